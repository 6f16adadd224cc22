//! Invoice and withdrawal commands.

use clap::Subcommand;
use console::style;

use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};
use sh_models::WithdrawalStatus;
use sh_services::{SessionContext, WithdrawalRequest};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum WalletAction {
    /// Invoices where the user is client or provider.
    Invoices,
    /// Request a withdrawal from a provider balance.
    Withdraw {
        /// Provider profile id.
        #[arg(long)]
        provider: String,
        /// Amount in whole currency units.
        #[arg(long)]
        amount: i64,
        /// Payout method, e.g. mobile_money.
        #[arg(long)]
        method: Option<String>,
        /// Account or phone number to pay out to.
        #[arg(long)]
        account: Option<String>,
    },
    /// List a provider's withdrawals.
    Withdrawals {
        /// Provider profile id.
        #[arg(long)]
        provider: String,
    },
    /// Change a withdrawal's status (approved, rejected, paid).
    WithdrawalStatus {
        /// Withdrawal id.
        id: String,
        /// New status.
        status: String,
    },
}

pub async fn run(
    config: ConfigHandle,
    session: SessionContext,
    action: WalletAction,
    format: OutputFormat,
) -> ShResult<()> {
    let registry = super::init_registry(&config, session).await;
    let wallet = registry.wallet();

    match action {
        WalletAction::Invoices => {
            let user = registry.session.resolve_user(None).await?;
            let invoices = wallet.invoices(&user).await?;
            match format {
                OutputFormat::Json => super::print_json(&invoices),
                OutputFormat::Text => {
                    if invoices.is_empty() {
                        println!("No invoices.");
                    } else {
                        let mut table =
                            super::new_table(vec!["Id", "Booking", "Amount", "Status", "Issued"]);
                        for i in &invoices {
                            table.add_row(vec![
                                i.id.clone(),
                                i.booking_id.clone(),
                                super::format_amount(i.amount, &i.currency),
                                format!("{:?}", i.status).to_lowercase(),
                                super::format_datetime(i.issued_at.as_ref()),
                            ]);
                        }
                        println!("{table}");
                    }
                }
            }
        }
        WalletAction::Withdraw { provider, amount, method, account } => {
            let withdrawal = wallet
                .request_withdrawal(WithdrawalRequest {
                    provider_id: provider,
                    amount,
                    method,
                    account_reference: account,
                })
                .await?;
            match format {
                OutputFormat::Json => super::print_json(&withdrawal),
                OutputFormat::Text => {
                    println!(
                        "  {} Withdrawal {} of {} requested",
                        style("OK").green().bold(),
                        withdrawal.id,
                        super::format_amount(withdrawal.amount, &withdrawal.currency)
                    );
                }
            }
        }
        WalletAction::Withdrawals { provider } => {
            let withdrawals = wallet.withdrawals(&provider).await?;
            match format {
                OutputFormat::Json => super::print_json(&withdrawals),
                OutputFormat::Text => {
                    if withdrawals.is_empty() {
                        println!("No withdrawals.");
                    } else {
                        let mut table =
                            super::new_table(vec!["Id", "Amount", "Method", "Status", "Requested"]);
                        for w in &withdrawals {
                            table.add_row(vec![
                                w.id.clone(),
                                super::format_amount(w.amount, &w.currency),
                                w.method.clone().unwrap_or_else(|| "-".into()),
                                w.status.to_string(),
                                super::format_datetime(w.requested_at.as_ref()),
                            ]);
                        }
                        println!("{table}");
                    }
                }
            }
        }
        WalletAction::WithdrawalStatus { id, status } => {
            let next = WithdrawalStatus::parse(&status).ok_or_else(|| {
                ShError::InvalidInput(format!("unknown withdrawal status '{status}'"))
            })?;
            let withdrawal = wallet.change_withdrawal_status(&id, next).await?;
            match format {
                OutputFormat::Json => super::print_json(&withdrawal),
                OutputFormat::Text => {
                    println!(
                        "  {} Withdrawal {} is now {}",
                        style("OK").green().bold(),
                        withdrawal.id,
                        withdrawal.status
                    );
                }
            }
        }
    }

    super::print_toasts(&registry.notifications, format);
    Ok(())
}
