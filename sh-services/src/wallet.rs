//! Invoices and provider withdrawals.
//!
//! Money movement itself happens outside the app; this keeps the request
//! bookkeeping honest: a provider cannot ask for less than the configured
//! minimum or more than what is left after outstanding requests.

use tracing::info;

use sh_api::endpoints::wallet::NewWithdrawal;
use sh_api::Backend;
use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};
use sh_models::{Invoice, Withdrawal, WithdrawalStatus};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{impl_service, ServiceState};

/// Input for a withdrawal request.
#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    pub provider_id: String,
    pub amount: i64,
    pub method: Option<String>,
    pub account_reference: Option<String>,
}

pub struct WalletService {
    state: ServiceState,
    config: ConfigHandle,
    backend: Backend,
    event_bus: EventBus,
}

/// Balance left after subtracting outstanding withdrawals.
pub fn available_balance(balance: i64, withdrawals: &[Withdrawal]) -> i64 {
    let reserved: i64 = withdrawals
        .iter()
        .filter(|w| w.status.is_outstanding())
        .map(|w| w.amount)
        .sum();
    balance - reserved
}

impl WalletService {
    pub fn new(config: ConfigHandle, backend: Backend, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            config,
            backend,
            event_bus,
        }
    }

    pub async fn invoices(&self, user_id: &str) -> ShResult<Vec<Invoice>> {
        self.backend.client()?.invoices_for_user(user_id).await
    }

    pub async fn withdrawals(&self, provider_id: &str) -> ShResult<Vec<Withdrawal>> {
        self.backend.client()?.withdrawals_for_provider(provider_id).await
    }

    /// Request a payout. `min_withdrawal <= amount <= available balance`.
    pub async fn request_withdrawal(&self, request: WithdrawalRequest) -> ShResult<Withdrawal> {
        let wallet = self.config.read().await.wallet.clone();
        if request.amount < wallet.min_withdrawal {
            return Err(ShError::InvalidInput(format!(
                "minimum withdrawal is {} {}",
                wallet.min_withdrawal, wallet.currency
            )));
        }

        let api = self.backend.client()?;
        let provider = api.get_provider(&request.provider_id).await?;
        let history = api.withdrawals_for_provider(&provider.id).await?;
        let available = available_balance(provider.balance, &history);
        if request.amount > available {
            return Err(ShError::InvalidInput(format!(
                "amount {} exceeds available balance {available} {}",
                request.amount, wallet.currency
            )));
        }

        let withdrawal = api
            .create_withdrawal(&NewWithdrawal {
                provider_id: provider.id,
                amount: request.amount,
                currency: wallet.currency,
                method: request.method,
                account_reference: request.account_reference,
                status: WithdrawalStatus::Pending,
            })
            .await?;

        info!("withdrawal {} requested: {}", withdrawal.id, withdrawal.amount);
        self.event_bus.emit(AppEvent::WithdrawalChanged {
            withdrawal_id: withdrawal.id.clone(),
            status: withdrawal.status.to_string(),
        });
        Ok(withdrawal)
    }

    /// Apply a status change (approve, reject, mark paid).
    pub async fn change_withdrawal_status(
        &self,
        withdrawal_id: &str,
        next: WithdrawalStatus,
    ) -> ShResult<Withdrawal> {
        let api = self.backend.client()?;
        let current = api.get_withdrawal(withdrawal_id).await?;
        if !current.status.can_transition_to(next) {
            return Err(ShError::InvalidTransition {
                from: current.status.to_string(),
                to: next.to_string(),
            });
        }

        let updated = api.set_withdrawal_status(withdrawal_id, next).await?;
        info!("withdrawal {withdrawal_id}: {} -> {}", current.status, updated.status);
        self.event_bus.emit(AppEvent::WithdrawalChanged {
            withdrawal_id: updated.id.clone(),
            status: updated.status.to_string(),
        });
        Ok(updated)
    }
}

impl_service!(WalletService, "wallet");

#[cfg(test)]
mod tests {
    use super::*;

    fn withdrawal(amount: i64, status: WithdrawalStatus) -> Withdrawal {
        Withdrawal {
            id: "w".into(),
            provider_id: "p".into(),
            amount,
            currency: "XOF".into(),
            method: None,
            account_reference: None,
            status,
            requested_at: None,
        }
    }

    #[test]
    fn test_available_balance_subtracts_outstanding() {
        let history = [
            withdrawal(1000, WithdrawalStatus::Pending),
            withdrawal(2000, WithdrawalStatus::Approved),
            withdrawal(4000, WithdrawalStatus::Paid),
            withdrawal(8000, WithdrawalStatus::Rejected),
        ];
        assert_eq!(available_balance(10_000, &history), 7_000);
        assert_eq!(available_balance(10_000, &[]), 10_000);
    }
}
