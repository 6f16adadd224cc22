//! Booking commands.

use clap::Subcommand;
use console::style;

use sh_api::endpoints::bookings::BookingParty;
use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};
use sh_models::BookingStatus;
use sh_services::{BookingRequest, SessionContext};

use crate::OutputFormat;

/// Which side of a booking the user is on.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Side {
    Client,
    Provider,
}

impl From<Side> for BookingParty {
    fn from(side: Side) -> Self {
        match side {
            Side::Client => BookingParty::Client,
            Side::Provider => BookingParty::Provider,
        }
    }
}

#[derive(Subcommand)]
pub enum BookingsAction {
    /// List bookings of the user.
    List {
        /// List as client or as provider.
        #[arg(long = "as", default_value = "client")]
        side: Side,
        /// Only this status (pending, confirmed, in_progress, completed, cancelled).
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Book a provider. The user is the client.
    Create {
        /// Provider id.
        #[arg(long)]
        provider: String,
        /// Date and time (RFC 3339 or "YYYY-MM-DD HH:MM" UTC).
        #[arg(long)]
        at: String,
        /// Service id. Without one the provider's hourly rate applies.
        #[arg(long)]
        service: Option<String>,
        /// Notes for the provider.
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change a booking's status. Completing it issues the invoice.
    Status {
        /// Booking id.
        id: String,
        /// New status.
        status: String,
    },
    /// Issue or show the invoice of a completed booking.
    Invoice {
        /// Booking id.
        id: String,
    },
}

fn parse_status(value: &str) -> ShResult<BookingStatus> {
    BookingStatus::parse(value)
        .ok_or_else(|| ShError::InvalidInput(format!("unknown booking status '{value}'")))
}

pub async fn run(
    config: ConfigHandle,
    session: SessionContext,
    action: BookingsAction,
    format: OutputFormat,
) -> ShResult<()> {
    let registry = super::init_registry(&config, session).await;
    let bookings = registry.bookings();
    let currency = config.read().await.wallet.currency.clone();

    match action {
        BookingsAction::List { side, status } => {
            let user = registry.session.resolve_user(None).await?;
            let status = status.as_deref().map(parse_status).transpose()?;
            let list = bookings.list(side.into(), &user, status).await?;

            match format {
                OutputFormat::Json => super::print_json(&list),
                OutputFormat::Text => {
                    if list.is_empty() {
                        println!("No bookings.");
                    } else {
                        let mut table =
                            super::new_table(vec!["Id", "When", "Client", "Provider", "Status", "Price"]);
                        for b in &list {
                            table.add_row(vec![
                                b.id.clone(),
                                super::format_datetime(Some(&b.scheduled_at)),
                                super::truncate(&b.client_id, 12),
                                super::truncate(&b.provider_id, 12),
                                b.status.to_string(),
                                super::format_amount(b.price, &currency),
                            ]);
                        }
                        println!("{table}");
                    }
                }
            }
        }
        BookingsAction::Create { provider, at, service, notes } => {
            let client = registry.session.resolve_user(None).await?;
            let booking = bookings
                .create(BookingRequest {
                    client_id: client,
                    provider_id: provider,
                    service_id: service,
                    scheduled_at: super::parse_datetime(&at)?,
                    notes,
                })
                .await?;

            match format {
                OutputFormat::Json => super::print_json(&booking),
                OutputFormat::Text => {
                    println!(
                        "  {} Booking {} requested for {} ({})",
                        style("OK").green().bold(),
                        booking.id,
                        super::format_datetime(Some(&booking.scheduled_at)),
                        super::format_amount(booking.price, &currency)
                    );
                }
            }
        }
        BookingsAction::Status { id, status } => {
            let next = parse_status(&status)?;
            let (booking, invoice) = bookings.change_status(&id, next).await?;

            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "booking": booking,
                    "invoice": invoice,
                })),
                OutputFormat::Text => {
                    println!(
                        "  {} Booking {} is now {}",
                        style("OK").green().bold(),
                        booking.id,
                        booking.status
                    );
                    match invoice {
                        Some(invoice) => println!(
                            "  Invoice {} issued: {}",
                            invoice.id,
                            super::format_amount(invoice.amount, &invoice.currency)
                        ),
                        None if booking.status == BookingStatus::Completed => println!(
                            "  {} Invoice not issued, retry with `bookings invoice {}`",
                            style("WARN").yellow().bold(),
                            booking.id
                        ),
                        None => {}
                    }
                }
            }
        }
        BookingsAction::Invoice { id } => {
            let invoice = bookings.invoice_booking(&id).await?;
            match format {
                OutputFormat::Json => super::print_json(&invoice),
                OutputFormat::Text => {
                    println!(
                        "  {} Invoice {} for booking {}: {}",
                        style("OK").green().bold(),
                        invoice.id,
                        invoice.booking_id,
                        super::format_amount(invoice.amount, &invoice.currency)
                    );
                }
            }
        }
    }

    super::print_toasts(&registry.notifications, format);
    Ok(())
}
