//! Booking lifecycle and invoicing.
//!
//! Status rules live on `BookingStatus`; they are checked here before any
//! remote write. Completing a booking issues its invoice.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use sh_api::endpoints::bookings::{BookingParty, NewBooking};
use sh_api::endpoints::wallet::NewInvoice;
use sh_api::Backend;
use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};
use sh_models::{Booking, BookingStatus, Invoice, InvoiceStatus};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{impl_service, ServiceState};

/// Input for a new booking.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub client_id: String,
    pub provider_id: String,
    pub service_id: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
}

pub struct BookingService {
    state: ServiceState,
    config: ConfigHandle,
    backend: Backend,
    event_bus: EventBus,
}

impl BookingService {
    pub fn new(config: ConfigHandle, backend: Backend, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            config,
            backend,
            event_bus,
        }
    }

    /// Create a pending booking. The time must be in the future and the
    /// provider must be taking bookings. The price comes from the chosen
    /// service, or the provider's hourly rate without one.
    pub async fn create(&self, request: BookingRequest) -> ShResult<Booking> {
        if request.scheduled_at <= Utc::now() {
            return Err(ShError::InvalidInput(
                "booking time must be in the future".into(),
            ));
        }
        if request.client_id == request.provider_id {
            return Err(ShError::InvalidInput("cannot book yourself".into()));
        }

        let api = self.backend.client()?;
        let provider = api.get_provider(&request.provider_id).await?;
        if !provider.is_available {
            return Err(ShError::InvalidInput(format!(
                "{} is not taking bookings",
                provider.business_name
            )));
        }

        let price = match &request.service_id {
            Some(service_id) => {
                let service = api.get_service(service_id).await?;
                if service.provider_id != provider.id || !service.is_active {
                    return Err(ShError::InvalidInput(format!(
                        "service {service_id} is not offered by this provider"
                    )));
                }
                service.price
            }
            None => match provider.hourly_rate {
                Some(rate) => rate.round() as i64,
                None => {
                    return Err(ShError::InvalidInput(format!(
                        "{} has no hourly rate, pick one of their services",
                        provider.business_name
                    )))
                }
            },
        };

        let booking = api
            .create_booking(&NewBooking {
                client_id: request.client_id,
                provider_id: request.provider_id,
                service_id: request.service_id,
                scheduled_at: request.scheduled_at,
                status: BookingStatus::Pending,
                price,
                notes: request.notes.filter(|n| !n.trim().is_empty()),
            })
            .await?;

        info!("booking {} created for {}", booking.id, booking.scheduled_at);
        self.event_bus.emit(AppEvent::BookingChanged {
            booking_id: booking.id.clone(),
            status: booking.status.to_string(),
        });
        Ok(booking)
    }

    pub async fn list(
        &self,
        party: BookingParty,
        user_id: &str,
        status: Option<BookingStatus>,
    ) -> ShResult<Vec<Booking>> {
        self.backend.client()?.list_bookings(party, user_id, status).await
    }

    /// Move a booking to `next`. Completing it also issues the invoice.
    ///
    /// The status change stands even if issuing the invoice fails; the
    /// invoice is then `None` and [`Self::invoice_booking`] retries it.
    pub async fn change_status(
        &self,
        booking_id: &str,
        next: BookingStatus,
    ) -> ShResult<(Booking, Option<Invoice>)> {
        let api = self.backend.client()?;
        let current = api.get_booking(booking_id).await?;
        if !current.status.can_transition_to(next) {
            return Err(ShError::InvalidTransition {
                from: current.status.to_string(),
                to: next.to_string(),
            });
        }

        let updated = api.set_booking_status(booking_id, next).await?;
        info!("booking {booking_id}: {} -> {}", current.status, updated.status);
        self.event_bus.emit(AppEvent::BookingChanged {
            booking_id: updated.id.clone(),
            status: updated.status.to_string(),
        });

        let invoice = if next == BookingStatus::Completed {
            match self.issue_invoice(&updated).await {
                Ok(invoice) => Some(invoice),
                Err(e) => {
                    warn!("booking {booking_id} completed but invoicing failed: {e}");
                    None
                }
            }
        } else {
            None
        };
        Ok((updated, invoice))
    }

    /// Issue (or fetch) the invoice of a completed booking by id.
    pub async fn invoice_booking(&self, booking_id: &str) -> ShResult<Invoice> {
        let booking = self.backend.client()?.get_booking(booking_id).await?;
        self.issue_invoice(&booking).await
    }

    /// Issue the invoice of a completed booking. Idempotent per booking.
    pub async fn issue_invoice(&self, booking: &Booking) -> ShResult<Invoice> {
        if booking.status != BookingStatus::Completed {
            return Err(ShError::InvalidInput(format!(
                "booking {} is {}, only completed bookings are invoiced",
                booking.id, booking.status
            )));
        }

        let api = self.backend.client()?;
        if let Some(existing) = api.invoice_for_booking(&booking.id).await? {
            return Ok(existing);
        }

        let currency = self.config.read().await.wallet.currency.clone();
        let invoice = api
            .create_invoice(&NewInvoice {
                booking_id: booking.id.clone(),
                client_id: booking.client_id.clone(),
                provider_id: booking.provider_id.clone(),
                amount: booking.price,
                currency,
                status: InvoiceStatus::Issued,
            })
            .await?;

        info!("invoice {} issued for booking {}", invoice.id, booking.id);
        self.event_bus.emit(AppEvent::InvoiceIssued {
            invoice_id: invoice.id.clone(),
            booking_id: booking.id.clone(),
            amount: invoice.amount,
        });
        Ok(invoice)
    }
}

impl_service!(BookingService, "bookings");
