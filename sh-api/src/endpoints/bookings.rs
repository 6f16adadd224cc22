//! Booking endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sh_core::constants::tables;
use sh_core::error::{ShError, ShResult};
use sh_models::{Booking, BookingStatus};

use crate::client::ApiClient;
use crate::query::{Order, Query};

/// Row inserted to request a booking.
#[derive(Debug, Clone, Serialize)]
pub struct NewBooking {
    pub client_id: String,
    pub provider_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Which side of a booking a user id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingParty {
    Client,
    Provider,
}

impl BookingParty {
    fn column(&self) -> &'static str {
        match self {
            BookingParty::Client => "client_id",
            BookingParty::Provider => "provider_id",
        }
    }
}

#[derive(Serialize)]
struct StatusChange {
    status: BookingStatus,
}

impl ApiClient {
    pub async fn create_booking(&self, row: &NewBooking) -> ShResult<Booking> {
        self.insert_one(tables::BOOKINGS, row).await
    }

    pub async fn get_booking(&self, id: &str) -> ShResult<Booking> {
        self.select_one(tables::BOOKINGS, &Query::new().eq("id", id))
            .await?
            .ok_or_else(|| ShError::not_found(tables::BOOKINGS, id))
    }

    /// Bookings of a client or provider, soonest first.
    pub async fn list_bookings(
        &self,
        party: BookingParty,
        user_id: &str,
        status: Option<BookingStatus>,
    ) -> ShResult<Vec<Booking>> {
        let mut query = Query::new().eq(party.column(), user_id);
        if let Some(status) = status {
            query = query.eq("status", status.as_str());
        }
        self.select(tables::BOOKINGS, &query.order("scheduled_at", Order::Asc))
            .await
    }

    /// Write a new status. Transition rules are checked by the caller.
    pub async fn set_booking_status(&self, id: &str, status: BookingStatus) -> ShResult<Booking> {
        let rows: Vec<Booking> = self
            .update(tables::BOOKINGS, &Query::new().eq("id", id), &StatusChange { status })
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ShError::not_found(tables::BOOKINGS, id))
    }
}
