//! Invoice and withdrawal endpoints.

use serde::Serialize;
use sh_core::constants::tables;
use sh_core::error::{ShError, ShResult};
use sh_models::{Invoice, InvoiceStatus, Withdrawal, WithdrawalStatus};

use crate::client::ApiClient;
use crate::query::{Order, Query};

#[derive(Debug, Clone, Serialize)]
pub struct NewInvoice {
    pub booking_id: String,
    pub client_id: String,
    pub provider_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewWithdrawal {
    pub provider_id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_reference: Option<String>,
    pub status: WithdrawalStatus,
}

#[derive(Serialize)]
struct WithdrawalStatusChange {
    status: WithdrawalStatus,
}

impl ApiClient {
    pub async fn create_invoice(&self, row: &NewInvoice) -> ShResult<Invoice> {
        self.insert_one(tables::INVOICES, row).await
    }

    /// The invoice issued for a booking, if any.
    pub async fn invoice_for_booking(&self, booking_id: &str) -> ShResult<Option<Invoice>> {
        self.select_one(tables::INVOICES, &Query::new().eq("booking_id", booking_id))
            .await
    }

    /// Invoices where the user is either the client or the provider, newest first.
    pub async fn invoices_for_user(&self, user_id: &str) -> ShResult<Vec<Invoice>> {
        let query = Query::new()
            .any_eq(&["client_id", "provider_id"], user_id)
            .order("issued_at", Order::Desc);
        self.select(tables::INVOICES, &query).await
    }

    pub async fn create_withdrawal(&self, row: &NewWithdrawal) -> ShResult<Withdrawal> {
        self.insert_one(tables::WITHDRAWALS, row).await
    }

    pub async fn get_withdrawal(&self, id: &str) -> ShResult<Withdrawal> {
        self.select_one(tables::WITHDRAWALS, &Query::new().eq("id", id))
            .await?
            .ok_or_else(|| ShError::not_found(tables::WITHDRAWALS, id))
    }

    /// A provider's withdrawal requests, newest first.
    pub async fn withdrawals_for_provider(&self, provider_id: &str) -> ShResult<Vec<Withdrawal>> {
        let query = Query::new()
            .eq("provider_id", provider_id)
            .order("requested_at", Order::Desc);
        self.select(tables::WITHDRAWALS, &query).await
    }

    /// Write a new status. Transition rules are checked by the caller.
    pub async fn set_withdrawal_status(
        &self,
        id: &str,
        status: WithdrawalStatus,
    ) -> ShResult<Withdrawal> {
        let rows: Vec<Withdrawal> = self
            .update(
                tables::WITHDRAWALS,
                &Query::new().eq("id", id),
                &WithdrawalStatusChange { status },
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ShError::not_found(tables::WITHDRAWALS, id))
    }
}
