//! Typed event bus for intra-service communication.
//!
//! Uses tokio broadcast channels so services can emit events without knowing
//! who is listening (CLI progress output, UI shells, tests).

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::liveness::LivenessStep;
use crate::notification::Toast;

/// Application-level events.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A toast was raised on the notification center.
    ToastRaised(Toast),
    /// The liveness check moved to another step.
    LivenessStepChanged {
        from: LivenessStep,
        to: LivenessStep,
    },
    /// Seconds left before the camera closes after a successful check.
    LivenessCountdown {
        remaining_secs: u64,
    },
    /// The liveness completion callback fired.
    LivenessCompleted {
        success: bool,
    },
    /// A profile's verification columns changed.
    VerificationUpdated {
        user_id: String,
        liveness_verified: bool,
    },
    /// A booking was created or changed status.
    BookingChanged {
        booking_id: String,
        status: String,
    },
    /// An invoice was issued for a completed booking.
    InvoiceIssued {
        invoice_id: String,
        booking_id: String,
        amount: i64,
    },
    /// A message was sent.
    MessageSent {
        conversation_id: String,
        message_id: String,
    },
    /// Messages were marked read.
    MessagesRead {
        conversation_id: String,
        count: usize,
    },
    /// A withdrawal was requested or changed status.
    WithdrawalChanged {
        withdrawal_id: String,
        status: String,
    },
    /// Export/import progress for one table.
    MigrationProgress {
        table: String,
        processed: u64,
        total: Option<u64>,
    },
    /// Export/import finished.
    MigrationComplete {
        rows: u64,
        dry_run: bool,
    },
}

/// Application-wide event bus backed by a tokio broadcast channel.
///
/// Every subscriber gets every event. Slow subscribers that fall behind
/// receive a `Lagged` error and miss events.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AppEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: AppEvent) {
        let label = event_label(&event);
        match self.sender.send(event) {
            Ok(count) => debug!("event_bus: emitted {label} to {count} subscriber(s)"),
            Err(_) => debug!("event_bus: no subscribers for {label}"),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

fn event_label(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::ToastRaised(_) => "ToastRaised",
        AppEvent::LivenessStepChanged { .. } => "LivenessStepChanged",
        AppEvent::LivenessCountdown { .. } => "LivenessCountdown",
        AppEvent::LivenessCompleted { .. } => "LivenessCompleted",
        AppEvent::VerificationUpdated { .. } => "VerificationUpdated",
        AppEvent::BookingChanged { .. } => "BookingChanged",
        AppEvent::InvoiceIssued { .. } => "InvoiceIssued",
        AppEvent::MessageSent { .. } => "MessageSent",
        AppEvent::MessagesRead { .. } => "MessagesRead",
        AppEvent::WithdrawalChanged { .. } => "WithdrawalChanged",
        AppEvent::MigrationProgress { .. } => "MigrationProgress",
        AppEvent::MigrationComplete { .. } => "MigrationComplete",
    }
}
