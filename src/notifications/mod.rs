//! User-visible notices and the channel that carries them.
//!
//! The pricing engine and the admin services stay pure / transport-agnostic;
//! this module is the adapter that turns their outcomes into toast-style
//! notices for whatever UI layer is listening on the channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::pricing::{Violation, MAX_DISCOUNT_PERCENTAGE, MIN_PROFIT_PERCENTAGE};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// A single user-visible notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    /// Stable machine-readable code, e.g. `profit_below_minimum`.
    pub code: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(kind: NoticeKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            code: code.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Warning, code, message)
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, code, message)
    }
}

/// Sending half of the notice channel.
#[derive(Debug, Clone)]
pub struct NoticeSender {
    sender: mpsc::Sender<Notice>,
}

impl NoticeSender {
    pub fn new(sender: mpsc::Sender<Notice>) -> Self {
        Self { sender }
    }

    /// Creates a bounded notice channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notice>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Sends a notice asynchronously.
    pub async fn send(&self, notice: Notice) -> Result<(), String> {
        self.sender
            .send(notice)
            .await
            .map_err(|e| format!("Failed to send notice: {}", e))
    }

    /// Sends a notice; a closed or full channel is logged, never propagated.
    pub async fn send_or_log(&self, notice: Notice) {
        if let Err(err) = self.send(notice).await {
            warn!("Notice dropped: {}", err);
        }
    }
}

/// Renders one pricing violation as a notice.
pub fn notice_for(violation: &Violation) -> Notice {
    let code = violation.as_ref();
    match violation {
        Violation::CostPriceRequired => Notice::error(
            code,
            "Enter a cost price before setting the base price".to_string(),
        ),
        Violation::BasePriceRequired => Notice::error(
            code,
            "Enter a base price before setting the current price".to_string(),
        ),
        Violation::ProfitBelowMinimum {
            corrected_base_price,
        } => Notice::warning(
            code,
            format!(
                "Profit cannot drop below {}%; base price raised to {}",
                MIN_PROFIT_PERCENTAGE, corrected_base_price
            ),
        ),
        Violation::CurrentPriceBelowFloor { floor } => Notice::warning(
            code,
            format!("Current price cannot drop below {}; raised to the minimum", floor),
        ),
        Violation::CurrentPriceAboveBase { base_price } => Notice::warning(
            code,
            format!(
                "Current price cannot exceed the base price; lowered to {}",
                base_price
            ),
        ),
        Violation::DiscountAboveMaximum {
            corrected_current_price,
        } => Notice::warning(
            code,
            format!(
                "Discount cannot exceed {}%; current price set to {}",
                MAX_DISCOUNT_PERCENTAGE, corrected_current_price
            ),
        ),
    }
}

/// Publishes one notice per violation, preserving the engine's order.
pub async fn publish_violations(sender: &NoticeSender, violations: &[Violation]) {
    for violation in violations {
        sender.send_or_log(notice_for(violation)).await;
    }
}
