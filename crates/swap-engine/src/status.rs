use serde::Serialize;

/// Canonical transaction state, derived from the upstream order-state
/// vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
    Unknown,
}

impl TransactionStatus {
    pub fn from_order_state(state: &str) -> Self {
        match state {
            "live" => TransactionStatus::Pending,
            "filled" => TransactionStatus::Success,
            "canceled" => TransactionStatus::Failed,
            _ => TransactionStatus::Unknown,
        }
    }
}
