//! Payment gateway adapters.
//!
//! - `HostedGateway` - Hosted payment page with HMAC-signed requests and callbacks
//! - `OfflineGateway` - Stand-in when no gateway is configured

mod amount;
mod hosted;
mod offline;

pub use amount::{format_amount, parse_amount};
pub use hosted::{HostedGateway, HostedGatewayConfig};
pub use offline::OfflineGateway;

use crate::domain::payment::GatewayStatus;

/// Map the hosted gateway's status words, ignoring case and padding.
pub(crate) fn status_from_vocabulary(raw: &str) -> GatewayStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "complete" | "completed" | "success" | "successful" | "paid" => GatewayStatus::Completed,
        "cancelled" | "canceled" | "abandoned" => GatewayStatus::Cancelled,
        "error" | "failed" | "failure" | "declined" => GatewayStatus::Failed,
        _ => GatewayStatus::Unknown,
    }
}
