//! Gateway status vocabulary.

use domain::PaymentStatus;

/// Maps a raw gateway status onto ours. Unknown values count as errors.
pub fn map_status(raw: &str) -> PaymentStatus {
    match raw {
        "APPROVED" => PaymentStatus::Approved,
        "DECLINED" | "VOIDED" => PaymentStatus::Declined,
        "PENDING" => PaymentStatus::Pending,
        _ => PaymentStatus::Error,
    }
}

/// Message reported with a status when the gateway sends none.
pub fn default_message(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Approved => "Payment approved successfully",
        PaymentStatus::Declined => "Payment declined",
        PaymentStatus::Pending => "Payment pending",
        PaymentStatus::Error => "Payment processing failed",
    }
}
