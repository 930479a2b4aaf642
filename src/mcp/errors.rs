//! Turns wallet and SDK failures into the text shown to the MCP client.

use tracing::warn;

pub const INSUFFICIENT_FUNDS_MESSAGE: &str =
    "Error: Insufficient funds to complete this transaction. Please check your balance and try again.";
pub const INVALID_ADDRESS_MESSAGE: &str =
    "Error: Invalid address provided. Please check the address format and try again.";
pub const SMART_ACCOUNT_MESSAGE: &str =
    "Error: Smart account is not configured. Please check your wallet configuration.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InsufficientFunds,
    InvalidAddress,
    SmartAccountMissing,
    Other,
}

type Rule = (fn(&str) -> bool, ErrorCategory);

// First match wins.
const RULES: &[Rule] = &[
    (is_insufficient_funds, ErrorCategory::InsufficientFunds),
    (is_invalid_address, ErrorCategory::InvalidAddress),
    (is_smart_account_missing, ErrorCategory::SmartAccountMissing),
];

fn is_insufficient_funds(msg: &str) -> bool {
    msg.contains("insufficient funds")
        || msg.contains("insufficient balance")
        || msg.contains("exceeds balance")
}

fn is_invalid_address(msg: &str) -> bool {
    msg.contains("invalid address") || msg.contains("bad address checksum")
}

fn is_smart_account_missing(msg: &str) -> bool {
    msg.contains("smart account")
        && (msg.contains("missing") || msg.contains("not configured") || msg.contains("not deployed"))
}

pub fn classify(message: &str) -> ErrorCategory {
    let lowered = message.to_lowercase();
    RULES
        .iter()
        .find(|(matches, _)| matches(&lowered))
        .map(|(_, category)| *category)
        .unwrap_or(ErrorCategory::Other)
}

/// Renders an error (with its whole context chain) as user-facing text.
pub fn render_failure(err: &anyhow::Error) -> String {
    let raw = format!("{:#}", err);
    warn!("Tool call failed: {}", raw);
    render_message(&raw)
}

pub fn render_message(raw: &str) -> String {
    match classify(raw) {
        ErrorCategory::InsufficientFunds => INSUFFICIENT_FUNDS_MESSAGE.to_string(),
        ErrorCategory::InvalidAddress => INVALID_ADDRESS_MESSAGE.to_string(),
        ErrorCategory::SmartAccountMissing => SMART_ACCOUNT_MESSAGE.to_string(),
        ErrorCategory::Other => format!("Error: {}", raw),
    }
}
