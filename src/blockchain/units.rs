//! Conversions between human decimal amounts and smallest-unit integers.

use anyhow::{anyhow, Result};
use ethers_core::types::U256;
use ethers_core::utils::{format_units, parse_units};

/// Renders `amount` smallest units as a decimal string with trailing zeros
/// trimmed (`1050000` at 6 decimals is `1.05`).
pub fn format_token_amount(amount: U256, decimals: u32) -> String {
    let full = match format_units(amount, decimals) {
        Ok(s) => s,
        Err(_) => return amount.to_string(),
    };
    if !full.contains('.') {
        return full;
    }
    full.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Parses a positive decimal amount into smallest units.
pub fn parse_token_amount(amount: &str, decimals: u32) -> Result<U256> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') || trimmed.starts_with('+') {
        return Err(anyhow!("invalid amount '{}': expected a positive decimal number", amount));
    }
    let parsed = parse_units(trimmed, decimals)
        .map_err(|e| anyhow!("invalid amount '{}': {}", amount, e))?;
    let value: U256 = parsed.into();
    if value.is_zero() {
        return Err(anyhow!("invalid amount '{}': must be greater than zero", amount));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_trimmed_zeros() {
        assert_eq!(format_token_amount(U256::from(1_050_000u64), 6), "1.05");
        assert_eq!(format_token_amount(U256::from(1_000_000u64), 6), "1");
        assert_eq!(format_token_amount(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_token_amount(U256::zero(), 18), "0");
    }

    #[test]
    fn parses_decimal_amounts() {
        assert_eq!(parse_token_amount("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(
            parse_token_amount("0.01", 18).unwrap(),
            U256::from(10_000_000_000_000_000u64)
        );
    }

    #[test]
    fn rejects_zero_negative_and_garbage() {
        assert!(parse_token_amount("0", 18).is_err());
        assert!(parse_token_amount("-1", 18).is_err());
        assert!(parse_token_amount("ten", 18).is_err());
        assert!(parse_token_amount("", 18).is_err());
    }
}
