//! Pure conversions between the chain's hex-encoded integers and the decimal
//! units the dashboard displays. No I/O; malformed input surfaces as
//! [`UnitsError`].

use ethers_core::types::U256;

#[derive(thiserror::Error, Debug)]
pub enum UnitsError {
    #[error("invalid hex quantity {0:?}")]
    InvalidHex(String),
    #[error("invalid block number {0:?}")]
    InvalidBlockNumber(String),
}

pub fn parse_hex_u64(raw: &str) -> Result<u64, UnitsError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| UnitsError::InvalidHex(raw.to_string()))?;
    u64::from_str_radix(digits, 16).map_err(|_| UnitsError::InvalidHex(raw.to_string()))
}

pub fn parse_hex_u256(raw: &str) -> Result<U256, UnitsError> {
    if !raw.starts_with("0x") && !raw.starts_with("0X") {
        return Err(UnitsError::InvalidHex(raw.to_string()));
    }
    U256::from_str_radix(&raw[2..], 16).map_err(|_| UnitsError::InvalidHex(raw.to_string()))
}

/// Block numbers arrive from the HTTP surface as either decimal or 0x-hex.
pub fn parse_block_number(raw: &str) -> Result<u64, UnitsError> {
    if raw.starts_with("0x") || raw.starts_with("0X") {
        parse_hex_u64(raw).map_err(|_| UnitsError::InvalidBlockNumber(raw.to_string()))
    } else {
        raw.parse::<u64>()
            .map_err(|_| UnitsError::InvalidBlockNumber(raw.to_string()))
    }
}

/// Wei to ether, fixed six decimal places.
pub fn format_ether(wei: U256) -> String {
    // 1 ether = 1e18 wei; work in millionths of an ether to keep the math
    // integral.
    let millionths = wei / U256::exp10(12);
    let whole = millionths / U256::from(1_000_000u64);
    let frac = (millionths % U256::from(1_000_000u64)).as_u64();
    format!("{}.{:06}", whole, frac)
}

/// Wei to gwei, fixed two decimal places.
pub fn format_gwei(wei: U256) -> String {
    // 1 gwei = 1e9 wei; hundredths of a gwei = wei / 1e7.
    let hundredths = wei / U256::exp10(7);
    let whole = hundredths / U256::from(100u64);
    let frac = (hundredths % U256::from(100u64)).as_u64();
    format!("{}.{:02}", whole, frac)
}

/// Lossy wei-to-gwei for charting.
pub fn wei_to_gwei(wei: U256) -> f64 {
    let hundredths = wei / U256::exp10(7);
    u128::try_from(hundredths).unwrap_or(u128::MAX) as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_ether_formats_with_six_decimals() {
        let wei = parse_hex_u256("0xDE0B6B3A7640000").unwrap();
        assert_eq!(format_ether(wei), "1.000000");
    }

    #[test]
    fn fractional_ether_keeps_millionths() {
        // 1.5 ether
        let wei = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(format_ether(wei), "1.500000");
        // 1 wei rounds down to zero at six decimal places
        assert_eq!(format_ether(U256::one()), "0.000000");
    }

    #[test]
    fn ten_gwei_formats_with_two_decimals() {
        let wei = parse_hex_u256("0x4A817C800").unwrap();
        assert_eq!(format_gwei(wei), "10.00");
    }

    #[test]
    fn sub_gwei_prices_keep_hundredths() {
        // 0.25 gwei
        let wei = U256::from(250_000_000u64);
        assert_eq!(format_gwei(wei), "0.25");
        assert_eq!(wei_to_gwei(wei), 0.25);
    }

    #[test]
    fn block_number_accepts_decimal_and_hex() {
        assert_eq!(parse_block_number("123456").unwrap(), 123_456);
        assert_eq!(parse_block_number("0x1e240").unwrap(), 123_456);
        assert!(parse_block_number("latest").is_err());
        assert!(parse_block_number("0xzz").is_err());
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(parse_hex_u64("123").is_err());
        assert!(parse_hex_u256("nope").is_err());
    }
}
