//! Decoding of ERC-20 `Transfer` events out of transaction receipt logs.
//!
//! Only the canonical `Transfer(address,address,uint256)` shape is handled;
//! anything else is ignored rather than treated as an error.

use ethers_core::types::{Address, Log, H256, U256};

use crate::models::TokenTransfer;
use crate::units::format_ether;

/// keccak256("Transfer(address,address,uint256)")
pub const TRANSFER_TOPIC: H256 = H256([
    0xdd, 0xf2, 0x52, 0xad, 0x1b, 0xe2, 0xc8, 0x9b, 0x69, 0xc2, 0xb0, 0x68, 0xfc, 0x37, 0x8d,
    0xaa, 0x95, 0x2b, 0xa7, 0xf1, 0x63, 0xc4, 0xa1, 0x16, 0x28, 0xf5, 0x5a, 0x4d, 0xf5, 0x23,
    0xb3, 0xef,
]);

/// Decode a single log if it is an ERC-20 `Transfer`; `None` otherwise.
///
/// The participant addresses are the lower 20 bytes of topics 1 and 2, and the
/// amount is the 32-byte big-endian word in the data field. The formatted
/// value assumes 18 token decimals, which is all the dashboard displays.
pub fn decode_transfer(log: &Log) -> Option<TokenTransfer> {
    if log.topics.len() < 3 || log.topics[0] != TRANSFER_TOPIC {
        return None;
    }
    if log.data.len() != 32 {
        return None;
    }

    let from = topic_address(&log.topics[1]);
    let to = topic_address(&log.topics[2]);
    let value = U256::from_big_endian(&log.data);

    Some(TokenTransfer {
        token: format!("0x{:x}", log.address),
        from: format!("0x{:x}", from),
        to: format!("0x{:x}", to),
        value: value.to_string(),
        value_formatted: format_ether(value),
    })
}

/// Collect every decodable transfer in receipt order.
pub fn decode_transfers(logs: &[Log]) -> Vec<TokenTransfer> {
    logs.iter().filter_map(decode_transfer).collect()
}

fn topic_address(topic: &H256) -> Address {
    Address::from_slice(&topic.as_bytes()[12..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::types::{Bytes, H160};

    fn padded(addr: H160) -> H256 {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(addr.as_bytes());
        H256(bytes)
    }

    fn transfer_log(from: H160, to: H160, value: U256) -> Log {
        let mut data = [0u8; 32];
        value.to_big_endian(&mut data);
        Log {
            address: H160::from_low_u64_be(0xdead),
            topics: vec![TRANSFER_TOPIC, padded(from), padded(to)],
            data: Bytes::from(data.to_vec()),
            ..Default::default()
        }
    }

    #[test]
    fn decodes_transfer_participants_and_value() {
        let from = H160::from_low_u64_be(1);
        let to = H160::from_low_u64_be(2);
        let log = transfer_log(from, to, U256::exp10(18));

        let transfer = decode_transfer(&log).unwrap();
        assert_eq!(transfer.from, format!("0x{:x}", from));
        assert_eq!(transfer.to, format!("0x{:x}", to));
        assert_eq!(transfer.value, U256::exp10(18).to_string());
        assert_eq!(transfer.value_formatted, "1.000000");
    }

    #[test]
    fn ignores_non_transfer_topics() {
        let mut log = transfer_log(
            H160::from_low_u64_be(1),
            H160::from_low_u64_be(2),
            U256::from(5u64),
        );
        log.topics[0] = H256::zero();
        assert!(decode_transfer(&log).is_none());
    }

    #[test]
    fn ignores_malformed_data_words() {
        let mut log = transfer_log(
            H160::from_low_u64_be(1),
            H160::from_low_u64_be(2),
            U256::from(5u64),
        );
        log.data = Bytes::from(vec![0u8; 31]);
        assert!(decode_transfer(&log).is_none());
    }
}
