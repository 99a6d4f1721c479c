//! Deterministic key construction for the four record kinds the index
//! owns: base vector, per-layer adjacency, entry pointer, dead-node log.
//! The original repeats `pred + "_vector_" + level` inline at every call
//! site; naming it once here keeps the four key shapes from drifting.

use crate::error::{IndexError, Result};

/// `(predicate, entity)` as an opaque key, the unit the posting store
/// actually keys on.
pub fn data_key(predicate: &str, entity: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(predicate.len() + 1 + 8);
    key.extend_from_slice(predicate.as_bytes());
    key.push(0); // predicates never contain NUL
    key.extend_from_slice(&entity.to_be_bytes());
    key
}

pub fn layer_attr(predicate: &str, level: usize) -> String {
    format!("{predicate}_vector_{level}")
}

pub fn entry_attr(predicate: &str) -> String {
    format!("{predicate}_vector_entry")
}

pub fn dead_attr(predicate: &str) -> String {
    format!("{predicate}_vector_dead")
}

/// Well-known entity id the entry pointer and dead-node log are keyed
/// under — both are predicate-wide, not per-entity, records.
pub const SENTINEL_ENTITY: u64 = 1;

pub fn encode_entry(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

pub fn decode_entry(bytes: &[u8]) -> Result<u64> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| {
        IndexError::Corrupt(format!("entry pointer is {} bytes, expected 8", bytes.len()))
    })?;
    Ok(u64::from_be_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_key_distinguishes_entities() {
        assert_ne!(data_key("p", 1), data_key("p", 2));
        assert_ne!(data_key("p", 1), data_key("q", 1));
    }

    #[test]
    fn entry_roundtrips() {
        assert_eq!(decode_entry(&encode_entry(42)).unwrap(), 42);
    }

    #[test]
    fn entry_rejects_wrong_length() {
        assert!(decode_entry(b"short").is_err());
    }
}
