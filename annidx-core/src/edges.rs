//! Adjacency-list (and dead-node log) wire codec: a JSON array of decimal
//! entity ids, per spec. An absent or literally empty byte string decodes
//! as an empty list — the bootstrap path writes adjacency before any
//! neighbor exists.

use crate::error::{IndexError, Result};
use std::collections::HashSet;

pub fn parse_edges(bytes: &[u8]) -> Result<Vec<u64>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_slice(bytes).map_err(|e| IndexError::Corrupt(e.to_string()))
}

pub fn encode_edges(ids: &[u64]) -> Vec<u8> {
    serde_json::to_vec(ids).expect("serializing a &[u64] to JSON cannot fail")
}

/// Elements of `a` not present in `b`, preserving `a`'s order. Used to
/// prune dead neighbors out of an adjacency list before a new edge is
/// added to it.
pub fn diff(a: &[u64], b: &[u64]) -> Vec<u64> {
    let exclude: HashSet<u64> = b.iter().copied().collect();
    a.iter().copied().filter(|x| !exclude.contains(x)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_bytes_decode_to_empty_list() {
        assert_eq!(parse_edges(b"").unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn empty_list_encodes_to_json_array() {
        assert_eq!(encode_edges(&[]), b"[]");
    }

    #[test]
    fn corrupt_payload_is_rejected() {
        assert!(parse_edges(b"not json").is_err());
    }

    #[test]
    fn diff_removes_only_named_elements() {
        assert_eq!(diff(&[1, 2, 3], &[2]), vec![1, 3]);
        assert_eq!(diff(&[1, 2, 3], &[]), vec![1, 2, 3]);
        assert_eq!(diff(&[], &[1, 2]), Vec::<u64>::new());
    }

    proptest! {
        #[test]
        fn parse_encode_roundtrips(ids in prop::collection::vec(any::<u64>(), 0..50)) {
            let encoded = encode_edges(&ids);
            let decoded = parse_edges(&encoded).unwrap();
            prop_assert_eq!(decoded, ids);
        }

        #[test]
        fn diff_never_contains_excluded_elements(a in prop::collection::vec(any::<u64>(), 0..30), b in prop::collection::vec(any::<u64>(), 0..30)) {
            let result = diff(&a, &b);
            for id in &result {
                prop_assert!(!b.contains(id));
            }
            for id in &result {
                prop_assert!(a.contains(id));
            }
        }
    }
}
