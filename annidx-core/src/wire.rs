//! Base-vector wire encoding.
//!
//! Decoding/encoding scalar vectors into byte strings is an external
//! collaborator's job — [`insert`](crate::insert::insert) and
//! [`search`](crate::search::search) never write a base vector, only
//! read and decode the ones already present at `(predicate, id)`. This
//! module exists so the index can be exercised end-to-end in this
//! crate's own tests without a real scalar-encoding layer; a production
//! caller (e.g. `quartz-server`) supplies its own base-vector bytes and
//! decode routine instead of this one, and writes them before calling
//! `insert`.

use crate::error::{IndexError, Result};

pub fn encode_vector(v: &[f64]) -> Vec<u8> {
    serde_json::to_vec(v).expect("serializing a &[f64] to JSON cannot fail")
}

pub fn decode_vector(bytes: &[u8]) -> Result<Vec<f64>> {
    serde_json::from_slice(bytes).map_err(|e| IndexError::Corrupt(e.to_string()))
}
