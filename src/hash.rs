//! Hashing utilities for matching rows and key tuples

use crate::dataset::{TabularDataset, Value};
use blake3::Hasher;
use rayon::prelude::*;
use std::collections::HashMap;

/// A 256-bit fingerprint of an ordered tuple of values
pub type Fingerprint = [u8; 32];

/// Computes type-aware fingerprints over selected columns of a dataset.
///
/// Two tuples share a fingerprint only when every position holds the same kind
/// of value with the same content. `1` (numeric) and `"1"` (text) differ; two
/// nulls are equal.
pub struct RowHasher;

impl RowHasher {
    /// Fingerprint a single tuple of values
    pub fn fingerprint<'a>(values: impl IntoIterator<Item = &'a Value>) -> Fingerprint {
        let mut hasher = Hasher::new();
        for value in values {
            match value {
                Value::Null => {
                    hasher.update(b"N");
                }
                Value::Integer(i) if Self::exact_in_f64(*i) => {
                    Self::update_float(&mut hasher, *i as f64);
                }
                Value::Integer(i) => {
                    hasher.update(b"I");
                    hasher.update(&i.to_le_bytes());
                }
                Value::Number(n) => Self::update_float(&mut hasher, *n),
                Value::Text(s) => {
                    hasher.update(b"T");
                    hasher.update(&(s.len() as u64).to_le_bytes());
                    hasher.update(s.as_bytes());
                }
                Value::Boolean(b) => {
                    hasher.update(if *b { b"B1" } else { b"B0" });
                }
            }
            hasher.update(b"|");
        }
        *hasher.finalize().as_bytes()
    }

    /// Integers an `f64` holds exactly hash like the equal float
    fn exact_in_f64(i: i64) -> bool {
        (i as f64) as i128 == i as i128
    }

    fn update_float(hasher: &mut Hasher, n: f64) {
        // -0.0 and 0.0 must agree
        let n = if n == 0.0 { 0.0 } else { n };
        hasher.update(b"F");
        hasher.update(&n.to_bits().to_le_bytes());
    }

    /// Fingerprint the given columns of every row, in parallel, preserving row order
    pub fn fingerprint_rows(dataset: &TabularDataset, columns: &[usize]) -> Vec<Fingerprint> {
        dataset
            .rows()
            .par_iter()
            .map(|row| Self::fingerprint(columns.iter().map(|&idx| &row[idx])))
            .collect()
    }

    /// Group row indices by fingerprint of the given columns
    pub fn index_rows(dataset: &TabularDataset, columns: &[usize]) -> HashMap<Fingerprint, Vec<usize>> {
        let mut index: HashMap<Fingerprint, Vec<usize>> = HashMap::new();
        for (row_idx, fp) in Self::fingerprint_rows(dataset, columns).into_iter().enumerate() {
            index.entry(fp).or_default().push(row_idx);
        }
        index
    }
}
