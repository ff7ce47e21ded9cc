//! One-time random playback order over the photo list.

use anyhow::{Result, ensure};
use rand::seq::SliceRandom;

/// Bijection from playback index (shuffled traversal position) to original
/// index (position in the unshuffled source list). Built once per session;
/// a new session reshuffles.
#[derive(Debug, Clone)]
pub struct PlaybackOrder {
    forward: Vec<usize>,
}

impl PlaybackOrder {
    /// Uniform random permutation of `[0, n)`. Unseeded; every session
    /// produces a different order.
    pub fn generate(n: usize) -> Self {
        let mut forward: Vec<usize> = (0..n).collect();
        forward.shuffle(&mut rand::rng());
        Self { forward }
    }

    /// Build from an explicit permutation, validating the bijection: every
    /// value in `[0, len)` must appear exactly once.
    ///
    /// # Errors
    /// Fails when a value is out of range or duplicated.
    pub fn from_vec(forward: Vec<usize>) -> Result<Self> {
        let n = forward.len();
        let mut seen = vec![false; n];
        for &original in &forward {
            ensure!(original < n, "index {original} out of range for length {n}");
            ensure!(!seen[original], "index {original} appears more than once");
            seen[original] = true;
        }
        Ok(Self { forward })
    }

    /// Original-list position for a playback position; used for remote
    /// addressing and display-name resolution.
    #[must_use]
    pub fn original_index_of(&self, playback: usize) -> usize {
        self.forward[playback]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_yields_a_permutation() {
        for n in [1usize, 2, 5, 97] {
            let order = PlaybackOrder::generate(n);
            let mut values: Vec<usize> = (0..n).map(|i| order.original_index_of(i)).collect();
            values.sort_unstable();
            assert_eq!(values, (0..n).collect::<Vec<_>>(), "n = {n}");
        }
    }

    #[test]
    fn from_vec_accepts_identity_and_reversal() {
        let id = PlaybackOrder::from_vec(vec![0, 1, 2]).unwrap();
        assert_eq!(id.original_index_of(1), 1);

        let rev = PlaybackOrder::from_vec(vec![2, 1, 0]).unwrap();
        assert_eq!(rev.original_index_of(0), 2);
        assert_eq!(rev.original_index_of(2), 0);
    }

    #[test]
    fn from_vec_rejects_duplicates_and_gaps() {
        assert!(PlaybackOrder::from_vec(vec![0, 0, 2]).is_err());
        assert!(PlaybackOrder::from_vec(vec![0, 1, 3]).is_err());
    }

    #[test]
    fn empty_order_is_valid() {
        let order = PlaybackOrder::from_vec(Vec::new()).unwrap();
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
    }
}
