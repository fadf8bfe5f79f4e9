//! The seeded MinHash hash family and signature generation.
//!
//! One [`LshContext`] is built per run and passed explicitly to every
//! component that computes signatures. Signatures produced under different
//! seeds are not comparable; the store's config sidecar records the seed a
//! dataset was built with.

use rayon::prelude::*;

use crate::core::config::LshConfig;

/// Mersenne prime 2^31 − 1, the modulus of the hash family.
const MERSENNE_PRIME: u64 = (1 << 31) - 1;

/// Signature value for positions with no shingles to hash.
///
/// Real hash values are always below 2^31, so the sentinel is
/// distinguishable from any produced minimum.
pub const SIGNATURE_SENTINEL: u32 = u32::MAX;

/// Per-run MinHash context: the (a, b) coefficient pairs of the
/// `h(s) = (a·poly31(s) + b) mod p` family, expanded deterministically
/// from the configured seed.
#[derive(Debug, Clone)]
pub struct LshContext {
    coefficients: Vec<(u64, u64)>,
    bands: usize,
    rows_per_band: usize,
    shingle_size: usize,
}

impl LshContext {
    /// Build a context from LSH configuration.
    pub fn new(config: &LshConfig) -> Self {
        let k = config.signature_len();
        let mut stream = SplitMix64::new(config.seed);
        let coefficients = (0..k)
            .map(|_| {
                // a must be non-zero for the family to stay pairwise independent
                let a = 1 + stream.next() % (MERSENNE_PRIME - 1);
                let b = stream.next() % MERSENNE_PRIME;
                (a, b)
            })
            .collect();

        Self {
            coefficients,
            bands: config.bands,
            rows_per_band: config.rows_per_band,
            shingle_size: config.shingle_size,
        }
    }

    /// Total signature length (bands × rows).
    pub fn signature_len(&self) -> usize {
        self.coefficients.len()
    }

    /// Number of LSH bands.
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Signature positions per band.
    pub fn rows_per_band(&self) -> usize {
        self.rows_per_band
    }

    /// Form the set of contiguous shingles over a token sequence.
    ///
    /// Shingles are ordered tuples joined by a space and treated as
    /// strings. A window longer than the sequence yields no shingles.
    pub fn shingles(&self, tokens: &[String]) -> Vec<String> {
        if tokens.len() < self.shingle_size {
            return Vec::new();
        }
        tokens
            .windows(self.shingle_size)
            .map(|w| w.join(" "))
            .collect()
    }

    /// Compute the MinHash signature for a token sequence.
    ///
    /// Each position holds the minimum of one hash function across the
    /// shingle set; an empty shingle set yields the sentinel at every
    /// position rather than an error.
    pub fn signature(&self, tokens: &[String]) -> Vec<u32> {
        let shingles = self.shingles(tokens);
        if shingles.is_empty() {
            return vec![SIGNATURE_SENTINEL; self.signature_len()];
        }

        let base_hashes: Vec<u64> = shingles.iter().map(|s| poly31(s)).collect();

        self.coefficients
            .iter()
            .map(|&(a, b)| {
                let min = base_hashes
                    .iter()
                    .map(|&h| (a.wrapping_mul(h) + b) % MERSENNE_PRIME)
                    .min()
                    .unwrap_or(u64::from(SIGNATURE_SENTINEL));
                min as u32
            })
            .collect()
    }

    /// Compute signatures for many token sequences, preserving input order.
    ///
    /// Signature generation is embarrassingly parallel over snippets; this
    /// is the only fan-out point in the pipeline.
    pub fn signatures_batch(&self, token_seqs: &[Vec<String>]) -> Vec<Vec<u32>> {
        token_seqs
            .par_iter()
            .map(|tokens| self.signature(tokens))
            .collect()
    }
}

/// Fraction of positions on which two signatures agree; an unbiased
/// estimator of the Jaccard similarity of the underlying shingle sets.
///
/// Returns 0.0 for signatures of mismatched length.
pub fn estimated_jaccard(a: &[u32], b: &[u32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let matching = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    matching as f64 / a.len() as f64
}

/// Polynomial rolling hash of a string's bytes with base 31, reduced
/// modulo the Mersenne prime at each step.
fn poly31(s: &str) -> u64 {
    let mut hash: u64 = 0;
    for byte in s.bytes() {
        hash = (hash.wrapping_mul(31) + u64::from(byte)) % MERSENNE_PRIME;
    }
    hash
}

/// SplitMix64 stream used to expand the config seed into the coefficient
/// pairs. Deterministic: same seed, same family.
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}
