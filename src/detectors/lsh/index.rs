//! Banded LSH index for sub-quadratic candidate generation.
//!
//! Signatures are split into contiguous bands; two snippets become
//! candidates when any band hashes into the same bucket. Bucket iteration
//! follows insertion order and pairs are emitted bucket-then-pair, which
//! fixes downstream cluster labelling order.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use ahash::AHasher;

use crate::core::config::LshConfig;
use crate::detectors::lsh::context::estimated_jaccard;

/// An unordered candidate pair of index slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePair {
    /// Slot of the earlier-inserted member
    pub left: usize,
    /// Slot of the later-inserted member
    pub right: usize,
}

/// LSH index over MinHash signatures.
#[derive(Debug)]
pub struct LshIndex {
    bands: usize,
    rows_per_band: usize,

    /// Per-band buckets: band hash → member slots in insertion order
    buckets: Vec<HashMap<u64, Vec<usize>>>,

    /// First-seen journal of (band index, band hash); keeps candidate
    /// emission deterministic where the maps alone would not be
    bucket_order: Vec<(usize, u64)>,

    /// Slot → snippet id, in insertion order
    ids: Vec<String>,

    /// Slot → stored signature
    signatures: Vec<Vec<u32>>,
}

impl LshIndex {
    /// Create an index for the configured banding scheme.
    pub fn new(config: &LshConfig) -> Self {
        Self {
            bands: config.bands,
            rows_per_band: config.rows_per_band,
            buckets: vec![HashMap::new(); config.bands],
            bucket_order: Vec::new(),
            ids: Vec::new(),
            signatures: Vec::new(),
        }
    }

    /// Number of indexed snippets.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Snippet id stored at a slot.
    pub fn id_of(&self, slot: usize) -> &str {
        &self.ids[slot]
    }

    /// Signature stored at a slot.
    pub fn signature_of(&self, slot: usize) -> &[u32] {
        &self.signatures[slot]
    }

    /// Insert a snippet's signature, returning its slot.
    pub fn insert(&mut self, id: String, signature: Vec<u32>) -> usize {
        let slot = self.ids.len();
        for (band_idx, band_hash) in self.band_hashes(&signature) {
            let bucket = self.buckets[band_idx].entry(band_hash).or_default();
            if bucket.is_empty() {
                self.bucket_order.push((band_idx, band_hash));
            }
            bucket.push(slot);
        }
        self.ids.push(id);
        self.signatures.push(signature);
        slot
    }

    /// Candidate slots for a signature not present in the index.
    ///
    /// Used by the de-duplication pass to probe before inserting. Results
    /// are distinct and ordered by first collision.
    pub fn query(&self, signature: &[u32]) -> Vec<usize> {
        let mut seen = vec![false; self.ids.len()];
        let mut found = Vec::new();
        for (band_idx, band_hash) in self.band_hashes(signature) {
            if let Some(bucket) = self.buckets[band_idx].get(&band_hash) {
                for &slot in bucket {
                    if !seen[slot] {
                        seen[slot] = true;
                        found.push(slot);
                    }
                }
            }
        }
        found
    }

    /// All candidate pairs from buckets with at least two members.
    ///
    /// Pairs are emitted in bucket insertion order, then pair order within
    /// each bucket, deduplicated across buckets.
    pub fn candidate_pairs(&self) -> Vec<CandidatePair> {
        let mut seen: ahash::AHashSet<(usize, usize)> = ahash::AHashSet::new();
        let mut pairs = Vec::new();

        for &(band_idx, band_hash) in &self.bucket_order {
            let Some(bucket) = self.buckets[band_idx].get(&band_hash) else {
                continue;
            };
            if bucket.len() < 2 {
                continue;
            }
            for i in 0..bucket.len() {
                for j in (i + 1)..bucket.len() {
                    let (a, b) = (bucket[i].min(bucket[j]), bucket[i].max(bucket[j]));
                    if seen.insert((a, b)) {
                        pairs.push(CandidatePair { left: a, right: b });
                    }
                }
            }
        }

        pairs
    }

    /// Candidate pairs whose full-signature match fraction meets the
    /// threshold, with the estimate attached.
    ///
    /// Verification always consults the whole signature, never the bucket
    /// collision that surfaced the pair.
    pub fn verified_pairs(&self, threshold: f64) -> Vec<(CandidatePair, f64)> {
        self.candidate_pairs()
            .into_iter()
            .filter_map(|pair| {
                let similarity =
                    estimated_jaccard(&self.signatures[pair.left], &self.signatures[pair.right]);
                (similarity >= threshold).then_some((pair, similarity))
            })
            .collect()
    }

    /// Hash each band slice of a signature to its bucket key.
    fn band_hashes(&self, signature: &[u32]) -> Vec<(usize, u64)> {
        let mut hashes = Vec::with_capacity(self.bands);
        for band_idx in 0..self.bands {
            let start = band_idx * self.rows_per_band;
            let end = (start + self.rows_per_band).min(signature.len());
            if start >= signature.len() {
                break;
            }
            hashes.push((band_idx, hash_band(&signature[start..end])));
        }
        hashes
    }
}

/// Hash a band slice into a bucket key.
fn hash_band(band: &[u32]) -> u64 {
    let mut hasher = AHasher::default();
    band.hash(&mut hasher);
    hasher.finish()
}
