//! MinHash signatures and banded LSH candidate generation.
//!
//! Signatures are fixed-length vectors of 32-bit hash minima over 3-token
//! shingles; the fraction of positions two signatures agree on estimates
//! the Jaccard similarity of their shingle sets. Banding collides likely
//! pairs into shared buckets so candidate generation is sub-quadratic.

pub mod context;
pub mod index;

pub use context::{estimated_jaccard, LshContext, SIGNATURE_SENTINEL};
pub use index::{CandidatePair, LshIndex};
