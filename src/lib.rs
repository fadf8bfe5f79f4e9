//! # Refrain: Structural Redundancy Discovery
//!
//! Refrain ingests source code written in many programming languages and
//! discovers structural redundancy across it: near-duplicate fragments,
//! recurring token sequences, and shared skeletal structure. It is built for
//! corpora large enough that pairwise comparison is infeasible and small
//! enough to live on one machine's disk.
//!
//! The pipeline:
//!
//! - **Ingest**: walk source trees, cut files into function-sized snippets,
//!   tokenize them with language-aware normalisation
//! - **Index**: MinHash signatures + banded LSH for sub-quadratic candidate
//!   generation, similarity-graph clustering with centroid selection
//! - **Synthesize**: mine n-gram, longest-common-subsequence, and shallow
//!   structural patterns from the clustered corpus
//!
//! Everything is backed by append-only JSONL logs, so each stage is
//! separately re-runnable and a cancelled run leaves a legal prefix.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use refrain::core::config::RefrainConfig;
//! use refrain::core::pipeline::{IngestStage, IndexStage, SynthStage};
//! use refrain::io::store::JsonlStore;
//!
//! fn main() -> refrain::Result<()> {
//!     let config = RefrainConfig::default();
//!     config.validate()?;
//!
//!     let store = JsonlStore::open("./data")?;
//!     let ingest = IngestStage::new(&store, &config).run(&["./src".into()])?;
//!     println!("ingested {} snippets", ingest.snippets_created);
//!
//!     IndexStage::new(&store, &config).run()?;
//!     SynthStage::new(&store, &config).run(&[])?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

// Core data model, configuration, and pipeline orchestration
pub mod core {
    //! Core records, configuration, errors, and pipeline stages.

    pub mod config;
    pub mod errors;
    pub mod pipeline;
    pub mod records;
}

// Language detection and token normalisation
pub mod lang {
    //! Language registry and the normalising tokenizer.

    pub mod registry;
    pub mod tokenizer;

    pub use registry::{language_for_path, Language};
    pub use tokenizer::Tokenizer;
}

// Snippet extraction from raw source files
pub mod extract;

// Similarity detection and pattern mining
pub mod detectors {
    //! Similarity detection: MinHash/LSH, clustering, and pattern mining.

    pub mod cluster;
    pub mod lsh;
    pub mod patterns;
}

// On-disk persistence
pub mod io {
    //! Append-only record logs and metadata sidecars.

    pub mod store;
}

// Read-only aggregation views for external consumers
pub mod api {
    //! View-model aggregations consumed by the HTTP collaborator.

    pub mod views;
}

// Re-export primary types for convenience
pub use crate::core::config::RefrainConfig;
pub use crate::core::errors::{RefrainError, Result};
pub use crate::core::records::{Cluster, Pattern, PatternKind, Snippet};
pub use crate::io::store::{Dataset, JsonlStore};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
