//! Configuration types for the refrain analysis pipeline.
//!
//! All tuning constants live here, loaded once at process start and
//! persisted alongside the datasets as a sidecar record so a store is
//! self-describing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::{RefrainError, Result};

/// Validate that a value lies in the closed unit interval.
pub fn validate_unit_range(value: f64, field: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(RefrainError::validation_field(
            format!("{field} must be between 0.0 and 1.0, got {value}"),
            field,
        ));
    }
    Ok(())
}

/// Main configuration for the refrain pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefrainConfig {
    /// MinHash/LSH similarity settings
    #[serde(default)]
    pub lsh: LshConfig,

    /// Snippet extraction settings
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Pattern synthesis settings
    #[serde(default)]
    pub synth: SynthConfig,
}

/// MinHash/LSH similarity detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LshConfig {
    /// Number of LSH bands
    pub bands: usize,

    /// Number of signature positions per band
    pub rows_per_band: usize,

    /// Shingle size for signature generation
    pub shingle_size: usize,

    /// Jaccard threshold for the de-duplication pass
    pub similarity_threshold: f64,

    /// Jaccard threshold for cluster edge admission (typically looser)
    pub cluster_threshold: f64,

    /// Minimum members for an emitted cluster
    pub min_cluster_size: usize,

    /// Seed for the MinHash coefficient family.
    ///
    /// Signatures are only comparable within one seed; the store records
    /// the seed it was built with.
    pub seed: u64,
}

/// Snippet extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractConfig {
    /// Minimum non-whitespace characters for a snippet to be kept
    pub min_snippet_chars: usize,

    /// Maximum file length eligible for the whole-file fallback snippet
    pub max_whole_file_lines: usize,

    /// File extensions eligible for ingestion (with leading dots)
    pub extensions: Vec<String>,
}

/// Pattern synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynthConfig {
    /// Token window length for the n-gram tier
    pub ngram_size: usize,

    /// Minimum cross-snippet support for an emitted pattern
    pub min_frequency: usize,

    /// Minimum token length for an emitted LCS pattern
    pub min_lcs_tokens: usize,
}

/// Default implementation for [`LshConfig`].
impl Default for LshConfig {
    /// Returns the default LSH configuration (signature length 100).
    fn default() -> Self {
        Self {
            bands: 20,
            rows_per_band: 5,
            shingle_size: 3,
            similarity_threshold: 0.8,
            cluster_threshold: 0.7,
            min_cluster_size: 2,
            seed: 0,
        }
    }
}

/// Default implementation for [`ExtractConfig`].
impl Default for ExtractConfig {
    /// Returns the default extraction configuration.
    fn default() -> Self {
        Self {
            min_snippet_chars: 20,
            max_whole_file_lines: 50,
            extensions: [
                ".js", ".ts", ".py", ".java", ".cpp", ".c", ".go", ".rs", ".rb", ".php",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        }
    }
}

/// Default implementation for [`SynthConfig`].
impl Default for SynthConfig {
    /// Returns the default synthesis configuration.
    fn default() -> Self {
        Self {
            ngram_size: 3,
            min_frequency: 2,
            min_lcs_tokens: 3,
        }
    }
}

/// Default implementation for [`RefrainConfig`].
impl Default for RefrainConfig {
    /// Returns the default pipeline configuration.
    fn default() -> Self {
        Self {
            lsh: LshConfig::default(),
            extract: ExtractConfig::default(),
            synth: SynthConfig::default(),
        }
    }
}

/// Validation and utility methods for [`LshConfig`].
impl LshConfig {
    /// Total signature length (bands × rows).
    pub fn signature_len(&self) -> usize {
        self.bands * self.rows_per_band
    }

    /// Validate LSH configuration
    pub fn validate(&self) -> Result<()> {
        if self.bands == 0 {
            return Err(RefrainError::validation_field(
                "bands must be greater than 0",
                "lsh.bands",
            ));
        }

        if self.rows_per_band == 0 {
            return Err(RefrainError::validation_field(
                "rows_per_band must be greater than 0",
                "lsh.rows_per_band",
            ));
        }

        if self.shingle_size == 0 {
            return Err(RefrainError::validation_field(
                "shingle_size must be greater than 0",
                "lsh.shingle_size",
            ));
        }

        if self.min_cluster_size == 0 {
            return Err(RefrainError::validation_field(
                "min_cluster_size must be greater than 0",
                "lsh.min_cluster_size",
            ));
        }

        validate_unit_range(self.similarity_threshold, "lsh.similarity_threshold")?;
        validate_unit_range(self.cluster_threshold, "lsh.cluster_threshold")?;

        Ok(())
    }
}

/// Validation for [`ExtractConfig`].
impl ExtractConfig {
    /// Validate extraction configuration
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(RefrainError::validation_field(
                "at least one extension must be configured",
                "extract.extensions",
            ));
        }

        for ext in &self.extensions {
            if !ext.starts_with('.') {
                return Err(RefrainError::validation_field(
                    format!("extension '{ext}' must start with a dot"),
                    "extract.extensions",
                ));
            }
        }

        Ok(())
    }
}

/// Validation for [`SynthConfig`].
impl SynthConfig {
    /// Validate synthesis configuration
    pub fn validate(&self) -> Result<()> {
        if self.ngram_size == 0 {
            return Err(RefrainError::validation_field(
                "ngram_size must be greater than 0",
                "synth.ngram_size",
            ));
        }

        if self.min_frequency < 2 {
            return Err(RefrainError::validation_field(
                "min_frequency must be at least 2",
                "synth.min_frequency",
            ));
        }

        Ok(())
    }
}

/// Configuration construction and I/O methods for [`RefrainConfig`].
impl RefrainConfig {
    /// Validate the entire configuration.
    pub fn validate(&self) -> Result<()> {
        self.lsh.validate()?;
        self.extract.validate()?;
        self.synth.validate()?;
        Ok(())
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RefrainError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}
