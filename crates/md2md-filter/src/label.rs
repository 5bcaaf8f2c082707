//! Random labels for generated filenames.
//!
//! The generator is seedable so that file naming is reproducible in tests.

use std::fmt;

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::link::extension_for;

/// Source of `NNN-NNNN` labels for unnamed assets.
pub struct LabelGenerator {
    rng: StdRng,
}

impl fmt::Debug for LabelGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelGenerator").finish_non_exhaustive()
    }
}

impl Default for LabelGenerator {
    fn default() -> Self {
        Self::seeded(rand::rng().random())
    }
}

impl LabelGenerator {
    /// Create a generator with a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Next label, three digits and four digits separated by `-`.
    pub fn label(&mut self) -> String {
        let first: u32 = self.rng.random_range(0..1000);
        let second: u32 = self.rng.random_range(0..10000);
        format!("{first:03}-{second:04}")
    }

    /// Generate a filename for content of the given type.
    ///
    /// Images become `image-<label>.<ext>`; anything else becomes
    /// `file-<label>` with the major type as extension when known.
    pub fn filename(&mut self, content_type: Option<&str>) -> String {
        let label = self.label();
        match content_type {
            Some(ct) if ct.starts_with("image/") => {
                format!("image-{label}.{}", extension_for(ct))
            }
            Some(ct) if !ct.is_empty() => {
                let major = ct.split('/').next().unwrap_or(ct);
                format!("file-{label}.{major}")
            }
            _ => format!("file-{label}"),
        }
    }
}
