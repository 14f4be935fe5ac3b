//! Random URL segments gating a record's obfuscated paths
//!
//! Segments are a low-security gate: anyone holding the full URL gets in.
//! They are generated once per upload and frozen.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Five path tokens bound to one record id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UrlSegments {
    pub param1: String,
    pub param2: String,
    pub param3: String,
    pub param4: String,
    pub param5: String,
}

impl UrlSegments {
    /// Draw a fresh set of segments
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Draw segments from the supplied generator
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let letters: String = (0..7)
            .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
            .collect();

        Self {
            param1: rng.gen_range(100..=999).to_string(),
            param2: letters,
            param3: rng.gen_range(1..=10).to_string(),
            param4: rng.gen_range(100..=999).to_string(),
            param5: rng.gen_range(10..=99).to_string(),
        }
    }

    pub fn new(
        param1: impl Into<String>,
        param2: impl Into<String>,
        param3: impl Into<String>,
        param4: impl Into<String>,
        param5: impl Into<String>,
    ) -> Self {
        Self {
            param1: param1.into(),
            param2: param2.into(),
            param3: param3.into(),
            param4: param4.into(),
            param5: param5.into(),
        }
    }

    /// Component-wise string equality
    pub fn matches(&self, other: &UrlSegments) -> bool {
        self == other
    }

    pub fn as_array(&self) -> [&str; 5] {
        [
            &self.param1,
            &self.param2,
            &self.param3,
            &self.param4,
            &self.param5,
        ]
    }

    /// Segments joined with `/`, no leading or trailing slash
    pub fn as_path(&self) -> String {
        self.as_array().join("/")
    }
}
