use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Default number of memoized term lookups.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Which tokenizer `index_text`/`query` run over raw text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    /// Split on whitespace and lower-case.
    #[default]
    Whitespace,
    /// NFKC, stopword removal and English stemming.
    Analyzed,
}

/// Settings for opening a `DiskInvertedIndex`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub path: PathBuf,
    pub cache_capacity: usize,
    pub tokenizer: TokenizerKind,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./index"),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            tokenizer: TokenizerKind::Whitespace,
        }
    }
}

impl IndexConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf(), ..Self::default() }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_tokenizer(mut self, kind: TokenizerKind) -> Self {
        self.tokenizer = kind;
        self
    }

    /// Load a JSON config; absent fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
