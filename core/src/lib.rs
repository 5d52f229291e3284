pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod persist;
pub mod radix;
pub mod ranking;
pub mod tokenizer;

pub use cache::{CacheStats, QueryCache};
pub use config::{IndexConfig, TokenizerKind};
pub use error::{Result, SearchError};
pub use index::{DiskInvertedIndex, DocId, DocMeta, PostingSet, SharedIndex};
pub use radix::RadixTree;
pub use ranking::{RankedEntry, RankingQueue};
