use crate::cache::{CacheStats, QueryCache};
use crate::config::IndexConfig;
use crate::error::Result;
use crate::persist::{IndexPaths, PostingsStore};
use crate::radix::RadixTree;
use crate::ranking::{RankedEntry, RankingQueue};
use crate::tokenizer::{normalize_term, tokenizer_for, Tokenizer};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Caller-supplied document identifier. Numbers order before names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DocId {
    Num(u64),
    Name(String),
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocId::Num(n) => write!(f, "{n}"),
            DocId::Name(s) => f.write_str(s),
        }
    }
}

impl From<u64> for DocId {
    fn from(n: u64) -> Self { DocId::Num(n) }
}

impl From<u32> for DocId {
    fn from(n: u32) -> Self { DocId::Num(n.into()) }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self { DocId::Name(s.to_string()) }
}

impl From<String> for DocId {
    fn from(s: String) -> Self { DocId::Name(s) }
}

/// Documents containing a term, each at most once.
pub type PostingSet = BTreeSet<DocId>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    pub title: String,
    pub url: Option<String>,
}

/// Handle for sharing one index between threads; the mutex serializes all access.
pub type SharedIndex = Arc<Mutex<DiskInvertedIndex>>;

/// Durable inverted index with a read-through LRU cache in front of `search`.
///
/// Writes invalidate the cached entry of every term they touch, so a search
/// after `add_document` always observes the new posting.
pub struct DiskInvertedIndex {
    store: PostingsStore,
    cache: QueryCache<PostingSet>,
    tokenizer: Box<dyn Tokenizer>,
}

impl DiskInvertedIndex {
    pub fn open(config: &IndexConfig) -> Result<Self> {
        let store = PostingsStore::open(&IndexPaths::new(&config.path))?;
        info!(path = %config.path.display(), cache_capacity = config.cache_capacity, tokenizer = ?config.tokenizer, "index ready");
        Ok(Self {
            store,
            cache: QueryCache::new(config.cache_capacity),
            tokenizer: tokenizer_for(config.tokenizer),
        })
    }

    /// Replace the tokenizer used by `index_text` and `query`.
    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn into_shared(self) -> SharedIndex {
        Arc::new(Mutex::new(self))
    }

    pub fn add_document<D, I, S>(&mut self, doc_id: D, tokens: I) -> Result<()>
    where
        D: Into<DocId>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let doc_id = doc_id.into();
        let terms: Vec<String> = tokens.into_iter().map(|t| normalize_term(t.as_ref())).collect();
        let written = self.store.add_document(&doc_id, &terms);
        self.invalidate(&terms);
        written.map(|_| ())
    }

    pub fn remove_document<D, I, S>(&mut self, doc_id: D, tokens: I) -> Result<()>
    where
        D: Into<DocId>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let doc_id = doc_id.into();
        let terms: Vec<String> = tokens.into_iter().map(|t| normalize_term(t.as_ref())).collect();
        let written = self.store.remove_document(&doc_id, &terms);
        self.invalidate(&terms);
        written.map(|_| ())
    }

    /// Tokenize raw text and index it under `doc_id`.
    pub fn index_text<D: Into<DocId>>(&mut self, doc_id: D, text: &str) -> Result<()> {
        let doc_id = doc_id.into();
        let tokens = self.tokenizer.tokenize(text);
        if tokens.is_empty() {
            warn!(%doc_id, "document produced no tokens");
            return Ok(());
        }
        self.add_document(doc_id, tokens)
    }

    fn invalidate(&mut self, terms: &[String]) {
        for term in terms {
            if self.cache.invalidate(term) {
                debug!(%term, "invalidated cached postings");
            }
        }
    }

    /// Posting set for `term`, served from the cache when possible.
    pub fn search(&mut self, term: &str) -> Result<PostingSet> {
        let key = normalize_term(term);
        if let Some(hit) = self.cache.get(&key) {
            debug!(term = %key, "cache hit");
            return Ok(hit);
        }
        let postings = self.store.search(&key)?;
        debug!(term = %key, docs = postings.len(), "cache miss");
        self.cache.insert(key, postings.clone());
        Ok(postings)
    }

    pub fn retrieve_all_terms(&self) -> Result<BTreeMap<String, PostingSet>> {
        self.store.retrieve_all_terms()
    }

    pub fn term_count(&self) -> usize {
        self.store.term_count()
    }

    pub fn put_meta<D: Into<DocId>>(&self, doc_id: D, meta: &DocMeta) -> Result<()> {
        self.store.put_meta(&doc_id.into(), meta)
    }

    pub fn meta<D: Into<DocId>>(&self, doc_id: D) -> Result<Option<DocMeta>> {
        self.store.meta(&doc_id.into())
    }

    /// Rank documents by the fraction of distinct query terms they contain
    /// and return the best `k`.
    pub fn query(&mut self, text: &str, k: usize) -> Result<Vec<RankedEntry>> {
        let terms: BTreeSet<String> = self.tokenizer.tokenize(text).into_iter().collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let mut matched: HashMap<DocId, usize> = HashMap::new();
        for term in &terms {
            for doc in self.search(term)? {
                *matched.entry(doc).or_insert(0) += 1;
            }
        }
        let n = terms.len() as f64;
        let mut ranking = RankingQueue::new();
        ranking.extend(matched.into_iter().map(|(doc, hits)| (hits as f64 / n, doc)));
        Ok(ranking.get_top(k))
    }

    /// Prefix tree over every stored term.
    ///
    /// Terms are stored as the tokenizer produced them, so an index built
    /// with [`crate::TokenizerKind::Analyzed`] suggests stems (`run`, not `running`).
    pub fn suggester(&self) -> Result<RadixTree> {
        Ok(self.store.retrieve_all_terms()?.into_keys().collect())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_ids_order_and_display() {
        let mut ids: Vec<DocId> = vec!["b".into(), 10u64.into(), "a".into(), 2u32.into()];
        ids.sort();
        assert_eq!(ids, vec![DocId::Num(2), DocId::Num(10), DocId::from("a"), DocId::from("b")]);
        assert_eq!(DocId::Num(7).to_string(), "7");
        assert_eq!(DocId::from("doc1").to_string(), "doc1");
    }

    #[test]
    fn doc_id_survives_bincode() {
        let id = DocId::from("doc-9");
        let bytes = bincode::serialize(&id).unwrap();
        assert_eq!(bincode::deserialize::<DocId>(&bytes).unwrap(), id);
    }
}
