use crate::error::{Result, SearchError};
use crate::index::{DocId, DocMeta, PostingSet};
use crate::tokenizer::normalize_term;
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionalTree};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info};

/// On-disk format written by this version of the library.
pub const FORMAT_VERSION: u32 = 1;

const POSTINGS_TREE: &str = "postings";
const DOCS_TREE: &str = "docs";

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub created_at: String,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn db(&self) -> PathBuf { self.root.join("postings.sled") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    f.sync_all()?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Which way a batch of term updates moves a document's membership.
#[derive(Clone, Copy, Debug)]
enum Membership {
    Insert,
    Remove,
}

/// Durable term -> posting set mapping backed by a sled database.
///
/// Each term is one record keyed by its normalized bytes; the value is the
/// bincode encoding of the sorted document ids. All updates from one call run
/// in a single transaction and are flushed before the call returns.
pub struct PostingsStore {
    db: sled::Db,
    postings: sled::Tree,
    docs: sled::Tree,
}

impl PostingsStore {
    /// Open (or create) the store under `paths.root`.
    pub fn open(paths: &IndexPaths) -> Result<Self> {
        create_dir_all(&paths.root)?;
        match load_meta(paths) {
            Ok(meta) if meta.version > FORMAT_VERSION => {
                return Err(SearchError::IncompatibleIndex { expected: FORMAT_VERSION, actual: meta.version });
            }
            Ok(_) => {}
            Err(SearchError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                let created_at = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
                save_meta(paths, &MetaFile { version: FORMAT_VERSION, created_at })?;
            }
            Err(e) => return Err(e),
        }
        let db = sled::open(paths.db())?;
        let postings = db.open_tree(POSTINGS_TREE)?;
        let docs = db.open_tree(DOCS_TREE)?;
        info!(root = %paths.root.display(), terms = postings.len(), "opened postings store");
        Ok(Self { db, postings, docs })
    }

    /// Add `doc_id` to the posting set of every token. Returns the distinct
    /// normalized terms touched.
    pub fn add_document<I, S>(&self, doc_id: &DocId, tokens: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.apply(doc_id, distinct_terms(tokens), Membership::Insert)
    }

    /// Remove `doc_id` from the posting set of every token; records left empty
    /// are deleted.
    pub fn remove_document<I, S>(&self, doc_id: &DocId, tokens: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.apply(doc_id, distinct_terms(tokens), Membership::Remove)
    }

    fn apply(&self, doc_id: &DocId, terms: Vec<String>, op: Membership) -> Result<Vec<String>> {
        if terms.is_empty() {
            return Ok(terms);
        }
        let changed = self
            .postings
            .transaction(|tx| {
                let mut changed = 0usize;
                for term in &terms {
                    if update_record(tx, term, doc_id, op)? {
                        changed += 1;
                    }
                }
                Ok::<_, ConflictableTransactionError<SearchError>>(changed)
            })
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => SearchError::Storage(e),
            })?;
        self.db.flush()?;
        debug!(%doc_id, ?op, terms = terms.len(), changed, "committed postings");
        Ok(terms)
    }

    /// Current posting set for `term`, empty when the term was never stored.
    pub fn search(&self, term: &str) -> Result<PostingSet> {
        let key = normalize_term(term);
        match self.postings.get(key.as_bytes())? {
            Some(bytes) => decode_postings(&bytes),
            None => Ok(PostingSet::new()),
        }
    }

    /// Snapshot of every stored term and its posting set.
    pub fn retrieve_all_terms(&self) -> Result<BTreeMap<String, PostingSet>> {
        let mut out = BTreeMap::new();
        for item in self.postings.iter() {
            let (key, value) = item?;
            out.insert(String::from_utf8_lossy(&key).into_owned(), decode_postings(&value)?);
        }
        Ok(out)
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn put_meta(&self, doc_id: &DocId, meta: &DocMeta) -> Result<()> {
        let key = bincode::serialize(doc_id)?;
        let value = bincode::serialize(meta)?;
        self.docs.insert(key, value)?;
        self.db.flush()?;
        Ok(())
    }

    pub fn meta(&self, doc_id: &DocId) -> Result<Option<DocMeta>> {
        let key = bincode::serialize(doc_id)?;
        match self.docs.get(key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn distinct_terms<I, S>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let terms: BTreeSet<String> = tokens
        .into_iter()
        .map(|t| normalize_term(t.as_ref()))
        .filter(|t| !t.is_empty())
        .collect();
    terms.into_iter().collect()
}

fn decode_postings(bytes: &[u8]) -> Result<PostingSet> {
    let ids: Vec<DocId> = bincode::deserialize(bytes)?;
    Ok(ids.into_iter().collect())
}

fn encode_postings(set: &PostingSet) -> std::result::Result<Vec<u8>, bincode::Error> {
    bincode::serialize(&set.iter().collect::<Vec<_>>())
}

/// Read-modify-write of one term record inside a transaction. Returns whether
/// the record changed.
fn update_record(
    tx: &TransactionalTree,
    term: &str,
    doc_id: &DocId,
    op: Membership,
) -> std::result::Result<bool, ConflictableTransactionError<SearchError>> {
    let key = term.as_bytes();
    let mut set = match tx.get(key)? {
        Some(bytes) => decode_postings(&bytes).map_err(ConflictableTransactionError::Abort)?,
        None => PostingSet::new(),
    };
    let changed = match op {
        Membership::Insert => set.insert(doc_id.clone()),
        Membership::Remove => set.remove(doc_id),
    };
    if !changed {
        return Ok(false);
    }
    if set.is_empty() {
        tx.remove(key)?;
    } else {
        let bytes = encode_postings(&set).map_err(|e| ConflictableTransactionError::Abort(e.into()))?;
        tx.insert(key, bytes)?;
    }
    Ok(true)
}
