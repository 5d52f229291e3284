use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use search_core::{DiskInvertedIndex, DocId, DocMeta, IndexConfig, TokenizerKind};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Document ids in input files may be JSON numbers or strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(u64),
    Name(String),
}

impl From<RawId> for DocId {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Num(n) => DocId::Num(n),
            RawId::Name(s) => DocId::Name(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: RawId,
    body: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
struct Hit<'a> {
    doc_id: String,
    score: f64,
    title: Option<&'a str>,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a persistent inverted index", long_about = None)]
struct Cli {
    #[command(flatten)]
    index: IndexArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexArgs {
    /// JSON config file; flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Index directory path
    #[arg(long, global = true)]
    index: Option<PathBuf>,
    /// Number of term lookups kept in the query cache
    #[arg(long, global = true)]
    cache_capacity: Option<usize>,
    /// Use stemming/stopword analysis instead of plain whitespace splitting
    #[arg(long, global = true, default_value_t = false)]
    analyzed: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest JSON/JSONL documents from a file or directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
    },
    /// Print the documents containing a term
    Lookup {
        #[arg(long)]
        term: String,
    },
    /// Print stored terms starting with a prefix (stemmed forms for --analyzed indexes)
    Suggest {
        #[arg(long)]
        prefix: String,
    },
    /// Rank documents against a free-text query
    Query {
        #[arg(long)]
        q: String,
        #[arg(short, long, default_value_t = 10)]
        k: usize,
    },
    /// Dump every term and its postings as JSON
    Terms,
}

impl IndexArgs {
    fn resolve(&self) -> Result<IndexConfig> {
        let mut config = match &self.config {
            Some(path) => IndexConfig::from_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => IndexConfig::default(),
        };
        if let Some(path) = &self.index {
            config.path = path.clone();
        }
        if let Some(capacity) = self.cache_capacity {
            config = config.with_cache_capacity(capacity);
        }
        if self.analyzed {
            config = config.with_tokenizer(TokenizerKind::Analyzed);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let config = cli.index.resolve()?;
    let mut index = DiskInvertedIndex::open(&config)
        .with_context(|| format!("opening index at {}", config.path.display()))?;

    match cli.command {
        Commands::Build { input } => build_index(&mut index, &input),
        Commands::Lookup { term } => {
            let ids: Vec<String> = index.search(&term)?.iter().map(|d| d.to_string()).collect();
            println!("{}", serde_json::to_string(&ids)?);
            Ok(())
        }
        Commands::Suggest { prefix } => {
            for word in index.suggester()?.autocomplete(&prefix) {
                println!("{word}");
            }
            Ok(())
        }
        Commands::Query { q, k } => {
            for entry in index.query(&q, k)? {
                let meta = index.meta(entry.doc.clone())?;
                let hit = Hit {
                    doc_id: entry.doc.to_string(),
                    score: entry.score,
                    title: meta.as_ref().map(|m| m.title.as_str()),
                };
                println!("{}", serde_json::to_string(&hit)?);
            }
            Ok(())
        }
        Commands::Terms => {
            let terms: Vec<(String, Vec<String>)> = index
                .retrieve_all_terms()?
                .into_iter()
                .map(|(term, ids)| (term, ids.iter().map(|d| d.to_string()).collect()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&terms)?);
            Ok(())
        }
    }
}

fn build_index(index: &mut DiskInvertedIndex, input: &Path) -> Result<()> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        anyhow::bail!("input {} does not exist", input.display());
    }
    files.sort();

    let mut ingested = 0usize;
    for file in files {
        let docs = if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file)?
        } else {
            read_json(&file)?
        };
        for doc in docs {
            ingest_doc(index, doc)?;
            ingested += 1;
        }
    }
    tracing::info!(ingested, terms = index.term_count(), "index build complete");
    Ok(())
}

fn read_jsonl(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file)?);
    let mut docs = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        docs.push(doc);
    }
    Ok(docs)
}

fn read_json(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    parse_json_docs(json).with_context(|| file.display().to_string())
}

fn parse_json_docs(json: serde_json::Value) -> Result<Vec<InputDoc>> {
    match json {
        serde_json::Value::Array(arr) => {
            Ok(arr.into_iter().map(serde_json::from_value).collect::<std::result::Result<Vec<InputDoc>, _>>()?)
        }
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(json)?]),
        _ => Ok(Vec::new()),
    }
}

fn ingest_doc(index: &mut DiskInvertedIndex, doc: InputDoc) -> Result<()> {
    let doc_id = DocId::from(doc.id);
    index.index_text(doc_id.clone(), &doc.body)?;
    if doc.title.is_some() || doc.url.is_some() {
        let meta = DocMeta { title: doc.title.unwrap_or_default(), url: doc.url };
        index.put_meta(doc_id, &meta)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_single_object_and_arrays() {
        let one = parse_json_docs(json!({"id": "a", "body": "hello"})).unwrap();
        assert_eq!(one.len(), 1);
        let numeric = parse_json_docs(json!({"id": 1, "body": "x"})).unwrap();
        assert_eq!(numeric[0].id, RawId::Num(1));
        let many = parse_json_docs(json!([
            {"id": "a", "body": "x", "title": "A"},
            {"id": "b", "body": "y", "url": "http://b"}
        ]))
        .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[0].title.as_deref(), Some("A"));
        assert!(parse_json_docs(json!(42)).unwrap().is_empty());
    }

    #[test]
    fn numeric_and_string_ids() {
        let docs = parse_json_docs(json!([
            {"id": 1, "body": "x"},
            {"id": "doc-2", "body": "y"}
        ]))
        .unwrap();
        assert_eq!(DocId::from(docs[0].id.clone()), DocId::Num(1));
        assert_eq!(DocId::from(docs[1].id.clone()), DocId::from("doc-2"));
        assert!(parse_json_docs(json!({"id": -3, "body": "z"})).is_err());
    }

    #[test]
    fn suggest_help_mentions_stemming() {
        use clap::CommandFactory;
        let cmd = Cli::command();
        cmd.clone().debug_assert();
        let about = cmd.find_subcommand("suggest").and_then(|c| c.get_about()).unwrap().to_string();
        assert!(about.contains("stemmed"));
    }

    #[test]
    fn build_ingests_jsonl_directory() {
        let input = tempfile::tempdir().unwrap();
        std::fs::write(
            input.path().join("docs.jsonl"),
            "{\"id\":\"1\",\"body\":\"search engines\",\"title\":\"One\"}\n\n{\"id\":2,\"body\":\"search trees\"}\n",
        )
        .unwrap();
        let out = tempfile::tempdir().unwrap();
        let mut index = DiskInvertedIndex::open(&IndexConfig::new(out.path())).unwrap();
        build_index(&mut index, input.path()).unwrap();
        assert_eq!(index.search("search").unwrap().len(), 2);
        assert_eq!(index.meta("1").unwrap().unwrap().title, "One");
        assert!(index.meta(2u64).unwrap().is_none());
        assert_eq!(index.search("trees").unwrap(), [DocId::Num(2)].into_iter().collect());
    }
}
