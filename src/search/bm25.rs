//! Okapi BM25 keyword index (spec §4.3) with fixed k1=1.5, b=0.75.
//!
//! The corpus is persisted with `tantivy` — schema-building idiom grounded
//! on the teacher's `indexes/schema.rs` (`SchemaBuilder`, `TextOptions`,
//! `STORED`/`FAST` field construction) — generalised from a whole-file
//! search schema down to one `(snippet_id, tokens)` document per snippet.
//! Tantivy owns durable storage and gives us the atomic staging-then-swap
//! rebuild (spec §4.3, §5: readers see either the pre- or post-rebuild
//! state); BM25 scoring itself is computed directly from corpus statistics
//! we keep in memory so the k1/b constants are exactly the ones spec.md
//! fixes, rather than tantivy's own internal defaults.
//!
//! The in-memory `Corpus` is only useful if it survives past the
//! `Bm25Index` instance that built it — `open()` reloads a `corpus.json`
//! snapshot written alongside the tantivy directory, swapped atomically
//! the same way the tantivy directory itself is (temp file, then rename),
//! so a fresh instance opened against an already-indexed root scores
//! correctly instead of starting empty.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tantivy::doc;
use tantivy::schema::{Field, Schema, SchemaBuilder, FAST, STORED, STRING, TEXT};
use tantivy::{Index, IndexWriter, TantivyDocument};

use crate::domain::entities::SnippetId;
use crate::error::{KoditError, KoditResult};

const K1: f32 = 1.5;
const B: f32 = 0.75;

struct Bm25Schema {
    schema: Schema,
    snippet_id: Field,
    tokens: Field,
}

fn build_schema() -> Bm25Schema {
    let mut builder = SchemaBuilder::new();
    let snippet_id = builder.add_text_field("snippet_id", STRING | STORED);
    let tokens = builder.add_text_field("tokens", TEXT | STORED);
    let _insertion_order = builder.add_u64_field("insertion_order", FAST | STORED);
    Bm25Schema {
        schema: builder.build(),
        snippet_id,
        tokens,
    }
}

#[derive(Default)]
struct Corpus {
    /// Snippet ids in insertion order; index into this vec is the stable
    /// tie-break order (spec §4.3's "ties broken by snippet insertion
    /// order").
    doc_ids: Vec<SnippetId>,
    doc_lengths: Vec<usize>,
    avg_doc_length: f32,
    /// term -> (doc index, term frequency in that doc)
    postings: HashMap<String, Vec<(usize, u32)>>,
}

/// On-disk form of `Corpus`, persisted alongside the tantivy directory so a
/// freshly opened `Bm25Index` doesn't start out scoring against nothing.
#[derive(Serialize, Deserialize)]
struct CorpusSnapshot {
    doc_ids: Vec<SnippetId>,
    doc_lengths: Vec<usize>,
    avg_doc_length: f32,
    postings: HashMap<String, Vec<(usize, u32)>>,
}

impl From<&Corpus> for CorpusSnapshot {
    fn from(corpus: &Corpus) -> Self {
        Self {
            doc_ids: corpus.doc_ids.clone(),
            doc_lengths: corpus.doc_lengths.clone(),
            avg_doc_length: corpus.avg_doc_length,
            postings: corpus.postings.clone(),
        }
    }
}

impl From<CorpusSnapshot> for Corpus {
    fn from(snapshot: CorpusSnapshot) -> Self {
        Self {
            doc_ids: snapshot.doc_ids,
            doc_lengths: snapshot.doc_lengths,
            avg_doc_length: snapshot.avg_doc_length,
            postings: snapshot.postings,
        }
    }
}

impl Corpus {
    fn document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map(Vec::len).unwrap_or(0)
    }

    fn idf(&self, term: &str) -> f32 {
        let n = self.doc_ids.len() as f32;
        let df = self.document_frequency(term) as f32;
        (((n - df + 0.5) / (df + 0.5)) + 1.0).ln()
    }

    fn score(&self, doc_idx: usize, query_terms: &[String]) -> f32 {
        let doc_len = self.doc_lengths[doc_idx] as f32;
        let mut score = 0.0;
        for term in query_terms {
            let Some(postings) = self.postings.get(term) else {
                continue;
            };
            let Some(&(_, tf)) = postings.iter().find(|(idx, _)| *idx == doc_idx) else {
                continue;
            };
            let tf = tf as f32;
            let idf = self.idf(term);
            let numerator = tf * (K1 + 1.0);
            let denominator = tf + K1 * (1.0 - B + B * (doc_len / self.avg_doc_length.max(1.0)));
            score += idf * (numerator / denominator);
        }
        score
    }
}

pub struct Bm25Index {
    root: PathBuf,
    corpus: RwLock<Corpus>,
}

impl Bm25Index {
    pub fn open(root: impl Into<PathBuf>) -> KoditResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let corpus = load_snapshot(&root).unwrap_or_default();
        Ok(Self {
            root,
            corpus: RwLock::new(corpus),
        })
    }

    /// Atomically rebuilds the corpus from the given (snippet_id, text)
    /// pairs, in insertion order (spec §4.3: "rebuild is atomic — the new
    /// index is written to a staging location then swapped").
    pub fn rebuild(&self, documents: Vec<(SnippetId, String)>) -> KoditResult<()> {
        let staging = self.root.join(".staging");
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }
        std::fs::create_dir_all(&staging)?;

        let Bm25Schema {
            schema,
            snippet_id: snippet_id_field,
            tokens: tokens_field,
        } = build_schema();

        let index = Index::create_in_dir(&staging, schema)
            .map_err(|e| KoditError::Fatal(format!("bm25 index create failed: {e}")))?;
        let mut writer: IndexWriter = index
            .writer(50_000_000)
            .map_err(|e| KoditError::Fatal(format!("bm25 writer failed: {e}")))?;

        let mut corpus = Corpus::default();
        let mut total_len = 0usize;

        for (doc_idx, (snippet_id, text)) in documents.into_iter().enumerate() {
            let tokens = super::tokenize::tokenize(&text);
            let doc_len = tokens.len();
            total_len += doc_len;

            let mut term_freq: HashMap<String, u32> = HashMap::new();
            for token in &tokens {
                *term_freq.entry(token.clone()).or_insert(0) += 1;
            }
            for (term, freq) in term_freq {
                corpus.postings.entry(term).or_default().push((doc_idx, freq));
            }

            corpus.doc_ids.push(snippet_id);
            corpus.doc_lengths.push(doc_len);

            writer
                .add_document(doc!(
                    snippet_id_field => snippet_id.to_hex(),
                    tokens_field => tokens.join(" "),
                ))
                .map_err(|e| KoditError::Fatal(format!("bm25 add_document failed: {e}")))?;
        }

        writer
            .commit()
            .map_err(|e| KoditError::Fatal(format!("bm25 commit failed: {e}")))?;

        corpus.avg_doc_length = if corpus.doc_ids.is_empty() {
            0.0
        } else {
            total_len as f32 / corpus.doc_ids.len() as f32
        };

        // Atomic swap: rename staging over the live directory, then publish
        // the in-memory statistics readers score against.
        let live = self.live_dir();
        if live.exists() {
            std::fs::remove_dir_all(&live)?;
        }
        std::fs::rename(&staging, &live)?;

        save_snapshot(&self.root, &corpus)?;
        *self.corpus.write().expect("bm25 corpus lock poisoned") = corpus;
        Ok(())
    }

    fn live_dir(&self) -> PathBuf {
        self.root.join("live")
    }

    /// Returns up to `top_k` `(snippet_id, score)` pairs, descending score,
    /// ties broken by insertion order (spec §4.3).
    pub fn search(&self, query: &str, top_k: usize) -> Vec<(SnippetId, f32)> {
        let query_terms = super::tokenize::tokenize(query);
        let corpus = self.corpus.read().expect("bm25 corpus lock poisoned");
        if corpus.doc_ids.is_empty() || query_terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = (0..corpus.doc_ids.len())
            .map(|idx| (idx, corpus.score(idx, &query_terms)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(top_k);
        scored
            .into_iter()
            .map(|(idx, score)| (corpus.doc_ids[idx], score))
            .collect()
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.corpus
            .read()
            .expect("bm25 corpus lock poisoned")
            .document_frequency(term)
    }
}

fn snapshot_path(root: &Path) -> PathBuf {
    root.join("corpus.json")
}

fn load_snapshot(root: &Path) -> Option<Corpus> {
    let bytes = std::fs::read(snapshot_path(root)).ok()?;
    let snapshot: CorpusSnapshot = serde_json::from_slice(&bytes).ok()?;
    Some(snapshot.into())
}

/// Atomic temp-file-then-rename write, mirroring the `.staging`/`live`
/// tantivy directory swap so readers never observe a half-written snapshot.
fn save_snapshot(root: &Path, corpus: &Corpus) -> KoditResult<()> {
    let snapshot = CorpusSnapshot::from(corpus);
    let bytes = serde_json::to_vec(&snapshot)?;
    let tmp = root.join("corpus.json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, snapshot_path(root))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(n: u8) -> SnippetId {
        SnippetId([n; 32])
    }

    #[test]
    fn tiny_corpus_ranks_and_ties_by_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let index = Bm25Index::open(dir.path()).unwrap();
        index
            .rebuild(vec![
                (sid(0), "hello world".to_string()),
                (sid(1), "goodbye world".to_string()),
            ])
            .unwrap();

        let hits = index.search("hello", 2);
        assert_eq!(hits[0].0, sid(0));

        let hits = index.search("WORLD", 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, sid(0));
    }

    #[test]
    fn rebuild_replaces_corpus_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let index = Bm25Index::open(dir.path()).unwrap();
        index.rebuild(vec![(sid(0), "alpha".into())]).unwrap();
        index.rebuild(vec![(sid(1), "beta".into())]).unwrap();
        assert!(index.search("alpha", 10).is_empty());
        assert_eq!(index.search("beta", 10)[0].0, sid(1));
    }

    #[test]
    fn reopening_the_same_root_reloads_corpus_statistics() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = Bm25Index::open(dir.path()).unwrap();
            index
                .rebuild(vec![(sid(0), "hello world".into()), (sid(1), "goodbye world".into())])
                .unwrap();
        }

        // A fresh instance against the same root, as every real call site
        // constructs, must see the previously rebuilt corpus.
        let reopened = Bm25Index::open(dir.path()).unwrap();
        let hits = reopened.search("hello", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, sid(0));
    }
}
