//! Positional inverted index: term → document → ascending positions.

use crate::corpus::{Corpus, Document};
use crate::error::SearchError;
use crate::pipeline::Pipeline;
use crate::{DocId, Position, Result};
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Positions of one term inside each document that contains it.
pub type Postings = BTreeMap<DocId, Vec<Position>>;

/// Immutable once built. Ordered maps keep iteration, serialization and
/// floating-point accumulation order stable across runs.
///
/// Document lengths and avgdl are computed once when the index is sealed,
/// so ranking never walks postings it does not match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionalIndex {
    terms: BTreeMap<String, Postings>,
    doc_lengths: BTreeMap<DocId, usize>,
    avgdl: f64,
}

/// Serialized as the bare `{term: {doc_id: [positions]}}` map.
impl Serialize for PositionalIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.terms.serialize(serializer)
    }
}

impl PositionalIndex {
    pub fn new() -> Self { Self::default() }

    /// Build from raw term → postings data, checking every posting invariant.
    pub fn from_terms(terms: BTreeMap<String, Postings>) -> Result<Self> {
        let doc_lengths = count_lengths(&terms);
        let index = Self { terms, doc_lengths, avgdl: 0.0 }.seal();
        index.validate()?;
        Ok(index)
    }

    fn seal(mut self) -> Self {
        self.avgdl = average(&self.doc_lengths);
        self
    }

    fn add_document(&mut self, doc_id: DocId, terms: Vec<String>) {
        if !terms.is_empty() {
            self.doc_lengths.insert(doc_id, terms.len());
        }
        for (pos, term) in terms.into_iter().enumerate() {
            self.terms
                .entry(term)
                .or_default()
                .entry(doc_id)
                .or_default()
                .push(pos as Position);
        }
    }

    /// Union per-term document maps. Each document belongs to exactly one
    /// side, so no positions collide.
    fn merge(mut self, other: Self) -> Self {
        for (term, postings) in other.terms {
            self.terms.entry(term).or_default().extend(postings);
        }
        self.doc_lengths.extend(other.doc_lengths);
        self
    }

    pub fn postings(&self, term: &str) -> Option<&Postings> {
        self.terms.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &Postings)> {
        self.terms.iter().map(|(t, p)| (t.as_str(), p))
    }

    pub fn term_count(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    /// Number of documents containing `term`.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.terms.get(term).map_or(0, BTreeMap::len)
    }

    /// dl per document: the total number of indexed positions across all terms.
    pub fn doc_lengths(&self) -> &BTreeMap<DocId, usize> {
        &self.doc_lengths
    }

    /// dl of one document; 0 when it has no indexed terms.
    pub fn doc_length(&self, doc_id: DocId) -> usize {
        self.doc_lengths.get(&doc_id).copied().unwrap_or(0)
    }

    /// N: distinct document ids present anywhere in the index.
    pub fn doc_count(&self) -> usize {
        self.doc_lengths.len()
    }

    /// avgdl, or 0 for an empty index.
    pub fn avg_doc_length(&self) -> f64 {
        self.avgdl
    }

    /// Documents where `terms` occur at consecutive positions, in order.
    pub fn phrase_docs(&self, terms: &[String]) -> Vec<DocId> {
        let Some((first, rest)) = terms.split_first() else {
            return Vec::new();
        };
        let Some(anchor) = self.terms.get(first) else {
            return Vec::new();
        };
        let mut rest_postings = Vec::with_capacity(rest.len());
        for term in rest {
            match self.terms.get(term) {
                Some(p) => rest_postings.push(p),
                None => return Vec::new(),
            }
        }
        anchor
            .iter()
            .filter(|(doc_id, starts)| {
                starts.iter().any(|&start| {
                    rest_postings.iter().enumerate().all(|(offset, postings)| {
                        let want = start + offset as Position + 1;
                        postings
                            .get(*doc_id)
                            .is_some_and(|positions| positions.binary_search(&want).is_ok())
                    })
                })
            })
            .map(|(&doc_id, _)| doc_id)
            .collect()
    }

    /// Check the structural invariants: ids ≥ 1, non-empty strictly increasing
    /// postings, and per document every position is distinct and below dl.
    pub fn validate(&self) -> Result<()> {
        for (term, postings) in &self.terms {
            for (&doc_id, positions) in postings {
                if doc_id == 0 {
                    return Err(SearchError::malformed(term, doc_id, "document ids start at 1"));
                }
                if positions.is_empty() {
                    return Err(SearchError::malformed(term, doc_id, "empty posting"));
                }
                if positions.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(SearchError::malformed(term, doc_id, "positions not strictly increasing"));
                }
            }
        }

        let mut seen: BTreeMap<DocId, Vec<bool>> =
            self.doc_lengths.iter().map(|(&doc_id, &dl)| (doc_id, vec![false; dl])).collect();
        for (term, postings) in &self.terms {
            for (doc_id, positions) in postings {
                let Some(slots) = seen.get_mut(doc_id) else { continue };
                let dl = slots.len();
                for &pos in positions {
                    match slots.get_mut(pos as usize) {
                        Some(slot) if !*slot => *slot = true,
                        Some(_) => {
                            return Err(SearchError::malformed(term, *doc_id, format!("position {pos} claimed twice")))
                        }
                        None => {
                            return Err(SearchError::malformed(term, *doc_id, format!("position {pos} beyond document length {dl}")))
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Recompute dl for every document by walking all postings.
pub fn count_lengths(terms: &BTreeMap<String, Postings>) -> BTreeMap<DocId, usize> {
    let mut lengths = BTreeMap::new();
    for postings in terms.values() {
        for (&doc_id, positions) in postings {
            *lengths.entry(doc_id).or_insert(0) += positions.len();
        }
    }
    lengths
}

fn average(lengths: &BTreeMap<DocId, usize>) -> f64 {
    if lengths.is_empty() {
        return 0.0;
    }
    lengths.values().sum::<usize>() as f64 / lengths.len() as f64
}

fn index_documents<'a, I>(docs: I, pipeline: &Pipeline) -> PositionalIndex
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut index = PositionalIndex::new();
    for doc in docs {
        let terms = pipeline.process(&doc.text);
        tracing::trace!(doc_id = doc.id, terms = terms.len(), "indexed document");
        index.add_document(doc.id, terms);
    }
    index
}

pub fn build_index(corpus: &Corpus, pipeline: &Pipeline) -> PositionalIndex {
    let index = index_documents(corpus.documents(), pipeline).seal();
    tracing::debug!(docs = corpus.len(), terms = index.term_count(), "built positional index");
    index
}

/// Same result as [`build_index`]; documents are sharded across the rayon
/// pool and the partial indexes merged.
pub fn build_index_parallel(corpus: &Corpus, pipeline: &Pipeline) -> PositionalIndex {
    let shard_size = (corpus.len() / rayon::current_num_threads().max(1)).max(1);
    let index = corpus
        .documents()
        .par_chunks(shard_size)
        .map(|shard| index_documents(shard, pipeline))
        .reduce(PositionalIndex::new, PositionalIndex::merge)
        .seal();
    tracing::debug!(docs = corpus.len(), terms = index.term_count(), shard_size, "built positional index in parallel");
    index
}
