//! TF, IDF and BM25 scoring over a [`PositionalIndex`].
//!
//! All strategies deduplicate the query, skip terms the index does not know,
//! and return hits ordered by score descending, then by ascending doc id.

use crate::index::PositionalIndex;
use crate::{DocId, ScoredDoc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length normalization strength: 0 disables it, 1 applies it fully.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    Tf,
    Idf,
    Bm25(Bm25Params),
}

impl Strategy {
    pub fn rank<S: AsRef<str>>(&self, query_terms: &[S], index: &PositionalIndex) -> Vec<ScoredDoc> {
        match *self {
            Strategy::Tf => rank_tf(query_terms, index),
            Strategy::Idf => rank_idf(query_terms, index),
            Strategy::Bm25(params) => rank_bm25(query_terms, index, params.k1, params.b),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Tf => "tf",
            Strategy::Idf => "idf",
            Strategy::Bm25(_) => "bm25",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    /// `bm25` parses with default parameters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tf" => Ok(Strategy::Tf),
            "idf" => Ok(Strategy::Idf),
            "bm25" => Ok(Strategy::Bm25(Bm25Params::default())),
            other => Err(format!("unknown ranking strategy '{other}' (expected tf, idf or bm25)")),
        }
    }
}

fn unique_terms<S: AsRef<str>>(query_terms: &[S]) -> BTreeSet<&str> {
    query_terms.iter().map(|t| t.as_ref()).collect()
}

fn into_ranked(scores: BTreeMap<DocId, f64>) -> Vec<ScoredDoc> {
    let mut ranked: Vec<ScoredDoc> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
}

/// Score = total occurrences of the query terms in the document.
pub fn rank_tf<S: AsRef<str>>(query_terms: &[S], index: &PositionalIndex) -> Vec<ScoredDoc> {
    let mut scores: BTreeMap<DocId, f64> = BTreeMap::new();
    for term in unique_terms(query_terms) {
        let Some(postings) = index.postings(term) else { continue };
        for (&doc_id, positions) in postings {
            *scores.entry(doc_id).or_insert(0.0) += positions.len() as f64;
        }
    }
    tracing::trace!(?scores, "tf scores");
    into_ranked(scores)
}

/// Smoothed idf: `ln((N + 1) / (df + 1)) + 1`. Never below 1 when df ≤ N.
pub fn smoothed_idf(n: usize, df: usize) -> f64 {
    ((n as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0
}

/// Score = sum of idf over matching query terms. A term counts once per
/// document no matter how often it occurs there.
pub fn rank_idf<S: AsRef<str>>(query_terms: &[S], index: &PositionalIndex) -> Vec<ScoredDoc> {
    let n = index.doc_count();
    let mut scores: BTreeMap<DocId, f64> = BTreeMap::new();
    for term in unique_terms(query_terms) {
        let Some(postings) = index.postings(term) else { continue };
        let idf = smoothed_idf(n, postings.len());
        tracing::debug!(term, df = postings.len(), idf, "idf");
        for &doc_id in postings.keys() {
            *scores.entry(doc_id).or_insert(0.0) += idf;
        }
    }
    tracing::trace!(?scores, "idf scores");
    into_ranked(scores)
}

/// Robertson–Sparck Jones idf with +1 inside the log: `ln((N - df + 0.5) / (df + 0.5) + 1)`.
pub fn bm25_idf(n: usize, df: usize) -> f64 {
    let (n, df) = (n as f64, df as f64);
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// One term's contribution to a document score. `avgdl == 0` is treated as
/// `dl / avgdl == 0`.
pub fn bm25_term(idf: f64, tf: f64, dl: f64, avgdl: f64, k1: f64, b: f64) -> f64 {
    let length_ratio = if avgdl > 0.0 { dl / avgdl } else { 0.0 };
    idf * (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * length_ratio))
}

pub fn rank_bm25<S: AsRef<str>>(query_terms: &[S], index: &PositionalIndex, k1: f64, b: f64) -> Vec<ScoredDoc> {
    let terms = unique_terms(query_terms);
    if terms.is_empty() {
        return Vec::new();
    }

    let n = index.doc_count();
    let avgdl = index.avg_doc_length();
    tracing::debug!(n, avgdl, k1, b, "bm25 corpus statistics");

    let mut scores: BTreeMap<DocId, f64> = BTreeMap::new();
    for term in terms {
        let Some(postings) = index.postings(term) else { continue };
        let idf = bm25_idf(n, postings.len());
        tracing::debug!(term, df = postings.len(), idf, "bm25 idf");
        for (doc_id, positions) in postings {
            let dl = index.doc_length(*doc_id) as f64;
            let contribution = bm25_term(idf, positions.len() as f64, dl, avgdl, k1, b);
            *scores.entry(*doc_id).or_insert(0.0) += contribution;
        }
    }
    tracing::trace!(?scores, "bm25 scores");
    into_ranked(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Strategy;
    use crate::corpus::Corpus;
    use crate::index::build_index;
    use crate::pipeline::Pipeline;
    use crate::stopwords::StopWords;
    use proptest::prelude::*;

    fn index_of(docs: &[&str]) -> PositionalIndex {
        build_index(&Corpus::from_documents(docs.iter().copied()), &Pipeline::new(StopWords::empty()))
    }

    #[test]
    fn empty_query_and_unknown_terms() {
        let index = index_of(&["alpha beta", "beta gamma"]);
        let empty: [&str; 0] = [];
        assert!(rank_tf(&empty, &index).is_empty());
        assert!(rank_idf(&empty, &index).is_empty());
        assert!(rank_bm25(&empty, &index, 1.2, 0.75).is_empty());
        assert!(rank_tf(&["zeta"], &index).is_empty());
        assert_eq!(rank_idf(&["zeta", "gamma"], &index).len(), 1);
    }

    #[test]
    fn tf_sums_occurrences() {
        let index = index_of(&["red red blue", "red", "blue blue blue"]);
        assert_eq!(rank_tf(&["red", "blue"], &index), vec![(1, 3.0), (3, 3.0), (2, 1.0)]);
    }

    #[test]
    fn duplicate_query_terms_count_once() {
        let index = index_of(&["red red", "blue"]);
        assert_eq!(rank_tf(&["red", "red"], &index), vec![(1, 2.0)]);
    }

    #[test]
    fn idf_ignores_term_frequency() {
        let index = index_of(&["red red red", "red blue"]);
        let ranked = rank_idf(&["red"], &index);
        assert_eq!(ranked, vec![(1, 1.0), (2, 1.0)]);
    }

    #[test]
    fn idf_bounds() {
        // Term in every document → minimum idf of 1.
        assert_eq!(smoothed_idf(5, 5), 1.0);
        // Rarer terms weigh more.
        assert!(smoothed_idf(5, 1) > smoothed_idf(5, 2));
        assert!(smoothed_idf(5, 1) >= smoothed_idf(5, 5));
    }

    #[test]
    fn bm25_guards_zero_avgdl() {
        let score = bm25_term(1.0, 2.0, 0.0, 0.0, 1.2, 0.75);
        assert!(score.is_finite());
        assert!((score - 2.0 * 2.2 / (2.0 + 1.2 * 0.25)).abs() < 1e-12);
    }

    #[test]
    fn bm25_prefers_shorter_documents() {
        let index = index_of(&["needle", "needle hay hay hay hay hay"]);
        let ranked = rank_bm25(&["needle"], &index, 1.2, 0.75);
        assert_eq!(ranked[0].0, 1);
        assert!(ranked[0].1 > ranked[1].1);
    }

    #[test]
    fn bm25_with_b_zero_ignores_length() {
        let index = index_of(&["needle", "needle hay hay hay hay hay"]);
        let ranked = rank_bm25(&["needle"], &index, 1.2, 0.0);
        assert_eq!(ranked[0].1, ranked[1].1);
        assert_eq!(ranked[0].0, 1);
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!("TF".parse::<Strategy>(), Ok(Strategy::Tf));
        assert_eq!("idf".parse::<Strategy>(), Ok(Strategy::Idf));
        assert_eq!("bm25".parse::<Strategy>(), Ok(Strategy::Bm25(Bm25Params::default())));
        assert!("cosine".parse::<Strategy>().is_err());
    }

    #[test]
    fn ranking_is_deterministic() {
        let index = index_of(&["a b c", "b c d", "c d e", "a e", "b b b"]);
        let q = ["b", "c", "e"];
        for strategy in [Strategy::Tf, Strategy::Idf, Strategy::Bm25(Bm25Params::default())] {
            let first = strategy.rank(&q, &index);
            for _ in 0..10 {
                let again = strategy.rank(&q, &index);
                let same = first.len() == again.len()
                    && first.iter().zip(&again).all(|(x, y)| x.0 == y.0 && x.1.to_bits() == y.1.to_bits());
                assert!(same, "{strategy} output changed between runs");
            }
        }
    }

    proptest! {
        #[test]
        fn bm25_saturates_below_idf_times_k1_plus_one(
            tf in 1u32..100_000,
            dl in 1u32..1_000,
            avgdl in 0.5f64..500.0,
            k1 in 0.1f64..3.0,
            b in 0.0f64..1.0,
        ) {
            let idf = 0.8;
            let contribution = bm25_term(idf, tf as f64, dl as f64, avgdl, k1, b);
            prop_assert!(contribution > 0.0);
            prop_assert!(contribution < idf * (k1 + 1.0));
        }

        #[test]
        fn tf_score_is_monotonic_in_frequency(extra in 0usize..20) {
            let mut doc = String::from("x");
            for _ in 0..extra { doc.push_str(" x"); }
            let base = index_of(&[doc.as_str()]);
            doc.push_str(" x");
            let more = index_of(&[doc.as_str()]);
            prop_assert!(rank_tf(&["x"], &more)[0].1 > rank_tf(&["x"], &base)[0].1);
        }
    }
}
