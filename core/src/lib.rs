pub mod corpus;
pub mod error;
pub mod handle;
pub mod index;
pub mod normalize;
pub mod persist;
pub mod pipeline;
pub mod rank;
pub mod stemmer;
pub mod stopwords;
pub mod tokenizer;

pub use corpus::{Corpus, Document};
pub use error::{Result, SearchError};
pub use handle::IndexHandle;
pub use index::{build_index, build_index_parallel, PositionalIndex, Postings};
pub use pipeline::{process_text, Pipeline};
pub use rank::{rank_bm25, rank_idf, rank_tf, Bm25Params, Strategy};
pub use stopwords::StopWords;

/// Documents are numbered 1..=N in corpus order.
pub type DocId = u32;
/// 0-based offset into a document's processed term sequence.
pub type Position = u32;
/// A ranked hit: document id and its score.
pub type ScoredDoc = (DocId, f64);
