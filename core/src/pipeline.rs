use crate::normalize::normalize;
use crate::stemmer::stem;
use crate::stopwords::StopWords;
use crate::tokenizer::tokenize;

/// Normalize → tokenize → drop stopwords → stem. The same instance must be
/// used for documents and queries: terms match only by stemmed-string equality.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stopwords: StopWords,
}

impl Pipeline {
    pub fn new(stopwords: StopWords) -> Self {
        Self { stopwords }
    }

    pub fn stopwords(&self) -> &StopWords {
        &self.stopwords
    }

    pub fn process(&self, text: &str) -> Vec<String> {
        process_text(text, &self.stopwords)
    }
}

/// Stopword matching happens on unstemmed tokens.
pub fn process_text(text: &str, stopwords: &StopWords) -> Vec<String> {
    let normalized = normalize(text);
    let tokens = stopwords.filter(tokenize(&normalized));
    let terms: Vec<String> = tokens.iter().map(|t| stem(t)).collect();
    tracing::trace!(?terms, "processed text");
    terms
}
