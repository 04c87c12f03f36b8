use crate::{DocId, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocId,
    pub text: String,
}

/// Newline-delimited documents. Blank lines are skipped and consume no id;
/// ids run 1..=N in line order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<Document>,
}

impl Corpus {
    pub fn from_text(text: &str) -> Self {
        let docs = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .zip(1..)
            .map(|(line, id)| Document { id, text: line.to_string() })
            .collect();
        Self { docs }
    }

    pub fn from_documents<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let docs = texts
            .into_iter()
            .map(Into::into)
            .filter(|t: &String| !t.trim().is_empty())
            .zip(1..)
            .map(|(text, id)| Document { id, text })
            .collect();
        Self { docs }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
