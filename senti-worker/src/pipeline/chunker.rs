//! Word-budgeted batching
//!
//! Splits documents into consecutive chunks whose whitespace word count stays
//! within `max_words`. A document that alone exceeds the budget still gets a
//! chunk of its own, so every document lands in exactly one chunk.

use crate::types::Document;

/// Ordered, non-empty group of documents scored in one inference call
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    documents: Vec<Document>,
    word_count: usize,
}

impl Chunk {
    /// Chunk holding exactly one document
    pub fn single(document: Document) -> Self {
        let word_count = document.word_count();
        Self {
            documents: vec![document],
            word_count,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn texts(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.text.as_str()).collect()
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}

/// Partition `documents` into word-budgeted chunks, preserving order
pub fn chunk_documents(documents: Vec<Document>, max_words: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current: Vec<Document> = Vec::new();
    let mut current_words = 0usize;

    for document in documents {
        let words = document.word_count();
        if !current.is_empty() && current_words + words > max_words {
            chunks.push(Chunk {
                documents: std::mem::take(&mut current),
                word_count: current_words,
            });
            current_words = 0;
        }
        current.push(document);
        current_words += words;
    }

    if !current.is_empty() {
        chunks.push(Chunk {
            documents: current,
            word_count: current_words,
        });
    }

    chunks
}
