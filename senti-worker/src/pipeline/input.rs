//! Input shape validation
//!
//! Jobs carry either structured documents (`[{"id": .., "document": ..}]`) or
//! a plain list of strings whose identifiers are their 0-based positions.
//! Anything else is rejected before inference starts.

use crate::error::ValidationError;
use crate::types::{Document, DocumentId};
use serde_json::Value;
use std::collections::HashSet;

/// Discriminated job input
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentInput {
    /// Explicit identifiers
    Structured(Vec<Document>),
    /// Positional identifiers
    Plain(Vec<String>),
}

impl DocumentInput {
    /// Classify and validate a decoded `sentiments` value
    ///
    /// The first item decides the shape; every other item must match it.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let items = value.as_array().ok_or_else(|| {
            ValidationError::UnsupportedShape(format!(
                "expected a list of documents, got {}",
                json_type(value)
            ))
        })?;

        match items.first() {
            None => Ok(DocumentInput::Plain(Vec::new())),
            Some(Value::Object(_)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| structured_document(index, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DocumentInput::Structured),
            Some(Value::String(_)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        ValidationError::UnsupportedShape(format!(
                            "item {index} is {} in a list of strings",
                            json_type(item)
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(DocumentInput::Plain),
            Some(other) => Err(ValidationError::UnsupportedShape(format!(
                "list items must be objects or strings, got {}",
                json_type(other)
            ))),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DocumentInput::Structured(documents) => documents.len(),
            DocumentInput::Plain(texts) => texts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize to documents, assigning positional ids to plain input
    pub fn into_documents(self) -> Result<Vec<Document>, ValidationError> {
        match self {
            DocumentInput::Plain(texts) => Ok(texts
                .into_iter()
                .enumerate()
                .map(|(index, text)| Document::new(DocumentId::Int(index as i64), text))
                .collect()),
            DocumentInput::Structured(documents) => {
                let mut seen = HashSet::with_capacity(documents.len());
                for document in &documents {
                    if !seen.insert(&document.id) {
                        return Err(ValidationError::DuplicateId(document.id.clone()));
                    }
                }
                Ok(documents)
            }
        }
    }
}

fn structured_document(index: usize, item: &Value) -> Result<Document, ValidationError> {
    let object = item.as_object().ok_or_else(|| {
        ValidationError::UnsupportedShape(format!(
            "item {index} is {} in a list of objects",
            json_type(item)
        ))
    })?;

    let id = match object.get("id") {
        None => return Err(ValidationError::MissingField { index, field: "id" }),
        Some(Value::String(id)) => DocumentId::Text(id.clone()),
        Some(Value::Number(n)) => n.as_i64().map(DocumentId::Int).ok_or_else(|| {
            ValidationError::InvalidField {
                index,
                field: "id",
                reason: format!("{n} is not an integer"),
            }
        })?,
        Some(other) => {
            return Err(ValidationError::InvalidField {
                index,
                field: "id",
                reason: format!("expected integer or string, got {}", json_type(other)),
            })
        }
    };

    let text = match object.get("document") {
        None => return Err(ValidationError::MissingField { index, field: "document" }),
        Some(Value::String(text)) => text.clone(),
        Some(other) => {
            return Err(ValidationError::InvalidField {
                index,
                field: "document",
                reason: format!("expected string, got {}", json_type(other)),
            })
        }
    };

    Ok(Document { id, text })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
