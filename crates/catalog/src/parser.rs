//! Parser for catalog export files.
//!
//! Two layouts are accepted:
//! - a JSON array of artwork documents
//! - JSON lines, one artwork document per line
//!
//! Documents come from a document-store export, so field names and id
//! encodings vary: `_id` may be a string, a number, or `{"$oid": "..."}`;
//! the artist may be stored as `artist` or `author`; images as a single
//! `url` or an `image_urls` list.

use crate::error::{CatalogError, Result};
use crate::types::Artwork;
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Parse a catalog file into artworks, in file order.
pub fn parse_catalog_file(path: &Path) -> Result<Vec<Artwork>> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CatalogError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => CatalogError::IoError(e),
    })?;

    parse_catalog_str(&content, &path.display().to_string())
}

/// Parse catalog text. `file` is only used in error messages.
pub fn parse_catalog_str(content: &str, file: &str) -> Result<Vec<Artwork>> {
    let documents = split_documents(content, file)?;

    // Normalisation is independent per document
    documents
        .into_par_iter()
        .map(|(position, value)| {
            parse_document(value).map_err(|reason| CatalogError::ParseError {
                file: file.to_string(),
                position,
                reason,
            })
        })
        .collect()
}

/// Split the raw text into (1-based position, JSON value) pairs
fn split_documents(content: &str, file: &str) -> Result<Vec<(usize, Value)>> {
    let trimmed = content.trim_start();

    if trimmed.starts_with('[') {
        let values: Vec<Value> =
            serde_json::from_str(trimmed).map_err(|e| CatalogError::ParseError {
                file: file.to_string(),
                position: 0,
                reason: e.to_string(),
            })?;
        return Ok(values.into_iter().enumerate().map(|(i, v)| (i + 1, v)).collect());
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map(|value| (i + 1, value))
                .map_err(|e| CatalogError::ParseError {
                    file: file.to_string(),
                    position: i + 1,
                    reason: e.to_string(),
                })
        })
        .collect()
}

/// Normalise a document store key to its string form.
///
/// Accepts plain strings, numbers, and extended-JSON object ids.
pub fn normalize_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("$oid").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn parse_document(value: Value) -> std::result::Result<Artwork, String> {
    let Value::Object(doc) = value else {
        return Err("document is not a JSON object".to_string());
    };

    let id = doc
        .get("_id")
        .or_else(|| doc.get("id"))
        .and_then(normalize_key)
        .ok_or("missing or invalid _id")?;

    let title = string_field(&doc, &["title"]).ok_or("missing title")?;
    let artist = string_field(&doc, &["artist", "author"]).ok_or("missing artist")?;

    let mut image_urls: Vec<String> = match doc.get("image_urls") {
        Some(Value::Array(urls)) => urls
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    if let Some(url) = string_field(&doc, &["url", "image_url"]) {
        if !image_urls.contains(&url) {
            image_urls.insert(0, url);
        }
    }
    if image_urls.is_empty() {
        return Err(format!("artwork {id} has no image location"));
    }

    let year = match doc.get("year") {
        Some(Value::Number(n)) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };

    Ok(Artwork {
        id,
        title,
        artist,
        image_urls,
        style: string_field(&doc, &["style"]),
        genre: string_field(&doc, &["genre"]),
        year,
        external_id: doc.get("external_id").and_then(normalize_key),
    })
}

fn string_field(doc: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| doc.get(*name))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
