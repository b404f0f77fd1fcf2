// Model name resolution
// Maps loosely formatted user input onto the canonical index names currently loaded


use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Modelo '{normalized}' no encontrado. Modelos disponibles: {available:?}")]
    ModelNotFound {
        query: String,
        normalized: String,
        available: Vec<String>,
    },
}

/// A model name prepared for display in a selection list
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModelOption {
    pub value: String,
    pub label: String,
}

fn is_separator(c: char) -> bool {
    c == '_' || c == '-' || c.is_whitespace()
}

fn collapse(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .chars()
        .filter(|c| !is_separator(*c))
        .collect()
}

/// Reduce a model name to its comparison key.
///
/// Uppercases, drops `_`, `-` and whitespace, then strips every leading occurrence of the
/// brand prefix. Applying it twice gives the same key as applying it once.
#[inline]
pub fn normalize_model_name(raw: &str, brand_prefix: &str) -> String {
    let prefix = collapse(brand_prefix);
    let mut key = collapse(raw);

    if !prefix.is_empty() {
        while let Some(rest) = key.strip_prefix(prefix.as_str()) {
            key = rest.to_string();
        }
    }

    key
}

/// Find the canonical name among `candidates` whose key matches `raw`.
///
/// Candidates are compared in the order given; when several collapse to the same key the first
/// one wins.
#[inline]
pub fn resolve<S: AsRef<str>>(
    raw: &str,
    candidates: &[S],
    brand_prefix: &str,
) -> Result<String, ResolveError> {
    let normalized = normalize_model_name(raw, brand_prefix);

    let mut matches = candidates
        .iter()
        .map(|candidate| candidate.as_ref())
        .filter(|candidate| {
            !normalized.is_empty() && normalize_model_name(candidate, brand_prefix) == normalized
        });

    match matches.next() {
        Some(found) => {
            let shadowed: Vec<&str> = matches.collect();
            if !shadowed.is_empty() {
                warn!(
                    "Model query '{}' is ambiguous; using '{}' over {:?}",
                    raw, found, shadowed
                );
            }
            debug!("Resolved model '{}' to '{}'", raw, found);
            Ok(found.to_string())
        }
        None => Err(ResolveError::ModelNotFound {
            query: raw.to_string(),
            normalized,
            available: candidates.iter().map(|c| c.as_ref().to_string()).collect(),
        }),
    }
}

/// Build `{value, label}` pairs for a model picker
#[inline]
pub fn display_options<S: AsRef<str>>(names: &[S], brand_label: &str) -> Vec<ModelOption> {
    names
        .iter()
        .map(|name| {
            let value = name.as_ref().to_uppercase().replace('_', " ").trim().to_string();
            let label = format!("{} {}", brand_label, value).trim().to_string();
            ModelOption { value, label }
        })
        .collect()
}
