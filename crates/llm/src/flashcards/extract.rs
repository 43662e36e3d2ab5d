//! Locate, repair, parse, and filter flashcards out of free-form model output.

use std::sync::LazyLock;

use cardsmith_core::Flashcard;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::repair::repair;

/// First `[` … `{` … `}` … `]` span, greedy so nested objects stay inside.
static ARRAY_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").expect("array span pattern is valid"));

/// Closed reasoning blocks emitted by reasoning models before the answer.
static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("think block pattern is valid"));

const THINK_CLOSE: &str = "</think>";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("no JSON array of objects found in response")]
    NoJsonArray,
    #[error("located array is not valid JSON: {0}")]
    MalformedJson(String),
}

/// Cards accepted from one response plus the count of rejected elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub cards: Vec<Flashcard>,
    pub discarded: usize,
}

/// Drop reasoning blocks. Some models omit the opening tag, so anything up to
/// a stray closing tag is dropped as well.
fn strip_reasoning(response: &str) -> std::borrow::Cow<'_, str> {
    let stripped = THINK_BLOCK.replace_all(response, "");
    match stripped.rfind(THINK_CLOSE) {
        Some(pos) => std::borrow::Cow::Owned(stripped[pos + THINK_CLOSE.len()..].to_string()),
        None => stripped,
    }
}

/// Find the JSON-array-shaped span in `text`.
pub fn locate_array(text: &str) -> Option<&str> {
    ARRAY_SPAN.find(text).map(|m| m.as_str())
}

/// Keep elements that are well-formed flashcards; count the rest.
pub fn filter_candidates(values: &[Value]) -> Extraction {
    let cards: Vec<Flashcard> = values.iter().filter_map(Flashcard::from_value).collect();
    Extraction {
        discarded: values.len() - cards.len(),
        cards,
    }
}

/// Parse the repaired span as one array. The greedy span can run past the
/// first array into later prose or example arrays, so on failure the first
/// complete array at the start of the span is taken instead.
fn parse_array(repaired: &str) -> Result<Vec<Value>, ExtractError> {
    let whole_err = match serde_json::from_str(repaired) {
        Ok(values) => return Ok(values),
        Err(e) => e,
    };
    match serde_json::Deserializer::from_str(repaired)
        .into_iter::<Vec<Value>>()
        .next()
    {
        Some(Ok(values)) => {
            debug!("Parsed leading array, ignoring trailing text in span");
            Ok(values)
        }
        _ => Err(ExtractError::MalformedJson(whole_err.to_string())),
    }
}

/// Locate → repair → parse → filter, reporting why nothing usable was found.
pub fn try_extract(response: &str) -> Result<Extraction, ExtractError> {
    let text = strip_reasoning(response);
    let span = locate_array(&text).ok_or(ExtractError::NoJsonArray)?;
    let values = parse_array(&repair(span))?;

    let extraction = filter_candidates(&values);
    if extraction.discarded > 0 {
        debug!(
            kept = extraction.cards.len(),
            discarded = extraction.discarded,
            "Dropped malformed flashcard candidates"
        );
    }
    Ok(extraction)
}

/// Infallible form: any failure is logged as a warning and yields no cards.
pub fn extract(response: &str) -> Vec<Flashcard> {
    match try_extract(response) {
        Ok(extraction) => extraction.cards,
        Err(e) => {
            warn!(error = %e, "No flashcards extracted from model response");
            Vec::new()
        }
    }
}
