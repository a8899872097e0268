//! Splits a free-text model reply into a chain-of-thought preamble and a
//! typed decision array.
//!
//! The reply format is "analysis text, then one JSON array". The parser
//! tolerates the usual model formatting defects: prose around the array,
//! code fences, and typographic quotes.

use thiserror::Error;

use crate::decision::Decision;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no decision array found in the response")]
    NoDecisionArray,

    #[error("decision array is unterminated")]
    UnterminatedArray,

    #[error("failed to decode decision array: {message}; json: {json}")]
    Decode { message: String, json: String },
}

/// Everything before the first `[` is the chain of thought. Without any
/// array the whole reply is.
#[must_use]
pub fn extract_cot_trace(response: &str) -> String {
    match response.find('[') {
        Some(start) => response[..start].trim().to_string(),
        None => response.trim().to_string(),
    }
}

/// Extracts and decodes the decision array.
///
/// Returns the trimmed chain of thought alongside the decisions.
///
/// # Errors
/// `NoDecisionArray` when the reply has no `[`, `UnterminatedArray` when the
/// bracket depth never returns to zero, and `Decode` (with the offending
/// substring) when the array is not valid decision JSON.
pub fn parse_decisions(response: &str) -> Result<(String, Vec<Decision>), ParseError> {
    let start = response.find('[').ok_or(ParseError::NoDecisionArray)?;
    let end = find_matching_bracket(response, start).ok_or(ParseError::UnterminatedArray)?;

    let json = normalize_quotes(response[start..=end].trim());

    let decisions: Vec<Decision> =
        serde_json::from_str(&json).map_err(|err| ParseError::Decode {
            message: err.to_string(),
            json,
        })?;

    Ok((extract_cot_trace(response), decisions))
}

/// Scans forward from the `[` at `start`, returning the byte index of the
/// matching `]`.
fn find_matching_bracket(s: &str, start: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

// Models regularly emit typographic quotes that break strict JSON.
fn normalize_quotes(json: &str) -> String {
    json.replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}
