//! Recovery of the recommendations array from free-form model output.
//!
//! Model output is rarely guaranteed to be strict JSON. Extraction runs as a
//! fixed sequence of tiers, each a pure function, each only attempted when the
//! previous one failed:
//!
//! 1. [`normalize`] cleans the text and isolates the JSON object span
//! 2. [`parse_direct`] is a strict parse of that span
//! 3. [`repair_and_parse`] fixes single quotes, bare keys, trailing commas and
//!    stray backslashes, then parses strictly again
//! 4. [`scrape_fields`] pulls `movieId`/`title`/`explanation` out of each
//!    object fragment with patterns
//!
//! Whatever tier succeeds, [`validate_shape`] turns the value into typed
//! [`RecommendationCandidate`]s.

use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

use crate::models::RecommendationCandidate;

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:json)?").expect("valid fence pattern"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid trailing comma pattern"));
static BARE_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*:)").expect("valid bare key pattern")
});

static RECOMMENDATIONS_ARRAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)["']?recommendations["']?\s*:\s*\[(.*)\]"#)
        .expect("valid recommendations pattern")
});
static OBJECT_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\s*["']?[A-Za-z_][A-Za-z0-9_]*["']?\s*:"#).expect("valid object start pattern")
});
static MOVIE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?movieId["']?\s*:\s*["']?(\d+)"#).expect("valid movieId pattern")
});
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| string_field_pattern("title"));
static EXPLANATION_RE: LazyLock<Regex> = LazyLock::new(|| string_field_pattern("explanation"));

fn string_field_pattern(field: &str) -> Regex {
    Regex::new(&format!(
        r#"["']?{field}["']?\s*:\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')"#
    ))
    .expect("valid string field pattern")
}

/// Why extraction gave up
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("No JSON object found in response")]
    NoJsonObject,

    #[error("Invalid recommendations format: {0}")]
    InvalidShape(String),

    #[error("Unparseable response: {0}")]
    Unparseable(String),
}

/// Runs every tier in order and returns the well-formed entries
pub fn extract_recommendations(raw: &str) -> Result<Vec<RecommendationCandidate>, ExtractError> {
    let span = normalize(raw)?;

    let value = match parse_direct(&span) {
        Ok(value) => value,
        Err(direct_err) => {
            tracing::debug!(error = %direct_err, "Direct parse failed, attempting repair");
            match repair_and_parse(&span) {
                Ok(value) => value,
                Err(repair_err) => {
                    tracing::warn!(
                        error = %repair_err,
                        "Repaired parse failed, falling back to field scrape"
                    );
                    scrape_fields(&span)?
                }
            }
        }
    };

    validate_shape(&value)
}

/// Tier 1: strip fences and noise, quote bare keys, cut out the JSON object
pub fn normalize(raw: &str) -> Result<String, ExtractError> {
    let text = CODE_FENCE_RE.replace_all(raw, "");
    let text = text.replace(['\r', '\n', '\t'], " ");

    // Typographic quotes inside string values are content
    let text = rewrite_outside_strings(&text, |segment| {
        segment
            .replace(['\u{2018}', '\u{2019}'], "'")
            .replace(['\u{201C}', '\u{201D}'], "\"")
    });

    let text = rewrite_outside_strings(&text, |segment| {
        let segment = WHITESPACE_RE.replace_all(segment, " ").replace('*', "");
        let segment = TRAILING_COMMA_RE.replace_all(&segment, "$1");
        BARE_KEY_RE
            .replace_all(&segment, "${1}\"${2}\"${3}")
            .into_owned()
    });

    json_object_span(text.trim())
        .map(str::to_string)
        .ok_or(ExtractError::NoJsonObject)
}

/// Tier 2: strict parse
pub fn parse_direct(span: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(span)
}

/// Tier 3: second cleanup pass, then strict parse
pub fn repair_and_parse(span: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(&repair(span))
}

fn repair(span: &str) -> String {
    let text = convert_single_quoted_strings(span);
    let text = rewrite_outside_strings(&text, |segment| {
        let segment = BARE_KEY_RE.replace_all(segment, "${1}\"${2}\"${3}");
        TRAILING_COMMA_RE.replace_all(&segment, "$1").into_owned()
    });
    neutralize_backslashes(&text)
}

/// Tier 4: pattern-match each object fragment of the recommendations array
pub fn scrape_fields(span: &str) -> Result<Value, ExtractError> {
    let array = RECOMMENDATIONS_ARRAY_RE
        .captures(span)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| {
            ExtractError::Unparseable("no recommendations array could be located".to_string())
        })?;

    let entries: Vec<Value> = object_fragments(array.as_str())
        .into_iter()
        .filter_map(|fragment| {
            let movie_id = MOVIE_ID_RE
                .captures(fragment)
                .and_then(|caps| caps[1].parse::<i64>().ok())?;
            let title = capture_string(&TITLE_RE, fragment)?;
            let explanation = capture_string(&EXPLANATION_RE, fragment)?;

            Some(json!({
                "movieId": movie_id,
                "title": title,
                "explanation": explanation,
            }))
        })
        .collect();

    if entries.is_empty() {
        return Err(ExtractError::Unparseable(
            "no complete recommendation entries could be scraped".to_string(),
        ));
    }

    tracing::info!(scraped = entries.len(), "Recovered recommendations by field scrape");

    Ok(json!({ "recommendations": entries }))
}

/// Requires a `recommendations` array; drops entries with missing or mistyped fields
pub fn validate_shape(value: &Value) -> Result<Vec<RecommendationCandidate>, ExtractError> {
    let entries = value
        .get("recommendations")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ExtractError::InvalidShape("missing or invalid recommendations array".to_string())
        })?;

    let candidates = entries
        .iter()
        .filter_map(|entry| {
            let candidate = candidate_from_value(entry);
            if candidate.is_none() {
                tracing::warn!(entry = %entry, "Dropping malformed recommendation");
            }
            candidate
        })
        .collect();

    Ok(candidates)
}

fn candidate_from_value(entry: &Value) -> Option<RecommendationCandidate> {
    let movie_id = entry.get("movieId").and_then(positive_integer)?;
    let title = entry.get("title").and_then(non_empty_str)?;
    let explanation = entry.get("explanation").and_then(non_empty_str)?;

    Some(RecommendationCandidate {
        movie_id,
        title: title.to_string(),
        explanation: explanation.to_string(),
    })
}

fn positive_integer(value: &Value) -> Option<i64> {
    if let Some(id) = value.as_i64() {
        return (id > 0).then_some(id);
    }

    // 50.0 is still the number 50
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && *f > 0.0 && *f < i64::MAX as f64)
        .map(|f| f as i64)
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

fn capture_string(pattern: &Regex, fragment: &str) -> Option<String> {
    let caps = pattern.captures(fragment)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();

    let text = serde_json::from_str::<String>(&format!("\"{}\"", raw))
        .unwrap_or_else(|_| raw.replace("\\'", "'"));
    (!text.trim().is_empty()).then_some(text)
}

/// First `{` through last `}`
fn json_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Splits an array body at every `{` that opens an object with a key.
///
/// Braces inside string values do not start a fragment, even when the
/// surrounding quotes are broken.
fn object_fragments(array: &str) -> Vec<&str> {
    let starts: Vec<usize> = OBJECT_START_RE.find_iter(array).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(array.len());
            &array[start..end]
        })
        .collect()
}

/// Applies `rewrite` to every stretch of text that is not inside a string
/// literal. Double-quoted literals, and single-quoted ones in key or value
/// position, are copied verbatim (quotes included).
fn rewrite_outside_strings<F>(input: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(input.len());
    let mut outside_start = 0;
    let mut pos = 0;

    while let Some(c) = input[pos..].chars().next() {
        let literal_end = match c {
            '"' => Some(closing_double_quote(input, pos + 1).map_or(input.len(), |i| i + 1)),
            '\'' if opens_literal(&input[..pos]) => {
                closing_single_quote(input, pos + 1).map(|i| i + 1)
            }
            _ => None,
        };

        match literal_end {
            Some(end) => {
                out.push_str(&rewrite(&input[outside_start..pos]));
                out.push_str(&input[pos..end]);
                outside_start = end;
                pos = end;
            }
            None => pos += c.len_utf8(),
        }
    }

    if outside_start < input.len() {
        out.push_str(&rewrite(&input[outside_start..]));
    }

    out
}

/// Rewrites `'value'` string literals as `"value"`.
///
/// A single quote only opens a string in value or key position (after `{`,
/// `[`, `,`, `:`), and only closes one when followed by `,`, `}`, `]`, `:` or
/// the end of input, so apostrophes inside words survive.
fn convert_single_quoted_strings(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(c) = input[pos..].chars().next() {
        if c == '"' {
            let end = closing_double_quote(input, pos + 1).map_or(input.len(), |i| i + 1);
            out.push_str(&input[pos..end]);
            pos = end;
            continue;
        }

        if c == '\'' && opens_literal(&out) {
            if let Some(close) = closing_single_quote(input, pos + 1) {
                let body = input[pos + 1..close]
                    .replace("\\'", "'")
                    .replace('"', "\\\"");
                out.push('"');
                out.push_str(&body);
                out.push('"');
                pos = close + 1;
                continue;
            }
        }

        out.push(c);
        pos += c.len_utf8();
    }

    out
}

fn opens_literal(preceding: &str) -> bool {
    matches!(
        preceding.trim_end().chars().last(),
        None | Some('{' | '[' | ',' | ':')
    )
}

/// Byte index of the `"` ending a string whose body starts at `from`
fn closing_double_quote(text: &str, from: usize) -> Option<usize> {
    let mut chars = text[from..].char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => return Some(from + i),
            _ => {}
        }
    }
    None
}

/// Byte index of the `'` ending a single-quoted literal whose body starts at `from`
fn closing_single_quote(text: &str, from: usize) -> Option<usize> {
    let mut chars = text[from..].char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '\'' => {
                let next = text[from + i + 1..].trim_start().chars().next();
                if matches!(next, None | Some(',' | '}' | ']' | ':')) {
                    return Some(from + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Drops backslashes that do not start a valid JSON escape
fn neutralize_backslashes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' {
            let next = chars.get(i + 1).copied();
            let valid = in_string
                && match next {
                    Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => true,
                    Some('u') => {
                        chars.len() > i + 5
                            && chars[i + 2..i + 6].iter().all(|d| d.is_ascii_hexdigit())
                    }
                    _ => false,
                };

            if valid {
                out.push(c);
                if let Some(next) = next {
                    out.push(next);
                }
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }

        if c == '"' {
            in_string = !in_string;
        }
        out.push(c);
        i += 1;
    }

    out
}
