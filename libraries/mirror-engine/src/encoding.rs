//! Encoding normalization for fetched text assets.
//!
//! Legacy-encoded HTML/CSS/script files are transcoded to UTF-8 when the
//! statistical detector is confident enough; markup additionally gets its
//! in-document charset declaration rewritten so the document's self-reported
//! encoding matches its actual bytes. Everything else is written unmodified.

use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Minimum detector confidence before a transcode is attempted.
pub const CONFIDENCE_THRESHOLD: f32 = 0.8;

/// File extensions treated as text assets (candidates for normalization).
const TEXT_EXTENSIONS: &[&str] = &["html", "htm", "css", "js"];

/// Subset of text assets that can carry an in-document charset declaration.
const MARKUP_EXTENSIONS: &[&str] = &["html", "htm"];

/// Failures of the normalization step. Never fatal for the run: the fetch
/// pipeline logs them and writes the raw bytes instead.
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("detector reported unknown encoding label {0:?}")]
    UnknownLabel(String),

    #[error("malformed byte sequence while decoding as {0}")]
    Decode(&'static str),
}

/// Result of normalizing one text asset.
#[derive(Debug, PartialEq, Eq)]
pub enum Normalized {
    /// Already canonical, pure ASCII, or below the confidence threshold.
    Unchanged,
    /// Re-encoded as UTF-8 (and, for markup, charset declaration rewritten).
    Transcoded {
        bytes: Vec<u8>,
        from: &'static str,
    },
}

/// Whether this path belongs to the fixed text-asset set.
pub fn is_text_asset(path: &Path) -> bool {
    has_extension_in(path, TEXT_EXTENSIONS)
}

/// Whether this path is markup (eligible for charset-declaration rewriting).
pub fn is_markup(path: &Path) -> bool {
    has_extension_in(path, MARKUP_EXTENSIONS)
}

fn has_extension_in(path: &Path, set: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| set.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn should_transcode(confidence: f32) -> bool {
    confidence >= CONFIDENCE_THRESHOLD
}

/// Normalize a text asset to canonical UTF-8 bytes.
///
/// Runs statistical detection; below the confidence threshold, or when the
/// detected encoding already is the canonical one, the input is left
/// untouched. Pure-ASCII input is canonical by definition and returned
/// unchanged without consulting the detector.
pub fn normalize(bytes: &[u8], markup: bool) -> Result<Normalized, EncodingError> {
    if bytes.is_empty() || bytes.is_ascii() {
        return Ok(Normalized::Unchanged);
    }

    let (label, confidence, _) = chardet::detect(bytes);
    debug!(label = %label, confidence, "Detected text encoding");

    if !should_transcode(confidence) {
        return Ok(Normalized::Unchanged);
    }

    let Some(encoding) = Encoding::for_label(chardet::charset2encoding(&label).as_bytes()) else {
        return Err(EncodingError::UnknownLabel(label));
    };
    if encoding == UTF_8 {
        return Ok(Normalized::Unchanged);
    }

    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(EncodingError::Decode(actual.name()));
    }

    let text = if markup {
        rewrite_charset_declarations(&text).into_owned()
    } else {
        text.into_owned()
    };

    Ok(Normalized::Transcoded {
        bytes: text.into_bytes(),
        from: encoding.name(),
    })
}

static CHARSET_DECL_RE: Lazy<Regex> = Lazy::new(|| {
    // Legacy tokens that show up in documents written before the migration
    // to UTF-8. Matched case-insensitively, with or without quotes.
    Regex::new(
        r#"(?i)(charset\s*=\s*["']?)(shift[_-]?jis|x-sjis|sjis|windows-31j|euc-jp|iso-2022-jp|iso-8859-1|windows-1252)"#,
    )
    .expect("charset declaration regex is valid")
});

/// Rewrite in-document legacy charset declarations to declare utf-8.
fn rewrite_charset_declarations(text: &str) -> Cow<'_, str> {
    CHARSET_DECL_RE.replace_all(text, "${1}utf-8")
}
