//! Boundary with the external text recognizer.
//!
//! The recognizer itself is opaque: the extraction engine only ever sees the
//! text it produced, plus a few summary numbers that are recorded in the
//! result metadata. Failures and empty results are reported here, before any
//! extraction runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR service error: {0}")]
    Service(String),
    #[error("invalid OCR response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of a recognizer response, kept next to the extracted entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OcrMetadata {
    /// Confidence the recognizer reported for the whole document.
    pub confidence: Option<f64>,
    /// Mean of the per-word confidences.
    pub average_word_confidence: Option<f64>,
    pub word_count: usize,
}

impl OcrMetadata {
    /// Write the known values into `processing_metadata` under `ocr_*` keys.
    pub fn record(&self, metadata: &mut BTreeMap<String, serde_json::Value>) {
        if let Some(c) = self.confidence {
            metadata.insert("ocr_confidence".to_string(), c.into());
        }
        if let Some(c) = self.average_word_confidence {
            metadata.insert("ocr_average_word_confidence".to_string(), c.into());
        }
        if self.word_count > 0 {
            metadata.insert("ocr_word_count".to_string(), self.word_count.into());
        }
    }
}

/// Text recognized on one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recognized {
    pub text: String,
    pub metadata: OcrMetadata,
}

impl From<String> for Recognized {
    fn from(text: String) -> Self {
        Self {
            text,
            metadata: OcrMetadata::default(),
        }
    }
}

/// Trait for text recognition backends (`image bytes → raw text`).
///
/// Implementors wrap the network call with their own timeout and retry
/// policy; the extraction pipeline lives in `jusorok_parsing::ContactExtractor`.
/// Backends without confidence figures can return `Recognized::from(text)`.
pub trait OcrBackend: Send + Sync {
    /// Recognize all text on one image.
    fn recognize(&self, image: &[u8]) -> Result<Recognized, OcrError>;
}

/// Saved document-OCR response.
///
/// Only the parts needed to recover plain text are modelled; unknown keys are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub pages: Vec<OcrPage>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrPage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub words: Vec<OcrWord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrWord {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl OcrResponse {
    /// Plain text of the response.
    ///
    /// Prefers the top-level `text`, then per-page text (one page per line
    /// block), then the page words joined by spaces.
    pub fn plain_text(&self) -> String {
        if let Some(text) = self.text.as_deref().filter(|t| !t.trim().is_empty()) {
            return text.trim().to_string();
        }

        let page_texts: Vec<&str> = self
            .pages
            .iter()
            .filter_map(|p| p.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if !page_texts.is_empty() {
            return page_texts.join("\n");
        }

        self.pages
            .iter()
            .map(|p| {
                p.words
                    .iter()
                    .filter_map(|w| w.text.as_deref())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Mean word confidence, or `None` when no word carries one.
    pub fn average_word_confidence(&self) -> Option<f64> {
        let scores: Vec<f64> = self
            .pages
            .iter()
            .flat_map(|p| p.words.iter())
            .filter_map(|w| w.confidence)
            .collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }

    pub fn metadata(&self) -> OcrMetadata {
        OcrMetadata {
            confidence: self.confidence,
            average_word_confidence: self.average_word_confidence(),
            word_count: self.pages.iter().map(|p| p.words.len()).sum(),
        }
    }
}

/// Parse a saved OCR response into its plain text and metadata.
pub fn read_response(json: &str) -> Result<Recognized, OcrError> {
    let response: OcrResponse = serde_json::from_str(json)?;
    let text = response.plain_text();
    if text.is_empty() {
        tracing::warn!("OCR response carried no text");
    }
    Ok(Recognized {
        text,
        metadata: response.metadata(),
    })
}
