use rayon::prelude::*;

use jusorok_core::{MultiEntryResult, OcrBackend};

use crate::assemble::{ScoredEntry, assemble};
use crate::config::ExtractionConfig;
use crate::fields::{ExtractedFields, extract_fields};
use crate::normalize::{NormalizedText, normalize};
use crate::quality::analyze;
use crate::review::ReviewPolicy;
use crate::scoring::{ScoringWeights, aggregate, score_fields};
use crate::segment::{EntrySpan, segment};
use crate::ParsingError;

/// A configurable contact extraction pipeline.
///
/// Holds an [`ExtractionConfig`] and exposes each pipeline step as a method.
/// The default constructor uses built-in defaults; use
/// [`ContactExtractor::with_config`] to supply custom weights, thresholds and
/// word lists.
#[derive(Debug, Clone, Default)]
pub struct ContactExtractor {
    config: ExtractionConfig,
}

impl ContactExtractor {
    /// Create an extractor with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with a custom configuration.
    pub fn with_config(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Get a reference to the current config.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Clean raw recognized text (step 1).
    pub fn normalize(&self, raw: &str) -> NormalizedText {
        normalize(raw)
    }

    /// Split normalized text into entry spans (step 2).
    pub fn segment(&self, normalized: &NormalizedText) -> Vec<EntrySpan> {
        segment(normalized)
    }

    /// Extract the fields of one entry block (step 3).
    pub fn extract_fields(&self, block: &str) -> ExtractedFields {
        extract_fields(block, &self.config)
    }

    /// Run steps 3 to 6 on one entry span.
    pub fn score_entry(&self, span: EntrySpan) -> ScoredEntry {
        let fields = self.extract_fields(&span.text);
        let quality = analyze(&span.text, &fields);
        let confidence = score_fields(&fields, &quality, &ScoringWeights::from_config(&self.config));
        let aggregate = aggregate(&confidence);

        let policy = ReviewPolicy::from_config(&self.config);
        let reasons = policy.reasons(&fields, &confidence, aggregate);
        let human_review = !reasons.is_empty();

        tracing::trace!(
            start = span.start,
            end = span.end,
            aggregate,
            human_review,
            "scored entry"
        );

        ScoredEntry {
            span,
            fields,
            quality,
            confidence,
            aggregate,
            reasons,
            human_review,
        }
    }

    /// Run the full pipeline on raw recognized text.
    pub fn extract(&self, raw: &str) -> MultiEntryResult {
        self.extract_with_id(raw, None)
    }

    /// Run the full pipeline, using `image_id` instead of the derived id when
    /// given.
    pub fn extract_with_id(&self, raw: &str, image_id: Option<String>) -> MultiEntryResult {
        let normalized = self.normalize(raw);
        let spans = self.segment(&normalized);

        // par_iter().collect() keeps input order, so both paths give the same result.
        let scored: Vec<ScoredEntry> = if spans.len() > self.config.parallel_threshold() {
            tracing::debug!(entries = spans.len(), "scoring entries in parallel");
            spans
                .into_par_iter()
                .map(|span| self.score_entry(span))
                .collect()
        } else {
            spans
                .into_iter()
                .map(|span| self.score_entry(span))
                .collect()
        };

        let result = assemble(&normalized, &scored, &self.config, image_id);
        tracing::info!(
            entries = result.total_entries,
            flagged = result.flagged_count(),
            "extraction complete"
        );
        result
    }

    /// Recognize an image with `backend`, then run the pipeline on its text.
    ///
    /// Backend failures and blank recognized text are reported before any
    /// extraction runs. The recognizer's confidence figures are recorded in
    /// `processing_metadata`.
    pub fn extract_image(
        &self,
        image: &[u8],
        backend: &dyn OcrBackend,
    ) -> Result<MultiEntryResult, ParsingError> {
        let recognized = backend.recognize(image)?;
        if recognized.text.trim().is_empty() {
            return Err(ParsingError::EmptyText);
        }
        let mut result = self.extract(&recognized.text);
        recognized
            .metadata
            .record(&mut result.processing_metadata);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfigBuilder;
    use jusorok_core::{OcrError, OcrMetadata, Recognized};

    struct FixedOcr(Result<&'static str, &'static str>);

    impl OcrBackend for FixedOcr {
        fn recognize(&self, _image: &[u8]) -> Result<Recognized, OcrError> {
            self.0
                .map(|text| Recognized::from(text.to_string()))
                .map_err(|e| OcrError::Service(e.to_string()))
        }
    }

    struct ScoredOcr;

    impl OcrBackend for ScoredOcr {
        fn recognize(&self, _image: &[u8]) -> Result<Recognized, OcrError> {
            Ok(Recognized {
                text: "김철수 010-1234-5678".to_string(),
                metadata: OcrMetadata {
                    confidence: None,
                    average_word_confidence: Some(0.82),
                    word_count: 2,
                },
            })
        }
    }

    #[test]
    fn test_extract_empty_text() {
        let result = ContactExtractor::new().extract("");
        assert_eq!(result.total_entries, 0);
        assert!(result.entries.is_empty());
    }

    #[test]
    fn test_extract_with_caller_id() {
        let result = ContactExtractor::new().extract_with_id("김철수 010-1234-5678", Some("img-7".into()));
        assert_eq!(result.image_id, "img-7");
        assert_eq!(result.total_entries, 1);
    }

    #[test]
    fn test_score_entry_flags_reasons() {
        let extractor = ContactExtractor::new();
        let n = extractor.normalize("김철수 010-1234-5678");
        let span = extractor.segment(&n).remove(0);
        let scored = extractor.score_entry(span);
        // Name and phone only: low aggregate, but contact is present.
        assert!(scored.human_review);
        assert!(scored.aggregate < 0.6);
    }

    #[test]
    fn test_parallel_path_matches_serial() {
        let raw = "김철수 010-1234-5678\n서울특별시 성북구 화랑로 26\n이영희 010-9876-5432\n부산광역시 해운대구 해운대로 570";
        let serial = ContactExtractor::with_config(
            ExtractionConfigBuilder::new()
                .parallel_threshold(usize::MAX)
                .build()
                .unwrap(),
        );
        let parallel = ContactExtractor::with_config(
            ExtractionConfigBuilder::new()
                .parallel_threshold(0)
                .build()
                .unwrap(),
        );
        assert_eq!(serial.extract(raw), parallel.extract(raw));
    }

    #[test]
    fn test_extract_image_errors() {
        let extractor = ContactExtractor::new();
        let err = extractor
            .extract_image(b"png", &FixedOcr(Err("quota exceeded")))
            .unwrap_err();
        assert!(matches!(err, ParsingError::Ocr(_)));

        let err = extractor
            .extract_image(b"png", &FixedOcr(Ok("  \n ")))
            .unwrap_err();
        assert!(matches!(err, ParsingError::EmptyText));

        let result = extractor
            .extract_image(b"png", &FixedOcr(Ok("김철수 010-1234-5678")))
            .unwrap();
        assert_eq!(result.entries[0].name.as_deref(), Some("김철수"));
    }

    #[test]
    fn test_extract_image_records_ocr_metadata() {
        let result = ContactExtractor::new()
            .extract_image(b"png", &ScoredOcr)
            .unwrap();
        assert_eq!(result.total_entries, 1);
        assert_eq!(result.processing_metadata["ocr_average_word_confidence"], 0.82);
        assert_eq!(result.processing_metadata["ocr_word_count"], 2);
        assert!(!result.processing_metadata.contains_key("ocr_confidence"));

        let plain = ContactExtractor::new()
            .extract_image(b"png", &FixedOcr(Ok("김철수 010-1234-5678")))
            .unwrap();
        assert!(!plain.processing_metadata.contains_key("ocr_word_count"));
    }
}
