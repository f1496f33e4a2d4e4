use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub scoring: Option<ScoringConfig>,
    pub review: Option<ReviewConfig>,
    pub extraction: Option<ExtractionSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub match_weight: Option<f64>,
    pub quality_weight: Option<f64>,
    pub partial_match_strength: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    pub review_threshold: Option<f64>,
    pub min_field_confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSection {
    pub parallel_threshold: Option<usize>,
    /// Appended to the built-in building-name suffixes.
    pub extra_building_suffixes: Option<Vec<String>>,
    /// Appended to the built-in label words skipped during name search.
    pub extra_name_labels: Option<Vec<String>>,
}

/// Platform config directory path: `<config_dir>/jusorok/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jusorok").join("config.toml"))
}

/// Load config by cascading CWD `.jusorok.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> Result<ConfigFile, CoreError> {
    let platform = match config_path() {
        Some(p) => load_from_path(&p)?,
        None => None,
    };
    let cwd = load_from_path(Path::new(".jusorok.toml"))?;

    Ok(match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    })
}

/// Load a config from a specific path. Returns `Ok(None)` if the file doesn't
/// exist; a file that exists but does not parse is an error.
pub fn load_from_path(path: &Path) -> Result<Option<ConfigFile>, CoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let parsed = toml::from_str(&content).map_err(|source| CoreError::ConfigParse {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(Some(parsed))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let base_scoring = base.scoring.unwrap_or_default();
    let over_scoring = overlay.scoring.unwrap_or_default();
    let base_review = base.review.unwrap_or_default();
    let over_review = overlay.review.unwrap_or_default();
    let base_extraction = base.extraction.unwrap_or_default();
    let over_extraction = overlay.extraction.unwrap_or_default();

    ConfigFile {
        scoring: Some(ScoringConfig {
            match_weight: over_scoring.match_weight.or(base_scoring.match_weight),
            quality_weight: over_scoring.quality_weight.or(base_scoring.quality_weight),
            partial_match_strength: over_scoring
                .partial_match_strength
                .or(base_scoring.partial_match_strength),
        }),
        review: Some(ReviewConfig {
            review_threshold: over_review.review_threshold.or(base_review.review_threshold),
            min_field_confidence: over_review
                .min_field_confidence
                .or(base_review.min_field_confidence),
        }),
        extraction: Some(ExtractionSection {
            parallel_threshold: over_extraction
                .parallel_threshold
                .or(base_extraction.parallel_threshold),
            extra_building_suffixes: over_extraction
                .extra_building_suffixes
                .or(base_extraction.extra_building_suffixes),
            extra_name_labels: over_extraction
                .extra_name_labels
                .or(base_extraction.extra_name_labels),
        }),
    }
}

/// Write a config to `path`, creating parent directories.
pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_threshold_round_trip_toml() {
        let config = ConfigFile {
            review: Some(ReviewConfig {
                review_threshold: Some(0.75),
                ..Default::default()
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.review.unwrap().review_threshold, Some(0.75));
    }

    #[test]
    fn absent_keys_deserialize_as_none() {
        let toml_str = "[scoring]\nmatch_weight = 0.8\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let scoring = parsed.scoring.unwrap();
        assert_eq!(scoring.match_weight, Some(0.8));
        assert!(scoring.quality_weight.is_none());
        assert!(parsed.review.is_none());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            scoring: Some(ScoringConfig {
                match_weight: Some(0.6),
                partial_match_strength: Some(0.5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            scoring: Some(ScoringConfig {
                match_weight: Some(0.8),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).scoring.unwrap();
        assert_eq!(merged.match_weight, Some(0.8));
        assert_eq!(merged.partial_match_strength, Some(0.5));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            extraction: Some(ExtractionSection {
                extra_building_suffixes: Some(vec!["캐슬".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(
            merged.extraction.unwrap().extra_building_suffixes,
            Some(vec!["캐슬".to_string()])
        );
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_from_path(&dir.path().join("absent.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[review\nreview_threshold = ").unwrap();
        assert!(matches!(
            load_from_path(&path),
            Err(CoreError::ConfigParse { .. })
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = ConfigFile {
            review: Some(ReviewConfig {
                review_threshold: Some(0.5),
                min_field_confidence: Some(0.2),
            }),
            ..Default::default()
        };
        save_to_path(&config, &path).unwrap();
        assert_eq!(load_from_path(&path).unwrap(), Some(config));
    }
}
