use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use jusorok_core::config_file::{self, ConfigFile, ExtractionSection, ReviewConfig, ScoringConfig};
use jusorok_core::{GazetteerRescorer, NoopRescorer, Recognized, Rescorer, apply_rescorer, ocr};
use jusorok_parsing::{ContactExtractor, ExtractionConfig, ExtractionConfigBuilder};

mod output;

use output::ColorMode;

/// Korean contact extractor - Split OCR text of a page into scored contact records
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract contact entries from recognized text
    Extract {
        /// Text file, saved OCR response (.json), or `-` for stdin
        input: PathBuf,

        /// Print the result as JSON instead of a report
        #[arg(long)]
        json: bool,

        /// Re-score the result before printing
        #[arg(long, value_enum, default_value_t = RescoreMode::None)]
        rescore: RescoreMode,

        /// Aggregate confidence below which an entry is flagged
        #[arg(long)]
        review_threshold: Option<f64>,

        /// Weight of the match strength (quality weight is 1 minus this)
        #[arg(long)]
        match_weight: Option<f64>,

        /// Match strength of alias and fallback matches
        #[arg(long)]
        partial_strength: Option<f64>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Path to output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the resolved configuration
    Config {
        /// Also write the resolved values to this TOML file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RescoreMode {
    None,
    Gazetteer,
}

impl RescoreMode {
    fn rescorer(self) -> Box<dyn Rescorer> {
        match self {
            RescoreMode::None => Box::new(NoopRescorer),
            RescoreMode::Gazetteer => Box::new(GazetteerRescorer::default()),
        }
    }
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Copy, Default)]
struct FlagOverrides {
    review_threshold: Option<f64>,
    match_weight: Option<f64>,
    partial_strength: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            input,
            json,
            rescore,
            review_threshold,
            match_weight,
            partial_strength,
            no_color,
            output,
        } => {
            let flags = FlagOverrides {
                review_threshold,
                match_weight,
                partial_strength,
            };
            let config = resolve_config(config_file::load_config()?, env_var, flags)?;
            extract(&input, &config, json, rescore, no_color, output)
        }
        Command::Config { save } => {
            let config = resolve_config(
                config_file::load_config()?,
                env_var,
                FlagOverrides::default(),
            )?;
            show_config(&config, save.as_deref())
        }
    }
}

/// Log to stderr, filtered by `JUSOROK_LOG` (default `warn`).
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_env("JUSOROK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env(name: &str, env: &impl Fn(&str) -> Option<String>) -> anyhow::Result<Option<f64>> {
    env(name)
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .with_context(|| format!("{name} must be a number, got {v:?}"))
        })
        .transpose()
}

/// Resolve configuration: CLI flags > env vars > config files > defaults.
fn resolve_config(
    file: ConfigFile,
    env: impl Fn(&str) -> Option<String>,
    flags: FlagOverrides,
) -> anyhow::Result<ExtractionConfig> {
    let mut builder = ExtractionConfigBuilder::from_config_file(&file);

    // An env value is only parsed when no flag overrides it.
    let review_threshold = match flags.review_threshold {
        Some(t) => Some(t),
        None => parse_env("JUSOROK_REVIEW_THRESHOLD", &env)?,
    };
    let match_weight = match flags.match_weight {
        Some(w) => Some(w),
        None => parse_env("JUSOROK_MATCH_WEIGHT", &env)?,
    };
    let partial_strength = match flags.partial_strength {
        Some(s) => Some(s),
        None => parse_env("JUSOROK_PARTIAL_STRENGTH", &env)?,
    };

    if let Some(t) = review_threshold {
        builder = builder.review_threshold(t);
    }
    if let Some(w) = match_weight {
        builder = builder.match_weight(w);
    }
    if let Some(s) = partial_strength {
        builder = builder.partial_match_strength(s);
    }

    builder.build().context("invalid configuration")
}

/// Read the input as plain text. Saved OCR responses are reduced to their
/// text and confidence figures.
fn read_input(input: &Path) -> anyhow::Result<Recognized> {
    let contents = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        if !input.exists() {
            bail!("File not found: {}", input.display());
        }
        std::fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?
    };

    let is_json = input
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        return ocr::read_response(&contents)
            .with_context(|| format!("failed to read OCR response {}", input.display()));
    }
    Ok(Recognized::from(contents))
}

fn extract(
    input: &Path,
    config: &ExtractionConfig,
    json: bool,
    rescore: RescoreMode,
    no_color: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let recognized = read_input(input)?;
    if recognized.text.trim().is_empty() {
        bail!("No text recognized in {}", input.display());
    }

    let extractor = ContactExtractor::with_config(config.clone());
    let mut result = extractor.extract(&recognized.text);
    recognized
        .metadata
        .record(&mut result.processing_metadata);
    let result = apply_rescorer(rescore.rescorer().as_ref(), result);

    // Determine color mode and output writer
    let color = ColorMode(!no_color && output.is_none() && !json);
    let mut writer: Box<dyn Write> = if let Some(ref output_path) = output {
        Box::new(
            std::fs::File::create(output_path)
                .with_context(|| format!("failed to create {}", output_path.display()))?,
        )
    } else {
        Box::new(std::io::stdout())
    };

    if json {
        serde_json::to_writer_pretty(&mut writer, &result)?;
        writeln!(writer)?;
    } else {
        let source = if input == Path::new("-") {
            "stdin".to_string()
        } else {
            input
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| input.display().to_string())
        };
        output::print_report(&mut writer, &source, &result, color)?;
    }
    writer.flush()?;
    Ok(())
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

fn to_config_file(config: &ExtractionConfig) -> ConfigFile {
    ConfigFile {
        scoring: Some(ScoringConfig {
            match_weight: Some(config.match_weight()),
            quality_weight: Some(config.quality_weight()),
            partial_match_strength: Some(config.partial_match_strength()),
        }),
        review: Some(ReviewConfig {
            review_threshold: Some(config.review_threshold()),
            min_field_confidence: Some(config.min_field_confidence()),
        }),
        extraction: Some(ExtractionSection {
            parallel_threshold: Some(config.parallel_threshold()),
            extra_building_suffixes: non_empty(config.extra_building_suffixes()),
            extra_name_labels: non_empty(config.extra_name_labels()),
        }),
    }
}

fn show_config(config: &ExtractionConfig, save: Option<&Path>) -> anyhow::Result<()> {
    match config_file::config_path() {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (no config directory on this platform)"),
    }
    println!("{}", serde_json::to_string_pretty(&config.to_metadata())?);
    println!("parallel_threshold: {}", config.parallel_threshold());

    if let Some(path) = save {
        config_file::save_to_path(&to_config_file(config), path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}
