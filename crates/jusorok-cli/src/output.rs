use std::io::Write;

use jusorok_core::{ContactEntry, Field, MultiEntryResult};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the human-readable extraction report.
pub fn print_report(
    w: &mut dyn Write,
    source: &str,
    result: &MultiEntryResult,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "Extracting contacts from {}...", source)?;
    writeln!(w, "Found {} entries", result.total_entries)?;
    if color.enabled() {
        writeln!(w, "{}", format!("(image id {})", result.image_id).dimmed())?;
    } else {
        writeln!(w, "(image id {})", result.image_id)?;
    }

    for (i, entry) in result.entries.iter().enumerate() {
        print_entry(w, entry, &review_reasons(result, i), color)?;
    }

    print_summary(w, result, color)
}

/// Review reasons recorded for entry `index`, if the metadata carries them.
fn review_reasons(result: &MultiEntryResult, index: usize) -> Vec<String> {
    result
        .processing_metadata
        .get("review_reasons")
        .and_then(|v| v.get(index))
        .and_then(|v| v.as_array())
        .map(|reasons| {
            reasons
                .iter()
                .filter_map(|r| r.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn print_entry(
    w: &mut dyn Write,
    entry: &ContactEntry,
    reasons: &[String],
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    let sep = "=".repeat(60);
    let heading = format!(
        "ENTRY {} (confidence {:.2})",
        entry.entry_number,
        entry.aggregate_confidence()
    );
    if color.enabled() {
        let status = if entry.human_review {
            "NEEDS REVIEW".yellow().to_string()
        } else {
            "OK".green().to_string()
        };
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{} {}", heading.bold(), status)?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        let status = if entry.human_review { "NEEDS REVIEW" } else { "OK" };
        writeln!(w, "{}", sep)?;
        writeln!(w, "{} {}", heading, status)?;
        writeln!(w, "{}", sep)?;
    }

    let phone_type = entry
        .phone_type
        .map(|t| format!(" ({})", t))
        .unwrap_or_default();
    print_field(w, "Name", entry.name.as_deref(), "", entry.field_confidence(Field::Name), color)?;
    print_field(
        w,
        "Phone",
        entry.phone_number.as_deref(),
        &phone_type,
        entry.field_confidence(Field::Phone),
        color,
    )?;

    match &entry.address {
        Some(address) => {
            let formatted = address.to_formatted_address();
            if color.enabled() {
                writeln!(w, "  {:<16}{}", "Address:".bold(), formatted.cyan())?;
            } else {
                writeln!(w, "  {:<16}{}", "Address:", formatted)?;
            }
            for field in Field::ADDRESS {
                if let Some(value) = address.get(field) {
                    print_field(
                        w,
                        field.key(),
                        Some(value),
                        "",
                        entry.field_confidence(field),
                        color,
                    )?;
                }
            }
        }
        None => {
            if color.enabled() {
                writeln!(w, "  {:<16}{}", "Address:".bold(), "(none)".dimmed())?;
            } else {
                writeln!(w, "  {:<16}(none)", "Address:")?;
            }
        }
    }

    if !reasons.is_empty() {
        let msg = format!("Review: {}", reasons.join(", "));
        if color.enabled() {
            writeln!(w, "  {}", msg.yellow())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
    }
    Ok(())
}

fn print_field(
    w: &mut dyn Write,
    label: &str,
    value: Option<&str>,
    note: &str,
    confidence: f64,
    color: ColorMode,
) -> std::io::Result<()> {
    let label = format!("{}:", label);
    match value {
        Some(v) if color.enabled() => writeln!(
            w,
            "  {:<16}{}{} {}",
            label.bold(),
            v,
            note,
            format!("[{:.2}]", confidence).dimmed()
        ),
        Some(v) => writeln!(w, "  {:<16}{}{} [{:.2}]", label, v, note, confidence),
        None if color.enabled() => writeln!(w, "  {:<16}{}", label.bold(), "-".dimmed()),
        None => writeln!(w, "  {:<16}-", label),
    }
}

/// Print the final summary.
fn print_summary(
    w: &mut dyn Write,
    result: &MultiEntryResult,
    color: ColorMode,
) -> std::io::Result<()> {
    let flagged = result.flagged_count();
    let with_address = result
        .entries
        .iter()
        .filter(|e| e.address.is_some())
        .count();

    writeln!(w)?;
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", "SUMMARY".bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "SUMMARY")?;
        writeln!(w, "{}", sep)?;
    }

    writeln!(w, "  Entries found: {}", result.total_entries)?;
    writeln!(w, "  With address: {}", with_address)?;
    if let Some(name) = result
        .processing_metadata
        .get("rescorer")
        .and_then(|v| v.as_str())
    {
        let msg = format!("Re-scored by: {}", name);
        if color.enabled() {
            writeln!(w, "  {}", msg.dimmed())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
    }
    writeln!(w)?;

    let ok = result.total_entries - flagged;
    if color.enabled() {
        writeln!(w, "  {} {}", "OK:".green(), ok)?;
    } else {
        writeln!(w, "  OK: {}", ok)?;
    }
    if flagged > 0 {
        if color.enabled() {
            writeln!(w, "  {} {}", "Needs review:".yellow(), flagged)?;
        } else {
            writeln!(w, "  Needs review: {}", flagged)?;
        }
    }

    writeln!(w)?;
    Ok(())
}
