use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use nutrilog_core::Tracker;
use nutrilog_core::export::parse_export;

use super::helpers::print_json;

pub(crate) fn cmd_export(tracker: &Tracker, csv: bool, output: Option<&Path>) -> Result<()> {
    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let count = if csv {
        let count = tracker.store().list_entries()?.len();
        tracker.write_entries_csv(&mut out)?;
        count
    } else {
        let data = tracker.export_all()?;
        serde_json::to_writer_pretty(&mut out, &data)?;
        writeln!(out)?;
        data.entries.len()
    };
    out.flush()?;

    if let Some(path) = output {
        eprintln!("Exported {count} entries to {}", path.display());
    }
    Ok(())
}

pub(crate) fn cmd_import(tracker: &Tracker, file: &Path, json: bool) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let data = parse_export(&raw)
        .with_context(|| format!("{} is not a nutrilog export", file.display()))?;
    let summary = tracker.import_all(&data)?;

    if json {
        return print_json(&summary);
    }

    let status = |imported: bool, skipped: bool| {
        if imported {
            "imported"
        } else if skipped {
            "skipped"
        } else {
            "none"
        }
    };
    println!("Import complete:");
    println!(
        "  Profile:      {}",
        status(summary.profile_imported, summary.profile_skipped)
    );
    println!(
        "  Entries:      {} imported, {} skipped",
        summary.entries_imported, summary.entries_skipped
    );
    println!(
        "  Daily data:   {} imported, {} skipped",
        summary.daily_imported, summary.daily_skipped
    );
    println!(
        "  Streak:       {}",
        status(summary.streak_imported, summary.streak_skipped)
    );
    println!(
        "  Achievements: {} imported, {} skipped",
        summary.achievements_imported, summary.achievements_skipped
    );
    Ok(())
}

pub(crate) fn cmd_reset(tracker: &Tracker, yes: bool) -> Result<()> {
    if !yes {
        bail!("This erases every entry, profile and streak. Re-run with --yes to confirm");
    }
    tracker.clear_all()?;
    println!("All data erased");
    Ok(())
}
