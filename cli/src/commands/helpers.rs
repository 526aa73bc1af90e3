use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use nutrilog_core::models::{DAY_KEY_FORMAT, format_day_key};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, DAY_KEY_FORMAT).with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday")
            }),
        },
    }
}

/// `parse_date`, rendered as a day key.
pub(crate) fn day_key(date_str: Option<String>) -> Result<String> {
    Ok(format_day_key(parse_date(date_str)?))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn format_serving(size: f64, unit: &str) -> String {
    if size.fract() == 0.0 {
        format!("{size:.0} {unit}")
    } else {
        format!("{size} {unit}")
    }
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

/// Text progress bar, `width` cells wide.
pub(crate) fn progress_bar(progress: f64, target: f64, width: usize) -> String {
    let ratio = if target > 0.0 {
        (progress / target).clamp(0.0, 1.0)
    } else {
        0.0
    };
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
    let filled = (ratio * width as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}
