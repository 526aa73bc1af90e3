use anyhow::Result;
use std::process;

use nutrilog_core::Tracker;
use nutrilog_core::models::DailyData;

use super::helpers::{day_key, json_error, print_json};

pub(crate) fn cmd_water(
    tracker: &Tracker,
    glasses: i64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = day_key(date)?;
    let data = tracker.update_water(&date, glasses)?;

    if json {
        return print_json(&data);
    }
    println!(
        "Water for {}: {}/{} glasses",
        data.date,
        data.water_glasses,
        tracker.water_target()?
    );
    Ok(())
}

pub(crate) fn cmd_weight(
    tracker: &Tracker,
    value: Option<f64>,
    clear: bool,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = day_key(date)?;

    let data = match value {
        Some(weight) => tracker.log_weight(&date, weight)?,
        None if clear => tracker.clear_weight(&date)?,
        None => {
            let stored = tracker
                .get_day_view(&date)?
                .daily
                .and_then(|d| d.weight);
            return show_weight(&date, stored, json);
        }
    };

    if json {
        return print_json(&data);
    }
    match data.weight {
        Some(w) => println!("Logged {w:.1} lbs for {}", data.date),
        None => println!("Cleared weight for {}", data.date),
    }
    Ok(())
}

fn show_weight(date: &str, weight: Option<f64>, json: bool) -> Result<()> {
    match weight {
        Some(w) if json => println!("{}", serde_json::json!({ "date": date, "weight": w })),
        Some(w) => println!("{date}: {w:.1} lbs"),
        None => {
            if json {
                println!("{}", json_error(&format!("No weight entry for {date}")));
            } else {
                eprintln!("No weight entry for {date}");
            }
            process::exit(2);
        }
    }
    Ok(())
}

pub(crate) fn cmd_notes(
    tracker: &Tracker,
    text: Option<&str>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = day_key(date)?;
    let data: DailyData = tracker.set_notes(&date, text)?;

    if json {
        return print_json(&data);
    }
    match &data.notes {
        Some(n) => println!("Notes for {}: {n}", data.date),
        None => println!("Cleared notes for {}", data.date),
    }
    Ok(())
}
