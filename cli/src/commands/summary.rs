use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutrilog_core::Tracker;
use nutrilog_core::models::MEAL_TYPES;

use super::helpers::{day_key, format_serving, no_neg_zero, print_json};

pub(crate) fn cmd_day(tracker: &Tracker, date: Option<String>, json: bool) -> Result<()> {
    let date = day_key(date)?;
    let view = tracker.get_day_view(&date)?;

    if json {
        return print_json(&view);
    }

    if !view.has_data {
        eprintln!("No entries for {date}");
        process::exit(2);
    }

    println!("=== {date} ===\n");

    for meal in MEAL_TYPES {
        let entries: Vec<_> = view.entries.iter().filter(|e| e.meal_type == *meal).collect();
        if entries.is_empty() {
            continue;
        }
        let subtotal: i64 = entries.iter().map(|e| e.calories).sum();
        println!("  {} ({subtotal} kcal)", meal.as_str().to_uppercase());
        for e in entries {
            let serving = format_serving(e.serving_size, &e.serving_unit);
            println!(
                "    [{}] {} — {serving} — {} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
                e.id, e.name, e.calories, e.protein, e.carbs, e.fat
            );
        }
        println!();
    }

    let t = view.totals;
    println!(
        "  TOTAL: {} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
        t.calories, t.protein, t.carbs, t.fat
    );

    if let Some(profile) = tracker.profile()? {
        #[allow(clippy::cast_precision_loss)]
        let (rp, rc, rf) = (
            profile.protein_target as f64 - t.protein,
            profile.carbs_target as f64 - t.carbs,
            profile.fat_target as f64 - t.fat,
        );
        println!(
            "  TARGET: {} kcal | P:{}g C:{}g F:{}g",
            profile.daily_calorie_target,
            profile.protein_target,
            profile.carbs_target,
            profile.fat_target
        );
        println!(
            "  REMAINING: {} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
            profile.daily_calorie_target - t.calories,
            no_neg_zero(rp),
            no_neg_zero(rc),
            no_neg_zero(rf)
        );
    }

    let water = view.daily.as_ref().map_or(0, |d| d.water_glasses);
    println!("  WATER: {water}/{} glasses", tracker.water_target()?);
    if let Some(daily) = &view.daily {
        if let Some(weight) = daily.weight {
            println!("  WEIGHT: {weight:.1} lbs");
        }
        if let Some(notes) = &daily.notes {
            println!("  NOTES: {notes}");
        }
    }

    Ok(())
}

pub(crate) fn cmd_trend(tracker: &Tracker, days: usize, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct TrendRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Calories")]
        calories: i64,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Water")]
        water: i64,
        #[tabled(rename = "Weight")]
        weight: String,
    }

    let trend = tracker.load_trend(days)?;

    if json {
        return print_json(&trend);
    }

    let rows: Vec<TrendRow> = trend
        .iter()
        .map(|p| TrendRow {
            date: p.date.clone(),
            calories: p.calories,
            protein: format!("{:.0}g", no_neg_zero(p.protein)),
            carbs: format!("{:.0}g", no_neg_zero(p.carbs)),
            fat: format!("{:.0}g", no_neg_zero(p.fat)),
            water: p.water_glasses,
            weight: p.weight.map_or("-".into(), |w| format!("{w:.1}")),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let logged: Vec<i64> = trend
        .iter()
        .map(|p| p.calories)
        .filter(|&c| c > 0)
        .collect();
    if !logged.is_empty() {
        #[allow(clippy::cast_precision_loss)]
        let avg = logged.iter().sum::<i64>() as f64 / logged.len() as f64;
        println!("Average: {avg:.0} kcal over {} logged days", logged.len());
    }

    Ok(())
}
