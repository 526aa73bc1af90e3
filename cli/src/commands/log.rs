use anyhow::Result;
use std::process;

use nutrilog_core::Tracker;
use nutrilog_core::dates;
use nutrilog_core::models::{MealType, NewFoodEntry};

use super::helpers::{format_serving, json_error, parse_date, print_json};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_log(
    tracker: &Tracker,
    name: &str,
    calories: i64,
    meal: &str,
    [protein, carbs, fat]: [f64; 3],
    serving: f64,
    unit: &str,
    id: Option<i64>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let meal_type: MealType = meal.parse()?;

    let entry = tracker.add_food(&NewFoodEntry {
        id,
        date,
        name: name.to_string(),
        calories,
        protein,
        carbs,
        fat,
        serving_size: serving,
        serving_unit: unit.to_string(),
        meal_type,
    })?;

    if date == dates::today() {
        tracker.check_in(date)?;
    }

    if json {
        return print_json(&entry);
    }

    let verb = if id.is_some() { "Updated" } else { "Logged" };
    let serving = format_serving(entry.serving_size, &entry.serving_unit);
    println!(
        "{verb} [{}] {} ({serving}) for {} on {}: {} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
        entry.id,
        entry.name,
        entry.meal_type,
        entry.date,
        entry.calories,
        entry.protein,
        entry.carbs,
        entry.fat
    );
    let view = tracker.get_day_view(&entry.date)?;
    println!("  Day total: {} kcal", view.totals.calories);
    Ok(())
}

pub(crate) fn cmd_delete(tracker: &Tracker, entry_id: i64, json: bool) -> Result<()> {
    if tracker.remove_food(entry_id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": entry_id }));
        } else {
            println!("Deleted entry {entry_id}");
        }
        Ok(())
    } else {
        if json {
            println!("{}", json_error(&format!("Entry {entry_id} not found")));
        } else {
            eprintln!("Entry {entry_id} not found");
        }
        process::exit(2);
    }
}
