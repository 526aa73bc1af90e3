use anyhow::{Result, bail};
use std::process;
use tabled::{Table, Tabled, settings::Style};

use nutrilog_core::{Tracker, goals};
use nutrilog_core::models::{ProfileInput, UserProfile};

use super::helpers::{json_error, print_json};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_profile_set(
    tracker: &Tracker,
    name: &str,
    age: f64,
    gender: &str,
    height: f64,
    weight: f64,
    activity: &str,
    goal: &str,
    water_target: Option<i64>,
    json: bool,
) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Name must not be empty");
    }
    let input = ProfileInput {
        name: name.to_string(),
        age,
        gender: gender.to_string(),
        height,
        weight,
        activity_level: activity.parse()?,
        goal: goal.parse()?,
    };
    if water_target.is_some_and(|glasses| glasses <= 0) {
        bail!("Water target must be greater than 0");
    }
    let mut profile = goals::build_profile(&input)?;
    if let Some(glasses) = water_target {
        profile.water_target = glasses;
    }
    tracker.save_profile(&profile)?;

    if json {
        return print_json(&profile);
    }
    println!("Saved profile for {}", profile.name);
    print_profile(&profile);
    Ok(())
}

pub(crate) fn cmd_profile_show(tracker: &Tracker, json: bool) -> Result<()> {
    let Some(profile) = tracker.profile()? else {
        if json {
            println!("{}", json_error("No profile saved"));
        } else {
            eprintln!("No profile saved. Use `nutrilog profile set` to create one.");
        }
        process::exit(2);
    };

    if json {
        return print_json(&profile);
    }
    print_profile(&profile);
    Ok(())
}

fn print_profile(p: &UserProfile) {
    #[derive(Tabled)]
    struct Field {
        #[tabled(rename = "Field")]
        field: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows = vec![
        Field {
            field: "Name",
            value: p.name.clone(),
        },
        Field {
            field: "Age",
            value: p.age.to_string(),
        },
        Field {
            field: "Gender",
            value: p.gender.clone(),
        },
        Field {
            field: "Height",
            value: format!("{:.1} cm", p.height),
        },
        Field {
            field: "Weight",
            value: format!("{:.1} lbs", p.weight),
        },
        Field {
            field: "Activity",
            value: p.activity_level.to_string(),
        },
        Field {
            field: "Goal",
            value: p.goal.to_string(),
        },
        Field {
            field: "Calories",
            value: format!("{} kcal", p.daily_calorie_target),
        },
        Field {
            field: "Protein",
            value: format!("{} g", p.protein_target),
        },
        Field {
            field: "Carbs",
            value: format!("{} g", p.carbs_target),
        },
        Field {
            field: "Fat",
            value: format!("{} g", p.fat_target),
        },
        Field {
            field: "Water",
            value: format!("{} glasses", p.water_target),
        },
    ];

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}
