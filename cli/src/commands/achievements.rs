use anyhow::Result;
use chrono::Local;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutrilog_core::{Tracker, dates};

use super::helpers::{print_json, progress_bar, truncate};

pub(crate) fn cmd_streak(tracker: &Tracker, json: bool) -> Result<()> {
    let streak = tracker.check_in(dates::today())?;

    if json {
        return print_json(&streak);
    }

    let plural = |n: i64| if n == 1 { "day" } else { "days" };
    println!(
        "Current streak: {} {}",
        streak.current_streak,
        plural(streak.current_streak)
    );
    println!(
        "Longest streak: {} {}",
        streak.longest_streak,
        plural(streak.longest_streak)
    );
    println!("Days logged:    {}", streak.total_days_logged);
    if let Some(last) = &streak.last_log_date {
        println!("Last logged:    {last}");
    }
    Ok(())
}

pub(crate) fn cmd_achievements(tracker: &Tracker, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct AchievementRow {
        #[tabled(rename = "")]
        icon: String,
        #[tabled(rename = "Achievement")]
        title: String,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "Progress")]
        progress: String,
        #[tabled(rename = "Unlocked")]
        unlocked: String,
    }

    let list = tracker.refresh_achievements(&Local::now().to_rfc3339())?;

    if json {
        return print_json(&list);
    }

    let rows: Vec<AchievementRow> = list
        .iter()
        .map(|a| AchievementRow {
            icon: a.icon.clone(),
            title: a.title.clone(),
            description: truncate(&a.description, 40),
            progress: format!(
                "{} {:.0}/{:.0}",
                progress_bar(a.progress, a.target, 10),
                a.progress,
                a.target
            ),
            unlocked: a
                .unlocked_at
                .as_deref()
                .map(|t| t.get(..10).unwrap_or(t).to_string())
                .unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let unlocked = list.iter().filter(|a| a.is_unlocked()).count();
    println!("{unlocked}/{} unlocked", list.len());
    Ok(())
}
