use anyhow::Result;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutrilog_core::models::{DEFAULT_CALORIE_GOAL, DailySummary, MealGroup};

use super::Service;
use super::helpers::{describe_entry, no_neg_zero, parse_date};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalView<'a> {
    #[serde(flatten)]
    summary: &'a DailySummary,
    calorie_goal: f64,
    remaining_calories: f64,
}

pub(crate) fn cmd_summary(svc: &Service, json: bool) -> Result<()> {
    let summary = svc.recompute_daily_summary()?;
    let remaining = DEFAULT_CALORIE_GOAL - summary.total_calories;

    if json {
        let view = GoalView {
            summary: &summary,
            calorie_goal: DEFAULT_CALORIE_GOAL,
            remaining_calories: remaining,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let date = summary.date;
    let total = no_neg_zero(summary.total_calories);
    let pct = total / DEFAULT_CALORIE_GOAL * 100.0;
    println!("=== {date} ===\n");
    println!("  CALORIES:  {total:.0} / {DEFAULT_CALORIE_GOAL:.0} kcal ({pct:.0}%)");
    if remaining >= 0.0 {
        println!("  REMAINING: {remaining:.0} kcal");
    } else {
        let over = -remaining;
        println!("  OVER:      {over:.0} kcal");
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DayView {
    date: NaiveDate,
    meals: Vec<MealGroup>,
    total_calories: f64,
}

pub(crate) fn cmd_day(svc: &Service, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let meals = svc.meals_for_date(date)?;
    let total_calories = svc.summary_for_date(date)?.total_calories;

    if json {
        let view = DayView {
            date,
            meals,
            total_calories,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if meals.is_empty() {
        eprintln!("No entries for {date}");
        process::exit(2);
    }

    println!("=== {date} ===\n");
    for meal in &meals {
        let label = meal.meal_type.as_str().to_uppercase();
        let sub_cal = no_neg_zero(meal.subtotal_calories);
        println!("  {label} ({sub_cal:.0} kcal)");
        for e in &meal.entries {
            println!("    [{}] {}", e.id, describe_entry(e));
        }
        println!();
    }
    let total = no_neg_zero(total_calories);
    println!("  TOTAL: {total:.0} kcal");
    Ok(())
}

/// Longest window `history` accepts.
pub(crate) const MAX_HISTORY_DAYS: u32 = 3650;

/// `today` and the `days - 1` days before it, newest first. Stops early at
/// the start of the calendar.
fn history_dates(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days.min(MAX_HISTORY_DAYS))
        .map_while(|i| today.checked_sub_days(Days::new(u64::from(i))))
        .collect()
}

pub(crate) fn cmd_history(svc: &Service, days: u32, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Goal")]
        goal: String,
    }

    let mut summaries = Vec::new();
    for date in history_dates(svc.today(), days) {
        summaries.push(svc.summary_for_date(date)?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let rows: Vec<HistoryRow> = summaries
        .iter()
        .map(|s| {
            let cal = no_neg_zero(s.total_calories);
            HistoryRow {
                date: s.date.to_string(),
                calories: format!("{cal:.0}"),
                goal: format!("{:.0}%", cal / DEFAULT_CALORIE_GOAL * 100.0),
            }
        })
        .collect();

    if rows.iter().all(|r| r.calories == "0") {
        eprintln!("No entries in the last {days} days");
        process::exit(2);
    }

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
