use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{DailySummary, FoodLog, MEAL_TYPES, Macros, MealGroup};

/// Fold the entries dated `date` into a [`DailySummary`].
///
/// Only calories are aggregated; macros and per-nutrient progress stay at
/// their zero/empty defaults.
#[must_use]
pub fn build_daily_summary(logs: &[FoodLog], date: NaiveDate) -> DailySummary {
    let total_calories: f64 = logs
        .iter()
        .filter(|log| log.date == date)
        .map(FoodLog::calories)
        .sum();

    DailySummary {
        date,
        total_calories,
        macros: Macros::default(),
        nutrients: BTreeMap::new(),
    }
}

/// Entries dated `date`, grouped by meal in display order. Empty meals are omitted.
#[must_use]
pub fn group_by_meal(logs: &[FoodLog], date: NaiveDate) -> Vec<MealGroup> {
    let mut meals: Vec<MealGroup> = Vec::new();

    for meal_type in MEAL_TYPES {
        let entries: Vec<FoodLog> = logs
            .iter()
            .filter(|log| log.date == date && log.meal_type == *meal_type)
            .cloned()
            .collect();

        if entries.is_empty() {
            continue;
        }

        let subtotal_calories = entries.iter().map(FoodLog::calories).sum();
        meals.push(MealGroup {
            meal_type: *meal_type,
            entries,
            subtotal_calories,
        });
    }

    meals
}
