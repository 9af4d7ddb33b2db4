use anyhow::{Result, bail};

use nutrilog_core::models::{FoodDetails, MealType, NewFoodLog};
use nutrilog_core::service::FoodLookupProvider;

use super::helpers::{describe_entry, parse_date, parse_serving};
use super::{Service, resolve_food_id};

pub(crate) fn cmd_log(
    svc: &Service,
    lookup: &dyn FoodLookupProvider,
    food: &str,
    serving: &str,
    meal: MealType,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let (serving_size, unit) = parse_serving(serving)?;
    let date = parse_date(date)?;
    let fdc_id = resolve_food_id(lookup, food)?;

    let entry = match unit {
        None => svc.log_food(lookup, &fdc_id, date, meal, serving_size)?,
        Some(unit) => {
            let details = lookup.get_food_details(&fdc_id)?;
            check_unit(&unit, &details)?;
            svc.add_food_log(NewFoodLog {
                date,
                meal_type: meal,
                food: details,
                serving_size,
            })?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let id = &entry.id;
        println!("Logged: {} for {meal} on {date} [{id}]", describe_entry(&entry));
    }
    Ok(())
}

/// A unit typed after the serving has to match the food's reference unit,
/// since entries are scaled by plain ratio.
fn check_unit(unit: &str, food: &FoodDetails) -> Result<()> {
    let reference = food.serving_unit.to_lowercase();
    let same = unit == reference
        || matches!((unit, reference.as_str()), ("g", "grm") | ("ml", "mlt"));
    if !same {
        bail!(
            "'{}' is measured in {}; give the serving in {} (or as a plain number)",
            food.name,
            food.serving_unit,
            food.serving_unit
        );
    }
    Ok(())
}
