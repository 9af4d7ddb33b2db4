use anyhow::{Result, bail};
use std::process;

use nutrilog_core::models::{FoodLogUpdate, MealType};
use nutrilog_core::service::FoodLookupProvider;

use super::helpers::{describe_entry, json_error, parse_date, parse_serving};
use super::{Service, resolve_food_id};

fn not_found(entry_id: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(&format!("Entry {entry_id} not found")));
    } else {
        eprintln!("Entry {entry_id} not found");
    }
    process::exit(2);
}

pub(crate) fn cmd_delete(svc: &Service, entry_id: &str, json: bool) -> Result<()> {
    let Some(entry) = svc.food_log(entry_id)? else {
        not_found(entry_id, json);
    };
    if !svc.remove_food_log(entry_id)? {
        not_found(entry_id, json);
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": entry_id }));
    } else {
        println!("Deleted entry {entry_id}: {}", describe_entry(&entry));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub(crate) struct UpdateArgs {
    pub serving: Option<String>,
    pub meal: Option<MealType>,
    pub date: Option<String>,
    /// FDC id or name of a replacement food.
    pub food: Option<String>,
}

fn build_update(lookup: &dyn FoodLookupProvider, args: UpdateArgs) -> Result<FoodLogUpdate> {
    let serving_size = args
        .serving
        .as_deref()
        .map(parse_serving)
        .transpose()?
        .map(|(v, _)| v);
    let date = args.date.map(Some).map(parse_date).transpose()?;
    let food = args
        .food
        .as_deref()
        .map(|f| -> Result<_> {
            let id = resolve_food_id(lookup, f)?;
            Ok(lookup.get_food_details(&id)?)
        })
        .transpose()?;

    let update = FoodLogUpdate {
        date,
        meal_type: args.meal,
        food,
        serving_size,
    };
    if update.is_empty() {
        bail!("Nothing to update. Provide at least one of --serving, --meal, --date, or --food");
    }
    Ok(update)
}

pub(crate) fn cmd_update(
    svc: &Service,
    lookup: &dyn FoodLookupProvider,
    entry_id: &str,
    args: UpdateArgs,
    json: bool,
) -> Result<()> {
    let update = build_update(lookup, args)?;

    let Some(entry) = svc.update_food_log(entry_id, &update)? else {
        not_found(entry_id, json);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let meal = entry.meal_type;
        let date = entry.date;
        println!(
            "Updated entry {entry_id}: {} for {meal} on {date}",
            describe_entry(&entry)
        );
    }
    Ok(())
}
