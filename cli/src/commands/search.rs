use anyhow::Result;
use std::process;

use nutrilog_core::service::FoodLookupProvider;

use super::helpers::{format_amount, json_error, print_nutrient_table, print_search_table};

pub(crate) fn cmd_search(lookup: &dyn FoodLookupProvider, query: &str, json: bool) -> Result<()> {
    let results = lookup.search_foods(query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        eprintln!("No results for '{query}'");
        process::exit(2);
    }

    print_search_table(&results);
    Ok(())
}

pub(crate) fn cmd_food(lookup: &dyn FoodLookupProvider, fdc_id: &str, json: bool) -> Result<()> {
    let food = match lookup.get_food_details(fdc_id) {
        Ok(food) => food,
        Err(e) if json => {
            println!("{}", json_error(&e.to_string()));
            process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
        return Ok(());
    }

    let brand = food
        .brand
        .as_ref()
        .map(|b| format!(" ({b})"))
        .unwrap_or_default();
    println!("[{}] {}{brand}", food.id, food.name);
    println!(
        "  {:.0} kcal per {}\n",
        food.calories,
        format_amount(food.serving_size, &food.serving_unit)
    );

    if food.nutrients.is_empty() {
        println!("  No nutrient data");
    } else {
        print_nutrient_table(&food.nutrients);
    }
    Ok(())
}
