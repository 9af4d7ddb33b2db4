mod helpers;
mod log;
mod meal;
mod profile;
mod search;
mod summary;

use anyhow::{Result, bail};

use nutrilog_core::db::Database;
use nutrilog_core::service::{FoodLookupProvider, NutrilogService};

use helpers::{print_search_table, prompt_choice};

pub(crate) use log::cmd_log;
pub(crate) use meal::{UpdateArgs, cmd_delete, cmd_update};
pub(crate) use profile::{ProfileArgs, cmd_profile_set, cmd_profile_show};
pub(crate) use search::{cmd_food, cmd_search};
pub(crate) use summary::{MAX_HISTORY_DAYS, cmd_day, cmd_history, cmd_summary};

pub(crate) type Service = NutrilogService<Database>;

/// Turn a food argument into an FDC id. Numeric input is taken as-is;
/// anything else is searched and, when ambiguous, picked interactively.
pub(super) fn resolve_food_id(lookup: &dyn FoodLookupProvider, food: &str) -> Result<String> {
    let food = food.trim();
    if !food.is_empty() && food.chars().all(|c| c.is_ascii_digit()) {
        return Ok(food.to_string());
    }

    let mut results = lookup.search_foods(food)?;
    match results.len() {
        0 => bail!("No food found for '{food}'"),
        1 => Ok(results.swap_remove(0).id),
        n => {
            print_search_table(&results);
            let idx = prompt_choice(n)?;
            Ok(results.swap_remove(idx).id)
        }
    }
}
