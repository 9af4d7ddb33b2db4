//! Payload types and mapping rules for USDA `FoodData` Central.
//!
//! The HTTP client lives in the CLI; this module only knows the wire shapes
//! and how they turn into [`FoodSearchResult`] and [`FoodDetails`].

use serde::{Deserialize, Serialize};

use crate::models::{FoodDetails, FoodSearchResult, Nutrient};

pub const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
/// Public rate-limited key accepted by `FoodData` Central.
pub const DEMO_API_KEY: &str = "DEMO_KEY";
/// FDC nutrient number for energy in kcal.
pub const ENERGY_KCAL_NUTRIENT_ID: i64 = 1008;
pub const SEARCH_PAGE_SIZE: u32 = 20;
pub const DEFAULT_SERVING_SIZE: f64 = 100.0;
pub const DEFAULT_SERVING_UNIT: &str = "g";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsdaConfig {
    pub base_url: String,
    pub api_key: String,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for UsdaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: DEMO_API_KEY.to_owned(),
            timeout_secs: 10,
        }
    }
}

impl UsdaConfig {
    #[must_use]
    pub fn search_url(&self) -> String {
        format!("{}/foods/search", self.base_url.trim_end_matches('/'))
    }

    #[must_use]
    pub fn food_url(&self, fdc_id: &str) -> String {
        format!("{}/food/{fdc_id}", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub foods: Vec<FdcFood>,
}

/// A food as returned by both `/foods/search` and `/food/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FdcFood {
    pub fdc_id: i64,
    #[serde(default)]
    pub description: String,
    pub brand_owner: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_size_unit: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<FdcNutrient>,
}

/// One nutrient amount. Search hits use the flat form (`nutrientId`,
/// `value`); `/food/{id}` nests the nutrient and reports `amount`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FdcNutrient {
    pub nutrient_id: Option<i64>,
    pub nutrient_name: Option<String>,
    pub value: Option<f64>,
    pub unit_name: Option<String>,
    pub nutrient: Option<FdcNutrientRef>,
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FdcNutrientRef {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub unit_name: Option<String>,
}

impl FdcNutrient {
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.nutrient_id
            .or_else(|| self.nutrient.as_ref().and_then(|n| n.id))
    }

    #[must_use]
    pub fn amount(&self) -> Option<f64> {
        self.value.or(self.amount)
    }

    fn into_nutrient(self) -> Option<Nutrient> {
        let id = self.id()?;
        let value = self.amount().unwrap_or(0.0);
        let (nested_name, nested_unit) = match self.nutrient {
            Some(r) => (r.name, r.unit_name),
            None => (None, None),
        };
        Some(Nutrient {
            id,
            name: self.nutrient_name.or(nested_name).unwrap_or_default(),
            value,
            unit: self.unit_name.or(nested_unit).unwrap_or_default(),
        })
    }
}

fn energy_kcal(nutrients: &[FdcNutrient]) -> f64 {
    nutrients
        .iter()
        .find(|n| n.id() == Some(ENERGY_KCAL_NUTRIENT_ID))
        .and_then(FdcNutrient::amount)
        .unwrap_or(0.0)
}

fn serving(food: &FdcFood) -> (f64, String) {
    let size = food
        .serving_size
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(DEFAULT_SERVING_SIZE);
    let unit = food
        .serving_size_unit
        .clone()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SERVING_UNIT.to_string());
    (size, unit)
}

#[must_use]
pub fn food_to_search_result(food: FdcFood) -> FoodSearchResult {
    let calories = energy_kcal(&food.food_nutrients);
    let (serving_size, serving_unit) = serving(&food);
    FoodSearchResult {
        id: food.fdc_id.to_string(),
        name: food.description,
        brand: food.brand_owner.filter(|b| !b.is_empty()),
        calories,
        serving_size,
        serving_unit,
    }
}

#[must_use]
pub fn food_to_details(food: FdcFood) -> FoodDetails {
    let calories = energy_kcal(&food.food_nutrients);
    let (serving_size, serving_unit) = serving(&food);
    let nutrients = food
        .food_nutrients
        .into_iter()
        .filter_map(FdcNutrient::into_nutrient)
        .collect();

    FoodDetails {
        id: food.fdc_id.to_string(),
        name: food.description,
        brand: food.brand_owner.filter(|b| !b.is_empty()),
        calories,
        serving_size,
        serving_unit,
        nutrients,
    }
}
