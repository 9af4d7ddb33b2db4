use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Calorie goal shown on the summary when nothing else is configured.
pub const DEFAULT_CALORIE_GOAL: f64 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DietaryPreference {
    Omnivore,
    Vegetarian,
    Vegan,
    Pescatarian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeightGoal {
    Maintain,
    Lose,
    Gain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
    Supplements,
}

/// Meals in display order.
pub const MEAL_TYPES: &[MealType] = &[
    MealType::Breakfast,
    MealType::Lunch,
    MealType::Dinner,
    MealType::Snacks,
    MealType::Supplements,
];

impl ActivityLevel {
    pub const ALL: &'static [ActivityLevel] = &[
        ActivityLevel::Sedentary,
        ActivityLevel::Light,
        ActivityLevel::Moderate,
        ActivityLevel::Active,
        ActivityLevel::VeryActive,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "veryActive",
        }
    }
}

impl DietaryPreference {
    pub const ALL: &'static [DietaryPreference] = &[
        DietaryPreference::Omnivore,
        DietaryPreference::Vegetarian,
        DietaryPreference::Vegan,
        DietaryPreference::Pescatarian,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DietaryPreference::Omnivore => "omnivore",
            DietaryPreference::Vegetarian => "vegetarian",
            DietaryPreference::Vegan => "vegan",
            DietaryPreference::Pescatarian => "pescatarian",
        }
    }
}

impl WeightGoal {
    pub const ALL: &'static [WeightGoal] =
        &[WeightGoal::Maintain, WeightGoal::Lose, WeightGoal::Gain];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WeightGoal::Maintain => "maintain",
            WeightGoal::Lose => "lose",
            WeightGoal::Gain => "gain",
        }
    }
}

impl MealType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snacks => "snacks",
            MealType::Supplements => "supplements",
        }
    }
}

/// Case-insensitive lookup of `s` among `options`, matched on their `as_str` form.
fn parse_choice<T: Copy>(
    s: &str,
    options: &[T],
    name: fn(T) -> &'static str,
    what: &str,
) -> std::result::Result<T, String> {
    let wanted = s.trim().to_lowercase();
    options
        .iter()
        .copied()
        .find(|o| name(*o).to_lowercase() == wanted)
        .ok_or_else(|| {
            let valid: Vec<&str> = options.iter().map(|o| name(*o)).collect();
            format!("Invalid {what} '{s}'. Must be one of: {}", valid.join(", "))
        })
}

macro_rules! choice_traits {
    ($ty:ty, $all:expr, $what:literal) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                parse_choice(s, $all, <$ty>::as_str, $what)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_traits!(ActivityLevel, ActivityLevel::ALL, "activity level");
choice_traits!(DietaryPreference, DietaryPreference::ALL, "dietary preference");
choice_traits!(WeightGoal, WeightGoal::ALL, "weight goal");
choice_traits!(MealType, MEAL_TYPES, "meal type");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    /// Kilograms.
    pub weight: f64,
    /// Centimetres.
    pub height: f64,
    pub activity_level: ActivityLevel,
    pub dietary_preference: DietaryPreference,
    pub weight_goal: WeightGoal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    /// FDC nutrient id; 0 when the stored entry carried none.
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSearchResult {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub calories: f64,
    pub serving_size: f64,
    pub serving_unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodDetails {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Calories per reference serving.
    #[serde(default)]
    pub calories: f64,
    /// Reference serving size, in `serving_unit`.
    pub serving_size: f64,
    pub serving_unit: String,
    #[serde(default)]
    pub nutrients: Vec<Nutrient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodLog {
    pub id: String,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub food: FoodDetails,
    /// Logged amount, in the food's `serving_unit`.
    pub serving_size: f64,
}

impl FoodLog {
    /// Calories for the logged amount, scaled linearly from the reference serving.
    ///
    /// An entry whose reference serving is not a positive number counts as zero.
    #[must_use]
    pub fn calories(&self) -> f64 {
        let reference = self.food.serving_size;
        if !reference.is_finite() || reference <= 0.0 {
            return 0.0;
        }
        self.food.calories * (self.serving_size / reference)
    }
}

/// A food log entry before an id has been assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFoodLog {
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub food: FoodDetails,
    pub serving_size: f64,
}

impl NewFoodLog {
    #[must_use]
    pub fn with_id(self, id: String) -> FoodLog {
        FoodLog {
            id,
            date: self.date,
            meal_type: self.meal_type,
            food: self.food,
            serving_size: self.serving_size,
        }
    }
}

/// Partial update of a food log entry; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoodLogUpdate {
    pub date: Option<NaiveDate>,
    pub meal_type: Option<MealType>,
    pub food: Option<FoodDetails>,
    pub serving_size: Option<f64>,
}

impl FoodLogUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.meal_type.is_none()
            && self.food.is_none()
            && self.serving_size.is_none()
    }

    pub fn apply_to(&self, entry: &mut FoodLog) {
        if let Some(date) = self.date {
            entry.date = date;
        }
        if let Some(meal_type) = self.meal_type {
            entry.meal_type = meal_type;
        }
        if let Some(food) = &self.food {
            entry.food = food.clone();
        }
        if let Some(serving_size) = self.serving_size {
            entry.serving_size = serving_size;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Macros {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientProgress {
    pub value: f64,
    pub target: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_calories: f64,
    pub macros: Macros,
    pub nutrients: BTreeMap<String, NutrientProgress>,
}

/// One meal's entries on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealGroup {
    pub meal_type: MealType,
    pub entries: Vec<FoodLog>,
    pub subtotal_calories: f64,
}

fn positive(value: f64, field: &str) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidEntry(format!(
            "{field} must be greater than 0 (got {value})"
        )));
    }
    Ok(())
}

/// Validate the numeric fields a food log entry depends on for scaling.
pub fn validate_food_log(serving_size: f64, food: &FoodDetails) -> Result<()> {
    positive(serving_size, "servingSize")?;
    positive(food.serving_size, "food.servingSize")?;
    if !food.calories.is_finite() || food.calories < 0.0 {
        return Err(Error::InvalidEntry(format!(
            "food.calories must not be negative (got {})",
            food.calories
        )));
    }
    Ok(())
}

/// Accept an identifier written either as a JSON string or a JSON number.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
