//! Core library for the nutrilog tracker.
//!
//! The [`NutrilogService`] owns the user profile and the food log, writes
//! every change through to a [`KeyValueStore`] before committing it in
//! memory, and keeps the current day's [`DailySummary`] up to date.

pub mod db;
pub mod models;
pub mod service;
pub mod store;
pub mod summary;
pub mod usda;

mod error;

pub use db::Database;
pub use error::{Error, Result, StoreError};
pub use models::{DailySummary, FoodDetails, FoodLog, MealType, NewFoodLog, UserProfile};
pub use service::{FoodLookupProvider, LoadReport, NutrilogService};
pub use store::{KeyValueStore, MemoryStore};
