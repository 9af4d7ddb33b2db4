use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    DailySummary, FoodDetails, FoodLog, FoodLogUpdate, FoodSearchResult, MealGroup, MealType,
    NewFoodLog, UserProfile, validate_food_log,
};
use crate::store::{FOOD_LOGS_KEY, KeyValueStore, USER_PROFILE_KEY, backup_key};
use crate::summary::{build_daily_summary, group_by_meal};

/// Remote food-composition lookup.
///
/// The CLI implements this with reqwest against `FoodData` Central. Failures
/// are reported as [`Error::LookupFailed`] and never retried here.
pub trait FoodLookupProvider: Send + Sync {
    fn search_foods(&self, query: &str) -> Result<Vec<FoodSearchResult>>;
    fn get_food_details(&self, id: &str) -> Result<FoodDetails>;
}

/// Outcome of [`NutrilogService::initialize`].
#[derive(Debug, Default)]
pub struct LoadReport {
    pub profile_loaded: bool,
    pub food_logs_loaded: usize,
    /// Values that could not be read or parsed and were treated as absent.
    pub recovered: Vec<Error>,
}

#[derive(Debug, Default)]
struct Snapshot {
    profile: Option<UserProfile>,
    logs: Vec<FoodLog>,
    summary: Option<DailySummary>,
}

/// Owner of the profile and food log state.
///
/// Starts uninitialized; every operation returns [`Error::NotReady`] until
/// [`initialize`](Self::initialize) has loaded the store. Mutations are
/// serialized and write through to the store before the in-memory state is
/// replaced, so a failed write leaves memory untouched. Readers only ever see
/// committed state and are not blocked by a write in flight.
pub struct NutrilogService<S> {
    store: S,
    state: RwLock<Option<Snapshot>>,
    writer: Mutex<()>,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

fn new_log_id(existing: &[FoodLog]) -> String {
    loop {
        let id = Uuid::now_v7().to_string();
        if !existing.iter().any(|log| log.id == id) {
            return id;
        }
    }
}

impl<S: KeyValueStore> NutrilogService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: RwLock::new(None),
            writer: Mutex::new(()),
            today: local_today,
        }
    }

    /// Replace the source of "today" (device-local date by default).
    #[must_use]
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    // --- Lifecycle ---

    /// Load the profile and food log from the store and become ready.
    ///
    /// Absent keys leave the defaults in place. Unreadable or malformed values
    /// are treated as absent and listed in [`LoadReport::recovered`].
    pub fn initialize(&self) -> Result<LoadReport> {
        let _writer = self.lock_writer();
        let mut report = LoadReport::default();

        let profile: Option<UserProfile> = self.load(USER_PROFILE_KEY, &mut report.recovered);
        let logs: Vec<FoodLog> = self
            .load(FOOD_LOGS_KEY, &mut report.recovered)
            .unwrap_or_default();

        report.profile_loaded = profile.is_some();
        report.food_logs_loaded = logs.len();

        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Some(Snapshot {
            profile,
            logs,
            summary: None,
        });

        tracing::info!(
            profile = report.profile_loaded,
            food_logs = report.food_logs_loaded,
            recovered = report.recovered.len(),
            "state loaded"
        );
        Ok(report)
    }

    // --- Reads ---

    pub fn user_profile(&self) -> Result<Option<UserProfile>> {
        self.read(|s| s.profile.clone())
    }

    pub fn food_logs(&self) -> Result<Vec<FoodLog>> {
        self.read(|s| s.logs.clone())
    }

    pub fn food_log(&self, id: &str) -> Result<Option<FoodLog>> {
        self.read(|s| s.logs.iter().find(|log| log.id == id).cloned())
    }

    /// The summary computed by the last mutation or explicit recompute.
    pub fn daily_summary(&self) -> Result<Option<DailySummary>> {
        self.read(|s| s.summary.clone())
    }

    /// Summary for an arbitrary day, without touching the stored summary.
    pub fn summary_for_date(&self, date: NaiveDate) -> Result<DailySummary> {
        self.read(|s| build_daily_summary(&s.logs, date))
    }

    pub fn meals_for_date(&self, date: NaiveDate) -> Result<Vec<MealGroup>> {
        self.read(|s| group_by_meal(&s.logs, date))
    }

    // --- Mutations ---

    pub fn set_user_profile(&self, profile: UserProfile) -> Result<()> {
        let _writer = self.lock_writer();
        self.ensure_ready()?;

        self.persist(USER_PROFILE_KEY, &profile)?;
        self.commit(|s| s.profile = Some(profile));
        tracing::debug!("user profile saved");
        Ok(())
    }

    pub fn add_food_log(&self, entry: NewFoodLog) -> Result<FoodLog> {
        let _writer = self.lock_writer();
        let mut logs = self.food_logs()?;
        validate_food_log(entry.serving_size, &entry.food)?;

        let log = entry.with_id(new_log_id(&logs));
        logs.push(log.clone());

        self.persist(FOOD_LOGS_KEY, &logs)?;
        self.commit_logs(logs);
        tracing::debug!(id = %log.id, date = %log.date, meal = %log.meal_type, "food log added");
        Ok(log)
    }

    /// Remove the entry with `id`. Returns `false`, and writes nothing, when
    /// no such entry exists.
    pub fn remove_food_log(&self, id: &str) -> Result<bool> {
        let _writer = self.lock_writer();
        let mut logs = self.food_logs()?;

        let before = logs.len();
        logs.retain(|log| log.id != id);
        if logs.len() == before {
            return Ok(false);
        }

        self.persist(FOOD_LOGS_KEY, &logs)?;
        self.commit_logs(logs);
        tracing::debug!(id, "food log removed");
        Ok(true)
    }

    /// Merge `update` into the entry with `id`. Returns `None`, and writes
    /// nothing, when no such entry exists.
    pub fn update_food_log(&self, id: &str, update: &FoodLogUpdate) -> Result<Option<FoodLog>> {
        let _writer = self.lock_writer();
        let mut logs = self.food_logs()?;

        let Some(entry) = logs.iter_mut().find(|log| log.id == id) else {
            return Ok(None);
        };
        if update.is_empty() {
            return Ok(Some(entry.clone()));
        }
        update.apply_to(entry);
        validate_food_log(entry.serving_size, &entry.food)?;
        let updated = entry.clone();

        self.persist(FOOD_LOGS_KEY, &logs)?;
        self.commit_logs(logs);
        tracing::debug!(id, "food log updated");
        Ok(Some(updated))
    }

    /// Rebuild the summary for today from the committed food log.
    pub fn recompute_daily_summary(&self) -> Result<DailySummary> {
        let today = self.today();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let snapshot = state.as_mut().ok_or(Error::NotReady)?;
        let summary = build_daily_summary(&snapshot.logs, today);
        snapshot.summary = Some(summary.clone());
        Ok(summary)
    }

    /// Fetch a food through `lookup` and log `serving_size` of it.
    ///
    /// Nothing is logged when the lookup fails.
    pub fn log_food<L: FoodLookupProvider + ?Sized>(
        &self,
        lookup: &L,
        food_id: &str,
        date: NaiveDate,
        meal_type: MealType,
        serving_size: f64,
    ) -> Result<FoodLog> {
        self.ensure_ready()?;
        let food = lookup.get_food_details(food_id)?;
        self.add_food_log(NewFoodLog {
            date,
            meal_type,
            food,
            serving_size,
        })
    }

    // --- Internals ---

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> Result<T> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.as_ref().map(f).ok_or(Error::NotReady)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(Error::NotReady)
        }
    }

    fn commit(&self, f: impl FnOnce(&mut Snapshot)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(snapshot) = state.as_mut() {
            f(snapshot);
        }
    }

    fn commit_logs(&self, logs: Vec<FoodLog>) {
        let summary = build_daily_summary(&logs, self.today());
        self.commit(|s| {
            s.logs = logs;
            s.summary = Some(summary);
        });
    }

    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json).map_err(|e| {
            tracing::warn!(key, error = %e, "storage write failed");
            Error::StorageWrite {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn load<T: DeserializeOwned>(&self, key: &str, recovered: &mut Vec<Error>) -> Option<T> {
        let reason = match self.store.get(key) {
            Ok(None) => return None,
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => return Some(value),
                Err(e) => {
                    let backup = backup_key(key);
                    match self.store.set(&backup, &raw) {
                        Ok(()) => format!("malformed content (kept under '{backup}'): {e}"),
                        Err(store_err) => {
                            tracing::warn!(key, error = %store_err, "could not back up malformed value");
                            format!("malformed content: {e}")
                        }
                    }
                }
            },
            Err(e) => e.to_string(),
        };

        tracing::warn!(key, %reason, "ignoring unreadable stored value");
        recovered.push(Error::StorageRead {
            key: key.to_string(),
            reason,
        });
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::error::StoreError;
    use crate::models::{ActivityLevel, DietaryPreference, WeightGoal};
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Memory store whose reads and writes can be made to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> std::result::Result<Option<String>, StoreError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("read refused".to_string()));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> std::result::Result<(), StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("disk full".to_string()));
            }
            self.inner.set(key, value)
        }
    }

    struct MockProvider {
        foods: Vec<FoodDetails>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(foods: Vec<FoodDetails>) -> Self {
            Self {
                foods,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl FoodLookupProvider for MockProvider {
        fn search_foods(&self, query: &str) -> Result<Vec<FoodSearchResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .foods
                .iter()
                .filter(|f| f.name.to_lowercase().contains(&query.to_lowercase()))
                .map(|f| FoodSearchResult {
                    id: f.id.clone(),
                    name: f.name.clone(),
                    brand: f.brand.clone(),
                    calories: f.calories,
                    serving_size: f.serving_size,
                    serving_unit: f.serving_unit.clone(),
                })
                .collect())
        }

        fn get_food_details(&self, id: &str) -> Result<FoodDetails> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.foods
                .iter()
                .find(|f| f.id == id)
                .cloned()
                .ok_or_else(|| Error::LookupFailed(format!("404 for food {id}")))
        }
    }

    fn jan_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn jan_second() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn sample_food() -> FoodDetails {
        FoodDetails {
            id: "2345678".to_string(),
            name: "Greek Yogurt".to_string(),
            brand: Some("Dairy Co".to_string()),
            calories: 200.0,
            serving_size: 100.0,
            serving_unit: "g".to_string(),
            nutrients: vec![],
        }
    }

    fn sample_entry(date: NaiveDate, serving_size: f64) -> NewFoodLog {
        NewFoodLog {
            date,
            meal_type: MealType::Lunch,
            food: sample_food(),
            serving_size,
        }
    }

    fn sample_profile() -> UserProfile {
        UserProfile {
            name: "Sam".to_string(),
            age: 34,
            weight: 72.5,
            height: 178.0,
            activity_level: ActivityLevel::Moderate,
            dietary_preference: DietaryPreference::Vegetarian,
            weight_goal: WeightGoal::Maintain,
        }
    }

    fn ready_service<S: KeyValueStore>(store: S) -> NutrilogService<S> {
        let svc = NutrilogService::new(store).with_clock(jan_first);
        svc.initialize().unwrap();
        svc
    }

    #[test]
    fn test_not_ready_before_initialize() {
        let svc = NutrilogService::new(MemoryStore::new()).with_clock(jan_first);
        assert!(!svc.is_ready());

        let err = svc.add_food_log(sample_entry(jan_first(), 150.0));
        assert!(matches!(err, Err(Error::NotReady)));
        assert!(matches!(
            svc.set_user_profile(sample_profile()),
            Err(Error::NotReady)
        ));
        assert!(matches!(svc.remove_food_log("x"), Err(Error::NotReady)));
        assert!(matches!(
            svc.update_food_log("x", &FoodLogUpdate::default()),
            Err(Error::NotReady)
        ));
        assert!(matches!(svc.recompute_daily_summary(), Err(Error::NotReady)));
        assert!(matches!(svc.food_logs(), Err(Error::NotReady)));
        assert!(matches!(svc.user_profile(), Err(Error::NotReady)));

        // Nothing reached the store
        assert!(svc.store().get(FOOD_LOGS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_example_scenario() {
        let svc = NutrilogService::new(MemoryStore::new()).with_clock(jan_first);
        assert!(matches!(
            svc.add_food_log(sample_entry(jan_first(), 150.0)),
            Err(Error::NotReady)
        ));

        let report = svc.initialize().unwrap();
        assert!(!report.profile_loaded);
        assert_eq!(report.food_logs_loaded, 0);
        assert!(report.recovered.is_empty());
        assert!(svc.user_profile().unwrap().is_none());
        assert!(svc.daily_summary().unwrap().is_none());

        svc.add_food_log(sample_entry(jan_first(), 150.0)).unwrap();

        let summary = svc.recompute_daily_summary().unwrap();
        assert_eq!(summary.date, jan_first());
        assert!((summary.total_calories - 300.0).abs() < 1e-9);
        assert_eq!(svc.daily_summary().unwrap(), Some(summary));
    }

    #[test]
    fn test_profile_round_trip_across_restart() {
        let store = MemoryStore::new();
        {
            let svc = ready_service(&store);
            svc.set_user_profile(sample_profile()).unwrap();
            assert_eq!(svc.user_profile().unwrap(), Some(sample_profile()));
        }

        let svc = NutrilogService::new(&store);
        let report = svc.initialize().unwrap();
        assert!(report.profile_loaded);
        assert_eq!(svc.user_profile().unwrap(), Some(sample_profile()));
    }

    #[test]
    fn test_state_survives_restart_with_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nutrilog.db");

        let added = {
            let svc = ready_service(Database::open(&path).unwrap());
            svc.set_user_profile(sample_profile()).unwrap();
            svc.add_food_log(sample_entry(jan_first(), 50.0)).unwrap()
        };

        let svc = ready_service(Database::open(&path).unwrap());
        assert_eq!(svc.user_profile().unwrap(), Some(sample_profile()));
        assert_eq!(svc.food_logs().unwrap(), vec![added]);
    }

    #[test]
    fn test_summary_excludes_other_dates() {
        let svc = ready_service(MemoryStore::new());
        svc.add_food_log(sample_entry(jan_first(), 100.0)).unwrap();
        svc.add_food_log(sample_entry(jan_second(), 500.0)).unwrap();
        let mut half = sample_entry(jan_first(), 25.0);
        half.food.calories = 80.0;
        half.food.serving_size = 50.0;
        svc.add_food_log(half).unwrap();

        let summary = svc.daily_summary().unwrap().unwrap();
        // 200 * 1.0 + 80 * 0.5
        assert!((summary.total_calories - 240.0).abs() < 1e-9);

        let other = svc.summary_for_date(jan_second()).unwrap();
        assert!((other.total_calories - 1000.0).abs() < 1e-9);
        // Looking at another day does not replace today's summary
        assert_eq!(svc.daily_summary().unwrap().unwrap().date, jan_first());
    }

    #[test]
    fn test_summary_absent_until_mutation() {
        let store = MemoryStore::new();
        {
            let svc = ready_service(&store);
            svc.add_food_log(sample_entry(jan_first(), 100.0)).unwrap();
        }
        let svc = ready_service(&store);
        assert!(svc.daily_summary().unwrap().is_none());
        let summary = svc.recompute_daily_summary().unwrap();
        assert!((summary.total_calories - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let svc = ready_service(MemoryStore::new());
        svc.add_food_log(sample_entry(jan_first(), 100.0)).unwrap();
        let logs_before = svc.food_logs().unwrap();
        let summary_before = svc.daily_summary().unwrap();
        let stored_before = svc.store().get(FOOD_LOGS_KEY).unwrap();

        assert!(!svc.remove_food_log("does-not-exist").unwrap());

        assert_eq!(svc.food_logs().unwrap(), logs_before);
        assert_eq!(svc.daily_summary().unwrap(), summary_before);
        assert_eq!(svc.store().get(FOOD_LOGS_KEY).unwrap(), stored_before);
    }

    #[test]
    fn test_remove_existing_entry() {
        let store = MemoryStore::new();
        let svc = ready_service(&store);
        let keep = svc.add_food_log(sample_entry(jan_first(), 100.0)).unwrap();
        let gone = svc.add_food_log(sample_entry(jan_first(), 50.0)).unwrap();

        assert!(svc.remove_food_log(&gone.id).unwrap());
        assert_eq!(svc.food_logs().unwrap(), vec![keep.clone()]);
        let summary = svc.daily_summary().unwrap().unwrap();
        assert!((summary.total_calories - 200.0).abs() < 1e-9);

        let reloaded = ready_service(&store);
        assert_eq!(reloaded.food_logs().unwrap(), vec![keep]);
    }

    #[test]
    fn test_rapid_adds_have_distinct_ids() {
        let svc = ready_service(MemoryStore::new());
        let mut ids = std::collections::HashSet::new();
        for _ in 0..200 {
            let log = svc.add_food_log(sample_entry(jan_first(), 10.0)).unwrap();
            ids.insert(log.id);
        }
        assert_eq!(ids.len(), 200);
        assert_eq!(svc.food_logs().unwrap().len(), 200);
    }

    #[test]
    fn test_concurrent_adds_are_serialized() {
        let svc = Arc::new(ready_service(MemoryStore::new()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = Arc::clone(&svc);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        svc.add_food_log(sample_entry(jan_first(), 1.0)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let logs = svc.food_logs().unwrap();
        assert_eq!(logs.len(), 200);
        let stored: Vec<FoodLog> =
            serde_json::from_str(&svc.store().get(FOOD_LOGS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, logs);
    }

    #[test]
    fn test_add_rolls_back_on_write_failure() {
        let svc = ready_service(FlakyStore::default());
        svc.add_food_log(sample_entry(jan_first(), 100.0)).unwrap();
        let logs_before = svc.food_logs().unwrap();
        let summary_before = svc.daily_summary().unwrap();

        svc.store().fail_writes.store(true, Ordering::SeqCst);
        let err = svc.add_food_log(sample_entry(jan_first(), 100.0));
        assert!(matches!(err, Err(Error::StorageWrite { ref key, .. }) if key == FOOD_LOGS_KEY));

        assert_eq!(svc.food_logs().unwrap(), logs_before);
        assert_eq!(svc.daily_summary().unwrap(), summary_before);

        // Storage still holds the pre-failure list
        svc.store().fail_writes.store(false, Ordering::SeqCst);
        let reloaded = ready_service(svc.store());
        assert_eq!(reloaded.food_logs().unwrap(), logs_before);
    }

    #[test]
    fn test_remove_and_update_roll_back_on_write_failure() {
        let svc = ready_service(FlakyStore::default());
        let log = svc.add_food_log(sample_entry(jan_first(), 100.0)).unwrap();
        svc.store().fail_writes.store(true, Ordering::SeqCst);

        assert!(matches!(
            svc.remove_food_log(&log.id),
            Err(Error::StorageWrite { .. })
        ));
        let update = FoodLogUpdate {
            serving_size: Some(300.0),
            ..FoodLogUpdate::default()
        };
        assert!(matches!(
            svc.update_food_log(&log.id, &update),
            Err(Error::StorageWrite { .. })
        ));

        assert_eq!(svc.food_logs().unwrap(), vec![log]);
        let summary = svc.daily_summary().unwrap().unwrap();
        assert!((summary.total_calories - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_profile_write_failure_keeps_previous() {
        let svc = ready_service(FlakyStore::default());
        svc.set_user_profile(sample_profile()).unwrap();

        svc.store().fail_writes.store(true, Ordering::SeqCst);
        let mut changed = sample_profile();
        changed.weight = 65.0;
        let err = svc.set_user_profile(changed);
        assert!(matches!(err, Err(Error::StorageWrite { ref key, .. }) if key == USER_PROFILE_KEY));
        assert_eq!(svc.user_profile().unwrap(), Some(sample_profile()));
    }

    #[test]
    fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let svc = ready_service(&store);
        let log = svc.add_food_log(sample_entry(jan_first(), 100.0)).unwrap();

        let update = FoodLogUpdate {
            meal_type: Some(MealType::Dinner),
            serving_size: Some(250.0),
            ..FoodLogUpdate::default()
        };
        let updated = svc.update_food_log(&log.id, &update).unwrap().unwrap();
        assert_eq!(updated.id, log.id);
        assert_eq!(updated.meal_type, MealType::Dinner);
        assert_eq!(updated.date, log.date);
        assert_eq!(updated.food, log.food);
        assert!((svc.daily_summary().unwrap().unwrap().total_calories - 500.0).abs() < 1e-9);

        let moved = FoodLogUpdate {
            date: Some(jan_second()),
            ..FoodLogUpdate::default()
        };
        svc.update_food_log(&log.id, &moved).unwrap();
        assert_eq!(svc.daily_summary().unwrap().unwrap().total_calories, 0.0);

        let reloaded = ready_service(&store);
        assert_eq!(reloaded.food_log(&log.id).unwrap().unwrap().date, jan_second());
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let svc = ready_service(MemoryStore::new());
        let update = FoodLogUpdate {
            serving_size: Some(1.0),
            ..FoodLogUpdate::default()
        };
        assert!(svc.update_food_log("missing", &update).unwrap().is_none());
        assert!(svc.store().get(FOOD_LOGS_KEY).unwrap().is_none());
        assert!(svc.daily_summary().unwrap().is_none());
    }

    #[test]
    fn test_invalid_entries_rejected() {
        let svc = ready_service(MemoryStore::new());
        assert!(matches!(
            svc.add_food_log(sample_entry(jan_first(), 0.0)),
            Err(Error::InvalidEntry(_))
        ));
        let mut zero_reference = sample_entry(jan_first(), 10.0);
        zero_reference.food.serving_size = 0.0;
        assert!(matches!(
            svc.add_food_log(zero_reference),
            Err(Error::InvalidEntry(_))
        ));

        let log = svc.add_food_log(sample_entry(jan_first(), 10.0)).unwrap();
        let bad = FoodLogUpdate {
            serving_size: Some(-5.0),
            ..FoodLogUpdate::default()
        };
        assert!(matches!(
            svc.update_food_log(&log.id, &bad),
            Err(Error::InvalidEntry(_))
        ));
        assert_eq!(svc.food_logs().unwrap(), vec![log]);
    }

    #[test]
    fn test_malformed_storage_treated_as_absent() {
        let store = MemoryStore::new();
        store.set(USER_PROFILE_KEY, "{not json").unwrap();
        store.set(FOOD_LOGS_KEY, r#"[{"id": 1}]"#).unwrap();

        let svc = NutrilogService::new(&store).with_clock(jan_first);
        let report = svc.initialize().unwrap();
        assert!(svc.is_ready());
        assert!(!report.profile_loaded);
        assert_eq!(report.recovered.len(), 2);
        assert!(
            report
                .recovered
                .iter()
                .all(|e| matches!(e, Error::StorageRead { .. }))
        );
        assert!(svc.user_profile().unwrap().is_none());
        assert!(svc.food_logs().unwrap().is_empty());

        // The next write replaces the malformed value; the raw text survives
        svc.add_food_log(sample_entry(jan_first(), 100.0)).unwrap();
        let reloaded = ready_service(&store);
        assert_eq!(reloaded.food_logs().unwrap().len(), 1);
        assert_eq!(
            store.get(&backup_key(FOOD_LOGS_KEY)).unwrap().as_deref(),
            Some(r#"[{"id": 1}]"#)
        );
        assert_eq!(
            store.get(&backup_key(USER_PROFILE_KEY)).unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn test_app_history_with_idless_nutrients_survives() {
        let store = MemoryStore::new();
        store
            .set(
                FOOD_LOGS_KEY,
                r#"[{"id":"1718000000001","date":"2024-01-01","mealType":"lunch","servingSize":150,
                    "food":{"id":"171688","name":"Apples","calories":52,"servingSize":100,
                    "servingUnit":"g","nutrients":[{},{}]}}]"#,
            )
            .unwrap();

        let svc = NutrilogService::new(&store).with_clock(jan_first);
        let report = svc.initialize().unwrap();
        assert!(report.recovered.is_empty());
        assert_eq!(report.food_logs_loaded, 1);

        svc.add_food_log(sample_entry(jan_first(), 100.0)).unwrap();
        let reloaded = ready_service(&store);
        let logs = reloaded.food_logs().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].id, "1718000000001");
        assert!((reloaded.recompute_daily_summary().unwrap().total_calories - 278.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_update_writes_nothing() {
        let store = FlakyStore::default();
        let svc = ready_service(&store);
        let log = svc.add_food_log(sample_entry(jan_first(), 100.0)).unwrap();

        store.fail_writes.store(true, Ordering::SeqCst);
        let same = svc
            .update_food_log(&log.id, &FoodLogUpdate::default())
            .unwrap()
            .unwrap();
        assert_eq!(same, log);
    }

    #[test]
    fn test_read_failure_treated_as_absent() {
        let store = FlakyStore::default();
        store.inner.set(USER_PROFILE_KEY, "{}").unwrap();
        store.fail_reads.store(true, Ordering::SeqCst);

        let svc = NutrilogService::new(store);
        let report = svc.initialize().unwrap();
        assert_eq!(report.recovered.len(), 2);
        assert!(svc.user_profile().unwrap().is_none());
        assert!(svc.food_logs().unwrap().is_empty());
    }

    #[test]
    fn test_meals_for_date() {
        let svc = ready_service(MemoryStore::new());
        let mut breakfast = sample_entry(jan_first(), 50.0);
        breakfast.meal_type = MealType::Breakfast;
        svc.add_food_log(sample_entry(jan_first(), 100.0)).unwrap();
        svc.add_food_log(breakfast).unwrap();

        let meals = svc.meals_for_date(jan_first()).unwrap();
        assert_eq!(meals.len(), 2);
        assert_eq!(meals[0].meal_type, MealType::Breakfast);
        assert_eq!(meals[1].meal_type, MealType::Lunch);
        assert!((meals[1].subtotal_calories - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_log_food_through_lookup() {
        let provider = MockProvider::new(vec![sample_food()]);
        let svc = ready_service(MemoryStore::new());

        let log = svc
            .log_food(&provider, "2345678", jan_first(), MealType::Snacks, 150.0)
            .unwrap();
        assert_eq!(log.food, sample_food());
        assert_eq!(log.meal_type, MealType::Snacks);
        assert!((svc.daily_summary().unwrap().unwrap().total_calories - 300.0).abs() < 1e-9);

        let found = provider.search_foods("yogurt").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "2345678");
    }

    #[test]
    fn test_log_food_lookup_failure_adds_nothing() {
        let provider = MockProvider::new(vec![]);
        let svc = ready_service(MemoryStore::new());

        let err = svc.log_food(&provider, "999", jan_first(), MealType::Lunch, 100.0);
        assert!(matches!(err, Err(Error::LookupFailed(_))));
        assert!(svc.food_logs().unwrap().is_empty());
        assert!(svc.store().get(FOOD_LOGS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_log_food_not_ready_skips_lookup() {
        let provider = MockProvider::new(vec![sample_food()]);
        let svc = NutrilogService::new(MemoryStore::new());

        let err = svc.log_food(&provider, "2345678", jan_first(), MealType::Lunch, 100.0);
        assert!(matches!(err, Err(Error::NotReady)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
