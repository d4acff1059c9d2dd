use crate::engine::{CalibrationSet, Tuning};
use crate::error::AppError;
use crate::record::Population;
use std::sync::{Arc, RwLock, RwLockReadGuard};

/// Read access to the shared state, surfacing lock poisoning as an error.
pub fn read(state: &Arc<RwLock<AppState>>) -> Result<RwLockReadGuard<'_, AppState>, AppError> {
    state.read().map_err(|_| AppError::StateLock)
}

/// Shared application state behind an `Arc<RwLock<_>>`.
///
/// Replacing the population rebuilds calibration in the same call, so a
/// reader can never observe a table that is stale for the loaded snapshot.
#[derive(Debug)]
pub struct AppState {
    tuning: Arc<Tuning>,
    population: Option<Arc<Population>>,
    calibration: Option<Arc<CalibrationSet>>,
    report_extremes: usize,
}

impl AppState {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            tuning: Arc::new(tuning),
            population: None,
            calibration: None,
            report_extremes: crate::config::DEFAULT_REPORT_EXTREMES,
        }
    }

    pub fn report_extremes(&self) -> usize {
        self.report_extremes
    }

    pub fn set_report_extremes(&mut self, extremes: usize) {
        self.report_extremes = extremes;
    }

    pub fn tuning(&self) -> &Arc<Tuning> {
        &self.tuning
    }

    pub fn population(&self) -> Option<&Arc<Population>> {
        self.population.as_ref()
    }

    pub fn calibration(&self) -> Option<&Arc<CalibrationSet>> {
        self.calibration.as_ref()
    }

    /// Installs a population snapshot and its freshly built calibration set.
    pub fn set_population(&mut self, population: Population) {
        let calibration = CalibrationSet::build(&population, &self.tuning);
        self.population = Some(Arc::new(population));
        self.calibration = Some(Arc::new(calibration));
    }

    /// Population and matching calibration, or an error when nothing is loaded.
    pub fn loaded(&self) -> Result<(Arc<Population>, Arc<CalibrationSet>), AppError> {
        match (&self.population, &self.calibration) {
            (Some(population), Some(calibration)) => {
                Ok((Arc::clone(population), Arc::clone(calibration)))
            }
            _ => Err(AppError::NoPopulation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RestaurantRecord;

    fn record(name: &str) -> RestaurantRecord {
        RestaurantRecord {
            name: name.to_string(),
            rating: 4.2,
            review_count: 150,
            price_level: Some(2),
            has_booking_link: true,
            format_tags: Vec::new(),
            prestige: None,
            press_links: Vec::new(),
            borough: None,
        }
    }

    #[test]
    fn fresh_state_has_nothing_loaded() {
        let state = AppState::new(Tuning::default());
        assert!(state.population().is_none());
        assert!(state.loaded().is_err());
    }

    #[test]
    fn set_population_builds_matching_calibration() {
        let mut state = AppState::new(Tuning::default());
        state.set_population(Population::new(vec![record("A"), record("B")]));

        let (population, calibration) = state.loaded().expect("loaded");
        assert!(calibration.matches(&population));
    }

    #[test]
    fn poisoned_lock_reads_as_state_lock_error() {
        let state = Arc::new(RwLock::new(AppState::new(Tuning::default())));
        let state_for_thread = Arc::clone(&state);
        let _ = std::thread::spawn(move || {
            let _guard = state_for_thread.write().expect("lock for poison");
            panic!("poison lock");
        })
        .join();

        assert!(matches!(read(&state), Err(AppError::StateLock)));
    }

    #[test]
    fn replacing_population_replaces_calibration() {
        let mut state = AppState::new(Tuning::default());
        state.set_population(Population::new(vec![record("A")]));
        let (first_pop, _) = state.loaded().expect("loaded");

        state.set_population(Population::new(vec![record("A"), record("B")]));
        let (second_pop, second_cal) = state.loaded().expect("loaded");

        assert_ne!(first_pop.version(), second_pop.version());
        assert!(second_cal.matches(&second_pop));
        assert!(!second_cal.matches(&first_pop));
    }
}
