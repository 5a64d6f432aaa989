//! Logging for simulation runs. Logging describes what a run is doing; the daily aggregate
//! counts are recorded separately through `crate::report`.
//!
//! The five `log` macros are re-exported here. The stepper emits `trace!` for every exposure,
//! promotion and terminal outcome, and one `info!` summary per simulated day.
//!
//! Logging is off until a level is set:
//!
//! ```rust
//! use epinet::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! // Daily summaries from every module.
//! set_log_level(LevelFilter::Info);
//! // Every individual transition from the stepper and the population store.
//! set_module_filter("epinet::epidemic", LevelFilter::Trace);
//! set_module_filter("epinet::population", LevelFilter::Trace);
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};

use std::sync::{LazyLock, Mutex, MutexGuard};

use crate::HashMap;

// Stream creation is traced once per stream and seed; keep it out of trace-level runs.
const QUIET_MODULES: [(&str, LevelFilter); 1] = [("epinet::random", LevelFilter::Info)];

static LOG_SETTINGS: LazyLock<Mutex<LogSettings>> = LazyLock::new(Mutex::default);

/// The global level plus per-module overrides, keyed by module path. There is one instance,
/// behind `LOG_SETTINGS`; every change is pushed to the installed logger.
#[derive(Debug)]
struct LogSettings {
    level: LevelFilter,
    module_levels: HashMap<String, LevelFilter>,
    #[cfg(feature = "logging")]
    handle: Option<log4rs::Handle>,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: LevelFilter::Off,
            module_levels: QUIET_MODULES
                .iter()
                .map(|(module, level)| ((*module).to_string(), *level))
                .collect(),
            #[cfg(feature = "logging")]
            handle: None,
        }
    }
}

impl LogSettings {
    fn update(&mut self, change: impl FnOnce(&mut Self) -> bool) {
        if change(self) {
            self.apply();
        }
    }
}

fn settings() -> MutexGuard<'static, LogSettings> {
    LOG_SETTINGS
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Turns on every log message. Same as `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Same as `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the level for modules without their own filter.
pub fn set_log_level(level: LevelFilter) {
    settings().update(|settings| {
        settings.level = level;
        true
    });
}

/// Sets the level for one module path, e.g. `"epinet::network"`.
pub fn set_module_filter(module: &str, level: LevelFilter) {
    set_module_filters(&[(module, level)]);
}

/// Sets several module filters with a single logger reconfiguration.
pub fn set_module_filters(filters: &[(&str, LevelFilter)]) {
    settings().update(|settings| {
        let mut changed = false;
        for (module, level) in filters {
            let previous = settings.module_levels.insert((*module).to_string(), *level);
            changed |= previous != Some(*level);
        }
        changed
    });
}

/// Drops the filter for `module`, which then follows the global level.
pub fn remove_module_filter(module: &str) {
    settings().update(|settings| settings.module_levels.remove(module).is_some());
}
