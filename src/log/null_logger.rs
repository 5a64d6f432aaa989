//! Without the `logging` feature nothing is printed; the levels still gate the `log` macros.
use crate::log::LogSettings;

impl LogSettings {
    pub(super) fn apply(&mut self) {
        log::set_max_level(self.level);
    }
}
