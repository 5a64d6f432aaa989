use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use crate::log::LogSettings;

// ISO 8601 timestamp, colored level, module path.
const PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";

impl LogSettings {
    fn build_config(&self) -> Result<Config, log4rs::config::runtime::ConfigErrors> {
        let console = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build();
        let loggers = self
            .module_levels
            .iter()
            .map(|(module, level)| Logger::builder().build(module.clone(), *level));
        Config::builder()
            .appender(Appender::builder().build("console", Box::new(console)))
            .loggers(loggers)
            .build(Root::builder().appender("console").build(self.level))
    }

    /// Installs the console logger on first use and reconfigures it afterwards.
    pub(super) fn apply(&mut self) {
        let config = match self.build_config() {
            Ok(config) => config,
            Err(errors) => {
                eprintln!("invalid log configuration: {errors}");
                return;
            }
        };
        match &self.handle {
            Some(handle) => handle.set_config(config),
            // The host program may already have installed its own logger.
            None => match log4rs::init_config(config) {
                Ok(handle) => self.handle = Some(handle),
                Err(error) => eprintln!("failed to install logger: {error}"),
            },
        }
    }
}
