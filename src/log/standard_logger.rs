use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::runtime::ConfigBuilder;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

#[cfg(feature = "progress_bar")]
use super::progress_bar_encoder::PBWrapperEncoder;
use crate::infector::CONTACT_LOG_TARGET;
use crate::log::{LogConfiguration, ModuleLogConfiguration};

// Use an ISO 8601 timestamp format and color coded level tag
const DEFAULT_LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";
// Contact records are data lines, written as they are.
const CONTACT_LOG_PATTERN: &str = "{m}{n}";

impl From<&ModuleLogConfiguration> for Logger {
    fn from(module_config: &ModuleLogConfiguration) -> Self {
        Logger::builder().build(module_config.module.clone(), module_config.level)
    }
}

impl LogConfiguration {
    /// Sets the global logger to conform to this [`LogConfiguration`].
    pub(in crate::log) fn set_config(&mut self) {
        let encoder = Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN));
        // Appends an ANSI escape code to clear to end of line.
        #[cfg(feature = "progress_bar")]
        let encoder = Box::new(PBWrapperEncoder::new(encoder));
        let stdout: ConsoleAppender = ConsoleAppender::builder().encoder(encoder).build();
        let mut config: ConfigBuilder =
            Config::builder().appender(Appender::builder().build("stdout", Box::new(stdout)));

        // Add module specific configuration
        for module_config in self.module_configurations.values() {
            config = config.logger(module_config.into());
        }

        // Contact records never reach the console.
        let contact_logger = match &self.contact_log_file {
            Some(path) => {
                let file = match FileAppender::builder()
                    .encoder(Box::new(PatternEncoder::new(CONTACT_LOG_PATTERN)))
                    .append(false)
                    .build(path)
                {
                    Err(e) => {
                        panic!("failed to open contact log {}: {e}", path.display());
                    }
                    Ok(file) => file,
                };
                config = config.appender(Appender::builder().build("contacts", Box::new(file)));
                Logger::builder()
                    .appender("contacts")
                    .additive(false)
                    .build(CONTACT_LOG_TARGET, LevelFilter::Info)
            }
            None => Logger::builder()
                .additive(false)
                .build(CONTACT_LOG_TARGET, LevelFilter::Off),
        };
        config = config.logger(contact_logger);

        // The `Root` determines the global log level
        let root = Root::builder()
            .appender("stdout")
            .build(self.global_log_level);
        let new_config = match config.build(root) {
            Err(e) => {
                panic!("failed to build config: {e}");
            }
            Ok(config) => config,
        };

        match self.root_handle {
            Some(ref mut handle) => {
                // The global logger has already been initialized
                handle.set_config(new_config);
            }

            None => {
                // The global logger has not yet been initialized
                match log4rs::init_config(new_config) {
                    Ok(handle) => self.root_handle = Some(handle),
                    Err(e) => panic!("failed to install logger: {e}"),
                }
            }
        }
    }
}
