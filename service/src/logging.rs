use crate::config::Config;
use log::LevelFilter;
use simplelog::{self, ConfigBuilder};

/// Dependency modules that are silenced unless running at Trace level.
/// The HTTP stack logs every accepted socket and polled body frame, which on a
/// server holding thousands of open event streams drowns out everything else.
const FILTERED_MODULES: &[&str] = &[
    "hyper",
    "hyper_util",
    "tower",
    "tower_http",
    "axum",
    "mio",
    "tokio_util",
];

pub struct Logger {}

impl Logger {
    /// Initializes the global terminal logger at the level from `config`.
    pub fn init_logger(config: &Config) {
        let level = config.log_level_filter;

        simplelog::TermLogger::init(
            level,
            Self::build_log_config(level),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
        .expect("Failed to start simplelog");
    }

    /// RFC3339 timestamps, with [`FILTERED_MODULES`] ignored below Trace.
    fn build_log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if level < LevelFilter::Trace {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered_modules_cover_the_http_stack() {
        for module in ["hyper", "tower", "axum"] {
            assert!(
                FILTERED_MODULES.contains(&module),
                "{module} should be filtered"
            );
        }
        assert!(
            !FILTERED_MODULES.contains(&"sse"),
            "our own crates must never be filtered"
        );
    }

    #[test]
    fn test_build_log_config_for_every_level_does_not_panic() {
        for level in [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
            LevelFilter::Trace,
        ] {
            let _config = Logger::build_log_config(level);
        }
    }
}
