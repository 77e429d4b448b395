//! Console logging setup.

use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Level used when neither `--verbose` nor the config file says otherwise.
pub fn default_level(verbose: bool, level: Option<&str>) -> LevelFilter {
    if verbose {
        return LevelFilter::Debug;
    }
    level.and_then(parse_level).unwrap_or(LevelFilter::Info)
}

/// Initialise `env_logger`. `RUST_LOG` overrides the computed level.
pub fn init_logging(verbose: bool, level: Option<&str>) {
    let _ = Builder::new()
        .filter_level(default_level(verbose, level))
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {:5} {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .try_init();
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    level.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(false, None), LevelFilter::Info);
        assert_eq!(default_level(false, Some("warn")), LevelFilter::Warn);
        assert_eq!(default_level(false, Some("DEBUG")), LevelFilter::Debug);
        assert_eq!(default_level(false, Some("loud")), LevelFilter::Info);
        assert_eq!(default_level(true, Some("error")), LevelFilter::Debug);
    }
}
