//! Configuration file loading and merging with the command line.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use arib_caption::RunConfig;
use serde::Deserialize;

use crate::context::Cli;
use crate::error::{AppError, Result};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "arib2ass.toml";

/// Configuration file format.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub drcs: DrcsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct OutputSection {
    /// Script header copied verbatim instead of the built-in one.
    pub header: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct DrcsSection {
    pub data_dir: Option<PathBuf>,
    pub conversion_table: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct LoggingSection {
    pub level: Option<String>,
}

pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read {}", path.display()), e))?;
    toml::from_str(&contents).map_err(|source| AppError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// Explicit path first, then the default file if it exists.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(|| {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        default_path.exists().then_some(default_path)
    })
}

/// `<input>` with `suffix` appended to its file name.
pub fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = input.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Everything a run needs, after merging the command line over the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub debug_log: Option<PathBuf>,
    pub verbose: bool,
    pub log_level: Option<String>,
    pub run: RunConfig,
}

impl Settings {
    pub fn resolve(cli: &Cli, file: ConfigFile) -> Self {
        let mut run = RunConfig::default();
        if let Some(header) = file.output.header {
            run.header_file = header;
        }
        if let Some(data_dir) = file.drcs.data_dir {
            run.data_dir = data_dir;
        }
        if let Some(table) = file.drcs.conversion_table {
            run.conversion_table = table;
        }

        Self {
            input: cli.file.clone(),
            output: cli
                .output
                .clone()
                .unwrap_or_else(|| sibling_path(&cli.file, ".ass")),
            debug_log: cli.debug.then(|| sibling_path(&cli.file, ".asslog")),
            verbose: cli.verbose,
            log_level: file.logging.level,
            run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("arib2ass").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_without_config() {
        let settings = Settings::resolve(&cli(&["-f", "rec.ts"]), ConfigFile::default());
        assert_eq!(settings.output, PathBuf::from("rec.ts.ass"));
        assert_eq!(settings.debug_log, None);
        assert_eq!(settings.run, RunConfig::default());
    }

    #[test]
    fn test_debug_log_path() {
        let settings = Settings::resolve(&cli(&["-f", "/tmp/rec.ts", "-d"]), ConfigFile::default());
        assert_eq!(settings.debug_log, Some(PathBuf::from("/tmp/rec.ts.asslog")));
    }

    #[test]
    fn test_load_and_merge() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[output]
header = "custom.ini"

[drcs]
data_dir = "glyphs"
conversion_table = "conv.ini"

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        let settings = Settings::resolve(&cli(&["-f", "rec.ts", "-o", "x.ass"]), config);
        assert_eq!(settings.output, PathBuf::from("x.ass"));
        assert_eq!(settings.run.header_file, PathBuf::from("custom.ini"));
        assert_eq!(settings.run.data_dir, PathBuf::from("glyphs"));
        assert_eq!(settings.run.conversion_table, PathBuf::from("conv.ini"));
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_config() {
        let config: ConfigFile = toml::from_str("[drcs]\ndata_dir = \"d\"\n").unwrap();
        assert_eq!(config.drcs.data_dir, Some(PathBuf::from("d")));
        assert_eq!(config.output, OutputSection::default());
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[drcs\ndata_dir = 1").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(AppError::Config { .. })
        ));
    }

    #[test]
    fn test_explicit_config_wins() {
        assert_eq!(
            find_config(Some(Path::new("mine.toml"))),
            Some(PathBuf::from("mine.toml"))
        );
    }
}
