use std::path::PathBuf;

use clap::Parser;

/// Convert ARIB captions in an ISDB transport stream to an ASS subtitle script.
#[derive(Debug, Parser)]
#[command(name = "arib2ass", author, version, about, long_about = None)]
pub struct Cli {
    /// Input MPEG-2 transport stream.
    #[arg(short, long, value_name = "FILE")]
    pub file: PathBuf,

    /// Output ASS script.{n}
    /// Defaults to <FILE>.ass next to the input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the decoded text and raw statement bytes of every caption
    /// to <FILE>.asslog
    #[arg(short, long)]
    pub debug: bool,

    /// Configuration file path.{n}
    /// arib2ass.toml in the working directory is used if present.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_options() {
        let cli = Cli::try_parse_from(["arib2ass", "-f", "rec.ts", "-o", "out.ass", "-d", "-v"])
            .unwrap();
        assert_eq!(cli.file, PathBuf::from("rec.ts"));
        assert_eq!(cli.output, Some(PathBuf::from("out.ass")));
        assert!(cli.debug);
        assert!(cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_file_is_required() {
        let err = Cli::try_parse_from(["arib2ass", "--debug"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
