//! Command-line argument parsing.
//!
//! Program flags come first, then the path to the command tree, then the
//! arguments that select a command and set its inputs. Everything after the
//! config path is handed to the core untouched, including tokens such as `-h`
//! or `-n`, so scripts run through a shebang line get them as input flags.

use clap::{CommandFactory, Parser};
use ilc_core::config::ENV_HISTORY_FILE;
use itertools::Itertools;

/// Command-line arguments for the `ilc` binary.
///
/// # Examples
///
/// ```rust
/// use clap::Parser;
/// use ilc_cli::cli_args::Args;
///
/// let args = Args::parse_from(["ilc", "ilc.yml", "deploy", "-env", "prod"]);
/// assert_eq!(args.config(), "ilc.yml");
/// assert_eq!(args.args(), ["deploy", "-env", "prod"]);
/// ```
#[derive(Parser, Debug)]
#[command(name = "ilc", version, about, term_width = 0)]
#[allow(clippy::struct_excessive_bools)]
pub struct Args {
    /// Print debug logging.
    #[arg(long, short = 'd', action)]
    pub debug: bool,

    /// Never prompt; fail if a command or input is left unresolved.
    #[arg(long, short = 'n', action)]
    pub non_interactive: bool,

    /// Only load and validate the config file.
    #[arg(long, action)]
    pub validate: bool,

    /// Path of the replay history file, or `-` to disable history.
    ///
    /// Defaults to `~/.ilc_history`.
    #[arg(long, env = ENV_HISTORY_FILE)]
    pub history_file: Option<String>,

    /// Number of history entries kept per config file. 0 disables recording.
    ///
    /// Falls back to `ILC_HISTSIZE`; unlimited when neither is set.
    #[arg(long)]
    pub history_size: Option<usize>,

    /// Path to the YAML command tree, then the commands to select and their
    /// input flags (`-name value`, `--name=value`).
    ///
    /// A first argument starting with `!` replays the newest history entry it prefixes.
    #[arg(
        value_name = "CONFIG [ARGS]",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command_line: Vec<String>,
}

impl Args {
    /// Path to the YAML command tree.
    #[must_use]
    pub fn config(&self) -> &str {
        self.command_line.first().map_or("", String::as_str)
    }

    /// Arguments after the config path.
    #[must_use]
    pub fn args(&self) -> &[String] {
        self.command_line.get(1..).unwrap_or_default()
    }

    /// The program's own flags as `(names, description)` pairs, for help text.
    #[must_use]
    pub fn program_flags() -> Vec<(String, String)> {
        Self::command()
            .get_arguments()
            .filter(|arg| !arg.is_positional())
            .map(|arg| {
                let names = arg
                    .get_short()
                    .map(|short| format!("-{short}"))
                    .into_iter()
                    .chain(arg.get_long().map(|long| format!("--{long}")))
                    .join(", ");
                let description = arg.get_help().map(ToString::to_string).unwrap_or_default();
                (names, description)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_values() {
        let args = Args::parse_from(["ilc", "ilc.yml"]);

        assert_eq!(args.config(), "ilc.yml");
        assert!(!args.debug);
        assert!(!args.non_interactive);
        assert!(!args.validate);
        assert!(args.history_size.is_none());
        assert!(args.args().is_empty());
    }

    #[test]
    fn test_args_config_is_required() {
        assert!(Args::try_parse_from(["ilc"]).is_err());
    }

    #[test]
    fn test_args_short_flags() {
        let args = Args::parse_from(["ilc", "-d", "-n", "ilc.yml"]);

        assert!(args.debug);
        assert!(args.non_interactive);
    }

    #[test]
    fn test_args_long_flags() {
        let args = Args::parse_from([
            "ilc",
            "--debug",
            "--non-interactive",
            "--validate",
            "--history-file",
            "/tmp/history.yml",
            "--history-size",
            "5",
            "ilc.yml",
        ]);

        assert!(args.debug);
        assert!(args.non_interactive);
        assert!(args.validate);
        assert_eq!(args.history_file.as_deref(), Some("/tmp/history.yml"));
        assert_eq!(args.history_size, Some(5));
    }

    #[test]
    fn test_args_trailing_input_flags_are_kept() {
        let args = Args::parse_from([
            "ilc", "-n", "ilc.yml", "deploy", "web", "-env", "prod", "--debug", "--replicas=3",
        ]);

        assert!(args.non_interactive);
        assert!(!args.debug);
        assert_eq!(
            args.args(),
            ["deploy", "web", "-env", "prod", "--debug", "--replicas=3"]
        );
    }

    #[test]
    fn test_args_flags_right_after_config_are_kept() {
        let args = Args::parse_from(["ilc", "ilc.yml", "-h"]);
        assert_eq!(args.config(), "ilc.yml");
        assert_eq!(args.args(), ["-h"]);

        let args = Args::parse_from(["ilc", "ilc.yml", "-n", "--debug", "deploy"]);
        assert!(!args.non_interactive);
        assert!(!args.debug);
        assert_eq!(args.args(), ["-n", "--debug", "deploy"]);
    }

    #[test]
    fn test_program_flags() {
        let flags = Args::program_flags();
        let names: Vec<&str> = flags.iter().map(|(names, _)| names.as_str()).collect();

        assert!(names.contains(&"-d, --debug"), "{names:?}");
        assert!(names.contains(&"--history-file"), "{names:?}");
        assert!(!names.iter().any(|name| name.is_empty()), "{names:?}");
    }

    #[test]
    fn test_args_replay_token() {
        let args = Args::parse_from(["ilc", "ilc.yml", "!deploy", "web"]);
        assert_eq!(args.args(), ["!deploy", "web"]);
    }
}
