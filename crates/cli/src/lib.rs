//! ilc CLI Library
//!
//! The command-line front end of ilc: argument parsing, the terminal prompts used
//! to fill in whatever the command line leaves open, and process exit handling.
//!
//! # Architecture
//!
//! - [`cli_args`]: Global flags, the config path and the arguments handed to the core
//! - [`prompt`]: Terminal [`ilc_core::prompter::Prompter`] with a fuzzy list picker
//! - [`app`]: Wiring the parsed arguments into an [`ilc_core::runner::Runner`]
//!
//! # Examples
//!
//! ```bash
//! # Pick a command and fill in its inputs interactively
//! ilc ilc.yml
//!
//! # Fully specified, never prompts
//! ilc -n ilc.yml deploy web -env prod --replicas=3
//!
//! # Show the commands and inputs available under `deploy`
//! ilc ilc.yml deploy -h
//!
//! # Replay the newest history entry starting with `deploy`
//! ilc ilc.yml '!deploy'
//! ```

pub mod app;
pub mod cli_args;
pub mod prompt;
