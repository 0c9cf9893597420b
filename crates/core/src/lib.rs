//! ilc Core Library
//!
//! This crate turns a declarative tree of commands plus partial command-line
//! arguments into a fully resolved shell invocation, prompting for whatever is
//! missing through a [`prompter::Prompter`].
//!
//! # Key Features
//!
//! - **Command Trees**: Nested commands loaded from YAML and validated on load
//! - **Typed Inputs**: String, number and boolean inputs with patterns, bounds and options
//! - **Templating**: Scripts and environment values rendered with a Go-style template syntax
//! - **Replay History**: Previous invocations recalled by argument prefix
//!
//! # Examples
//!
//! Running a command without prompting:
//!
//! ```no_run
//! use ilc_core::config::ambient_environment;
//! use ilc_core::file_handling::get_config;
//! use ilc_core::history::DisabledHistoryStore;
//! use ilc_core::prompter::NoPrompter;
//! use ilc_core::runner::{Runner, RunnerOptions};
//!
//! let config = get_config("ilc.yml")?;
//! let options = RunnerOptions {
//!     non_interactive: true,
//!     ..RunnerOptions::default()
//! };
//! let mut runner = Runner::new(&config, NoPrompter, DisabledHistoryStore, ambient_environment(), options);
//!
//! let args = vec!["deploy".to_string(), "-env".to_string(), "prod".to_string()];
//! runner.run(&args)?;
//! # Ok::<(), ilc_core::error::Error>(())
//! ```

pub mod command_definitions;
pub mod config;
pub mod environment;
pub mod error;
pub mod execution;
pub mod file_handling;
pub mod flags;
pub mod history;
pub mod input;
pub mod prompter;
pub mod runner;
pub mod selection;
pub mod template;
pub mod usage;
