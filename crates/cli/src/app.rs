//! Wiring of parsed arguments into a run.

use ilc_core::config::{ambient_environment, get_history_path, get_history_size, EnvMap};
use ilc_core::error::{Error, Result};
use ilc_core::file_handling::get_config;
use ilc_core::history::{DisabledHistoryStore, FileHistoryStore, HistoryStore};
use ilc_core::prompter::{NoPrompter, Prompter};
use ilc_core::runner::{Outcome, Runner, RunnerOptions};
use log::{debug, info};

use crate::cli_args::Args;
use crate::prompt::TerminalPrompter;

const PROGRAM_NAME: &str = "ilc";
/// Set by the invoking shell to the path of the command it ran.
const ENV_LAST_COMMAND: &str = "_";

/// How the program was invoked: just `config` when the shell ran the config file
/// itself through a shebang line, `ilc <config>` otherwise.
#[must_use]
pub fn entrypoint(config: &str, env: &EnvMap) -> Vec<String> {
    if env.get(ENV_LAST_COMMAND).is_some_and(|command| command == config) {
        debug!("Detected the config file as entrypoint");
        vec![config.to_string()]
    } else {
        vec![PROGRAM_NAME.to_string(), config.to_string()]
    }
}

/// Runner options for `args`, given the ambient environment.
#[must_use]
pub fn runner_options(args: &Args, env: &EnvMap) -> RunnerOptions {
    RunnerOptions {
        non_interactive: args.non_interactive,
        history_limit: get_history_size(args.history_size, env),
        entrypoint: entrypoint(args.config(), env),
        program_flags: Args::program_flags(),
    }
}

/// History store for `args`; disabled when the history path is `-`.
#[must_use]
pub fn history_store(args: &Args, env: &EnvMap) -> Box<dyn HistoryStore> {
    match get_history_path(args.history_file.as_deref(), env) {
        Some(path) => {
            debug!("History path: `{path}`");
            Box::new(FileHistoryStore::new(path))
        }
        None => {
            info!("History is disabled");
            Box::new(DisabledHistoryStore)
        }
    }
}

fn prompter(args: &Args) -> Box<dyn Prompter> {
    if args.non_interactive {
        Box::new(NoPrompter)
    } else {
        Box::new(TerminalPrompter)
    }
}

/// Loads the config and runs the invocation described by `args`.
///
/// # Errors
///
/// Returns the first error of loading or running. A failing script is reported
/// as [`Error::SubProcessExit`].
pub fn execute(args: &Args) -> Result<()> {
    let config = get_config(args.config())?;
    debug!("Config path: `{}`", config.path);

    if args.validate {
        println!("configuration is valid");
        return Ok(());
    }

    let env = ambient_environment();
    let options = runner_options(args, &env);
    let history_store = history_store(args, &env);

    let mut runner = Runner::new(&config, prompter(args), history_store, env, options);
    if let Outcome::Help(usage) = runner.run(args.args())? {
        print!("{usage}");
    }

    Ok(())
}

/// Process exit status for the result of [`execute`], printing any error.
///
/// A failing script keeps its own exit code and prints nothing further.
#[must_use]
pub fn exit_status(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(Error::SubProcessExit { code }) => {
            debug!("Script exited with {code}");
            u8::try_from(*code).unwrap_or(1)
        }
        Err(e) => {
            eprintln!("{e}");
            u8::try_from(e.exit_code()).unwrap_or(1)
        }
    }
}
