//! Orchestration of a single invocation, from raw arguments to an executed script.
//!
//! A run moves through these stages:
//!
//! ```text
//! ParsingArgs → Selecting → (PromptingCommands) → ParsingInputs → (PromptingInputs)
//!     → Validating → RenderingAndExecuting → Done | Failed
//! ```
//!
//! Prompting stages are only entered when arguments leave something open, and only
//! when running interactively. A cancelled prompt ends the run with
//! [`Error::Cancelled`] before anything is executed or recorded.

use std::fmt::{Display, Formatter};

use log::{debug, info, warn};

use crate::command_definitions::Config;
use crate::config::{history_key, EnvMap, REPLAY_PREFIX};
use crate::environment::{load_script_options, PreparedCommand};
use crate::error::{Error, Result};
use crate::execution::execute_command;
use crate::flags::{apply_defaults, help_requested, parse_flags, seed_from_env};
use crate::history::{History, HistoryStore};
use crate::input::{Inputs, ValueSource};
use crate::prompter::Prompter;
use crate::selection::{Selection, Selector};
use crate::usage::Usage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ParsingArgs,
    Selecting,
    PromptingCommands,
    ParsingInputs,
    PromptingInputs,
    Validating,
    RenderingAndExecuting,
    Done,
    Failed,
}

impl Display for Stage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(match self {
            Stage::ParsingArgs => "parsing arguments",
            Stage::Selecting => "selecting command",
            Stage::PromptingCommands => "prompting for command",
            Stage::ParsingInputs => "parsing inputs",
            Stage::PromptingInputs => "prompting for inputs",
            Stage::Validating => "validating",
            Stage::RenderingAndExecuting => "rendering and executing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    pub non_interactive: bool,
    /// Entries kept per config in history. `Some(0)` disables recording.
    pub history_limit: Option<usize>,
    /// How the program was invoked, shown in help text.
    pub entrypoint: Vec<String>,
    /// The program's own flags as `(names, description)`, listed under FLAGS in help.
    pub program_flags: Vec<(String, String)>,
}

/// What a run ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The script ran and exited successfully.
    Executed,
    /// Help was requested; holds the usage text.
    Help(String),
}

/// A selection with fully resolved inputs.
#[derive(Debug, Clone)]
pub struct Resolution<'c> {
    pub selection: Selection<'c>,
    pub inputs: Inputs,
}

impl Resolution<'_> {
    /// Argument vector that reproduces this resolution without prompts.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        self.selection.to_args(&self.inputs)
    }
}

/// Either a resolution ready to run, or help text.
#[derive(Debug, Clone)]
pub enum Resolved<'c> {
    Ready(Resolution<'c>),
    Help(String),
}

pub struct Runner<'c, P, H> {
    config: &'c Config,
    prompter: P,
    history_store: H,
    env: EnvMap,
    options: RunnerOptions,
    stage: Stage,
}

impl<'c, P: Prompter, H: HistoryStore> Runner<'c, P, H> {
    pub fn new(
        config: &'c Config,
        prompter: P,
        history_store: H,
        env: EnvMap,
        options: RunnerOptions,
    ) -> Self {
        Self {
            config,
            prompter,
            history_store,
            env,
            options,
            stage: Stage::ParsingArgs,
        }
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        debug!("Stage: {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    fn interactive(&self) -> bool {
        !self.options.non_interactive
    }

    fn history_path(&self) -> String {
        history_key(&self.config.path)
    }

    /// Runs the invocation described by `args` to completion.
    ///
    /// # Errors
    ///
    /// Returns the first error of any stage. A failing script is reported as
    /// [`Error::SubProcessExit`] with its own exit code.
    pub fn run(&mut self, args: &[String]) -> Result<Outcome> {
        let result = self.run_stages(args);

        match &result {
            Ok(_) => self.enter(Stage::Done),
            Err(e) => {
                debug!("Run failed while {}: {e}", self.stage);
                self.enter(Stage::Failed);
            }
        }

        result
    }

    fn run_stages(&mut self, args: &[String]) -> Result<Outcome> {
        self.enter(Stage::ParsingArgs);

        let replay = is_replay(args);
        let mut history = match self.history_store.load() {
            Ok(history) => Some(history),
            Err(e) if !replay => {
                warn!("Couldn't read history, it won't be updated: {e}");
                None
            }
            Err(e) => return Err(e),
        };

        let args = match (&history, replay) {
            (Some(history), true) => self.replay_args(history, args)?,
            _ => args.to_vec(),
        };

        let resolution = match self.resolve(&args)? {
            Resolved::Ready(resolution) => resolution,
            Resolved::Help(usage) => return Ok(Outcome::Help(usage)),
        };

        self.enter(Stage::RenderingAndExecuting);
        let prepared = self.prepare(&resolution)?;
        execute_command(&prepared)?;

        if let Some(history) = history.as_mut() {
            self.record(history, resolution.to_args());
        }

        Ok(Outcome::Executed)
    }

    fn replay_args(&self, history: &History, args: &[String]) -> Result<Vec<String>> {
        let mut query = args.to_vec();
        let stripped = query
            .first()
            .and_then(|first| first.strip_prefix(REPLAY_PREFIX))
            .map(str::to_string);
        match stripped {
            Some(name) if name.is_empty() => {
                query.remove(0);
            }
            Some(name) => query[0] = name,
            None => {}
        }

        let found = history
            .lookup(&self.history_path(), &query)
            .cloned()
            .ok_or(Error::Replay(query))?;

        info!("Replaying using arguments: {}", found.join(" "));
        Ok(found)
    }

    /// Resolves `args` into a runnable selection with every input set.
    ///
    /// # Errors
    ///
    /// Returns selection, input, missing-input or cancellation errors.
    pub fn resolve(&mut self, args: &[String]) -> Result<Resolved<'c>> {
        let config = self.config;

        self.enter(Stage::Selecting);
        info!("Running with arguments: {}", args.join(" "));
        let (mut selection, rest) = Selector::select(&config.root, args)?;

        if help_requested(&selection.inputs(), &rest) {
            debug!("Detected help flag whilst parsing arguments for `{selection}`");
            return Ok(Resolved::Help(self.usage(&selection)));
        }

        if !selection.runnable() {
            self.enter(Stage::PromptingCommands);
            let interactive = self.interactive();
            selection.complete(&mut self.prompter, interactive)?;
            info!("Selected `{selection}`");
        }

        self.enter(Stage::ParsingInputs);
        let mut inputs = selection.inputs();
        load_script_options(&mut inputs, &selection.shell())?;
        seed_from_env(&mut inputs, &self.env);
        parse_flags(&mut inputs, &rest)?;
        apply_defaults(&mut inputs);

        let missing = inputs.unresolved();
        if !missing.is_empty() {
            if !self.interactive() {
                return Err(Error::MissingInputs(missing));
            }

            self.enter(Stage::PromptingInputs);
            self.prompt_inputs(&mut inputs, &missing)?;
        }

        self.enter(Stage::Validating);
        validate(&inputs)?;

        Ok(Resolved::Ready(Resolution { selection, inputs }))
    }

    fn prompt_inputs(&mut self, inputs: &mut Inputs, names: &[String]) -> Result<()> {
        for name in names {
            let Some(input) = inputs.get_mut(name) else {
                continue;
            };

            let raw = self.prompter.prompt_input(input)?.ok_or(Error::Cancelled)?;
            input
                .set(&raw, ValueSource::Prompt)
                .map_err(|source| Error::InvalidInput {
                    input: name.clone(),
                    source,
                })?;
        }

        Ok(())
    }

    /// Renders the resolution into a command, writing the script file.
    ///
    /// # Errors
    ///
    /// Returns a template error or an IO error writing the script.
    pub fn prepare(&self, resolution: &Resolution<'_>) -> Result<PreparedCommand> {
        let prepared = PreparedCommand::new(&resolution.selection, &resolution.inputs, &self.env)?;
        debug!("Rendered script for `{}`:\n{}", resolution.selection, prepared.script);
        Ok(prepared)
    }

    fn usage(&self, selection: &Selection<'_>) -> String {
        let mut usage = Usage::new(self.options.entrypoint.clone());
        for (names, description) in &self.options.program_flags {
            usage.add_flag(names, description);
        }
        usage.import_selection(selection, &selection.inputs());
        usage.to_string()
    }

    fn record(&self, history: &mut History, args: Vec<String>) {
        if self.options.history_limit == Some(0) {
            debug!("History size is 0, not recording");
            return;
        }

        let path = self.history_path();
        history.append(&path, args);
        if let Some(limit) = self.options.history_limit {
            history.truncate(limit);
        }

        if let Err(e) = self.history_store.save(history) {
            warn!("Failed to save to history: {e}");
        }
    }
}

fn is_replay(args: &[String]) -> bool {
    args.first()
        .is_some_and(|first| first.starts_with(REPLAY_PREFIX))
}

fn validate(inputs: &Inputs) -> Result<()> {
    let missing = inputs.unresolved();
    if !missing.is_empty() {
        return Err(Error::MissingInputs(missing));
    }

    for input in inputs.iter() {
        input
            .validate(&input.value.to_string())
            .map_err(|source| Error::InvalidInput {
                input: input.name.clone(),
                source,
            })?;
    }

    Ok(())
}
