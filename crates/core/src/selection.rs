//! Resolving a chain of commands from the root of a tree.

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use log::{debug, info};

use crate::command_definitions::Command;
use crate::config::DEFAULT_SHELL;
use crate::error::{Error, Result};
use crate::input::Inputs;
use crate::prompter::Prompter;

/// The commands from the root down to the targeted command.
///
/// Every element is a direct child of the one before it.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    chain: Vec<&'a Command>,
}

impl<'a> Selection<'a> {
    #[must_use]
    pub fn new(root: &'a Command) -> Self {
        Self { chain: vec![root] }
    }

    #[must_use]
    pub fn chain(&self) -> &[&'a Command] {
        &self.chain
    }

    #[must_use]
    pub fn leaf(&self) -> &'a Command {
        // The chain always holds at least the root.
        self.chain[self.chain.len() - 1]
    }

    /// Descends into the leaf's child matching `token` by name or alias.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCommand`] if the leaf has no such child.
    pub fn descend(&mut self, token: &str) -> Result<()> {
        let child = self
            .leaf()
            .child(token)
            .ok_or_else(|| Error::UnknownCommand(token.to_string()))?;
        self.chain.push(child);
        Ok(())
    }

    fn push_index(&mut self, index: usize) -> Result<()> {
        let leaf = self.leaf();
        let child = leaf
            .commands
            .get(index)
            .ok_or_else(|| Error::InvalidCommand(self.to_string()))?;
        self.chain.push(child);
        Ok(())
    }

    #[must_use]
    pub fn runnable(&self) -> bool {
        self.leaf().is_leaf()
    }

    /// The nearest explicit `pure` setting, leaf first.
    #[must_use]
    pub fn pure(&self) -> bool {
        self.chain
            .iter()
            .rev()
            .find_map(|command| command.pure)
            .unwrap_or(false)
    }

    /// The nearest non-empty shell, leaf first, falling back to `/bin/sh`.
    #[must_use]
    pub fn shell(&self) -> Vec<String> {
        self.chain
            .iter()
            .rev()
            .find(|command| !command.shell.is_empty())
            .map_or_else(
                || DEFAULT_SHELL.iter().map(ToString::to_string).collect(),
                |command| command.shell.clone(),
            )
    }

    /// Unrendered environment templates merged root to leaf.
    #[must_use]
    pub fn env(&self) -> IndexMap<String, String> {
        let mut env = IndexMap::new();
        for command in &self.chain {
            for (name, value) in &command.env {
                env.insert(name.clone(), value.clone());
            }
        }
        env
    }

    /// Inputs merged root to leaf. See [`Inputs::merge`].
    #[must_use]
    pub fn inputs(&self) -> Inputs {
        self.chain
            .iter()
            .fold(Inputs::new(), |merged, command| merged.merge(&command.inputs))
    }

    /// Children of the leaf, offered when the selection isn't runnable yet.
    #[must_use]
    pub fn available(&self) -> &'a [Command] {
        &self.leaf().commands
    }

    #[must_use]
    pub fn description(&self) -> Option<&'a str> {
        self.leaf().description.as_deref()
    }

    /// Command names of the chain without the unnamed root.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.chain
            .iter()
            .filter(|command| !command.name.is_empty())
            .map(|command| command.name.clone())
            .collect()
    }

    /// Argument vector that reproduces this run: command names, then resolved inputs.
    #[must_use]
    pub fn to_args(&self, inputs: &Inputs) -> Vec<String> {
        let mut args = self.names();
        args.extend(inputs.to_args());
        args
    }

    /// Prompts for subcommands until the selection is runnable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCommand`] when not interactive, or
    /// [`Error::Cancelled`] when the user backs out of a prompt.
    pub fn complete<P: Prompter>(&mut self, prompter: &mut P, interactive: bool) -> Result<()> {
        while !self.runnable() {
            if !interactive {
                return Err(Error::InvalidCommand(self.to_string()));
            }

            debug!("Prompting for a subcommand of `{self}`");
            match prompter.pick_command(self.available())? {
                Some(index) => self.push_index(index)?,
                None => return Err(Error::Cancelled),
            }
        }

        Ok(())
    }
}

impl Display for Selection<'_> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.names().join(" "))
    }
}

/// Walks positional arguments down a command tree.
pub struct Selector;

impl Selector {
    /// Consumes leading subcommand tokens from `args`.
    ///
    /// Stops at the first flag, at a runnable command, or when arguments run out,
    /// returning the selection and whatever arguments remain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCommand`] for a token that names no child.
    pub fn select<'a>(root: &'a Command, args: &[String]) -> Result<(Selection<'a>, Vec<String>)> {
        let mut selection = Selection::new(root);
        let mut rest = args;

        while let Some((token, remaining)) = rest.split_first() {
            if selection.runnable() || !selection.leaf().is_branch() || token.starts_with('-') {
                break;
            }

            selection.descend(token)?;
            rest = remaining;
        }

        info!("Selected `{selection}`");

        Ok((selection, rest.to_vec()))
    }
}
