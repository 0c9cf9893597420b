//! The interactive collaborator consulted when arguments leave a choice open.

use crate::command_definitions::Command;
use crate::error::Result;
use crate::input::Input;

/// Blocking prompts used while resolving a command.
///
/// Returning `Ok(None)` means the user cancelled.
pub trait Prompter {
    /// Asks the user to pick one of `commands`, returning its index.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal can't be driven.
    fn pick_command(&mut self, commands: &[Command]) -> Result<Option<usize>>;

    /// Asks the user for a raw value for `input`.
    ///
    /// Implementations should only return values that pass [`Input::validate`];
    /// the caller validates again and treats a rejected value as an input error.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal can't be driven.
    fn prompt_input(&mut self, input: &Input) -> Result<Option<String>>;
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn pick_command(&mut self, commands: &[Command]) -> Result<Option<usize>> {
        (**self).pick_command(commands)
    }

    fn prompt_input(&mut self, input: &Input) -> Result<Option<String>> {
        (**self).prompt_input(input)
    }
}

impl<P: Prompter + ?Sized> Prompter for Box<P> {
    fn pick_command(&mut self, commands: &[Command]) -> Result<Option<usize>> {
        (**self).pick_command(commands)
    }

    fn prompt_input(&mut self, input: &Input) -> Result<Option<String>> {
        (**self).prompt_input(input)
    }
}

/// A prompter for non-interactive runs. Every prompt is a cancellation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompter;

impl Prompter for NoPrompter {
    fn pick_command(&mut self, _commands: &[Command]) -> Result<Option<usize>> {
        Ok(None)
    }

    fn prompt_input(&mut self, _input: &Input) -> Result<Option<String>> {
        Ok(None)
    }
}
