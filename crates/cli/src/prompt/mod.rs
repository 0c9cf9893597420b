//! Terminal prompts used when the command line leaves something open.
//!
//! Commands and enumerated inputs are chosen from a full-screen list:
//! - Up/Down (or `j`/`k`) and the mouse wheel move the selection
//! - Enter or a click picks the highlighted entry
//! - `/` starts a fuzzy filter, Escape stops it
//! - `q`, Escape or Ctrl-C cancels
//!
//! Other inputs are read line by line from stdin and re-asked until valid.

pub mod line;
pub mod picker;
pub mod types;

use std::io::{stdin, stdout};

use ilc_core::command_definitions::Command;
use ilc_core::error::Result;
use ilc_core::input::Input;
use ilc_core::prompter::Prompter;
use itertools::Itertools;

pub use line::prompt_value;
pub use picker::pick;
pub use types::PickerEntry;

/// [`Prompter`] that talks to the user on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

/// Picker line for a command: its name and aliases, plus its description.
#[must_use]
pub fn command_entry(command: &Command) -> PickerEntry {
    let names = std::iter::once(&command.name)
        .chain(&command.aliases)
        .join(", ");
    PickerEntry::new(names, command.description.as_deref())
}

/// Picker lines for the options of a selectable input.
///
/// The bound value is shown next to a label that differs from it.
#[must_use]
pub fn option_entries(input: &Input) -> Vec<PickerEntry> {
    input
        .options
        .iter()
        .map(|option| {
            let value = (option.label != option.value).then_some(option.value.as_str());
            PickerEntry::new(option.label.clone(), value)
        })
        .collect()
}

impl Prompter for TerminalPrompter {
    fn pick_command(&mut self, commands: &[Command]) -> Result<Option<usize>> {
        let entries: Vec<PickerEntry> = commands.iter().map(command_entry).collect();
        pick("Select a command", &entries)
    }

    fn prompt_input(&mut self, input: &Input) -> Result<Option<String>> {
        if input.selectable() {
            let picked = pick(&format!("Value for {}", input.name), &option_entries(input))?;
            return Ok(picked.map(|position| input.options[position].value.clone()));
        }

        prompt_value(input, &mut stdin().lock(), &mut stdout())
    }
}
