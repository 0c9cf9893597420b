//! Help text for a selection.

use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::input::{Input, Inputs};
use crate::selection::Selection;

const MIN_NAME_COLUMN: usize = 15;
const COLUMN_GAP: usize = 5;

/// One line of a usage section: the names it answers to and what it does.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    names: String,
    description: String,
}

#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub description: Option<String>,
    /// How the program was invoked, e.g. `["ilc", "ilc.yml"]`, or just the config
    /// path when it was run as a script.
    pub entrypoint: Vec<String>,
    commands: Vec<Entry>,
    inputs: Vec<Entry>,
    flags: Vec<Entry>,
}

impl Usage {
    #[must_use]
    pub fn new(entrypoint: Vec<String>) -> Self {
        Self {
            entrypoint,
            ..Self::default()
        }
    }

    pub fn add_command(&mut self, name: &str, aliases: &[String], description: Option<&str>) {
        self.commands.push(Entry {
            names: std::iter::once(name).chain(aliases.iter().map(String::as_str)).join(", "),
            description: description.unwrap_or_default().to_string(),
        });
    }

    pub fn add_input(&mut self, input: &Input) {
        let mut details = Vec::new();
        if let Some(script) = &input.options_script {
            details.push(format!("options from: {script}"));
        } else if input.selectable() {
            details.push(format!(
                "options: {}",
                input.options.iter().map(|option| &option.value).join(", ")
            ));
        }
        if let Some(default) = &input.default {
            details.push(format!("default: {default}"));
        }

        let mut description = input.description.clone().unwrap_or_default();
        if !details.is_empty() {
            if !description.is_empty() {
                description.push(' ');
            }
            description.push_str(&format!("({})", details.join("; ")));
        }

        self.inputs.push(Entry {
            names: format!("-{} <{}>", input.name, input.value.kind()),
            description,
        });
    }

    /// Adds a program flag; `names` is shown as given, e.g. `-d, --debug`.
    pub fn add_flag(&mut self, names: &str, description: &str) {
        self.flags.push(Entry {
            names: names.to_string(),
            description: description.to_string(),
        });
    }

    /// Adds the chain's description, its subcommands and its merged inputs.
    pub fn import_selection(&mut self, selection: &Selection<'_>, inputs: &Inputs) {
        self.description = selection.description().map(ToString::to_string);
        self.entrypoint.extend(selection.names());

        for command in selection.available() {
            self.add_command(&command.name, &command.aliases, command.description.as_deref());
        }
        for input in inputs.iter() {
            self.add_input(input);
        }
    }

    fn synopsis(&self) -> String {
        let mut params: Vec<&str> = Vec::new();
        match self.entrypoint.split_first() {
            None => {
                if !self.flags.is_empty() {
                    params.push("[flags]");
                }
                params.push("<config>");
            }
            // Run as a script: program flags can't be passed.
            Some((config, [])) => params.push(config),
            Some((program, rest)) => {
                params.push(program);
                if !self.flags.is_empty() {
                    params.push("[flags]");
                }
                params.extend(rest.iter().map(String::as_str));
            }
        }
        if !self.commands.is_empty() {
            params.push("<commands>");
        }
        if !self.inputs.is_empty() {
            params.push("[inputs]");
        }

        params.join(" ")
    }
}

fn write_section(
    formatter: &mut Formatter<'_>,
    header: &str,
    entries: &[Entry],
) -> std::fmt::Result {
    let column = entries
        .iter()
        .map(|entry| entry.names.chars().count())
        .max()
        .unwrap_or_default()
        .max(MIN_NAME_COLUMN)
        + COLUMN_GAP;

    writeln!(formatter, "{header}")?;
    for entry in entries {
        let line = format!("  {:<column$} {}", entry.names, entry.description);
        writeln!(formatter, "{}", line.trim_end())?;
    }
    writeln!(formatter)
}

impl Display for Usage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            writeln!(formatter, "{}\n", description.trim_end())?;
        }

        writeln!(formatter, "USAGE")?;
        writeln!(formatter, "  {}\n", self.synopsis())?;

        if !self.commands.is_empty() {
            write_section(formatter, "COMMANDS", &self.commands)?;
        }
        if !self.inputs.is_empty() {
            write_section(formatter, "INPUTS", &self.inputs)?;
        }
        if !self.flags.is_empty() {
            write_section(formatter, "FLAGS", &self.flags)?;
        }

        Ok(())
    }
}
