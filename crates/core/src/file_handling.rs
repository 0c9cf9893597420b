//! File handling and validation for ilc configuration and history files.
//!
//! This module reads command trees from YAML, validates names and structure, and
//! reads and writes the replay history.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use regex::Regex;

use crate::command_definitions::{Command, CommandDocument, Config};
use crate::error::Error::{DuplicateName, InvalidName, MissingRunOrCommands, RunWithCommands};
use crate::error::{Error, Result};
use crate::history::History;

fn get_reader(file_description: &str, path: &str) -> Result<File> {
    match File::open(path) {
        Ok(reader) => Ok(reader),
        Err(e) => Err(Error::io_error(
            file_description.to_string(),
            path.to_string(),
            e,
        )),
    }
}

fn get_history_reader(history_path: &str) -> Result<Option<File>> {
    if !Path::exists(Path::new(history_path)) {
        return Ok(None);
    }

    get_reader("history", history_path).map(Some)
}

/// Reads the replay history from disk.
///
/// A missing or empty file is an empty history.
///
/// # Errors
///
/// Returns an error if:
/// - The file exists but cannot be read
/// - The file contains invalid YAML
pub fn get_history(history_path: &str) -> Result<History> {
    let Some(mut history_reader) = get_history_reader(history_path)? else {
        return Ok(History::default());
    };

    let mut contents = String::new();
    history_reader
        .read_to_string(&mut contents)
        .map_err(|e| Error::io_error("history".to_string(), history_path.to_string(), e))?;

    if contents.trim().is_empty() {
        return Ok(History::default());
    }

    serde_yaml::from_str(&contents).map_err(|e| {
        Error::yaml_error(
            "reading".to_string(),
            "history".to_string(),
            history_path.to_string(),
            e,
        )
    })
}

/// Writes the replay history to disk, replacing the file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or the history cannot be serialized.
pub fn write_history(history_path: &str, history: &History) -> Result<()> {
    let file = File::create(history_path)
        .map_err(|e| Error::io_error("history".to_string(), history_path.to_string(), e))?;

    serde_yaml::to_writer(file, history).map_err(|e| {
        Error::yaml_error(
            "writing".to_string(),
            "history".to_string(),
            history_path.to_string(),
            e,
        )
    })
}

/// Names start with a letter or digit, followed by letters, digits, `-` or `_`.
const NAME_PATTERN: &str = "^[a-zA-Z0-9][a-zA-Z0-9_-]*$";

fn validate_name(name: &str) -> Result<()> {
    let valid = Regex::new(NAME_PATTERN).is_ok_and(|pattern| pattern.is_match(name));

    if valid {
        Ok(())
    } else {
        Err(InvalidName(name.to_string()))
    }
}

fn describe(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        format!("`{path}`")
    }
}

fn validate_command(command: &Command, path: &str) -> Result<()> {
    match (command.run.is_some(), command.is_branch()) {
        (true, true) => return Err(RunWithCommands(describe(path))),
        (false, false) => return Err(MissingRunOrCommands(describe(path))),
        _ => {}
    }

    for input in command.inputs.iter() {
        validate_name(&input.name)?;
    }

    let mut names = HashSet::new();
    for child in &command.commands {
        for name in std::iter::once(&child.name).chain(child.aliases.iter()) {
            validate_name(name)?;

            if !names.insert(name.clone()) {
                // Found a duplicate name or alias
                return Err(DuplicateName {
                    parent: describe(path),
                    name: name.clone(),
                });
            }
        }

        let child_path = if path.is_empty() {
            child.name.clone()
        } else {
            format!("{path} {}", child.name)
        };
        validate_command(child, &child_path)?;
    }

    Ok(())
}

/// Parses and validates a command tree from YAML text.
///
/// # Errors
///
/// Returns an error if the YAML is malformed or the tree fails validation.
pub fn parse_config(config_path: &str, contents: &str) -> Result<Config> {
    let document: CommandDocument = serde_yaml::from_str(contents).map_err(|e| {
        Error::yaml_error(
            "reading".to_string(),
            "config".to_string(),
            config_path.to_string(),
            e,
        )
    })?;

    let root = document.into_command(String::new())?;
    validate_command(&root, "")?;

    debug!(
        "Loaded config `{config_path}` with {} top-level commands",
        root.commands.len()
    );

    Ok(Config {
        path: config_path.to_string(),
        root,
    })
}

/// Loads and validates a command tree from a configuration file.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file cannot be read
/// - The YAML is malformed or doesn't match the expected structure
/// - A command or input name is invalid, or a sibling name/alias is repeated
/// - A command has both or neither of `run` and `commands`
/// - An input has an unknown type, bad pattern, inverted bounds, or invalid default
///
/// # Examples
///
/// ```no_run
/// use ilc_core::file_handling::get_config;
///
/// let config = get_config("ilc.yml")?;
/// for command in &config.root.commands {
///     println!("Command: {}", command);
/// }
/// # Ok::<(), ilc_core::error::Error>(())
/// ```
pub fn get_config(config_path: &str) -> Result<Config> {
    let expanded = shellexpand::tilde(config_path).to_string();
    let mut config_reader = get_reader("config", &expanded)?;

    let mut contents = String::new();
    config_reader
        .read_to_string(&mut contents)
        .map_err(|e| Error::io_error("config".to_string(), expanded.clone(), e))?;

    parse_config(&expanded, &contents)
}
