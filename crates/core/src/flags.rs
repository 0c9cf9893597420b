//! Filling inputs from command-line flags and `ILC_INPUT_*` variables.
//!
//! Every input of a selection is a flag named after it. Flags may be written with
//! one or two dashes, and take their value either inline (`-env=prod`) or from the
//! next argument (`-env prod`). Boolean inputs may be given bare (`-force`).

use log::{debug, warn};

use crate::config::EnvMap;
use crate::error::{Error, Result};
use crate::input::{Inputs, ValueKind, ValueSource};

const END_OF_FLAGS: &str = "--";
const HELP_NAMES: &[&str] = &["h", "help"];

/// Whether `args` ask for help: `-h`, `--h`, `-help` or `--help` in flag-name
/// position before `--`.
///
/// Values of known flags are skipped, and an input named `h` or `help` shadows
/// the help flag.
#[must_use]
pub fn help_requested(inputs: &Inputs, args: &[String]) -> bool {
    let mut remaining = args.iter().take_while(|arg| *arg != END_OF_FLAGS);

    while let Some(arg) = remaining.next() {
        let Some((name, inline_value)) = split_flag(arg) else {
            continue;
        };

        let input = inputs.get(name).or_else(|| inputs.find_by_safe_name(name));
        match input {
            Some(input) if inline_value.is_none() && input.value.kind() != ValueKind::Boolean => {
                remaining.next();
            }
            Some(_) => {}
            None if inline_value.is_none() && HELP_NAMES.contains(&name) => return true,
            None => {}
        }
    }

    false
}

/// Seeds inputs from `ILC_INPUT_<SAFE_NAME>` variables.
///
/// Values that fail validation are logged and skipped, leaving the input for a
/// default or a prompt.
pub fn seed_from_env(inputs: &mut Inputs, env: &EnvMap) {
    for input in inputs.iter_mut() {
        let variable = input.env_name();
        let Some(raw) = env.get(&variable) else {
            continue;
        };

        match input.set(raw, ValueSource::Environment) {
            Ok(()) => debug!("Input `{}` set from `{variable}`", input.name),
            Err(e) => warn!("Ignoring `{variable}`: {e}"),
        }
    }
}

/// Applies defaults to inputs that are still unresolved.
pub fn apply_defaults(inputs: &mut Inputs) {
    for input in inputs.iter_mut() {
        if input.is_resolved() {
            continue;
        }

        if let Some(default) = input.default.clone() {
            // Defaults are validated when the config is loaded.
            if let Err(e) = input.set(&default, ValueSource::Default) {
                warn!("Ignoring default for input `{}`: {e}", input.name);
            }
        }
    }
}

fn split_flag(arg: &str) -> Option<(&str, Option<&str>)> {
    let body = arg
        .strip_prefix("--")
        .or_else(|| arg.strip_prefix('-'))
        .filter(|body| !body.is_empty() && !body.starts_with('-'))?;

    Some(match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    })
}

/// Parses flags from `args` into `inputs`.
///
/// # Errors
///
/// - [`Error::UnknownFlag`] for a flag that names no input
/// - [`Error::MissingFlagValue`] for a non-boolean flag at the end of `args`
/// - [`Error::InvalidInput`] for a value the input rejects
/// - [`Error::UnexpectedArgument`] for a positional argument
pub fn parse_flags(inputs: &mut Inputs, args: &[String]) -> Result<()> {
    let mut remaining = args.iter();

    while let Some(arg) = remaining.next() {
        if arg == END_OF_FLAGS {
            break;
        }

        let Some((name, inline_value)) = split_flag(arg) else {
            return Err(Error::UnexpectedArgument(arg.clone()));
        };

        let key = if inputs.has(name) {
            name.to_string()
        } else {
            inputs
                .find_by_safe_name(name)
                .map(|input| input.name.clone())
                .ok_or_else(|| Error::UnknownFlag(name.to_string()))?
        };

        let Some(input) = inputs.get_mut(&key) else {
            return Err(Error::UnknownFlag(name.to_string()));
        };

        let value = match inline_value {
            Some(value) => value.to_string(),
            None if input.value.kind() == ValueKind::Boolean => "true".to_string(),
            None => remaining
                .next()
                .cloned()
                .ok_or_else(|| Error::MissingFlagValue(name.to_string()))?,
        };

        input
            .set(&value, ValueSource::Flag)
            .map_err(|source| Error::InvalidInput {
                input: input.name.clone(),
                source,
            })?;
        debug!("Input `{}` set from flag", input.name);
    }

    if let Some(extra) = remaining.next() {
        return Err(Error::UnexpectedArgument(extra.clone()));
    }

    Ok(())
}
