use thiserror::Error;

use crate::input::ValueError;
use crate::template::TemplateError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("The script exited with status {}.", .code)]
    SubProcessExit { code: i32 },

    #[error("Error with sub process: {}", .0)]
    SubProcess(std::io::Error),

    #[error("Error {} {} file at `{}`: {}", .action, .file_description, .path, .original)]
    Yaml {
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    },

    #[error("IO error with {} file at path `{}`: {}", .file_description, .path, .original)]
    Io {
        file_description: String,
        path: String,
        original: std::io::Error,
    },

    #[error("STDIO error: {}", .0)]
    Stdio(#[from] std::io::Error),

    #[error("Invalid name `{}`: names must start with a letter or digit and contain only letters, digits, `-` or `_`", .0)]
    InvalidName(String),

    #[error("Found a non-unique command name or alias under {}: `{}`", .parent, .name)]
    DuplicateName { parent: String, name: String },

    #[error("Command {} defines both `run` and `commands`", .0)]
    RunWithCommands(String),

    #[error("Command {} defines neither `run` nor `commands`", .0)]
    MissingRunOrCommands(String),

    #[error("Unknown type `{}` for input `{}`", .kind, .input)]
    UnknownInputType { input: String, kind: String },

    #[error("Invalid pattern for input `{}`: {}", .input, .message)]
    InvalidPattern { input: String, message: String },

    #[error("Invalid bounds for input `{}`: min {} is greater than max {}", .input, .min, .max)]
    InvalidBounds { input: String, min: f64, max: f64 },

    #[error("Invalid default for input `{}`: {}", .input, .source)]
    InvalidDefault { input: String, source: ValueError },

    #[error("Invalid option `{}` for input `{}`: {}", .option, .input, .source)]
    InvalidOptionValue {
        input: String,
        option: String,
        source: ValueError,
    },

    #[error("Options script for input `{}` failed: {}", .input, .message)]
    OptionsScript { input: String, message: String },

    #[error("Unsupported value for {}: expected a scalar", .0)]
    NonScalarValue(String),

    #[error("Invalid subcommand: `{}`", .0)]
    UnknownCommand(String),

    #[error("Invalid command: `{}` requires a subcommand", .0)]
    InvalidCommand(String),

    #[error("Invalid value given for input `{}`: {}", .input, .source)]
    InvalidInput { input: String, source: ValueError },

    #[error("Unknown flag: `-{}`", .0)]
    UnknownFlag(String),

    #[error("Flag `-{}` requires a value", .0)]
    MissingFlagValue(String),

    #[error("Unexpected argument: `{}`", .0)]
    UnexpectedArgument(String),

    #[error("Missing inputs: {}", .0.join(", "))]
    MissingInputs(Vec<String>),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Cancelled by user")]
    Cancelled,

    #[error("Invalid replay command: no history entry matches `{}`", .0.join(" "))]
    Replay(Vec<String>),
}

impl Error {
    pub fn yaml_error(
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    ) -> Self {
        Self::Yaml {
            action,
            file_description,
            path,
            original,
        }
    }

    pub fn io_error(file_description: String, path: String, original: std::io::Error) -> Self {
        Self::Io {
            file_description,
            path,
            original,
        }
    }

    /// Exit code the binary should use for this error.
    ///
    /// A failed script keeps its own status; everything else is a generic failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SubProcessExit { code } => *code,
            _ => 1,
        }
    }
}
