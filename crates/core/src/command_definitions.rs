use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::input::{
    BooleanValue, Input, InputOption, Inputs, NumberValue, StringValue, Value,
};

/// A node of the command tree.
///
/// A command is either a leaf with a `run` script or a branch with child
/// `commands`, never both. The root of a loaded config has an empty name.
#[derive(Debug, Clone, Default)]
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub run: Option<String>,
    pub shell: Vec<String>,
    pub env: IndexMap<String, String>,
    pub pure: Option<bool>,
    pub inputs: Inputs,
    pub commands: Vec<Command>,
    pub aliases: Vec<String>,
}

impl Command {
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.run.is_some() && self.commands.is_empty()
    }

    #[must_use]
    pub fn is_branch(&self) -> bool {
        !self.commands.is_empty()
    }

    /// Whether `token` is this command's name or one of its aliases.
    #[must_use]
    pub fn answers_to(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|alias| alias == token)
    }

    /// Finds a direct child by name or alias.
    #[must_use]
    pub fn child(&self, token: &str) -> Option<&Command> {
        self.commands.iter().find(|command| command.answers_to(token))
    }
}

impl Display for Command {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            formatter.write_str("<root>")
        } else {
            formatter.write_str(&self.name)
        }
    }
}

/// A loaded and validated command tree along with the file it came from.
#[derive(Debug, Clone)]
pub struct Config {
    pub path: String,
    pub root: Command,
}

/// Raw command entry: either a bare script string or a full definition.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum CommandEntry {
    Script(String),
    Definition(Box<CommandDocument>),
}

#[derive(Deserialize, Debug, Default)]
pub struct CommandDocument {
    pub description: Option<String>,
    pub run: Option<String>,
    #[serde(default)]
    pub shell: Vec<String>,
    #[serde(default)]
    pub env: IndexMap<String, serde_yaml::Value>,
    pub pure: Option<bool>,
    #[serde(default)]
    pub inputs: IndexMap<String, Option<InputEntry>>,
    #[serde(default)]
    pub commands: IndexMap<String, CommandEntry>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Raw input entry: either a bare type name or a full definition.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum InputEntry {
    Type(String),
    Definition(InputDocument),
}

#[derive(Deserialize, Debug, Default)]
pub struct InputDocument {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub default: Option<serde_yaml::Value>,
    pub pattern: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub options: Option<OptionsEntry>,
}

/// Options are a list of values (label = value), an ordered label → value map, or a
/// script printing one value per line.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum OptionsEntry {
    List(Vec<serde_yaml::Value>),
    Map(IndexMap<String, serde_yaml::Value>),
    Script(String),
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn required_scalar(value: &serde_yaml::Value, what: impl FnOnce() -> String) -> Result<String> {
    scalar_text(value).ok_or_else(|| Error::NonScalarValue(what()))
}

impl CommandEntry {
    /// Converts the raw entry into a [`Command`] with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if an input definition is malformed (unknown type, bad
    /// pattern, inverted bounds, non-scalar values).
    pub fn into_command(self, name: String) -> Result<Command> {
        match self {
            CommandEntry::Script(run) => Ok(Command {
                name,
                run: Some(run),
                ..Command::default()
            }),
            CommandEntry::Definition(document) => document.into_command(name),
        }
    }
}

impl CommandDocument {
    /// See [`CommandEntry::into_command`].
    ///
    /// # Errors
    ///
    /// Returns an error if an input or environment value is malformed.
    pub fn into_command(self, name: String) -> Result<Command> {
        let mut env = IndexMap::new();
        for (key, value) in &self.env {
            let text = required_scalar(value, || format!("environment variable `{key}`"))?;
            env.insert(key.clone(), text);
        }

        let mut inputs = Inputs::new();
        for (input_name, entry) in self.inputs {
            let document = match entry {
                None => InputDocument::default(),
                Some(InputEntry::Type(kind)) => InputDocument {
                    kind: Some(kind),
                    ..InputDocument::default()
                },
                Some(InputEntry::Definition(document)) => document,
            };
            inputs.insert(document.into_input(input_name)?);
        }

        let mut commands = Vec::with_capacity(self.commands.len());
        for (command_name, entry) in self.commands {
            commands.push(entry.into_command(command_name)?);
        }

        Ok(Command {
            name,
            description: self.description,
            run: self.run,
            shell: self.shell,
            env,
            pure: self.pure,
            inputs,
            commands,
            aliases: self.aliases,
        })
    }
}

impl InputDocument {
    fn new_value(&self, name: &str) -> Result<Value> {
        match self.kind.as_deref().unwrap_or("string") {
            "string" => {
                let pattern = match &self.pattern {
                    Some(pattern) => {
                        Some(Regex::new(pattern).map_err(|e| Error::InvalidPattern {
                            input: name.to_string(),
                            message: e.to_string(),
                        })?)
                    }
                    None => None,
                };
                Ok(Value::String(StringValue {
                    value: String::new(),
                    pattern,
                }))
            }
            "number" => {
                if let (Some(min), Some(max)) = (self.min, self.max) {
                    if min > max {
                        return Err(Error::InvalidBounds {
                            input: name.to_string(),
                            min,
                            max,
                        });
                    }
                }
                Ok(Value::Number(NumberValue {
                    value: 0.0,
                    min: self.min,
                    max: self.max,
                }))
            }
            "boolean" => Ok(Value::Boolean(BooleanValue::default())),
            other => Err(Error::UnknownInputType {
                input: name.to_string(),
                kind: other.to_string(),
            }),
        }
    }

    fn options(&self, name: &str, value: &Value) -> Result<Vec<InputOption>> {
        let options = match &self.options {
            Some(OptionsEntry::List(values)) => values
                .iter()
                .map(|value| {
                    let text = required_scalar(value, || format!("option of input `{name}`"))?;
                    Ok(InputOption::new(text.clone(), text))
                })
                .collect::<Result<Vec<_>>>()?,
            Some(OptionsEntry::Map(entries)) => entries
                .iter()
                .map(|(label, value)| {
                    let text =
                        required_scalar(value, || format!("option `{label}` of input `{name}`"))?;
                    Ok(InputOption::new(label.clone(), text))
                })
                .collect::<Result<Vec<_>>>()?,
            Some(OptionsEntry::Script(_)) => Vec::new(),
            None if matches!(value, Value::Boolean(_)) => vec![
                InputOption::new("Yes", "true"),
                InputOption::new("No", "false"),
            ],
            None => Vec::new(),
        };

        for option in &options {
            value
                .parse(&option.value)
                .map_err(|source| Error::InvalidOptionValue {
                    input: name.to_string(),
                    option: option.value.clone(),
                    source,
                })?;
        }

        Ok(options)
    }

    /// Builds a typed [`Input`], validating the default and options against it.
    ///
    /// # Errors
    ///
    /// Returns a config error if the type, pattern, bounds, options or default are invalid.
    pub fn into_input(self, name: String) -> Result<Input> {
        let mut value = self.new_value(&name)?;
        let options = self.options(&name, &value)?;
        let options_script = match &self.options {
            Some(OptionsEntry::Script(script)) => Some(script.clone()),
            _ => None,
        };

        let default = match &self.default {
            Some(default) => Some(required_scalar(default, || {
                format!("default of input `{name}`")
            })?),
            None => None,
        };

        let mut input = Input {
            name: name.clone(),
            description: self.description,
            value: Value::default(),
            options,
            options_script,
            default: None,
            source: None,
        };

        if let Some(default) = &default {
            value
                .set(default)
                .map_err(|source| Error::InvalidDefault {
                    input: name.clone(),
                    source,
                })?;
        }
        input.value = value;

        if let Some(default) = &default {
            input
                .validate(default)
                .map_err(|source| Error::InvalidDefault {
                    input: name.clone(),
                    source,
                })?;
        }
        input.default = default;

        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Primitive, ValueKind};

    fn parse_document(yaml: &str) -> Command {
        let document: CommandDocument = serde_yaml::from_str(yaml).unwrap();
        document.into_command(String::new()).unwrap()
    }

    #[test]
    fn test_bare_string_command_is_run_shorthand() {
        let root = parse_document(
            r#"
commands:
  hello: echo hello
"#,
        );
        let hello = root.child("hello").unwrap();
        assert_eq!(hello.run.as_deref(), Some("echo hello"));
        assert!(hello.is_leaf());
        assert!(root.is_branch());
    }

    #[test]
    fn test_bare_string_input_is_type_shorthand() {
        let root = parse_document(
            r#"
run: echo
inputs:
  count: number
  name:
"#,
        );
        assert_eq!(
            root.inputs.get("count").unwrap().value.kind(),
            ValueKind::Number
        );
        assert_eq!(
            root.inputs.get("name").unwrap().value.kind(),
            ValueKind::String
        );
    }

    #[test]
    fn test_commands_and_inputs_keep_document_order() {
        let root = parse_document(
            r#"
commands:
  zeta: echo z
  alpha: echo a
  mid:
    run: echo m
    inputs:
      b: string
      a: string
"#,
        );
        let names: Vec<&str> = root.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(root.child("mid").unwrap().inputs.names(), vec!["b", "a"]);
    }

    #[test]
    fn test_aliases_resolve_child() {
        let root = parse_document(
            r#"
commands:
  deploy:
    aliases: [d, dep]
    run: echo deploy
"#,
        );
        assert_eq!(root.child("dep").unwrap().name, "deploy");
        assert!(root.child("x").is_none());
    }

    #[test]
    fn test_option_forms() {
        let root = parse_document(
            r#"
run: echo
inputs:
  list:
    options: [a, b]
  map:
    options:
      Staging: staging
      Production: prod
"#,
        );
        let list = root.inputs.get("list").unwrap();
        assert_eq!(list.options, vec![InputOption::new("a", "a"), InputOption::new("b", "b")]);

        let map = root.inputs.get("map").unwrap();
        assert_eq!(map.options[1], InputOption::new("Production", "prod"));
    }

    #[test]
    fn test_options_script_is_kept_for_later() {
        let root = parse_document(
            r#"
run: echo
inputs:
  branch:
    options: git branch --format='%(refname:short)'
    default: main
"#,
        );
        let branch = root.inputs.get("branch").unwrap();
        assert!(branch.options.is_empty());
        assert_eq!(
            branch.options_script.as_deref(),
            Some("git branch --format='%(refname:short)'")
        );
        assert!(branch.selectable());
        assert_eq!(branch.default.as_deref(), Some("main"));
    }

    #[test]
    fn test_boolean_defaults_to_yes_no_options() {
        let root = parse_document(
            r#"
run: echo
inputs:
  force: boolean
"#,
        );
        let force = root.inputs.get("force").unwrap();
        assert_eq!(
            force.options,
            vec![InputOption::new("Yes", "true"), InputOption::new("No", "false")]
        );
    }

    #[test]
    fn test_default_is_applied_to_value() {
        let root = parse_document(
            r#"
run: echo
inputs:
  port:
    type: number
    default: 8080
"#,
        );
        let port = root.inputs.get("port").unwrap();
        assert_eq!(port.default.as_deref(), Some("8080"));
        assert_eq!(port.get(), Primitive::Number(8080.0));
        assert!(!port.is_resolved());
    }

    #[test]
    fn test_invalid_default_is_rejected() {
        let document: CommandDocument = serde_yaml::from_str(
            r#"
run: echo
inputs:
  port:
    type: number
    min: 1
    max: 10
    default: 11
"#,
        )
        .unwrap();
        let result = document.into_command(String::new());
        assert!(matches!(result, Err(Error::InvalidDefault { .. })));
    }

    #[test]
    fn test_default_outside_options_is_rejected() {
        let document: CommandDocument = serde_yaml::from_str(
            r#"
run: echo
inputs:
  env:
    options: [staging, prod]
    default: qa
"#,
        )
        .unwrap();
        let result = document.into_command(String::new());
        assert!(matches!(result, Err(Error::InvalidDefault { .. })));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let document: CommandDocument = serde_yaml::from_str(
            r#"
run: echo
inputs:
  when: date
"#,
        )
        .unwrap();
        let result = document.into_command(String::new());
        assert!(matches!(result, Err(Error::UnknownInputType { .. })));
    }

    #[test]
    fn test_bad_pattern_and_bounds_are_rejected() {
        let document: CommandDocument = serde_yaml::from_str(
            r#"
run: echo
inputs:
  name:
    pattern: "[a-"
"#,
        )
        .unwrap();
        assert!(matches!(
            document.into_command(String::new()),
            Err(Error::InvalidPattern { .. })
        ));

        let document: CommandDocument = serde_yaml::from_str(
            r#"
run: echo
inputs:
  count:
    type: number
    min: 5
    max: 1
"#,
        )
        .unwrap();
        assert!(matches!(
            document.into_command(String::new()),
            Err(Error::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_env_scalars_become_text() {
        let root = parse_document(
            r#"
run: echo
env:
  PORT: 8080
  DEBUG: true
  NAME: "{{ input \"name\" }}"
"#,
        );
        assert_eq!(root.env.get("PORT").map(String::as_str), Some("8080"));
        assert_eq!(root.env.get("DEBUG").map(String::as_str), Some("true"));
        assert_eq!(
            root.env.get("NAME").map(String::as_str),
            Some("{{ input \"name\" }}")
        );
    }

    #[test]
    fn test_command_display() {
        let root = Command::default();
        assert_eq!(root.to_string(), "<root>");

        let named = Command {
            name: "deploy".to_string(),
            ..Command::default()
        };
        assert_eq!(named.to_string(), "deploy");
    }
}
