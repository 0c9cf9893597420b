//! Typed input values and the ordered input collections merged across a command chain.
//!
//! Every input holds a [`Value`], a closed set of variants (string, number, boolean)
//! exposing the same four operations: [`Value::get`], [`Value::set`],
//! [`Value::to_string`] and [`Value::kind`]. Parsing is a pure function
//! ([`Value::parse`]) so callers such as the flag parser or an interactive prompt
//! can validate raw text without touching the stored value.

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use regex::Regex;
use thiserror::Error;

use crate::config::ENV_INPUT_PREFIX;

/// Primitive kind of a [`Value`]. Boolean inputs are flags that take no argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
}

impl Display for ValueKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
        })
    }
}

/// A typed value read out of a [`Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl Display for Primitive {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Primitive::String(value) => formatter.write_str(value),
            Primitive::Number(value) => formatter.write_str(&format_number(*value)),
            Primitive::Boolean(value) => write!(formatter, "{value}"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("`{}` is not a valid {}", .raw, .kind)]
    Parse { raw: String, kind: ValueKind },

    #[error("`{}` does not match pattern `{}`", .raw, .pattern)]
    Pattern { raw: String, pattern: String },

    #[error("{} is outside of the allowed range {}", .raw, .range)]
    OutOfRange { raw: String, range: String },

    #[error("`{}` is not one of the available options", .0)]
    NotAnOption(String),
}

/// Integers print without a fraction, everything else uses the shortest exact form.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Parses the boolean spellings accepted on the command line.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct StringValue {
    pub value: String,
    pub pattern: Option<Regex>,
}

impl StringValue {
    fn parse(&self, raw: &str) -> Result<Primitive, ValueError> {
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(raw) {
                return Err(ValueError::Pattern {
                    raw: raw.to_string(),
                    pattern: pattern.as_str().to_string(),
                });
            }
        }

        Ok(Primitive::String(raw.to_string()))
    }
}

/// Number input with optional inclusive bounds.
///
/// When both bounds are set and equal the range is treated as unbounded.
#[derive(Debug, Clone, Default)]
pub struct NumberValue {
    pub value: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberValue {
    fn bounds(&self) -> (Option<f64>, Option<f64>) {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => (None, None),
            bounds => bounds,
        }
    }

    fn describe_range(&self) -> String {
        match self.bounds() {
            (Some(min), Some(max)) => format!("[{}, {}]", format_number(min), format_number(max)),
            (Some(min), None) => format!("[{}, ..]", format_number(min)),
            (None, Some(max)) => format!("[.., {}]", format_number(max)),
            (None, None) => "[.., ..]".to_string(),
        }
    }

    fn parse(&self, raw: &str) -> Result<Primitive, ValueError> {
        let number: f64 = raw.trim().parse().map_err(|_| ValueError::Parse {
            raw: raw.to_string(),
            kind: ValueKind::Number,
        })?;

        if number.is_nan() {
            return Err(ValueError::Parse {
                raw: raw.to_string(),
                kind: ValueKind::Number,
            });
        }

        let (min, max) = self.bounds();
        let below = min.is_some_and(|min| number < min);
        let above = max.is_some_and(|max| number > max);

        if below || above {
            return Err(ValueError::OutOfRange {
                raw: raw.to_string(),
                range: self.describe_range(),
            });
        }

        Ok(Primitive::Number(number))
    }
}

#[derive(Debug, Clone, Default)]
pub struct BooleanValue {
    pub value: bool,
}

impl BooleanValue {
    fn parse(raw: &str) -> Result<Primitive, ValueError> {
        parse_bool(raw)
            .map(Primitive::Boolean)
            .ok_or_else(|| ValueError::Parse {
                raw: raw.to_string(),
                kind: ValueKind::Boolean,
            })
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    String(StringValue),
    Number(NumberValue),
    Boolean(BooleanValue),
}

impl Default for Value {
    fn default() -> Self {
        Value::String(StringValue::default())
    }
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Boolean(_) => ValueKind::Boolean,
        }
    }

    #[must_use]
    pub fn get(&self) -> Primitive {
        match self {
            Value::String(v) => Primitive::String(v.value.clone()),
            Value::Number(v) => Primitive::Number(v.value),
            Value::Boolean(v) => Primitive::Boolean(v.value),
        }
    }

    /// Parses and validates `raw` without changing the stored value.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] if `raw` can't be parsed as this kind, or fails the
    /// pattern or bounds of the value.
    pub fn parse(&self, raw: &str) -> Result<Primitive, ValueError> {
        match self {
            Value::String(v) => v.parse(raw),
            Value::Number(v) => v.parse(raw),
            Value::Boolean(_) => BooleanValue::parse(raw),
        }
    }

    /// Parses `raw` and stores it. On failure the previous value is kept.
    ///
    /// # Errors
    ///
    /// See [`Value::parse`].
    pub fn set(&mut self, raw: &str) -> Result<(), ValueError> {
        let parsed = self.parse(raw)?;
        self.store(parsed);
        Ok(())
    }

    fn store(&mut self, parsed: Primitive) {
        match (self, parsed) {
            (Value::String(v), Primitive::String(s)) => v.value = s,
            (Value::Number(v), Primitive::Number(n)) => v.value = n,
            (Value::Boolean(v), Primitive::Boolean(b)) => v.value = b,
            // parse always yields the variant's own kind
            _ => {}
        }
    }
}

impl Display for Value {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.get())
    }
}

/// One entry of an enumerated input: a display label bound to a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputOption {
    pub label: String,
    pub value: String,
}

impl InputOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

impl Display for InputOption {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.label)
    }
}

/// Where an input got its value from, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Flag,
    Environment,
    Default,
    Prompt,
}

#[derive(Debug, Clone)]
pub struct Input {
    pub name: String,
    pub description: Option<String>,
    pub value: Value,
    pub options: Vec<InputOption>,
    /// Script whose output lines become the options, run before inputs are filled.
    pub options_script: Option<String>,
    pub default: Option<String>,
    pub source: Option<ValueSource>,
}

impl Input {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            value,
            options: Vec::new(),
            options_script: None,
            default: None,
            source: None,
        }
    }

    /// Name with hyphens replaced so it can be used in environment variables and templates.
    #[must_use]
    pub fn safe_name(&self) -> String {
        safe_name(&self.name)
    }

    #[must_use]
    pub fn env_name(&self) -> String {
        format!("{ENV_INPUT_PREFIX}{}", self.safe_name())
    }

    #[must_use]
    pub fn selectable(&self) -> bool {
        !self.options.is_empty() || self.options_script.is_some()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.source.is_some()
    }

    /// Validates `raw` against the value and, for selectable inputs, the options.
    ///
    /// Options are compared by their parsed value so `1.0` matches an option `1`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] describing why `raw` was rejected.
    pub fn validate(&self, raw: &str) -> Result<Primitive, ValueError> {
        let parsed = self.value.parse(raw)?;

        if !self.options.is_empty()
            && !self
                .options
                .iter()
                .any(|option| self.value.parse(&option.value).ok().as_ref() == Some(&parsed))
        {
            return Err(ValueError::NotAnOption(raw.to_string()));
        }

        Ok(parsed)
    }

    /// Validates and stores `raw`, recording where it came from.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] and leaves the input untouched if `raw` is invalid.
    pub fn set(&mut self, raw: &str, source: ValueSource) -> Result<(), ValueError> {
        let parsed = self.validate(raw)?;
        self.value.store(parsed);
        self.source = Some(source);
        Ok(())
    }

    #[must_use]
    pub fn get(&self) -> Primitive {
        self.value.get()
    }
}

impl Display for Input {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "`{}`", self.name)?;

        if let Some(description) = &self.description {
            write!(formatter, " ({description})")?;
        }

        Ok(())
    }
}

#[must_use]
pub fn safe_name(name: &str) -> String {
    name.replace('-', "_")
}

/// Ordered collection of inputs, unique by name.
#[derive(Debug, Clone, Default)]
pub struct Inputs(IndexMap<String, Input>);

impl Inputs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input, replacing any existing input of the same name in place.
    pub fn insert(&mut self, input: Input) {
        self.0.insert(input.name.clone(), input);
    }

    /// Combines two input lists.
    ///
    /// For a name present in both, `other`'s definition wins but keeps the position
    /// it had in `self`. Names only found in `other` follow in their own order.
    #[must_use]
    pub fn merge(&self, other: &Inputs) -> Inputs {
        let mut merged = self.clone();
        for input in other.iter() {
            merged.insert(input.clone());
        }
        merged
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Input> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Input> {
        self.0.get_mut(name)
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Input> {
        self.0.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Input> {
        self.0.values_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    #[must_use]
    pub fn unresolved(&self) -> Vec<String> {
        self.iter()
            .filter(|input| !input.is_resolved())
            .map(|input| input.name.clone())
            .collect()
    }

    /// Finds an input by its environment-safe name, e.g. `foo_bar` for `foo-bar`.
    #[must_use]
    pub fn find_by_safe_name(&self, name: &str) -> Option<&Input> {
        self.iter().find(|input| input.safe_name() == name)
    }

    /// Values keyed by safe name, as exposed to templates.
    #[must_use]
    pub fn values(&self) -> IndexMap<String, Primitive> {
        self.iter()
            .map(|input| (input.safe_name(), input.get()))
            .collect()
    }

    /// `ILC_INPUT_<SAFE_NAME>` entries for every input.
    #[must_use]
    pub fn to_env_map(&self) -> IndexMap<String, String> {
        self.iter()
            .map(|input| (input.env_name(), input.value.to_string()))
            .collect()
    }

    /// Flag form of every resolved input, as recorded in history.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        self.iter()
            .filter(|input| input.is_resolved())
            .map(|input| format!("-{}={}", input.name, input.value))
            .collect()
    }
}

impl FromIterator<Input> for Inputs {
    fn from_iter<T: IntoIterator<Item = Input>>(iter: T) -> Self {
        let mut inputs = Inputs::new();
        for input in iter {
            inputs.insert(input);
        }
        inputs
    }
}
