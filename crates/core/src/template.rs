//! Script and environment templating on top of `gtmpl` (Go `text/template` syntax).
//!
//! ```text
//! echo {{ input "env" }}
//! {{- if eq (input "force") true }} --force{{ end }}
//! {{ template "build" . }}
//! ```
//!
//! A [`TemplateSet`] holds named fragments; a fragment may include another one by
//! name with `{{ template "name" . }}`.

use std::cell::RefCell;
use std::collections::HashMap;

use gtmpl::{Context, Template};
use gtmpl_value::{FuncError, Value};
use indexmap::IndexMap;
use regex::Regex;
use thiserror::Error;

use crate::config::EnvMap;
use crate::input::{safe_name, Primitive};

const REFERENCE_PATTERN: &str = r#"\{\{-?\s*template\s+"([^"]*)""#;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Template error in {}: {}", .name, .message)]
pub struct TemplateError {
    /// Command or environment variable whose template failed.
    pub name: String,
    pub message: String,
}

impl TemplateError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// The data a template is rendered against.
///
/// `input` is keyed by safe input name (hyphens become underscores); `env` is the
/// ambient process environment.
#[derive(Debug, Clone, Default)]
pub struct TemplateData {
    pub input: IndexMap<String, Primitive>,
    pub env: EnvMap,
}

impl TemplateData {
    #[must_use]
    pub fn new(input: IndexMap<String, Primitive>, env: EnvMap) -> Self {
        let input = input
            .into_iter()
            .map(|(name, value)| (safe_name(&name), value))
            .collect();

        Self { input, env }
    }

    /// The `.` value: `.Input.<name>` and `.Env.<NAME>`.
    fn to_value(&self) -> Value {
        let input = self
            .input
            .iter()
            .map(|(name, value)| (name.clone(), primitive_value(value)))
            .collect();
        let env = self
            .env
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();

        Value::Object(HashMap::from([
            ("Input".to_string(), Value::Map(input)),
            ("Env".to_string(), Value::Map(env)),
        ]))
    }
}

fn primitive_value(value: &Primitive) -> Value {
    match value {
        Primitive::String(text) => Value::String(text.clone()),
        Primitive::Boolean(flag) => Value::Bool(*flag),
        Primitive::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => {
            Value::from(*number as i64)
        }
        Primitive::Number(number) => Value::from(*number),
    }
}

thread_local! {
    static CURRENT_DATA: RefCell<Option<TemplateData>> = const { RefCell::new(None) };
}

/// Makes `data` visible to the `input`/`env` functions until dropped.
struct DataScope;

impl DataScope {
    fn enter(data: &TemplateData) -> Self {
        CURRENT_DATA.with(|current| *current.borrow_mut() = Some(data.clone()));
        DataScope
    }
}

impl Drop for DataScope {
    fn drop(&mut self) {
        CURRENT_DATA.with(|current| *current.borrow_mut() = None);
    }
}

fn with_data(
    f: impl FnOnce(&TemplateData) -> Result<Value, FuncError>,
) -> Result<Value, FuncError> {
    CURRENT_DATA.with(|current| match current.borrow().as_ref() {
        Some(data) => f(data),
        None => Err(FuncError::Generic("no template data bound".to_string())),
    })
}

fn text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn one_arg<'a>(func: &str, args: &'a [Value]) -> Result<&'a Value, FuncError> {
    match args {
        [arg] => Ok(arg),
        _ => Err(FuncError::Generic(format!("{func} expects 1 argument"))),
    }
}

fn two_args(func: &str, args: &[Value]) -> Result<(String, String), FuncError> {
    match args {
        [first, second] => Ok((text(first), text(second))),
        _ => Err(FuncError::Generic(format!("{func} expects 2 arguments"))),
    }
}

fn input_func(args: &[Value]) -> Result<Value, FuncError> {
    let name = text(one_arg("input", args)?);
    with_data(|data| {
        data.input
            .get(&safe_name(&name))
            .map(primitive_value)
            .ok_or_else(|| FuncError::Generic(format!("input `{name}` not found")))
    })
}

fn env_func(args: &[Value]) -> Result<Value, FuncError> {
    let name = text(one_arg("env", args)?);
    with_data(|data| {
        Ok(Value::String(
            data.env.get(&name).cloned().unwrap_or_default(),
        ))
    })
}

fn contains_func(args: &[Value]) -> Result<Value, FuncError> {
    let (text, substring) = two_args("contains", args)?;
    Ok(Value::Bool(text.contains(&substring)))
}

fn startswith_func(args: &[Value]) -> Result<Value, FuncError> {
    let (text, prefix) = two_args("startswith", args)?;
    Ok(Value::Bool(text.starts_with(&prefix)))
}

fn endswith_func(args: &[Value]) -> Result<Value, FuncError> {
    let (text, suffix) = two_args("endswith", args)?;
    Ok(Value::Bool(text.ends_with(&suffix)))
}

fn new_template() -> Template {
    let mut template = Template::default();
    template.add_func("input", input_func);
    template.add_func("env", env_func);
    template.add_func("contains", contains_func);
    template.add_func("startswith", startswith_func);
    template.add_func("endswith", endswith_func);
    template
}

fn parse(name: &str, text: &str) -> Result<Template, TemplateError> {
    let mut template = new_template();
    template
        .parse(text)
        .map_err(|e| TemplateError::new(name, e.to_string()))?;
    Ok(template)
}

#[derive(Debug, Clone)]
struct Fragment {
    text: String,
    references: Vec<String>,
}

/// A set of named template fragments.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    fragments: IndexMap<String, Fragment>,
}

impl TemplateSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `text` and stores it as fragment `name`, replacing any earlier fragment
    /// with that name.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] naming the fragment if `text` doesn't parse.
    pub fn add(&mut self, name: &str, text: &str) -> Result<(), TemplateError> {
        parse(name, text)?;

        let pattern =
            Regex::new(REFERENCE_PATTERN).map_err(|e| TemplateError::new(name, e.to_string()))?;
        let references = pattern
            .captures_iter(text)
            .map(|captures| captures[1].to_string())
            .collect();

        self.fragments.insert(
            name.to_string(),
            Fragment {
                text: text.to_string(),
                references,
            },
        );
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fragments.contains_key(name)
    }

    /// Checks that every `{{ template }}` reference names a known fragment.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] naming the fragment holding the first bad reference.
    pub fn check_references(&self) -> Result<(), TemplateError> {
        for (name, fragment) in &self.fragments {
            if let Some(missing) = fragment
                .references
                .iter()
                .find(|reference| !self.contains(reference))
            {
                return Err(TemplateError::new(
                    name,
                    format!("no such template `{missing}`"),
                ));
            }
        }
        Ok(())
    }

    /// Fails if fragment `name` can reach itself through `{{ template }}`.
    fn check_cycles(&self, name: &str, path: &mut Vec<String>) -> Result<(), TemplateError> {
        if path.iter().any(|seen| seen == name) {
            return Err(TemplateError::new(
                path.first().map_or(name, String::as_str),
                format!("recursive template `{name}`"),
            ));
        }
        let Some(fragment) = self.fragments.get(name) else {
            return Ok(());
        };

        path.push(name.to_string());
        for reference in &fragment.references {
            self.check_cycles(reference, path)?;
        }
        path.pop();
        Ok(())
    }

    /// Renders fragment `name` with the other fragments available to it.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] naming `name` for unknown fragments, recursive
    /// includes and evaluation failures.
    pub fn execute(&self, name: &str, data: &TemplateData) -> Result<String, TemplateError> {
        if !self.contains(name) {
            return Err(TemplateError::new(name, "no such template"));
        }
        self.check_references()?;
        self.check_cycles(name, &mut Vec::new())?;

        let mut text = String::new();
        for (fragment_name, fragment) in &self.fragments {
            text.push_str(&format!(
                "{{{{define {fragment_name:?}}}}}{}{{{{end}}}}",
                fragment.text
            ));
        }
        text.push_str(&format!("{{{{template {name:?} .}}}}"));

        let template = parse(name, &text)?;
        let _scope = DataScope::enter(data);
        template
            .render(&Context::from(data.to_value()))
            .map_err(|e| TemplateError::new(name, e.to_string()))
    }
}

/// Renders a single standalone template.
///
/// # Errors
///
/// Returns a [`TemplateError`] naming `name` if the template fails to parse or run.
pub fn render(name: &str, text: &str, data: &TemplateData) -> Result<String, TemplateError> {
    let mut set = TemplateSet::new();
    set.add(name, text)?;
    set.execute(name, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> TemplateData {
        let mut input = IndexMap::new();
        input.insert("env".to_string(), Primitive::String("prod".to_string()));
        input.insert("dry-run".to_string(), Primitive::Boolean(true));
        input.insert("count".to_string(), Primitive::Number(3.0));

        let mut env = EnvMap::new();
        env.insert("HOME".to_string(), "/home/user".to_string());

        TemplateData::new(input, env)
    }

    #[test]
    fn test_literal_text_is_unchanged() {
        let text = "echo 'a { b }' && exit 0\n";
        assert_eq!(render("x", text, &data()).unwrap(), text);
    }

    #[test]
    fn test_input_function() {
        assert_eq!(
            render("deploy", r#"echo {{ input "env" }}"#, &data()).unwrap(),
            "echo prod"
        );
        // Both spellings of a hyphenated name work.
        assert_eq!(
            render("x", r#"{{ input "dry-run" }} {{ input "dry_run" }}"#, &data()).unwrap(),
            "true true"
        );
        assert_eq!(render("x", r#"{{ input "count" }}"#, &data()).unwrap(), "3");
    }

    #[test]
    fn test_unknown_input_is_an_error() {
        let error = render("deploy", r#"{{ input "region" }}"#, &data()).unwrap_err();
        assert_eq!(error.name, "deploy");
        assert!(error.message.contains("region"), "{}", error.message);
    }

    #[test]
    fn test_env_function_and_fields() {
        let output = render(
            "x",
            r#"{{ env "HOME" }}|{{ env "NOPE" }}|{{ .Env.HOME }}|{{ .Input.env }}"#,
            &data(),
        )
        .unwrap();
        assert_eq!(output, "/home/user||/home/user|prod");
    }

    #[test]
    fn test_conditionals_and_helpers() {
        let text = r#"{{ if eq (input "env") "staging" }}S{{ else if input "dry-run" }}D{{ else }}O{{ end }}"#;
        assert_eq!(render("x", text, &data()).unwrap(), "D");

        let text = r#"{{ if and (startswith (input "env") "pr") (endswith "prod" "od") }}yes{{ end }}"#;
        assert_eq!(render("x", text, &data()).unwrap(), "yes");

        let text = r#"{{ if not (contains (input "env") "stag") }}not staging{{ end }}"#;
        assert_eq!(render("x", text, &data()).unwrap(), "not staging");
    }

    #[test]
    fn test_pipe_appends_previous_value() {
        let text = r#"{{ input "env" | contains "prod!" }}"#;
        // Previous value is the last argument: contains("prod!", "prod")
        assert_eq!(render("x", text, &data()).unwrap(), "true");
    }

    #[test]
    fn test_trim_markers_render() {
        let text = "a\n  {{- input \"env\" -}}\n  b";
        assert_eq!(render("x", text, &data()).unwrap(), "aprodb");
    }

    #[test]
    fn test_fragments_include_each_other() {
        let mut set = TemplateSet::new();
        set.add("build", r#"make {{ input "env" }}"#).unwrap();
        set.add("deploy", r#"{{ template "build" . }} && ship"#).unwrap();
        set.check_references().unwrap();

        assert_eq!(set.execute("deploy", &data()).unwrap(), "make prod && ship");
    }

    #[test]
    fn test_later_fragment_overrides_earlier() {
        let mut set = TemplateSet::new();
        set.add("a", "first").unwrap();
        set.add("a", "second").unwrap();
        assert_eq!(set.execute("a", &data()).unwrap(), "second");
    }

    #[test]
    fn test_undefined_fragment_names_referrer() {
        let mut set = TemplateSet::new();
        set.add("deploy", r#"{{ template "missing" . }}"#).unwrap();
        let error = set.check_references().unwrap_err();
        assert_eq!(error.name, "deploy");
        assert!(error.message.contains("missing"));
    }

    #[test]
    fn test_recursion_is_rejected() {
        let mut set = TemplateSet::new();
        set.add("ping", r#"{{ template "pong" . }}"#).unwrap();
        set.add("pong", r#"{{ template "ping" . }}"#).unwrap();
        let error = set.execute("ping", &data()).unwrap_err();
        assert_eq!(error.name, "ping");
        assert!(error.message.contains("recursive"), "{}", error.message);
    }

    #[test]
    fn test_parse_error_names_template() {
        let error = render("deploy", "{{ if true }}", &data()).unwrap_err();
        assert_eq!(error.name, "deploy");
        assert!(error.to_string().starts_with("Template error in deploy"));
    }

    #[test]
    fn test_unknown_function_is_an_error() {
        let error = render("x", "{{ upper \"a\" }}", &data()).unwrap_err();
        assert_eq!(error.name, "x");
    }

    #[test]
    fn test_data_is_unbound_after_render() {
        render("x", r#"{{ input "env" }}"#, &data()).unwrap();
        assert!(CURRENT_DATA.with(|current| current.borrow().is_none()));
    }
}
