//! Rendering a selection into a script, an environment and an argument vector.

use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use tempfile::NamedTempFile;

use crate::config::EnvMap;
use crate::error::{Error, Result};
use crate::execution::capture_output;
use crate::input::{InputOption, Inputs};
use crate::selection::Selection;
use crate::template::{render, TemplateData, TemplateError, TemplateSet};

/// Renders the script of the selected command.
///
/// Every command in the chain with a `run` script becomes a fragment named after
/// the command, so a script can include an ancestor's with `{{ template "name" . }}`.
/// The leaf's fragment is executed.
///
/// # Errors
///
/// Returns a [`TemplateError`] naming the offending command.
pub fn render_script(selection: &Selection<'_>, data: &TemplateData) -> Result<String> {
    let mut set = TemplateSet::new();
    let mut entry = None;

    for command in selection.chain() {
        if let Some(run) = &command.run {
            let name = command.to_string();
            set.add(&name, run)?;
            entry = Some(name);
        }
    }

    let entry = entry
        .ok_or_else(|| TemplateError::new(selection.leaf().to_string(), "no script present"))?;
    set.check_references()?;

    Ok(set.execute(&entry, data)?)
}

/// Renders every environment template of the selection against `data`.
///
/// # Errors
///
/// Returns a [`TemplateError`] naming the variable whose template failed.
pub fn render_env(
    selection: &Selection<'_>,
    data: &TemplateData,
) -> Result<IndexMap<String, String>> {
    let mut rendered = IndexMap::new();

    for (name, template) in selection.env() {
        let value = render(&format!("environment variable `{name}`"), &template, data)?;
        rendered.insert(name, value);
    }

    Ok(rendered)
}

/// Layers the child environment: the ambient environment (unless `pure`), then the
/// rendered variables, then `ILC_INPUT_*` for every input.
#[must_use]
pub fn build_env(
    rendered: IndexMap<String, String>,
    inputs: &Inputs,
    ambient: &EnvMap,
    pure: bool,
) -> EnvMap {
    let mut env = if pure { EnvMap::new() } else { ambient.clone() };
    env.extend(rendered);
    env.extend(inputs.to_env_map());
    env
}

/// Writes `script` to a fresh temporary file that is deleted when dropped.
///
/// # Errors
///
/// Returns an error if the file can't be created or written.
pub fn write_script(script: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("ilc-")
        .suffix(".sh")
        .tempfile()
        .map_err(|e| Error::io_error("script".to_string(), "<temp>".to_string(), e))?;

    let path = file.path().display().to_string();
    file.write_all(script.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| Error::io_error("script".to_string(), path.clone(), e))?;

    debug!("Created temporary script: {path}");

    Ok(file)
}

/// Runs the options script of every input that has one through `shell`, making
/// each non-empty output line an option.
///
/// # Errors
///
/// Returns [`Error::OptionsScript`] naming the input if its script can't run,
/// fails, prints nothing, or prints a value the input rejects.
pub fn load_script_options(inputs: &mut Inputs, shell: &[String]) -> Result<()> {
    for input in inputs.iter_mut() {
        let Some(script) = input.options_script.clone() else {
            continue;
        };
        let name = input.name.clone();
        let failed = |message: String| Error::OptionsScript {
            input: name.clone(),
            message,
        };

        let script_file = write_script(&script)?;
        let mut argv = shell.to_vec();
        argv.push(script_file.path().display().to_string());

        debug!("Loading options for input `{name}`");
        let output = capture_output(&argv).map_err(|e| failed(e.to_string()))?;

        let options: Vec<InputOption> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| InputOption::new(line, line))
            .collect();
        if options.is_empty() {
            return Err(failed("the script printed no options".to_string()));
        }
        for option in &options {
            input
                .value
                .parse(&option.value)
                .map_err(|e| failed(format!("`{}`: {e}", option.value)))?;
        }

        input.options = options;
    }

    Ok(())
}

/// A fully rendered command, ready to be executed.
///
/// Owns the temporary script file, which is removed when this is dropped.
#[derive(Debug)]
pub struct PreparedCommand {
    pub argv: Vec<String>,
    pub env: EnvMap,
    pub script: String,
    script_file: NamedTempFile,
}

impl PreparedCommand {
    /// Renders `selection` with resolved `inputs` into a runnable command.
    ///
    /// # Errors
    ///
    /// Returns a template error, or an IO error writing the script file.
    pub fn new(selection: &Selection<'_>, inputs: &Inputs, ambient: &EnvMap) -> Result<Self> {
        let data = TemplateData::new(inputs.values(), ambient.clone());

        let script = render_script(selection, &data)?;
        let rendered = render_env(selection, &data)?;
        let env = build_env(rendered, inputs, ambient, selection.pure());

        let script_file = write_script(&script)?;
        let mut argv = selection.shell();
        argv.push(script_file.path().display().to_string());

        Ok(Self {
            argv,
            env,
            script,
            script_file,
        })
    }

    #[must_use]
    pub fn script_path(&self) -> &Path {
        self.script_file.path()
    }
}
