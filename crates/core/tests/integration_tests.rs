//! Integration tests for ilc-core
//!
//! These tests verify that the core functionality works together correctly
//! by running complete invocations end-to-end, including spawning `/bin/sh`.

use ilc_core::{
    command_definitions::{Command, Config},
    config::{history_key, EnvMap},
    error::Error,
    file_handling::get_config,
    history::{DisabledHistoryStore, FileHistoryStore, HistoryStore},
    input::Input,
    prompter::{NoPrompter, Prompter},
    runner::{Outcome, Resolved, Runner, RunnerOptions},
};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const DEPLOY_CONFIG: &str = r#"
commands:
  deploy:
    run: echo {{input "env"}}
    inputs:
      env:
        options: [staging, prod]
"#;

fn args(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn write_config(directory: &Path, contents: &str) -> Config {
    let path = directory.join("ilc.yml");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, "{contents}").unwrap();
    get_config(path.to_str().unwrap()).unwrap()
}

fn non_interactive() -> RunnerOptions {
    RunnerOptions {
        non_interactive: true,
        ..RunnerOptions::default()
    }
}

/// A prompter that answers from a script and records what it was asked.
#[derive(Default)]
struct ScriptedPrompter {
    commands: Vec<Option<usize>>,
    values: Vec<Option<String>>,
    asked: Vec<String>,
}

impl Prompter for ScriptedPrompter {
    fn pick_command(&mut self, commands: &[Command]) -> ilc_core::error::Result<Option<usize>> {
        self.asked.push(
            commands
                .iter()
                .map(|command| command.name.as_str())
                .collect::<Vec<_>>()
                .join("|"),
        );
        Ok(self.commands.remove(0))
    }

    fn prompt_input(&mut self, input: &Input) -> ilc_core::error::Result<Option<String>> {
        self.asked.push(input.name.clone());
        Ok(self.values.remove(0))
    }
}

/// Deploy scenario: flags fully resolve the command and the script runs.
#[test]
fn test_deploy_renders_and_runs() {
    let directory = TempDir::new().unwrap();
    let config = write_config(directory.path(), DEPLOY_CONFIG);
    let mut runner = Runner::new(
        &config,
        NoPrompter,
        DisabledHistoryStore,
        EnvMap::new(),
        non_interactive(),
    );

    let Resolved::Ready(resolution) = runner.resolve(&args("deploy -env prod")).unwrap() else {
        panic!("expected a resolution");
    };
    let prepared = runner.prepare(&resolution).unwrap();
    assert_eq!(prepared.script, "echo prod");
    assert_eq!(prepared.argv[0], "/bin/sh");

    let outcome = runner.run(&args("deploy -env prod")).unwrap();
    assert_eq!(outcome, Outcome::Executed);
}

/// Deploy scenario: a value outside the options is rejected naming the input.
#[test]
fn test_deploy_rejects_unknown_option() {
    let directory = TempDir::new().unwrap();
    let config = write_config(directory.path(), DEPLOY_CONFIG);
    let mut runner = Runner::new(
        &config,
        NoPrompter,
        DisabledHistoryStore,
        EnvMap::new(),
        non_interactive(),
    );

    let result = runner.run(&args("deploy -env qa"));
    assert!(
        matches!(&result, Err(Error::InvalidInput { input, .. }) if input == "env"),
        "{result:?}"
    );
}

/// Pure commands don't see the ambient environment.
#[test]
fn test_pure_command_environment() {
    let directory = TempDir::new().unwrap();
    let config = write_config(
        directory.path(),
        r#"
commands:
  show:
    pure: true
    run: env
    env:
      A: "1"
    inputs:
      name:
        default: world
"#,
    );

    let mut ambient = EnvMap::new();
    ambient.insert("FOO".to_string(), "bar".to_string());
    let mut runner = Runner::new(&config, NoPrompter, DisabledHistoryStore, ambient, non_interactive());

    let Resolved::Ready(resolution) = runner.resolve(&args("show")).unwrap() else {
        panic!("expected a resolution");
    };
    let prepared = runner.prepare(&resolution).unwrap();

    assert_eq!(prepared.env.get("A").map(String::as_str), Some("1"));
    assert_eq!(
        prepared.env.get("ILC_INPUT_name").map(String::as_str),
        Some("world")
    );
    assert!(!prepared.env.contains_key("FOO"));
}

/// Successful runs are recorded, repeated runs are not duplicated, and a replay
/// runs the recorded arguments without prompting.
#[test]
fn test_history_record_and_replay() {
    let directory = TempDir::new().unwrap();
    let config = write_config(directory.path(), DEPLOY_CONFIG);
    let history_path = directory.path().join("history.yml");
    let store = FileHistoryStore::new(history_path.to_str().unwrap());

    let mut runner = Runner::new(
        &config,
        NoPrompter,
        store.clone(),
        EnvMap::new(),
        non_interactive(),
    );
    runner.run(&args("deploy -env prod")).unwrap();
    runner.run(&args("deploy --env=prod")).unwrap();

    let history = store.load().unwrap();
    let key = history_key(&config.path);
    assert_eq!(history.entries(&key), &[args("deploy -env=prod")]);

    assert_eq!(runner.run(&args("!deploy")).unwrap(), Outcome::Executed);
    assert_eq!(runner.run(&args("!")).unwrap(), Outcome::Executed);
    assert_eq!(store.load().unwrap().entries(&key).len(), 1);

    let result = runner.run(&args("!other"));
    assert!(matches!(result, Err(Error::Replay(_))));
}

/// A failing script keeps its exit code and isn't recorded.
#[test]
fn test_failing_script_is_not_recorded() {
    let directory = TempDir::new().unwrap();
    let config = write_config(
        directory.path(),
        r#"
commands:
  fail: exit 3
"#,
    );
    let history_path = directory.path().join("history.yml");
    let store = FileHistoryStore::new(history_path.to_str().unwrap());

    let mut runner = Runner::new(&config, NoPrompter, store.clone(), EnvMap::new(), non_interactive());

    let result = runner.run(&args("fail"));
    assert!(matches!(result, Err(Error::SubProcessExit { code: 3 })));
    assert!(store.load().unwrap().is_empty());
}

/// History limits keep the newest entries, and a limit of zero records nothing.
#[test]
fn test_history_limit() {
    let directory = TempDir::new().unwrap();
    let config = write_config(
        directory.path(),
        r#"
commands:
  a: "true"
  b: "true"
  c: "true"
"#,
    );
    let history_path = directory.path().join("history.yml");
    let store = FileHistoryStore::new(history_path.to_str().unwrap());
    let key = history_key(&config.path);

    let options = RunnerOptions {
        non_interactive: true,
        history_limit: Some(2),
        ..RunnerOptions::default()
    };
    let mut runner = Runner::new(&config, NoPrompter, store.clone(), EnvMap::new(), options);
    for command in ["a", "b", "c"] {
        runner.run(&args(command)).unwrap();
    }
    assert_eq!(store.load().unwrap().entries(&key), &[args("b"), args("c")]);

    let options = RunnerOptions {
        non_interactive: true,
        history_limit: Some(0),
        ..RunnerOptions::default()
    };
    let mut runner = Runner::new(&config, NoPrompter, store.clone(), EnvMap::new(), options);
    runner.run(&args("a")).unwrap();
    assert_eq!(store.load().unwrap().entries(&key), &[args("b"), args("c")]);
}

/// Interactive runs prompt for the command and then only for unresolved inputs.
#[test]
fn test_interactive_prompting() {
    let directory = TempDir::new().unwrap();
    let config = write_config(
        directory.path(),
        r#"
inputs:
  region:
    default: eu
commands:
  deploy:
    commands:
      web:
        run: echo {{ input "region" }} {{ input "replicas" }}
        inputs:
          replicas:
            type: number
            min: 1
            max: 5
"#,
    );

    let mut prompter = ScriptedPrompter {
        commands: vec![Some(0)],
        values: vec![Some("3".to_string())],
        ..ScriptedPrompter::default()
    };
    let mut runner = Runner::new(
        &config,
        &mut prompter,
        DisabledHistoryStore,
        EnvMap::new(),
        RunnerOptions::default(),
    );

    let Resolved::Ready(resolution) = runner.resolve(&args("deploy")).unwrap() else {
        panic!("expected a resolution");
    };
    let prepared = runner.prepare(&resolution).unwrap();
    assert_eq!(prepared.script, "echo eu 3");
    drop(runner);

    assert_eq!(prompter.asked, vec!["web", "replicas"]);
}

/// Errors in templates name the command they came from.
#[test]
fn test_template_error_names_command() {
    let directory = TempDir::new().unwrap();
    let config = write_config(
        directory.path(),
        r#"
commands:
  broken: echo {{ input "missing" }}
"#,
    );
    let mut runner = Runner::new(
        &config,
        NoPrompter,
        DisabledHistoryStore,
        EnvMap::new(),
        non_interactive(),
    );

    let result = runner.run(&args("broken"));
    assert!(matches!(result, Err(Error::Template(e)) if e.name == "broken"));
}

/// Loading rejects malformed trees.
#[test]
fn test_invalid_config_is_rejected() {
    let directory = TempDir::new().unwrap();
    let path = directory.path().join("ilc.yml");
    std::fs::write(
        &path,
        "commands:\n  deploy:\n    run: echo\n    commands:\n      web: echo\n",
    )
    .unwrap();

    let result = get_config(path.to_str().unwrap());
    assert!(matches!(result, Err(Error::RunWithCommands(_))));
}
