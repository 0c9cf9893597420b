use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use log::{debug, info};

use crate::config::EnvMap;
use crate::environment::PreparedCommand;
use crate::error::{Error, Result};

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Looks `program` up on this process's `PATH`, so a pure environment without
/// `PATH` can still start the shell.
fn resolve_program(program: &str) -> PathBuf {
    match which::which(program) {
        Ok(path) => path,
        Err(e) => {
            debug!("Could not resolve `{program}` on PATH: {e}");
            PathBuf::from(program)
        }
    }
}

/// Executes a prepared command with inherited stdio and only its own environment.
///
/// # Errors
///
/// Returns [`Error::SubProcess`] if the command can't be spawned, or
/// [`Error::SubProcessExit`] carrying the exit code if it exits unsuccessfully.
pub fn execute_command(prepared: &PreparedCommand) -> Result<()> {
    run_argv(&prepared.argv, &prepared.env)
}

/// Runs `argv` with this process's environment and returns what it printed.
///
/// # Errors
///
/// Returns [`Error::SubProcess`] if the command can't be spawned, or
/// [`Error::SubProcessExit`] if it exits unsuccessfully.
pub fn capture_output(argv: &[String]) -> Result<String> {
    let Some((program, arguments)) = argv.split_first() else {
        return Err(Error::SubProcess(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "empty command line",
        )));
    };

    debug!("Capturing output of: {}", argv.join(" "));
    let output = Command::new(resolve_program(program))
        .args(arguments)
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()
        .map_err(Error::SubProcess)?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(Error::SubProcessExit {
            code: exit_code(output.status),
        })
    }
}

fn run_argv(argv: &[String], env: &EnvMap) -> Result<()> {
    let Some((program, arguments)) = argv.split_first() else {
        return Err(Error::SubProcess(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "empty command line",
        )));
    };

    let mut command = Command::new(resolve_program(program));
    command
        .args(arguments)
        .env_clear()
        .envs(env)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    info!("Executing: {}", argv.join(" "));
    debug!("Executing with environment variables: {env:?}");

    let status = command
        .spawn()
        .and_then(|mut child| child.wait())
        .map_err(Error::SubProcess)?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::SubProcessExit {
            code: exit_code(status),
        })
    }
}
