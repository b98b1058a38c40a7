use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::RunError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub stdout: String,
    // `None` when killed by a signal
    pub exit_code: Option<i32>,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

pub fn run_capture(program: &str, args: &[String]) -> Result<Captured, RunError> {
    debug!(program, ?args, "running with captured output");
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|source| spawn_error(program, source))?;
    Ok(Captured {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        exit_code: output.status.code(),
    })
}

pub fn run_inherit(program: &str, args: &[String]) -> Result<Option<i32>, RunError> {
    debug!(program, ?args, "running attached");
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| spawn_error(program, source))?;
    Ok(status.code())
}

pub trait Executor {
    fn capture(&mut self, program: &str, args: &[String]) -> Result<Captured, RunError>;
    fn inherit(&mut self, program: &str, args: &[String]) -> Result<Option<i32>, RunError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn capture(&mut self, program: &str, args: &[String]) -> Result<Captured, RunError> {
        run_capture(program, args)
    }

    fn inherit(&mut self, program: &str, args: &[String]) -> Result<Option<i32>, RunError> {
        run_inherit(program, args)
    }
}

fn spawn_error(program: &str, source: std::io::Error) -> RunError {
    RunError::Spawn {
        program: program.to_string(),
        source,
    }
}
