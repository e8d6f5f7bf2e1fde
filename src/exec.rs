//! Running the chosen unit as a child process.

use std::ffi::OsString;
use std::process::{Command, ExitStatus, Stdio};

use tracing::info;

use crate::candidate::{Candidate, Source};
use crate::error::{Result, RunnerError};

/// Program and arguments that run `candidate` with `extra` passed through.
///
/// Make targets take arguments directly. Package managers go through `run`;
/// npm also needs `--` so the arguments reach the script instead of npm.
pub fn build_script_args(candidate: &Candidate, extra: &[String]) -> (&'static str, Vec<String>) {
    let program = candidate.source.as_str();
    let mut args = Vec::with_capacity(extra.len() + 3);
    if candidate.source.is_package_manager() {
        args.push("run".to_string());
    }
    args.push(candidate.name.clone());
    if candidate.source == Source::Npm && !extra.is_empty() {
        args.push("--".to_string());
    }
    args.extend(extra.iter().cloned());
    (program, args)
}

/// The command line as a user would type it, for display.
pub fn display_command(candidate: &Candidate, extra: &[String]) -> String {
    let (program, args) = build_script_args(candidate, extra);
    std::iter::once(program.to_string())
        .chain(args)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `candidate` in the current directory with inherited stdio and wait.
pub fn run(candidate: &Candidate, extra: &[String]) -> Result<ExitStatus> {
    let (program, args) = build_script_args(candidate, extra);
    info!(program, ?args, "running script");
    Command::new(program)
        .args(args.iter().map(OsString::from))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| RunnerError::Spawn {
            program: program.to_string(),
            source,
        })
}

/// Exit code to hand back to the shell for a finished child.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
