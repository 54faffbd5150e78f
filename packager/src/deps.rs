//! Dependency materialization.
//!
//! Declared dependencies are installed into an isolated directory by an
//! external installer (`pip` by default), one blocking invocation per
//! dependency and strictly in declaration order. The first failing
//! invocation aborts the run so failures are reproducible.

use crate::dependency::Dependency;
use crate::error::{PackagerError, Result};
use camino::Utf8Path;
use log::debug;
use std::process::{Command, Output};

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use jobpack_packager::deps::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("pip", &["--version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), jobpack_packager::error::PackagerError>(())
    /// ```
    fn run<'a>(&self, cmd: &str, args: &[&'a str]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run<'a>(&self, cmd: &str, args: &[&'a str]) -> Result<Output> {
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(PackagerError::from)
    }
}

/// Inputs for [`materialize`].
#[derive(Debug, Clone, Copy)]
pub struct MaterializeParams<'a> {
    /// Installer program, e.g. `pip`.
    pub installer: &'a str,
    /// Declared dependencies, in installation order.
    pub dependencies: &'a [Dependency],
    /// Dependency names or requirements to skip.
    pub exclude: &'a [String],
    /// Directory receiving the installed packages.
    pub target_dir: &'a Utf8Path,
    /// Optional custom package index.
    pub index_url: Option<&'a str>,
}

/// What [`materialize`] did with each dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Dependencies installed, in order.
    pub installed: Vec<Dependency>,
    /// Dependencies skipped because they were excluded.
    pub skipped: Vec<Dependency>,
}

/// Installs every non-excluded dependency into `params.target_dir`.
///
/// The installer is invoked as
/// `{installer} install --target {dir} [--index-url {url}] {dependency}`.
///
/// # Errors
///
/// Returns [`PackagerError::DependencyInstall`] for the first dependency
/// whose installer invocation cannot be started or exits unsuccessfully.
/// No further dependencies are installed after a failure.
pub fn materialize(
    executor: &dyn CommandExecutor,
    params: &MaterializeParams<'_>,
) -> Result<MaterializeReport> {
    let mut report = MaterializeReport::default();

    for dependency in params.dependencies {
        if dependency.is_excluded_by(params.exclude) {
            debug!("Not installing dependency {dependency}.");
            report.skipped.push(dependency.clone());
            continue;
        }

        let args = install_args(params, dependency);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let command = render_command(params.installer, &arg_refs);
        debug!("Installing dependency {dependency}: {command}");

        let output = executor
            .run(params.installer, &arg_refs)
            .map_err(|err| PackagerError::DependencyInstall {
                dependency: dependency.clone(),
                command: command.clone(),
                reason: format!("could not run installer: {err}"),
            })?;

        if !output.status.success() {
            return Err(PackagerError::DependencyInstall {
                dependency: dependency.clone(),
                command,
                reason: failure_reason(&output),
            });
        }

        report.installed.push(dependency.clone());
    }

    Ok(report)
}

/// Builds the installer arguments for one dependency.
fn install_args(params: &MaterializeParams<'_>, dependency: &Dependency) -> Vec<String> {
    let mut args = vec![
        "install".to_owned(),
        "--target".to_owned(),
        params.target_dir.to_string(),
    ];
    if let Some(url) = params.index_url {
        args.push("--index-url".to_owned());
        args.push(url.to_owned());
    }
    args.push(dependency.as_str().to_owned());
    args
}

fn render_command(installer: &str, args: &[&str]) -> String {
    std::iter::once(installer)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        output.status.to_string()
    } else {
        format!("{}: {stderr}", output.status)
    }
}

#[cfg(test)]
mod tests;
