//! `jobpack` CLI entrypoint.
//!
//! Packages a project's dependencies and sources into a versioned bundle,
//! uploads it to an S3-compatible store, and promotes uploaded versions to
//! the release prefix.

use clap::Parser;
use jobpack::ProjectConfig;
use jobpack_packager::cli::{Cli, Command};
use jobpack_packager::deps::SystemCommandExecutor;
use jobpack_packager::error::Result;
use jobpack_packager::notify::Notifier;
use jobpack_packager::output::{
    package_summary, release_summary, upload_summary, write_stderr_line,
};
use jobpack_packager::pipeline;
use jobpack_packager::store::{ObjectStore, S3Store};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter.
const LOG_ENV_VAR: &str = "JOBPACK_LOG";

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stderr = io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .is_err()
    {
        // A subscriber is already installed.
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let config = ProjectConfig::load(cli.config_path(), &cli.properties)?;
    log::debug!("Loaded {} {} from {}", config.name, config.version, cli.config);

    if cli.command.needs_store() {
        let store = S3Store::from_env(&config.store)?;
        log::debug!("Using object store at {}", store.endpoint());
        run_step(cli, &config, &store, stderr)
    } else {
        package_step(cli, &config, stderr)
    }
}

fn package_step(cli: &Cli, config: &ProjectConfig, stderr: &mut dyn Write) -> Result<()> {
    let outcome = pipeline::package(config, &SystemCommandExecutor)?;
    report(cli, stderr, package_summary(&outcome));
    Ok(())
}

fn run_step<S: ObjectStore>(
    cli: &Cli,
    config: &ProjectConfig,
    store: &S,
    stderr: &mut dyn Write,
) -> Result<()> {
    match cli.command {
        Command::Package => package_step(cli, config, stderr)?,
        Command::Upload => {
            let mut notifier = Notifier::new(&config.notification, io::stdout());
            let uploaded = pipeline::upload(config, store, &mut notifier)?;
            report(cli, stderr, upload_summary(bucket(config), &uploaded));
        }
        Command::Publish => {
            let mut notifier = Notifier::new(&config.notification, io::stdout());
            let (outcome, uploaded) =
                pipeline::publish(config, &SystemCommandExecutor, store, &mut notifier)?;
            report(cli, stderr, package_summary(&outcome));
            report(cli, stderr, upload_summary(bucket(config), &uploaded));
        }
        Command::Release => {
            let released = pipeline::release(config, store)?;
            report(cli, stderr, release_summary(bucket(config), &released));
        }
    }
    Ok(())
}

/// Bucket name for summaries; only called after the pipeline validated it.
fn bucket(config: &ProjectConfig) -> &str {
    config.store.bucket_name.as_deref().unwrap_or_default()
}

fn report(cli: &Cli, stderr: &mut dyn Write, summary: String) {
    if !cli.quiet {
        write_stderr_line(stderr, summary);
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use jobpack::ConfigFile;
    use jobpack_packager::error::PackagerError;
    use jobpack_packager::store::{CannedAcl, InMemoryStore};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[rstest]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[rstest]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = PackagerError::MissingCredentials {
            variable: "AWS_ACCESS_KEY_ID",
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.starts_with("error: "));
        assert!(stderr_text.contains("AWS_ACCESS_KEY_ID is not set"));
    }

    #[rstest]
    fn run_reports_a_missing_configuration_file() {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let config = root.join("jobpack.toml");
        let cli = Cli::parse_from(["jobpack", "--config", config.as_str(), "package"]);

        let mut stderr = Vec::new();
        let err = run(&cli, &mut stderr).expect_err("no configuration");
        assert!(matches!(err, PackagerError::Config(_)));
        assert!(stderr.is_empty());
    }

    #[rstest]
    fn package_runs_without_store_credentials() {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let config = root.join("jobpack.toml");
        std::fs::write(&config, "[project]\nname = \"palp\"\nversion = \"1\"\n")
            .expect("write configuration");
        let cli = Cli::parse_from(["jobpack", "--config", config.as_str(), "package"]);

        let result = temp_env::with_vars_unset(
            ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"],
            || run(&cli, &mut io::sink()),
        );
        assert!(
            !matches!(result, Err(PackagerError::MissingCredentials { .. })),
            "package must not read store credentials"
        );
    }

    struct Uploaded {
        _dir: TempDir,
        config: ProjectConfig,
        store: InMemoryStore,
    }

    #[fixture]
    fn uploaded() -> Uploaded {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let file: ConfigFile = toml::from_str(
            "[project]\nname = \"palp\"\nversion = \"1\"\n[s3]\nbucket_name = \"jobs\"\n",
        )
        .expect("valid configuration");
        let config = file.resolve(&root).expect("resolves");
        let store = InMemoryStore::default().with_bucket("jobs");
        for key in ["v1/palp.zip", "v1/main.py"] {
            store
                .insert("jobs", key, key, CannedAcl::Private)
                .expect("seeded");
        }
        Uploaded {
            _dir: dir,
            config,
            store,
        }
    }

    #[rstest]
    fn release_step_reports_to_stderr(uploaded: Uploaded) {
        let cli = Cli::parse_from(["jobpack", "release"]);

        let mut stderr = Vec::new();
        run_step(&cli, &uploaded.config, &uploaded.store, &mut stderr).expect("released");

        assert!(uploaded.store.object("jobs", "latest/palp.zip").is_some());
        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("latest/palp.zip"), "{stderr_text}");
    }

    #[rstest]
    fn quiet_release_step_writes_nothing(uploaded: Uploaded) {
        let cli = Cli::parse_from(["jobpack", "-q", "release"]);

        let mut stderr = Vec::new();
        run_step(&cli, &uploaded.config, &uploaded.store, &mut stderr).expect("released");
        assert!(stderr.is_empty());
    }

    #[rstest]
    fn release_without_credentials_fails_before_any_request() {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let config = root.join("jobpack.toml");
        std::fs::write(
            &config,
            "[project]\nname = \"palp\"\nversion = \"1\"\n[s3]\nbucket_name = \"jobs\"\n",
        )
        .expect("write configuration");
        let cli = Cli::parse_from(["jobpack", "--config", config.as_str(), "release"]);

        let result = temp_env::with_vars_unset(
            ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"],
            || run(&cli, &mut io::sink()),
        );
        assert!(matches!(
            result,
            Err(PackagerError::MissingCredentials { .. })
        ));
    }
}
