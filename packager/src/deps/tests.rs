//! Tests for dependency materialization.

use super::*;
use crate::test_utils::{failure_output, success_output};
use camino::Utf8PathBuf;
use mockall::Sequence;
use rstest::{fixture, rstest};

#[fixture]
fn target_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("targetdir")
}

fn dependencies(names: &[&str]) -> Vec<Dependency> {
    names.iter().copied().map(Dependency::from).collect()
}

fn expect_install(
    executor: &mut MockCommandExecutor,
    sequence: &mut Sequence,
    expected_args: &'static [&'static str],
    output: fn() -> Output,
) {
    executor
        .expect_run()
        .withf(move |cmd, args| cmd == "pip" && args == expected_args)
        .times(1)
        .in_sequence(sequence)
        .returning(move |_, _| Ok(output()));
}

#[rstest]
fn installs_every_dependency_in_order(target_dir: Utf8PathBuf) {
    let mut executor = MockCommandExecutor::new();
    let mut sequence = Sequence::new();
    for args in [
        &["install", "--target", "targetdir", "a"][..],
        &["install", "--target", "targetdir", "b"][..],
        &["install", "--target", "targetdir", "c"][..],
    ] {
        expect_install(&mut executor, &mut sequence, args, success_output);
    }

    let deps = dependencies(&["a", "b", "c"]);
    let params = MaterializeParams {
        installer: "pip",
        dependencies: &deps,
        exclude: &[],
        target_dir: &target_dir,
        index_url: None,
    };

    let report = materialize(&executor, &params).expect("materialize succeeds");
    assert_eq!(report.installed, deps);
    assert!(report.skipped.is_empty());
}

#[rstest]
fn skips_excluded_dependencies(target_dir: Utf8PathBuf) {
    let mut executor = MockCommandExecutor::new();
    let mut sequence = Sequence::new();
    expect_install(
        &mut executor,
        &mut sequence,
        &["install", "--target", "targetdir", "c"],
        success_output,
    );
    expect_install(
        &mut executor,
        &mut sequence,
        &["install", "--target", "targetdir", "d"],
        success_output,
    );

    let deps = dependencies(&["a", "b", "c", "d", "e"]);
    let exclude = vec!["b".to_owned(), "e".to_owned(), "a".to_owned()];
    let params = MaterializeParams {
        installer: "pip",
        dependencies: &deps,
        exclude: &exclude,
        target_dir: &target_dir,
        index_url: None,
    };

    let report = materialize(&executor, &params).expect("materialize succeeds");
    assert_eq!(report.installed, dependencies(&["c", "d"]));
    assert_eq!(report.skipped, dependencies(&["a", "b", "e"]));
}

#[rstest]
fn excludes_match_bare_names_of_pinned_requirements(target_dir: Utf8PathBuf) {
    let mut executor = MockCommandExecutor::new();
    let mut sequence = Sequence::new();
    expect_install(
        &mut executor,
        &mut sequence,
        &["install", "--target", "targetdir", "httpretty==0.8.14"],
        success_output,
    );

    let deps = dependencies(&["boto3==1.4.8", "httpretty==0.8.14"]);
    let exclude = vec!["boto".to_owned(), "boto3".to_owned()];
    let params = MaterializeParams {
        installer: "pip",
        dependencies: &deps,
        exclude: &exclude,
        target_dir: &target_dir,
        index_url: None,
    };

    let report = materialize(&executor, &params).expect("materialize succeeds");
    assert_eq!(report.skipped, dependencies(&["boto3==1.4.8"]));
}

#[rstest]
fn passes_custom_index_url(target_dir: Utf8PathBuf) {
    let mut executor = MockCommandExecutor::new();
    let mut sequence = Sequence::new();
    expect_install(
        &mut executor,
        &mut sequence,
        &[
            "install",
            "--target",
            "targetdir",
            "--index-url",
            "http://example.domain",
            "a",
        ],
        success_output,
    );

    let deps = dependencies(&["a"]);
    let params = MaterializeParams {
        installer: "pip",
        dependencies: &deps,
        exclude: &[],
        target_dir: &target_dir,
        index_url: Some("http://example.domain"),
    };

    materialize(&executor, &params).expect("materialize succeeds");
}

#[rstest]
fn stops_at_the_first_failing_dependency(target_dir: Utf8PathBuf) {
    let mut executor = MockCommandExecutor::new();
    let mut sequence = Sequence::new();
    expect_install(
        &mut executor,
        &mut sequence,
        &["install", "--target", "targetdir", "a"],
        success_output,
    );
    executor
        .expect_run()
        .withf(|cmd, args| cmd == "pip" && args == ["install", "--target", "targetdir", "b"])
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_, _| Ok(failure_output("No matching distribution found for b")));

    let deps = dependencies(&["a", "b", "c"]);
    let params = MaterializeParams {
        installer: "pip",
        dependencies: &deps,
        exclude: &[],
        target_dir: &target_dir,
        index_url: None,
    };

    let err = match materialize(&executor, &params) {
        Ok(report) => panic!("expected install failure, got {report:?}"),
        Err(err) => err,
    };

    match err {
        PackagerError::DependencyInstall {
            dependency,
            command,
            reason,
        } => {
            assert_eq!(dependency, Dependency::from("b"));
            assert_eq!(command, "pip install --target targetdir b");
            assert!(reason.contains("No matching distribution found for b"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn reports_installers_that_cannot_start(target_dir: Utf8PathBuf) {
    let mut executor = MockCommandExecutor::new();
    executor
        .expect_run()
        .times(1)
        .returning(|_, _| Err(std::io::Error::other("pip: not found").into()));

    let deps = dependencies(&["a", "b"]);
    let params = MaterializeParams {
        installer: "pip",
        dependencies: &deps,
        exclude: &[],
        target_dir: &target_dir,
        index_url: None,
    };

    let err = materialize(&executor, &params).expect_err("expected spawn failure");
    assert!(err.to_string().contains("could not run installer"));
    assert!(err.to_string().contains("pip: not found"));
}

#[rstest]
fn logs_skipped_dependencies(target_dir: Utf8PathBuf) {
    let mut logger = logtest::Logger::start();
    let executor = MockCommandExecutor::new();

    let deps = dependencies(&["boto"]);
    let exclude = vec!["boto".to_owned()];
    let params = MaterializeParams {
        installer: "pip",
        dependencies: &deps,
        exclude: &exclude,
        target_dir: &target_dir,
        index_url: None,
    };

    materialize(&executor, &params).expect("nothing to install");

    let messages: Vec<String> = std::iter::from_fn(|| logger.pop())
        .map(|record| record.args().to_owned())
        .collect();
    assert!(
        messages
            .iter()
            .any(|message| message == "Not installing dependency boto."),
        "missing skip message in {messages:?}"
    );
}
