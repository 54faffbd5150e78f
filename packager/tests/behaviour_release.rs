//! Behaviour-driven tests for uploading and releasing bundles.
//!
//! A bundle is packaged into a temporary project, then uploaded to and
//! promoted within an in-memory store. Tests use the rstest-bdd v0.5.0
//! mutable world pattern.

mod support;

use jobpack_packager::error::PackagerError;
use jobpack_packager::notify::Notifier;
use jobpack_packager::pipeline;
use jobpack_packager::store::InMemoryStore;
use jobpack_packager::test_utils::{ExpectedCall, StubExecutor, success_output};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use support::Project;

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ReleaseWorld {
    project: Option<Project>,
    store: InMemoryStore,
    ci_output: Vec<u8>,
    error: Option<PackagerError>,
}

#[fixture]
fn world() -> ReleaseWorld {
    ReleaseWorld::default()
}

fn project(world: &ReleaseWorld) -> &Project {
    world.project.as_ref().expect("project set")
}

fn record(world: &mut ReleaseWorld, result: Result<(), PackagerError>) {
    if let Err(err) = result {
        world.error = Some(err);
    }
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a packaged bundle \"{name}\" at version \"{version}\"")]
fn given_packaged_bundle(world: &mut ReleaseWorld, name: String, version: String) {
    let mut project = Project::new(&name, &version);
    project.set("project.dependencies", "requests");
    let args = project.install_args("requests");
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let executor = StubExecutor::new(vec![ExpectedCall::new(
        "pip",
        &args,
        Ok(success_output()),
    )]);

    let outcome = pipeline::package(&project.config(), &executor).expect("packages");
    assert!(outcome.bundle.archive().starts_with(project.root()));
    world.project = Some(project);
}

#[given("a store with bucket \"{bucket}\"")]
fn given_store(world: &mut ReleaseWorld, bucket: String) {
    world.store = InMemoryStore::default().with_bucket(&bucket);
    world
        .project
        .as_mut()
        .expect("project set")
        .set("s3.bucket_name", &bucket);
}

#[given("CI notifications write to parameter \"{parameter}\"")]
fn given_notifications(world: &mut ReleaseWorld, parameter: String) {
    let project = world.project.as_mut().expect("project set");
    project.set("teamcity_output", "true");
    project.set("teamcity_parameter", &parameter);
}

#[given("the property \"{key}\" is \"{value}\"")]
fn given_property(world: &mut ReleaseWorld, key: String, value: String) {
    world
        .project
        .as_mut()
        .expect("project set")
        .set(&key, &value);
}

#[when("the bundle is uploaded")]
fn when_uploaded(world: &mut ReleaseWorld) {
    let config = project(world).config();
    let mut notifier = Notifier::new(&config.notification, Vec::new());
    let result = pipeline::upload(&config, &world.store, &mut notifier).map(|_| ());
    world.ci_output = notifier.into_inner();
    record(world, result);
}

#[when("the version is released")]
fn when_released(world: &mut ReleaseWorld) {
    let config = project(world).config();
    let result = pipeline::release(&config, &world.store).map(|_| ());
    record(world, result);
}

#[then("the step succeeds")]
fn then_succeeds(world: &mut ReleaseWorld) {
    if let Some(err) = &world.error {
        panic!("step failed: {err}");
    }
}

#[then("the step fails with \"{fragment}\"")]
fn then_fails_with(world: &mut ReleaseWorld, fragment: String) {
    let err = world.error.as_ref().expect("expected a failure");
    assert!(
        err.to_string().contains(&fragment),
        "{err} does not mention {fragment}"
    );
}

#[then("the store holds \"{key}\"")]
fn then_store_holds(world: &mut ReleaseWorld, key: String) {
    assert!(
        world.store.object("jobs", &key).is_some(),
        "{key} missing from {:?}",
        world.store.keys("jobs")
    );
}

#[then("CI was told \"{line}\"")]
fn then_ci_told(world: &mut ReleaseWorld, line: String) {
    let output = String::from_utf8(world.ci_output.clone()).expect("utf-8 output");
    assert_eq!(output, format!("{line}\n"));
}

#[then("the store received no calls")]
fn then_no_calls(world: &mut ReleaseWorld) {
    assert!(world.store.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/release.feature",
    name = "Upload stores every file and notifies CI"
)]
fn scenario_upload_notifies_ci(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release.feature",
    name = "Uploads honour the bucket prefix"
)]
fn scenario_upload_with_prefix(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release.feature",
    name = "Release promotes an uploaded version"
)]
fn scenario_release_promotes(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release.feature",
    name = "Release of a version that was never uploaded"
)]
fn scenario_release_without_upload(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release.feature",
    name = "Invalid access control is rejected before any store call"
)]
fn scenario_invalid_acl(world: ReleaseWorld) {
    let _ = world;
}
