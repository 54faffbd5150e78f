//! Human-readable progress and summary lines for the CLI.
//!
//! Summaries go to stderr so stdout stays free for the CI status line.

use crate::pipeline::PackageOutcome;
use crate::release::{ReleaseReport, ReleaseStage, UploadReport};
use std::fmt::Display;
use std::io::Write;

/// Writes one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Nowhere left to report the failure.
    }
}

/// Summarises a packaging run.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use jobpack_packager::bundle::ArtifactBundle;
/// use jobpack_packager::deps::MaterializeReport;
/// use jobpack_packager::output::package_summary;
/// use jobpack_packager::pipeline::PackageOutcome;
///
/// let outcome = PackageOutcome {
///     bundle: ArtifactBundle::new(
///         Utf8PathBuf::from("target/palp-1"),
///         Utf8PathBuf::from("target/palp-1/palp.zip"),
///         Vec::new(),
///     ),
///     dependencies: MaterializeReport::default(),
/// };
/// assert!(package_summary(&outcome).contains("target/palp-1/palp.zip"));
/// ```
#[must_use]
pub fn package_summary(outcome: &PackageOutcome) -> String {
    let installed = outcome.dependencies.installed.len();
    let skipped = outcome.dependencies.skipped.len();
    let mut lines = vec![format!(
        "Bundle {}: {} (dependencies: {installed} installed, {skipped} excluded)",
        ReleaseStage::Packaged,
        outcome.bundle.archive(),
    )];
    for sibling in outcome.bundle.siblings() {
        lines.push(format!("  shipped alongside: {sibling}"));
    }
    lines.join("\n")
}

/// Summarises an upload.
#[must_use]
pub fn upload_summary(bucket: &str, report: &UploadReport) -> String {
    let mut lines = vec![format!(
        "Bundle {}: {} {} to {bucket}",
        ReleaseStage::Uploaded,
        report.keys.len(),
        plural(report.keys.len(), "object", "objects"),
    )];
    lines.extend(report.keys.iter().map(|key| format!("  - {key}")));
    lines.join("\n")
}

/// Summarises a release.
#[must_use]
pub fn release_summary(bucket: &str, report: &ReleaseReport) -> String {
    let mut lines = vec![format!(
        "Bundle {}: {} {} in {bucket}",
        ReleaseStage::Released,
        report.copies.len(),
        plural(report.copies.len(), "object", "objects"),
    )];
    lines.extend(
        report
            .copies
            .iter()
            .map(|(source, destination)| format!("  - {source} -> {destination}")),
    );
    lines.join("\n")
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}
