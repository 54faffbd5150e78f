//! CI status lines.
//!
//! When enabled, an upload announces the primary archive's key as a
//! TeamCity `setParameter` service message so later build steps can read
//! it. Exactly one line is written per uploaded bundle.

use jobpack::NotificationSettings;
use std::io::{self, Write};

/// Renders a TeamCity `setParameter` service message.
///
/// # Examples
///
/// ```
/// use jobpack_packager::notify::service_message;
///
/// assert_eq!(
///     service_message("k", "v123/palp.zip"),
///     "##teamcity[setParameter name='k' value='v123/palp.zip']"
/// );
/// ```
#[must_use]
pub fn service_message(name: &str, value: &str) -> String {
    format!(
        "##teamcity[setParameter name='{}' value='{}']",
        escape(name),
        escape(value)
    )
}

/// Applies TeamCity service-message escaping.
fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '|' => escaped.push_str("||"),
            '\'' => escaped.push_str("|'"),
            '[' => escaped.push_str("|["),
            ']' => escaped.push_str("|]"),
            '\n' => escaped.push_str("|n"),
            '\r' => escaped.push_str("|r"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Writes status lines when a parameter name is configured and output is
/// enabled, and stays silent otherwise.
#[derive(Debug)]
pub struct Notifier<W> {
    parameter: Option<String>,
    writer: W,
}

impl<W: Write> Notifier<W> {
    /// Creates a notifier from configuration.
    #[must_use]
    pub fn new(settings: &NotificationSettings, writer: W) -> Self {
        Self {
            parameter: settings.active_parameter().map(str::to_owned),
            writer,
        }
    }

    /// Creates a notifier that never writes.
    #[must_use]
    pub fn disabled(writer: W) -> Self {
        Self {
            parameter: None,
            writer,
        }
    }

    /// Announces `key`, returning whether a line was written.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn announce(&mut self, key: &str) -> io::Result<bool> {
        let Some(parameter) = &self.parameter else {
            return Ok(false);
        };
        writeln!(self.writer, "{}", service_message(parameter, key))?;
        self.writer.flush()?;
        Ok(true)
    }

    /// Returns the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}
