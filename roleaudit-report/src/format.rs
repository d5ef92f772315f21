//! Output formats and report files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use roleaudit_profile::Profile;

use crate::console::render_console;
use crate::csv::render_csv;
use crate::html::render_html;

/// Error parsing an output format name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown output format '{0}' (expected console, html, csv or all)")]
pub struct ParseFormatError(pub String);

/// Requested output format.
///
/// # Examples
///
/// ```
/// use roleaudit_report::{OutputFormat, ReportKind};
///
/// let format: OutputFormat = "all".parse().unwrap();
/// assert_eq!(format.kinds(), &[ReportKind::Console, ReportKind::Html, ReportKind::Csv]);
/// assert!("pdf".parse::<OutputFormat>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Console text only
    Console,
    /// HTML attachment only
    #[default]
    Html,
    /// CSV attachment only
    Csv,
    /// Every format
    All,
}

impl OutputFormat {
    /// The reports this format produces, in output order.
    pub fn kinds(&self) -> &'static [ReportKind] {
        match self {
            Self::Console => &[ReportKind::Console],
            Self::Html => &[ReportKind::Html],
            Self::Csv => &[ReportKind::Csv],
            Self::All => &[ReportKind::Console, ReportKind::Html, ReportKind::Csv],
        }
    }

    /// Get string representation of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Html => "html",
            Self::Csv => "csv",
            Self::All => "all",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "html" => Ok(Self::Html),
            "csv" => Ok(Self::Csv),
            "all" => Ok(Self::All),
            _ => Err(ParseFormatError(s.to_string())),
        }
    }
}

/// A single rendered report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Console text
    Console,
    /// HTML page
    Html,
    /// CSV document
    Csv,
}

impl ReportKind {
    /// File extension for delivered reports.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Console => "txt",
            Self::Html => "html",
            Self::Csv => "csv",
        }
    }

    /// MIME type for delivered reports.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Console => "text/plain",
            Self::Html => "text/html",
            Self::Csv => "text/csv",
        }
    }

    /// Whether this report is delivered as an attachment rather than printed.
    pub fn is_attachment(&self) -> bool {
        !matches!(self, Self::Console)
    }

    /// Render a profile in this format.
    pub fn render(&self, profile: &Profile, generated_at: DateTime<Utc>) -> String {
        match self {
            Self::Console => render_console(profile),
            Self::Html => render_html(profile, generated_at),
            Self::Csv => render_csv(profile, generated_at),
        }
    }
}

/// A rendered report ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFile {
    /// File name
    pub file_name: String,
    /// MIME type
    pub content_type: String,
    /// Document body
    pub content: String,
}

impl ReportFile {
    /// Render `profile` as a named file.
    ///
    /// # Arguments
    ///
    /// * `kind` - Report format
    /// * `role_name` - Requested role name, used in the file name
    /// * `profile` - Profile to render
    /// * `generated_at` - Generation time, used in the file name and header
    pub fn render(kind: ReportKind, role_name: &str, profile: &Profile, generated_at: DateTime<Utc>) -> Self {
        Self {
            file_name: report_file_name(role_name, generated_at, kind),
            content_type: kind.content_type().to_string(),
            content: kind.render(profile, generated_at),
        }
    }
}

/// `role_access_report_<role>_<epoch millis>.<ext>`
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use roleaudit_report::{report_file_name, ReportKind};
///
/// let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
/// assert_eq!(
///     report_file_name("itil", at, ReportKind::Csv),
///     "role_access_report_itil_1700000000123.csv"
/// );
/// ```
pub fn report_file_name(role_name: &str, generated_at: DateTime<Utc>, kind: ReportKind) -> String {
    format!(
        "role_access_report_{}_{}.{}",
        role_name,
        generated_at.timestamp_millis(),
        kind.extension()
    )
}

/// Timestamp as shown inside reports.
pub fn display_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
