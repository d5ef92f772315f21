//! # roleaudit Report
//!
//! Renderers for role access profiles and attachment delivery of the results.
//!
//! ## Overview
//!
//! The roleaudit-report crate handles:
//! - **Views**: ordering and grouping shared by every format
//! - **Console**: plain-text report for standard output
//! - **HTML**: standalone page with an embedded stylesheet
//! - **CSV**: role hierarchy and ACL details, every field quoted
//! - **Delivery**: attaching HTML/CSV files to the current user's record
//!
//! ## Architecture
//!
//! ```text
//! Profile ──→ views (sorted roles, operation groups, tables by package)
//!               ├─→ render_console ──→ stdout
//!               ├─→ render_html ─┐
//!               └─→ render_csv ──┴─→ ReportFile ──→ deliver ──→ AttachmentWriter
//! ```
//!
//! An error profile (role not found) short-circuits every renderer into a
//! single error message in that format.
//!
//! ## Usage
//!
//! ```rust
//! use chrono::Utc;
//! use roleaudit_profile::Profile;
//! use roleaudit_report::{ReportFile, ReportKind};
//!
//! let profile = Profile::NotFound { role_name: "adt_user".into() };
//! let file = ReportFile::render(ReportKind::Csv, "adt_user", &profile, Utc::now());
//! assert_eq!(file.content, "\"Error\",\"Role not found: adt_user\"\n");
//! ```

pub mod console;
pub mod csv;
pub mod delivery;
pub mod format;
pub mod html;
pub mod views;

// Re-export main types for convenience
pub use console::{render_console, END_MARKER};
pub use csv::render_csv;
pub use delivery::{deliver, AttachmentWriter, DeliveryError, DeliveryReceipt};
pub use format::{
    display_timestamp, report_file_name, OutputFormat, ParseFormatError, ReportFile, ReportKind,
};
pub use html::render_html;
pub use views::SummaryStats;
