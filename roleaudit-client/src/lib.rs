//! # roleaudit Client
//!
//! REST adapters connecting the profile builder and report delivery to a live
//! ServiceNow instance.
//!
//! ## Overview
//!
//! - [`TableApiClient`] implements [`RecordStore`](roleaudit_profile::RecordStore)
//!   over the Table API and
//!   [`AttachmentWriter`](roleaudit_report::AttachmentWriter) over the
//!   Attachment API
//! - [`InstanceConfig`] carries the instance URL, credentials and limits,
//!   loaded from `SERVICENOW_*` environment variables
//!
//! ## Usage
//!
//! ```rust,no_run
//! use roleaudit_client::{InstanceConfig, TableApiClient};
//! use roleaudit_profile::ProfileBuilder;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     // Validates the configuration before building the HTTP client
//!     let client = TableApiClient::new(InstanceConfig::from_env())?;
//!     let profile = ProfileBuilder::new(&client).build("itil").await?;
//!     println!("{:?}", profile.error());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod table_api;

pub use config::{ConfigError, InstanceConfig};
pub use error::ClientError;
pub use table_api::{encode_query, record_from_json, TableApiClient};
