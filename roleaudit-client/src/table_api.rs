//! Table API and Attachment API client.
//!
//! Implements [`RecordStore`] over `GET /api/now/table/<table>` and
//! [`AttachmentWriter`] over `POST /api/now/attachment/file`. Requests use
//! basic authentication and ask for plain values instead of reference links.
//! Queries are paged with `sysparm_offset` until a short page comes back.
//! Nothing is retried.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use roleaudit_profile::schema::{SYS_ID, USER_TABLE};
use roleaudit_profile::{Filter, Record, RecordStore, StoreResult};
use roleaudit_report::{AttachmentWriter, DeliveryError, ReportFile};

use crate::config::InstanceConfig;
use crate::error::ClientError;

const TABLE_PATH: &str = "/api/now/table";
const ATTACHMENT_PATH: &str = "/api/now/attachment/file";

/// Envelope of every Table API and Attachment API response.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    result: Value,
}

/// Encode filters as an encoded query (`field=value^fieldINa,b`).
///
/// A `^` inside a value is doubled (`^^`) so it cannot start a new condition.
///
/// # Examples
///
/// ```
/// use roleaudit_client::encode_query;
/// use roleaudit_profile::Filter;
///
/// let query = encode_query(&[
///     Filter::eq("name", "itil"),
///     Filter::one_of("sys_id", ["a", "b"]),
/// ]);
/// assert_eq!(query, "name=itil^sys_idINa,b");
/// ```
pub fn encode_query(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(|filter| match filter {
            Filter::Eq { field, value } => format!("{}={}", field, escape_value(value)),
            Filter::In { field, values } => {
                let values: Vec<String> = values.iter().map(|v| escape_value(v)).collect();
                format!("{}IN{}", field, values.join(","))
            }
        })
        .collect::<Vec<_>>()
        .join("^")
}

fn escape_value(value: &str) -> String {
    value.replace('^', "^^")
}

/// Convert one JSON result object into a [`Record`].
///
/// Reference fields may arrive as `{"value": ..., "link": ...}` objects; the
/// value is kept. Nulls are dropped.
pub fn record_from_json(value: &Value) -> Option<Record> {
    let object = value.as_object()?;
    let mut record = Record::new();

    for (name, field) in object {
        let text = match field {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Object(inner) => match inner.get("value") {
                Some(Value::String(s)) => s.clone(),
                _ => continue,
            },
            Value::Null | Value::Array(_) => continue,
        };
        record.set(name.clone(), text);
    }

    Some(record)
}

/// Client for one instance.
#[derive(Clone)]
pub struct TableApiClient {
    /// HTTP client instance.
    client: Client,

    /// Instance configuration.
    config: InstanceConfig,
}

impl TableApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the configuration does not
    /// validate, or an error when the HTTP client cannot be built.
    pub fn new(config: InstanceConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self { client, config })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, "application/json");
        match &self.config.username {
            Some(username) => request.basic_auth(username, self.config.password.as_deref()),
            None => request,
        }
    }

    /// Fetch every record of `table` matching `filters`.
    ///
    /// Pages of `page_limit` rows are requested until a page comes back short.
    #[instrument(skip(self, filters), fields(table = %table))]
    pub async fn fetch(&self, table: &str, filters: &[Filter]) -> Result<Vec<Record>, ClientError> {
        let encoded = encode_query(filters);
        debug!("Querying {} with '{}'", table, encoded);

        let page_limit = self.config.page_limit as usize;
        let mut records = Vec::new();
        let mut offset = 0usize;
        loop {
            let page = self.fetch_page(table, &encoded, offset).await?;
            let rows = page.len();
            records.extend(page.iter().filter_map(record_from_json));

            if rows < page_limit {
                break;
            }
            offset += rows;
            debug!("Fetched {} rows of {}, requesting next page", offset, table);
        }

        Ok(records)
    }

    async fn fetch_page(&self, table: &str, encoded: &str, offset: usize) -> Result<Vec<Value>, ClientError> {
        let url = self.config.url(&format!("{}/{}", TABLE_PATH, table));

        let mut params: Vec<(&str, String)> = Vec::with_capacity(4);
        if !encoded.is_empty() {
            params.push(("sysparm_query", encoded.to_string()));
        }
        params.push(("sysparm_exclude_reference_link", "true".to_string()));
        params.push(("sysparm_limit", self.config.page_limit.to_string()));
        params.push(("sysparm_offset", offset.to_string()));

        let response = self.authorized(self.client.get(&url).query(&params)).send().await?;
        match self.handle_response(table, response).await? {
            Value::Array(items) => Ok(items),
            other => Err(ClientError::InvalidResponse(format!(
                "expected a list of records from {}, got {}",
                table, other
            ))),
        }
    }

    /// Fetch a single record by sys_id.
    #[instrument(skip(self), fields(table = %table, id = %id))]
    pub async fn fetch_one(&self, table: &str, id: &str) -> Result<Option<Record>, ClientError> {
        let url = self.config.url(&format!("{}/{}/{}", TABLE_PATH, table, id));
        debug!("Fetching {}/{}", table, id);

        let request = self
            .client
            .get(&url)
            .query(&[("sysparm_exclude_reference_link", "true")]);
        let response = self.authorized(request).send().await?;

        match self.handle_response(table, response).await {
            Ok(result) => Ok(record_from_json(&result)),
            Err(e) if e.is_not_found() => {
                debug!("No record {} in {}", id, table);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Upload `file` as an attachment of the `table` record `sys_id`.
    #[instrument(skip(self, file), fields(file_name = %file.file_name))]
    pub async fn upload(&self, table: &str, sys_id: &str, file: &ReportFile) -> Result<String, ClientError> {
        let url = self.config.url(ATTACHMENT_PATH);
        debug!("Attaching {} to {}/{}", file.file_name, table, sys_id);

        let request = self
            .client
            .post(&url)
            .query(&[
                ("table_name", table),
                ("table_sys_id", sys_id),
                ("file_name", file.file_name.as_str()),
            ])
            .header(CONTENT_TYPE, file.content_type.as_str())
            .body(file.content.clone());
        let response = self.authorized(request).send().await?;
        let result = self.handle_response(ATTACHMENT_PATH, response).await?;

        result
            .get(SYS_ID)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ClientError::InvalidResponse("attachment response has no sys_id".to_string()))
    }

    /// Handle API response and unwrap the `result` envelope.
    async fn handle_response(&self, table: &str, response: reqwest::Response) -> Result<Value, ClientError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            error!("Instance authentication failed");
            return Err(ClientError::AuthenticationFailed);
        }

        if status == StatusCode::FORBIDDEN {
            warn!("Access denied to {}", table);
            return Err(ClientError::AccessDenied(table.to_string()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            if status == StatusCode::BAD_REQUEST && message.contains("Invalid table") {
                return Err(ClientError::UnknownTable(table.to_string()));
            }
            if status != StatusCode::NOT_FOUND {
                warn!("Instance API error ({}): {}", status.as_u16(), message);
            }
            return Err(ClientError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ApiEnvelope>()
            .await
            .map(|envelope| envelope.result)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for TableApiClient {
    async fn query(&self, table: &str, filters: &[Filter]) -> StoreResult<Vec<Record>> {
        Ok(self.fetch(table, filters).await?)
    }

    async fn get(&self, table: &str, id: &str) -> StoreResult<Option<Record>> {
        Ok(self.fetch_one(table, id).await?)
    }
}

#[async_trait]
impl AttachmentWriter for TableApiClient {
    fn current_user_name(&self) -> String {
        self.config.username.clone().unwrap_or_default()
    }

    async fn attach(&self, owner: &Record, file: &ReportFile) -> Result<String, DeliveryError> {
        let owner_id = owner
            .id()
            .ok_or_else(|| DeliveryError::WriteFailed("owner record has no sys_id".to_string()))?;
        Ok(self.upload(USER_TABLE, owner_id, file).await?)
    }
}
