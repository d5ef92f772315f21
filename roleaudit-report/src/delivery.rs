//! Attachment delivery of rendered reports.
//!
//! HTML and CSV reports are stored as attachments on the current user's record.
//! [`deliver`] looks the user up through the [`RecordStore`] and hands the file
//! to an [`AttachmentWriter`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use roleaudit_profile::schema::{fields, USER_TABLE};
use roleaudit_profile::{Filter, Record, RecordStore, StoreError};

use crate::format::ReportFile;

/// Delivery errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeliveryError {
    /// No user record matches the current user name
    #[error("Could not find current user for file attachment")]
    OwnerNotFound,

    /// The attachment could not be written
    #[error("Failed to create attachment: {0}")]
    WriteFailed(String),

    /// Store error while locating the owner
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Writer of file attachments.
#[async_trait]
pub trait AttachmentWriter: Send + Sync {
    /// User name of the identity the writer acts as.
    fn current_user_name(&self) -> String;

    /// Attach `file` to `owner`, returning the attachment id.
    async fn attach(&self, owner: &Record, file: &ReportFile) -> Result<String, DeliveryError>;
}

/// Outcome of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    /// Attached file name
    pub file_name: String,
    /// Attachment sys_id
    pub attachment_id: String,
    /// Owning user name
    pub user_name: String,
}

impl DeliveryReceipt {
    /// Link to the attachment record.
    ///
    /// # Examples
    ///
    /// ```
    /// use roleaudit_report::DeliveryReceipt;
    ///
    /// let receipt = DeliveryReceipt {
    ///     file_name: "r.csv".into(),
    ///     attachment_id: "abc".into(),
    ///     user_name: "admin".into(),
    /// };
    /// assert_eq!(
    ///     receipt.direct_link("https://dev.service-now.com/"),
    ///     "https://dev.service-now.com/sys_attachment.do?sys_id=abc"
    /// );
    /// ```
    pub fn direct_link(&self, instance_url: &str) -> String {
        format!(
            "{}/sys_attachment.do?sys_id={}",
            instance_url.trim_end_matches('/'),
            self.attachment_id
        )
    }

    /// Link that downloads the attachment directly.
    pub fn download_link(&self, instance_url: &str) -> String {
        format!("{}&sysparm_referring_url=tear_off", self.direct_link(instance_url))
    }
}

/// Attach a rendered report to the current user's record.
///
/// # Arguments
///
/// * `store` - Store used to find the user record
/// * `writer` - Attachment writer
/// * `file` - Rendered report
///
/// # Returns
///
/// The receipt, or [`DeliveryError::OwnerNotFound`] when no user record exists
#[instrument(skip(store, writer, file), fields(file_name = %file.file_name))]
pub async fn deliver<S, W>(store: &S, writer: &W, file: &ReportFile) -> Result<DeliveryReceipt, DeliveryError>
where
    S: RecordStore + ?Sized,
    W: AttachmentWriter + ?Sized,
{
    let user_name = writer.current_user_name();
    let users = store
        .query(USER_TABLE, &[Filter::eq(fields::USER_NAME, &user_name)])
        .await?;

    let Some(owner) = users.into_iter().next() else {
        warn!(user = %user_name, "No user record for attachment owner");
        return Err(DeliveryError::OwnerNotFound);
    };

    let attachment_id = writer.attach(&owner, file).await?;
    info!(attachment_id = %attachment_id, user = %user_name, "Report attached");

    Ok(DeliveryReceipt {
        file_name: file.file_name.clone(),
        attachment_id,
        user_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use roleaudit_profile::MemoryStore;
    use tokio::sync::Mutex;

    struct FakeWriter {
        user: String,
        fail: bool,
        attached: Mutex<Vec<(String, String)>>,
    }

    impl FakeWriter {
        fn new(user: &str) -> Self {
            Self {
                user: user.to_string(),
                fail: false,
                attached: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AttachmentWriter for FakeWriter {
        fn current_user_name(&self) -> String {
            self.user.clone()
        }

        async fn attach(&self, owner: &Record, file: &ReportFile) -> Result<String, DeliveryError> {
            if self.fail {
                return Err(DeliveryError::WriteFailed("quota exceeded".into()));
            }
            self.attached
                .lock()
                .await
                .push((owner.id().unwrap_or_default().to_string(), file.file_name.clone()));
            Ok("att_1".to_string())
        }
    }

    fn file() -> ReportFile {
        ReportFile {
            file_name: "role_access_report_itil_1.csv".into(),
            content_type: "text/csv".into(),
            content: "\"Error\",\"x\"\n".into(),
        }
    }

    fn store_with_user() -> MemoryStore {
        MemoryStore::new().with_record(
            USER_TABLE,
            Record::new().with("sys_id", "user_1").with("user_name", "admin"),
        )
    }

    #[tokio::test]
    async fn test_deliver_attaches_to_user_record() {
        let store = store_with_user();
        let writer = FakeWriter::new("admin");

        let receipt = deliver(&store, &writer, &file()).await.unwrap();

        assert_eq!(receipt.attachment_id, "att_1");
        assert_eq!(receipt.user_name, "admin");
        assert_eq!(
            *writer.attached.lock().await,
            vec![("user_1".to_string(), "role_access_report_itil_1.csv".to_string())]
        );
    }

    #[tokio::test]
    async fn test_missing_user_is_reported() {
        let store = store_with_user();
        let writer = FakeWriter::new("ghost");

        let err = deliver(&store, &writer, &file()).await.unwrap_err();
        assert_eq!(err, DeliveryError::OwnerNotFound);
        assert_eq!(err.to_string(), "Could not find current user for file attachment");
        assert!(writer.attached.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let store = store_with_user();
        let mut writer = FakeWriter::new("admin");
        writer.fail = true;

        let err = deliver(&store, &writer, &file()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::WriteFailed(_)));
    }

    #[tokio::test]
    async fn test_store_error_maps_to_delivery_error() {
        let store = store_with_user().with_denied_table(USER_TABLE);
        let writer = FakeWriter::new("admin");

        let err = deliver(&store, &writer, &file()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Store(StoreError::AccessDenied(_))));
    }

    #[test]
    fn test_links() {
        let receipt = DeliveryReceipt {
            file_name: "r.html".into(),
            attachment_id: "abc".into(),
            user_name: "admin".into(),
        };
        assert_eq!(
            receipt.download_link("https://x.service-now.com"),
            "https://x.service-now.com/sys_attachment.do?sys_id=abc&sysparm_referring_url=tear_off"
        );
    }
}
