//! One report run: banner, profile build, rendering and delivery.

use std::io::Write;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{error, info};

use roleaudit_profile::{ProfileBuilder, RecordStore};
use roleaudit_report::{
    deliver, display_timestamp, AttachmentWriter, DeliveryReceipt, OutputFormat, ReportFile, ReportKind,
};

/// Inputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Role to report on
    pub role: String,
    /// Requested output format
    pub format: OutputFormat,
    /// Instance base URL, used in attachment links
    pub instance_url: String,
    /// Generation time shown in reports and file names
    pub generated_at: DateTime<Utc>,
}

/// Build the profile and emit every requested report.
///
/// Console text goes to `out`. HTML and CSV are attached through `writer`; a
/// failed delivery is reported on `out` and the remaining formats continue.
///
/// # Errors
///
/// Store failures while building the profile, or failures writing to `out`.
pub async fn run<S, W, O>(options: &RunOptions, store: &S, writer: &W, out: &mut O) -> anyhow::Result<()>
where
    S: RecordStore + ?Sized,
    W: AttachmentWriter + ?Sized,
    O: Write,
{
    write_banner(options, out)?;

    let profile = ProfileBuilder::new(store)
        .build(&options.role)
        .await
        .with_context(|| format!("building access profile for role '{}'", options.role))?;

    for kind in options.format.kinds() {
        match kind {
            ReportKind::Console => {
                writeln!(out, "{}", kind.render(&profile, options.generated_at))?;
            }
            ReportKind::Html | ReportKind::Csv => {
                let file = ReportFile::render(*kind, &options.role, &profile, options.generated_at);
                match deliver(store, writer, &file).await {
                    Ok(receipt) => write_receipt(&receipt, &options.instance_url, out)?,
                    Err(e) => {
                        error!(file_name = %file.file_name, "Report delivery failed: {}", e);
                        writeln!(out, "ERROR: {}", e)?;
                    }
                }
            }
        }
    }

    writeln!(out, "\n=== REPORT GENERATION COMPLETED ===")?;
    info!(role = %options.role, format = %options.format, "Run complete");
    Ok(())
}

fn write_banner<O: Write>(options: &RunOptions, out: &mut O) -> std::io::Result<()> {
    writeln!(out, "=== ServiceNow Role Access Profile Report ===")?;
    writeln!(out, "Role: {}", options.role)?;
    writeln!(out, "Output Format: {}", options.format)?;
    writeln!(out, "Generated: {}", display_timestamp(options.generated_at))?;
    writeln!(out, "==============================================\n")
}

fn write_receipt<O: Write>(receipt: &DeliveryReceipt, instance_url: &str, out: &mut O) -> std::io::Result<()> {
    writeln!(out, "✓ File created successfully!")?;
    writeln!(out, "  File Name: {}", receipt.file_name)?;
    writeln!(out, "  Attachment ID: {}", receipt.attachment_id)?;
    writeln!(out, "  Attached to user: {}", receipt.user_name)?;
    writeln!(out, "  You can find this file in your user record attachments.")?;
    writeln!(out, "  Direct link: {}", receipt.direct_link(instance_url))?;
    writeln!(out, "  Download link: {}", receipt.download_link(instance_url))
}
