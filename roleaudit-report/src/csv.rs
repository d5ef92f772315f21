//! CSV report.
//!
//! Two sections, `Role Hierarchy` and `ACL Details`, separated by a blank line.
//! Every field is double-quoted and embedded quotes are doubled, so
//! descriptions containing commas, quotes or newlines survive a round trip.
//! Lines end with `\n`.

use chrono::{DateTime, Utc};
use roleaudit_profile::{Profile, RoleProfile};

use crate::format::display_timestamp;
use crate::views::{sorted_roles, sorted_rules};

/// Column names of the role hierarchy section.
pub const ROLE_HIERARCHY_HEADER: [&str; 4] = ["Type", "Role Name", "Description", "Package"];

/// Column names of the ACL details section.
pub const ACL_DETAILS_HEADER: [&str; 10] = [
    "Role Type",
    "Role Name",
    "Role Package",
    "Table/Field",
    "Table Display",
    "Operation",
    "Operation Display",
    "ACL Type",
    "Type Display",
    "Table Package",
];

/// Quote one field.
///
/// # Examples
///
/// ```
/// use roleaudit_report::csv::quote;
///
/// assert_eq!(quote("plain"), "\"plain\"");
/// assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
/// ```
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn row<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted: Vec<String> = fields.into_iter().map(|f| quote(f.as_ref())).collect();
    let mut line = quoted.join(",");
    line.push('\n');
    line
}

/// Render the CSV report.
///
/// # Arguments
///
/// * `profile` - The profile to render
/// * `generated_at` - Timestamp written in the report header
pub fn render_csv(profile: &Profile, generated_at: DateTime<Utc>) -> String {
    match profile {
        Profile::Complete(profile) => csv_document(profile, generated_at),
        Profile::NotFound { .. } => row(["Error".to_string(), profile.error().unwrap_or_default()]),
    }
}

fn csv_document(profile: &RoleProfile, generated_at: DateTime<Utc>) -> String {
    let mut csv = String::new();
    let roles = sorted_roles(profile);

    csv.push_str(&row([format!("Role Access Report - {}", profile.role.name)]));
    csv.push_str(&row(["Generated".to_string(), display_timestamp(generated_at)]));
    csv.push('\n');

    csv.push_str(&row(["Role Hierarchy"]));
    csv.push_str(&row(ROLE_HIERARCHY_HEADER));
    for access in &roles {
        let role = &access.role;
        csv.push_str(&row([
            role.kind(),
            role.name.as_str(),
            role.description.as_deref().unwrap_or(""),
            role.package.name.as_str(),
        ]));
    }

    csv.push('\n');
    csv.push_str(&row(["ACL Details"]));
    csv.push_str(&row(ACL_DETAILS_HEADER));
    for access in &roles {
        let role = &access.role;
        for rule in sorted_rules(&access.rules) {
            csv.push_str(&row([
                role.kind(),
                role.name.as_str(),
                role.package.name.as_str(),
                rule.table.as_str(),
                rule.table_label(),
                rule.operation.as_str(),
                rule.operation_label(),
                rule.rule_type.as_str(),
                rule.type_label(),
                rule.table_package.name.as_str(),
            ]));
        }
    }

    csv
}
