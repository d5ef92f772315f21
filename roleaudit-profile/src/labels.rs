//! Constant lookup data for identifier resolution.
//!
//! Which fields name a record, which tables to search when the metadata index
//! has no answer, and how table names read to a person.

/// Candidate name fields, in order of preference.
pub const NAME_FIELDS: &[&str] = &[
    "name",
    "title",
    "short_description",
    "description",
    "label",
    "action_name",
    "column_label",
    "display_name",
    "sys_name",
    "number",
    "user_name",
    "first_name",
];

/// Name fields checked on a record found by direct probing.
pub const FALLBACK_NAME_FIELDS: &[&str] = &["name", "title", "action_name"];

/// Tables searched directly when the metadata index lookup fails.
pub const FALLBACK_TABLES: &[&str] = &[
    "sys_ui_action",
    "sys_script",
    "sys_script_client",
    "sys_script_include",
    "sys_ui_page",
    "sys_ui_macro",
    "sys_report",
    "sys_user_role",
    "sys_app_module",
    "sys_processor",
    "sys_web_service",
];

/// Name used when a record has none of the candidate fields.
pub const UNNAMED_RECORD: &str = "Unnamed Record";

/// Name used when a fallback record has none of the fallback name fields.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Human labels for well-known tables.
pub const TABLE_LABELS: &[(&str, &str)] = &[
    ("sys_ui_action", "UI Action"),
    ("sys_script", "Business Rule"),
    ("sys_script_client", "Client Script"),
    ("sys_script_include", "Script Include"),
    ("sysauto_script", "Scheduled Job"),
    ("sys_processor", "Processor"),
    ("sys_web_service", "Web Service"),
    ("sys_data_source", "Import Set"),
    ("wf_workflow", "Workflow"),
    ("sys_ui_page", "UI Page"),
    ("sys_ui_macro", "UI Macro"),
    ("sys_ui_script", "UI Script"),
    ("sys_transform_map", "Transform Map"),
    ("sys_report", "Report"),
    ("sys_ws_operation", "Web Service Operation"),
    ("sys_rest_service", "REST Service"),
    ("sys_soap_service", "SOAP Service"),
    ("sys_ui_form", "Form"),
    ("sys_ui_list", "List"),
    ("sys_ui_view", "View"),
    ("sys_dictionary", "Dictionary Entry"),
    ("sys_choice", "Choice"),
    ("sys_ui_policy", "UI Policy"),
    ("sys_data_policy2", "Data Policy"),
    ("sys_script_fix", "Fix Script"),
    ("sys_email", "Email"),
    ("sysevent_email_action", "Email Notification"),
    ("sys_trigger", "Trigger"),
    ("sys_flow", "Flow"),
    ("sys_hub_flow", "Hub Flow"),
    ("sys_app_module", "Application Module"),
    ("sys_user_role", "Role"),
    ("sys_user", "User"),
    ("sys_user_group", "Group"),
];

/// Convert a table name to a human-readable label.
///
/// Known tables use [`TABLE_LABELS`]. Anything else drops a leading `sys_`,
/// turns underscores into spaces and capitalizes each word.
///
/// # Examples
///
/// ```
/// use roleaudit_profile::labels::table_label;
///
/// assert_eq!(table_label("sys_script"), "Business Rule");
/// assert_eq!(table_label("sys_hub_action_type"), "Hub Action Type");
/// assert_eq!(table_label("x_acme_asset"), "X Acme Asset");
/// ```
pub fn table_label(table: &str) -> String {
    if let Some((_, label)) = TABLE_LABELS.iter().find(|(name, _)| *name == table) {
        return (*label).to_string();
    }

    let spaced = table.strip_prefix("sys_").unwrap_or(table).replace('_', " ");
    capitalize_words(&spaced)
}

// Upper-case every word character that follows a non-word character.
fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_boundary = true;
    for ch in text.chars() {
        let is_word = ch.is_alphanumeric() || ch == '_';
        if is_word && at_boundary {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_boundary = !is_word;
    }
    out
}
