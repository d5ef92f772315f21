//! HTML report: a standalone page with an embedded stylesheet.
//!
//! Values are interpolated as-is. Everything shown comes from the instance's
//! own metadata tables, which only administrators can write.

use chrono::{DateTime, Utc};
use roleaudit_profile::{Profile, RoleProfile};

use crate::format::display_timestamp;
use crate::views::{operation_groups, package_suffix, sorted_roles, tables_by_package, SummaryStats};

const STYLESHEET: &str = "\
body { font-family: Arial, sans-serif; margin: 20px; }
h1 { color: #2c5aa0; border-bottom: 2px solid #2c5aa0; }
h2 { color: #4a4a4a; margin-top: 30px; }
h3 { color: #666; }
table { border-collapse: collapse; width: 100%; margin: 10px 0; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; font-weight: bold; }
.direct { background-color: #e8f5e8; }
.inherited { background-color: #fff3cd; }
.summary { background-color: #f8f9fa; padding: 15px; border-radius: 5px; }
.package { font-style: italic; color: #666; }
";

/// Render the HTML report.
///
/// # Arguments
///
/// * `profile` - The profile to render
/// * `generated_at` - Timestamp shown in the page header
pub fn render_html(profile: &Profile, generated_at: DateTime<Utc>) -> String {
    match profile {
        Profile::Complete(profile) => html_page(profile, generated_at),
        Profile::NotFound { .. } => format!(
            "<html><body><h1>Error</h1><p>{}</p></body></html>",
            profile.error().unwrap_or_default()
        ),
    }
}

fn html_page(profile: &RoleProfile, generated_at: DateTime<Utc>) -> String {
    let mut html = String::new();
    let roles = sorted_roles(profile);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str(&format!(
        "<title>ServiceNow Role Access Report - {}</title>\n",
        profile.role.name
    ));
    html.push_str("<style>\n");
    html.push_str(STYLESHEET);
    html.push_str("</style>\n</head>\n<body>\n");

    html.push_str("<h1>ServiceNow Role Access Profile Report</h1>\n");
    html.push_str(&format!("<p><strong>Role:</strong> {}</p>\n", profile.role.name));
    html.push_str(&format!(
        "<p><strong>Generated:</strong> {}</p>\n",
        display_timestamp(generated_at)
    ));
    html.push_str(&format!(
        "<p><strong>Description:</strong> {}</p>\n",
        profile.role.description.as_deref().unwrap_or("No description")
    ));
    html.push_str(&format!("<p><strong>Sys ID:</strong> {}</p>\n", profile.role.id));

    // Role hierarchy
    html.push_str(&format!(
        "<h2>Role Hierarchy ({} roles total)</h2>\n",
        profile.all_roles.len()
    ));
    html.push_str("<table>\n<tr><th>Type</th><th>Role Name</th><th>Description</th><th>Package</th></tr>\n");
    for access in &roles {
        let role = &access.role;
        let class = if role.is_direct { "direct" } else { "inherited" };
        html.push_str(&format!("<tr class=\"{}\">\n", class));
        html.push_str(&format!("<td>{}</td>\n", role.kind()));
        html.push_str(&format!("<td>{}</td>\n", role.name));
        html.push_str(&format!("<td>{}</td>\n", role.description.as_deref().unwrap_or("")));
        html.push_str(&format!("<td class=\"package\">{}</td>\n", role.package.name));
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");

    // Rules by role
    html.push_str("<h2>Access Control Lists (ACLs) by Role</h2>\n");
    for access in roles.iter().filter(|a| !a.rules.is_empty()) {
        let role = &access.role;
        html.push_str(&format!(
            "<h3>{} - {}{} ({} ACLs)</h3>\n",
            role.kind(),
            role.name,
            package_suffix(&role.package),
            access.rules.len()
        ));
        html.push_str("<table>\n<tr><th>Operation</th><th>Table/Field</th><th>Type</th><th>Package</th></tr>\n");
        for group in operation_groups(&access.rules) {
            for (index, rule) in group.rules.iter().enumerate() {
                html.push_str("<tr>\n");
                if index == 0 {
                    html.push_str(&format!(
                        "<td rowspan=\"{}\">{}</td>\n",
                        group.rules.len(),
                        group.label
                    ));
                }
                html.push_str(&format!("<td>{}</td>\n", rule.table_label()));
                html.push_str(&format!("<td>{}</td>\n", rule.type_label()));
                html.push_str(&format!("<td class=\"package\">{}</td>\n", rule.table_package.name));
                html.push_str("</tr>\n");
            }
        }
        html.push_str("</table>\n");
    }

    // Tables
    html.push_str(&format!(
        "<h2>Tables/Applications Accessed ({} total)</h2>\n",
        profile.applications.len()
    ));
    if !profile.applications.is_empty() {
        html.push_str("<table>\n<tr><th>Package</th><th>Table/Application</th><th>Accessed via Roles</th></tr>\n");
        for group in tables_by_package(profile) {
            for (index, app) in group.tables.iter().enumerate() {
                html.push_str("<tr>\n");
                if index == 0 {
                    html.push_str(&format!(
                        "<td rowspan=\"{}\" class=\"package\">{}</td>\n",
                        group.tables.len(),
                        group.package
                    ));
                }
                html.push_str(&format!("<td>{}</td>\n", app.label()));
                html.push_str(&format!("<td>{}</td>\n", app.roles.join(", ")));
                html.push_str("</tr>\n");
            }
        }
        html.push_str("</table>\n");
    }

    // Summary
    let stats = SummaryStats::from_profile(profile);
    html.push_str("<h2>Summary Statistics</h2>\n<div class=\"summary\">\n");
    html.push_str(&format!(
        "<p><strong>Total roles in hierarchy:</strong> {}</p>\n",
        stats.total_roles
    ));
    html.push_str(&format!("<p><strong>Direct roles:</strong> {}</p>\n", stats.direct_roles));
    html.push_str(&format!("<p><strong>Inherited roles:</strong> {}</p>\n", stats.inherited_roles));
    html.push_str(&format!("<p><strong>Total ACLs:</strong> {}</p>\n", stats.total_rules));
    html.push_str(&format!(
        "<p><strong>Tables/Applications accessed:</strong> {}</p>\n",
        stats.tables
    ));
    html.push_str("<p><strong>Package distribution:</strong></p>\n<ul>\n");
    for (package, count) in &stats.package_distribution {
        html.push_str(&format!("<li>{}: {} roles</li>\n", package, count));
    }
    html.push_str("</ul>\n</div>\n");

    html.push_str("</body>\n</html>");
    html
}
