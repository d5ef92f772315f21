//! Plain-text report for terminal output.

use roleaudit_profile::{Profile, RoleProfile};

use crate::views::{operation_groups, package_suffix, sorted_roles, tables_by_package, SummaryStats};

/// Closing line of the console report.
pub const END_MARKER: &str = "=== END OF ROLE ACCESS PROFILE REPORT ===";

/// Render the console report.
///
/// Lines are separated by `\n`; the caller decides where they go.
pub fn render_console(profile: &Profile) -> String {
    match profile {
        Profile::Complete(profile) => console_lines(profile).join("\n"),
        Profile::NotFound { .. } => format!("ERROR: {}", profile.error().unwrap_or_default()),
    }
}

fn console_lines(profile: &RoleProfile) -> Vec<String> {
    let mut lines = Vec::new();
    let roles = sorted_roles(profile);

    lines.push("▶ ROLE INFORMATION".to_string());
    lines.push(format!("  Name: {}", profile.role.name));
    lines.push(format!(
        "  Description: {}",
        profile.role.description.as_deref().unwrap_or("No description")
    ));
    lines.push(format!("  Sys ID: {}", profile.role.id));
    lines.push(String::new());

    lines.push(format!("▶ ROLE HIERARCHY ({} roles total)", profile.all_roles.len()));
    for access in &roles {
        let role = &access.role;
        lines.push(format!("  [{}] {}{}", role.kind(), role.name, package_suffix(&role.package)));
        if let Some(description) = &role.description {
            lines.push(format!("    Description: {}", description));
        }
    }
    lines.push(String::new());

    lines.push("▶ ACCESS CONTROL LISTS (ACLs) BY ROLE".to_string());
    for access in roles.iter().filter(|a| !a.rules.is_empty()) {
        let role = &access.role;
        lines.push(format!(
            "  [{}] {}{} ({} ACLs):",
            role.kind(),
            role.name,
            package_suffix(&role.package),
            access.rules.len()
        ));
        for group in operation_groups(&access.rules) {
            lines.push(format!("    {} ({}):", group.label, group.rules.len()));
            for rule in &group.rules {
                let package = if rule.table_package.is_global() {
                    String::new()
                } else {
                    format!(" [{}]", rule.table_package.name)
                };
                lines.push(format!("      • {}{} ({})", rule.table_label(), package, rule.type_label()));
            }
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "▶ TABLES/APPLICATIONS ACCESSED ({} total)",
        profile.applications.len()
    ));
    if profile.applications.is_empty() {
        lines.push("  No tables/applications found with ACL access.".to_string());
    } else {
        for group in tables_by_package(profile) {
            lines.push(format!("  Package: {} ({} tables)", group.package, group.tables.len()));
            for app in &group.tables {
                lines.push(format!("    • {} (via roles: {})", app.label(), app.roles.join(", ")));
            }
            lines.push(String::new());
        }
    }

    let stats = SummaryStats::from_profile(profile);
    lines.push("▶ SUMMARY STATISTICS".to_string());
    lines.push(format!("  Total roles in hierarchy: {}", stats.total_roles));
    lines.push(format!("  Direct roles: {}", stats.direct_roles));
    lines.push(format!("  Inherited roles: {}", stats.inherited_roles));
    lines.push(format!("  Total ACLs: {}", stats.total_rules));
    lines.push(format!("  Tables/Applications accessed: {}", stats.tables));
    lines.push("  Package distribution:".to_string());
    for (package, count) in &stats.package_distribution {
        lines.push(format!("    • {}: {} roles", package, count));
    }

    lines.push(String::new());
    lines.push(END_MARKER.to_string());
    lines
}
