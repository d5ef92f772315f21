//! Grouping and ordering shared by every renderer.
//!
//! The console, HTML and CSV reports show the same three views of a profile:
//! roles ordered by package and name, each role's rules grouped by operation,
//! and the referenced tables grouped by package. Keeping those rules here means
//! the formats can only differ in layout.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use roleaudit_profile::{AccessRule, Application, PackageRef, RoleAccess, RoleProfile};

/// Compare two strings the way a person reading the report expects.
///
/// Case-insensitive first; on a tie lower case sorts before upper case.
///
/// # Examples
///
/// ```
/// use roleaudit_report::views::locale_cmp;
/// use std::cmp::Ordering;
///
/// assert_eq!(locale_cmp("admin", "Bravo"), Ordering::Less);
/// assert_eq!(locale_cmp("itil", "ITIL"), Ordering::Less);
/// ```
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.cmp(a))
}

/// Roles ordered by `(package name, role name)`.
pub fn sorted_roles(profile: &RoleProfile) -> Vec<&RoleAccess> {
    let mut roles: Vec<&RoleAccess> = profile.all_roles.iter().collect();
    roles.sort_by(|a, b| {
        locale_cmp(&a.role.package.name, &b.role.package.name)
            .then_with(|| locale_cmp(&a.role.name, &b.role.name))
    });
    roles
}

fn rule_order(a: &AccessRule, b: &AccessRule) -> Ordering {
    locale_cmp(&a.table_package.name, &b.table_package.name).then_with(|| locale_cmp(&a.table, &b.table))
}

/// Rules ordered by `(table package name, table)`.
pub fn sorted_rules(rules: &[AccessRule]) -> Vec<&AccessRule> {
    let mut sorted: Vec<&AccessRule> = rules.iter().collect();
    sorted.sort_by(|a, b| rule_order(a, b));
    sorted
}

/// Rules of one role sharing a raw operation value.
#[derive(Debug, Clone)]
pub struct OperationGroup<'a> {
    /// Raw operation value
    pub operation: &'a str,
    /// Header label
    pub label: String,
    /// Rules ordered by table package, then table
    pub rules: Vec<&'a AccessRule>,
}

/// Group a role's rules by raw operation, groups in first-seen order.
///
/// The header is the first sorted rule's operation display, or the upper-cased
/// raw operation when no display is set.
pub fn operation_groups(rules: &[AccessRule]) -> Vec<OperationGroup<'_>> {
    let mut groups: Vec<OperationGroup<'_>> = Vec::new();

    for rule in rules {
        match groups.iter_mut().find(|g| g.operation == rule.operation) {
            Some(group) => group.rules.push(rule),
            None => groups.push(OperationGroup {
                operation: &rule.operation,
                label: String::new(),
                rules: vec![rule],
            }),
        }
    }

    for group in &mut groups {
        group.rules.sort_by(|a, b| rule_order(a, b));
        group.label = match group.rules.first() {
            Some(first) if !first.operation_display.is_empty() => first.operation_display.clone(),
            _ => group.operation.to_uppercase(),
        };
    }

    groups
}

/// Tables listed under one package.
#[derive(Debug, Clone)]
pub struct PackageTables<'a> {
    /// Package name
    pub package: &'a str,
    /// Tables ordered by display name
    pub tables: Vec<&'a Application>,
}

/// Tables grouped by package; packages in byte order, tables by label.
pub fn tables_by_package(profile: &RoleProfile) -> Vec<PackageTables<'_>> {
    let mut grouped: BTreeMap<&str, Vec<&Application>> = BTreeMap::new();
    for app in &profile.applications {
        grouped.entry(table_package_name(&app.package)).or_default().push(app);
    }

    grouped
        .into_iter()
        .map(|(package, mut tables)| {
            tables.sort_by(|a, b| locale_cmp(a.label(), b.label()));
            PackageTables { package, tables }
        })
        .collect()
}

fn table_package_name(package: &PackageRef) -> &str {
    if package.is_global() {
        roleaudit_profile::GLOBAL_PACKAGE
    } else {
        &package.name
    }
}

/// `" (Package: <name>)"` for non-global packages, empty otherwise.
pub fn package_suffix(package: &PackageRef) -> String {
    if package.is_global() {
        String::new()
    } else {
        format!(" (Package: {})", package.name)
    }
}

/// Headline numbers of a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryStats {
    /// Roles in the closure
    pub total_roles: usize,
    /// Direct roles
    pub direct_roles: usize,
    /// Inherited roles
    pub inherited_roles: usize,
    /// Rules across all roles
    pub total_rules: usize,
    /// Distinct tables
    pub tables: usize,
    /// Role count per package name, sorted by package name
    pub package_distribution: Vec<(String, usize)>,
}

impl SummaryStats {
    /// Compute the summary of a profile.
    pub fn from_profile(profile: &RoleProfile) -> Self {
        let mut distribution: BTreeMap<&str, usize> = BTreeMap::new();
        for access in &profile.all_roles {
            *distribution.entry(access.role.package.name.as_str()).or_default() += 1;
        }

        Self {
            total_roles: profile.all_roles.len(),
            direct_roles: profile.direct_count(),
            inherited_roles: profile.inherited_count(),
            total_rules: profile.rule_count(),
            tables: profile.applications.len(),
            package_distribution: distribution
                .into_iter()
                .map(|(name, count)| (name.to_string(), count))
                .collect(),
        }
    }
}
