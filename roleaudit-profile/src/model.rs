//! # Access Profile Model
//!
//! The in-memory result of one profile build: the root role, every role in its
//! closure with the rules attached to it, and the derived table index.

use serde::{Deserialize, Serialize};

/// Display name of the default package.
pub const GLOBAL_PACKAGE: &str = "Global";

/// The package (application scope) an artifact belongs to.
///
/// A package without an id is the default global package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRef {
    /// Package name
    pub name: String,
    /// Package sys_id; `None` for the global package
    pub id: Option<String>,
}

impl PackageRef {
    /// The default global package.
    pub fn global() -> Self {
        Self {
            name: GLOBAL_PACKAGE.to_string(),
            id: None,
        }
    }

    /// A named package record.
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: Some(id.into()),
        }
    }

    /// Check if this is the global package.
    ///
    /// Instances also carry a real `sys_package` row named `Global`, so the
    /// name counts as well as a missing id.
    pub fn is_global(&self) -> bool {
        self.id.is_none() || self.name == GLOBAL_PACKAGE
    }
}

impl Default for PackageRef {
    fn default() -> Self {
        Self::global()
    }
}

/// A role in the closure of the reported role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Role name
    pub name: String,
    /// Role sys_id
    pub id: String,
    /// Role description
    pub description: Option<String>,
    /// `true` only for the reported (root) role
    pub is_direct: bool,
    /// Package the role belongs to
    pub package: PackageRef,
}

impl Role {
    /// `DIRECT` or `INHERITED`.
    pub fn kind(&self) -> &'static str {
        if self.is_direct {
            "DIRECT"
        } else {
            "INHERITED"
        }
    }
}

/// One access control rule attached to a role.
///
/// Raw values are grouping and sort keys; display values are what reports show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRule {
    /// ACL name: a table, `table.field`, or an opaque sys_id
    pub table: String,
    /// Readable form of `table`
    pub table_display: String,
    /// Operation (`read`, `write`, ... or an opaque sys_id)
    pub operation: String,
    /// Readable form of `operation`
    pub operation_display: String,
    /// ACL type (`record`, `ui_page`, ... or an opaque sys_id)
    #[serde(rename = "type")]
    pub rule_type: String,
    /// Readable form of `rule_type`
    pub type_display: String,
    /// ACL description
    pub description: Option<String>,
    /// Package of the table the rule governs
    pub table_package: PackageRef,
}

impl AccessRule {
    /// Table label for display, falling back to the raw name.
    pub fn table_label(&self) -> &str {
        non_empty_or(&self.table_display, &self.table)
    }

    /// Type label for display, falling back to the raw type.
    pub fn type_label(&self) -> &str {
        non_empty_or(&self.type_display, &self.rule_type)
    }

    /// Operation label for display, falling back to the raw operation.
    pub fn operation_label(&self) -> &str {
        non_empty_or(&self.operation_display, &self.operation)
    }
}

fn non_empty_or<'a>(preferred: &'a str, fallback: &'a str) -> &'a str {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}

/// A role together with the rules attached directly to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAccess {
    /// The role
    #[serde(flatten)]
    pub role: Role,
    /// Rules attached to the role
    pub rules: Vec<AccessRule>,
}

/// A table referenced by at least one rule in the closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Raw table name (ACL name)
    pub name: String,
    /// Readable table name
    pub display_name: String,
    /// Names of the roles whose rules reference the table, first-seen order
    pub roles: Vec<String>,
    /// Package the table is listed under
    pub package: PackageRef,
}

impl Application {
    /// Start an entry from the first rule that references the table.
    pub fn from_rule(rule: &AccessRule, role_name: &str) -> Self {
        Self {
            name: rule.table.clone(),
            display_name: rule.table_label().to_string(),
            roles: vec![role_name.to_string()],
            package: rule.table_package.clone(),
        }
    }

    /// Record another rule referencing the table.
    ///
    /// Role names are kept with set semantics. The first non-global package
    /// seen for the table is kept.
    pub fn add_reference(&mut self, rule: &AccessRule, role_name: &str) {
        if !self.roles.iter().any(|r| r == role_name) {
            self.roles.push(role_name.to_string());
        }
        if self.package.is_global() && !rule.table_package.is_global() {
            self.package = rule.table_package.clone();
        }
    }

    /// Label for display, falling back to the raw name.
    pub fn label(&self) -> &str {
        non_empty_or(&self.display_name, &self.name)
    }
}

/// A fully assembled access profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleProfile {
    /// The reported role
    pub role: Role,
    /// The closure, root first, in discovery order
    pub all_roles: Vec<RoleAccess>,
    /// Tables referenced by any rule of any role in the closure
    pub applications: Vec<Application>,
}

impl RoleProfile {
    /// Total number of rules across the closure.
    pub fn rule_count(&self) -> usize {
        self.all_roles.iter().map(|r| r.rules.len()).sum()
    }

    /// Number of direct roles (the root, when it still resolves).
    pub fn direct_count(&self) -> usize {
        self.all_roles.iter().filter(|r| r.role.is_direct).count()
    }

    /// Number of inherited roles.
    pub fn inherited_count(&self) -> usize {
        self.all_roles.len() - self.direct_count()
    }
}

/// Outcome of a profile build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "status")]
pub enum Profile {
    /// The role resolved and its profile was assembled
    Complete(RoleProfile),
    /// No role has the requested name
    NotFound {
        /// The requested role name
        role_name: String,
    },
}

impl Profile {
    /// The error message for a failed build.
    ///
    /// # Examples
    ///
    /// ```
    /// use roleaudit_profile::Profile;
    ///
    /// let profile = Profile::NotFound { role_name: "adt_user".into() };
    /// assert_eq!(profile.error().as_deref(), Some("Role not found: adt_user"));
    /// ```
    pub fn error(&self) -> Option<String> {
        match self {
            Profile::Complete(_) => None,
            Profile::NotFound { role_name } => Some(format!("Role not found: {}", role_name)),
        }
    }

    /// The assembled profile, if the role resolved.
    pub fn complete(&self) -> Option<&RoleProfile> {
        match self {
            Profile::Complete(profile) => Some(profile),
            Profile::NotFound { .. } => None,
        }
    }
}

/// Derive the table index from the rules of every role.
///
/// Keyed by raw table name in first-seen order.
pub fn derive_applications(all_roles: &[RoleAccess]) -> Vec<Application> {
    let mut applications: Vec<Application> = Vec::new();

    for access in all_roles {
        for rule in &access.rules {
            match applications.iter_mut().find(|app| app.name == rule.table) {
                Some(app) => app.add_reference(rule, &access.role.name),
                None => applications.push(Application::from_rule(rule, &access.role.name)),
            }
        }
    }

    applications
}
