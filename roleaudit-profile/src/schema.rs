//! Table and field names of the instance metadata schema.

/// Primary key field present on every record.
pub const SYS_ID: &str = "sys_id";

/// Length of a sys_id; values of this length are treated as opaque identifiers.
pub const SYS_ID_LEN: usize = 32;

/// Roles.
pub const ROLE_TABLE: &str = "sys_user_role";
/// Role containment (`role` contains `contains`).
pub const ROLE_CONTAINS_TABLE: &str = "sys_user_role_contains";
/// ACL to role join.
pub const ACL_ROLE_TABLE: &str = "sys_security_acl_role";
/// Access control rules.
pub const ACL_TABLE: &str = "sys_security_acl";
/// Table definitions.
pub const DB_OBJECT_TABLE: &str = "sys_db_object";
/// Application packages / scopes.
pub const PACKAGE_TABLE: &str = "sys_package";
/// Generic metadata index used to discover the owning table of a sys_id.
pub const METADATA_TABLE: &str = "sys_metadata";
/// Users.
pub const USER_TABLE: &str = "sys_user";

/// Common field names.
pub mod fields {
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const PACKAGE: &str = "sys_package";
    pub const CLASS_NAME: &str = "sys_class_name";
    pub const USER_NAME: &str = "user_name";

    /// `sys_user_role_contains.role`
    pub const CONTAINS_PARENT: &str = "role";
    /// `sys_user_role_contains.contains`
    pub const CONTAINS_CHILD: &str = "contains";

    /// `sys_security_acl_role.sys_user_role`
    pub const ACL_ROLE_ROLE: &str = "sys_user_role";
    /// `sys_security_acl_role.sys_security_acl`
    pub const ACL_ROLE_ACL: &str = "sys_security_acl";

    pub const ACL_OPERATION: &str = "operation";
    pub const ACL_TYPE: &str = "type";
}

/// Check whether a value has the shape of a sys_id.
///
/// Only the length is checked, matching how the instance scripts tell opaque
/// references apart from readable names.
pub fn looks_like_sys_id(value: &str) -> bool {
    value.len() == SYS_ID_LEN
}
