//! # Profile Builder
//!
//! Assembles a [`Profile`] for a role name:
//!
//! ```text
//! role name ─→ sys_user_role (by name)
//!                 └─ closure = root + HierarchyWalker::expand(root)
//!                       └─ per role: sys_user_role ─→ sys_package
//!                                    sys_security_acl_role ─→ sys_security_acl (IN batch)
//!                                       └─ per ACL: sys_db_object ─→ sys_package
//!                                                   IdentifierResolver (operation/table/type)
//!                 └─ applications derived from every rule
//! ```
//!
//! Store errors abort the build. A root role that does not exist is reported
//! through [`Profile::NotFound`]. Roles of the closure that no longer resolve
//! are skipped.

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

use crate::error::StoreResult;
use crate::hierarchy::HierarchyWalker;
use crate::model::{derive_applications, AccessRule, PackageRef, Profile, Role, RoleAccess, RoleProfile};
use crate::resolver::IdentifierResolver;
use crate::schema::{
    fields, ACL_ROLE_TABLE, ACL_TABLE, DB_OBJECT_TABLE, PACKAGE_TABLE, ROLE_TABLE, SYS_ID,
};
use crate::store::{Filter, Record, RecordStore};

/// Builds access profiles from a record store.
///
/// The builder holds no state between calls: every [`build`](Self::build)
/// starts with fresh caches, so the result is a function of the role name and
/// the store contents.
pub struct ProfileBuilder<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> ProfileBuilder<'a, S> {
    /// Create a builder over `store`.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Build the access profile of `role_name`.
    ///
    /// # Returns
    ///
    /// - `Ok(Profile::Complete)` with the closure, rules and table index
    /// - `Ok(Profile::NotFound)` if no role has this name
    /// - `Err` if the store fails outside identifier probing
    #[instrument(skip(self), fields(role = %role_name))]
    pub async fn build(&self, role_name: &str) -> StoreResult<Profile> {
        let mut build = Build::new(self.store);

        let Some(root) = build.find_role(role_name).await? else {
            info!("Role not found");
            return Ok(Profile::NotFound {
                role_name: role_name.to_string(),
            });
        };

        let root_id = root.id().unwrap_or_default().to_string();
        let root_role = build.role_from_record(&root, &root_id, &root_id).await?;

        let closure = build.closure(&root_id).await?;
        debug!(roles = closure.len(), "Resolved role closure");

        let mut all_roles = Vec::with_capacity(closure.len());
        for role_id in &closure {
            let Some(record) = self.store.get(ROLE_TABLE, role_id).await? else {
                warn!(role_id = %role_id, "Contained role no longer exists, skipping");
                continue;
            };

            let role = build.role_from_record(&record, role_id, &root_id).await?;
            let rules = build.rules_for(role_id).await?;
            debug!(role = %role.name, rules = rules.len(), "Collected role rules");
            all_roles.push(RoleAccess { role, rules });
        }

        let applications = derive_applications(&all_roles);
        info!(
            roles = all_roles.len(),
            rules = all_roles.iter().map(|r| r.rules.len()).sum::<usize>(),
            tables = applications.len(),
            "Built role access profile"
        );

        Ok(Profile::Complete(RoleProfile {
            role: root_role,
            all_roles,
            applications,
        }))
    }
}

/// Per-build state: resolver memo and package caches.
struct Build<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    resolver: IdentifierResolver<'a, S>,
    packages: HashMap<String, PackageRef>,
    table_packages: HashMap<String, PackageRef>,
}

impl<'a, S: RecordStore + ?Sized> Build<'a, S> {
    fn new(store: &'a S) -> Self {
        Self {
            store,
            resolver: IdentifierResolver::new(store),
            packages: HashMap::new(),
            table_packages: HashMap::new(),
        }
    }

    async fn find_role(&self, role_name: &str) -> StoreResult<Option<Record>> {
        let mut rows = self
            .store
            .query(ROLE_TABLE, &[Filter::eq(fields::NAME, role_name)])
            .await?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.swap_remove(0)))
    }

    /// Root first, then contained roles in discovery order, no duplicates.
    async fn closure(&self, root_id: &str) -> StoreResult<Vec<String>> {
        let walker = HierarchyWalker::new(self.store);
        let mut visited = HashSet::new();
        let contained = walker.expand(root_id, &mut visited).await?;

        let mut closure = vec![root_id.to_string()];
        for id in contained {
            if !closure.contains(&id) {
                closure.push(id);
            }
        }
        Ok(closure)
    }

    async fn role_from_record(&mut self, record: &Record, role_id: &str, root_id: &str) -> StoreResult<Role> {
        let package = self.package(record.field(fields::PACKAGE)).await?;
        Ok(Role {
            name: record.field(fields::NAME).unwrap_or_default().to_string(),
            id: role_id.to_string(),
            description: record.field(fields::DESCRIPTION).map(str::to_string),
            is_direct: role_id == root_id,
            package,
        })
    }

    /// Package of a record, Global when missing or unresolvable.
    async fn package(&mut self, package_id: Option<&str>) -> StoreResult<PackageRef> {
        let Some(package_id) = package_id else {
            return Ok(PackageRef::global());
        };
        if let Some(cached) = self.packages.get(package_id) {
            return Ok(cached.clone());
        }

        let package = match self.store.get(PACKAGE_TABLE, package_id).await? {
            Some(record) => match record.field(fields::NAME) {
                Some(name) => PackageRef::new(name, package_id),
                None => PackageRef::global(),
            },
            None => {
                debug!(package_id = %package_id, "Package does not resolve, using Global");
                PackageRef::global()
            }
        };

        self.packages.insert(package_id.to_string(), package.clone());
        Ok(package)
    }

    /// Package of the table an ACL governs.
    ///
    /// Field ACLs (`incident.state`) use the package of their base table.
    async fn table_package(&mut self, acl_name: &str) -> StoreResult<PackageRef> {
        if acl_name.is_empty() {
            return Ok(PackageRef::global());
        }
        let base_table = acl_name.split('.').next().unwrap_or(acl_name);
        if let Some(cached) = self.table_packages.get(base_table) {
            return Ok(cached.clone());
        }

        let rows = self
            .store
            .query(DB_OBJECT_TABLE, &[Filter::eq(fields::NAME, base_table)])
            .await?;
        let package_id = rows
            .first()
            .and_then(|row| row.field(fields::PACKAGE))
            .map(str::to_string);
        let package = self.package(package_id.as_deref()).await?;

        self.table_packages.insert(base_table.to_string(), package.clone());
        Ok(package)
    }

    /// Rules attached directly to a role.
    async fn rules_for(&mut self, role_id: &str) -> StoreResult<Vec<AccessRule>> {
        let joins = self
            .store
            .query(ACL_ROLE_TABLE, &[Filter::eq(fields::ACL_ROLE_ROLE, role_id)])
            .await?;
        let acl_ids: Vec<&str> = joins
            .iter()
            .filter_map(|join| join.field(fields::ACL_ROLE_ACL))
            .collect();
        if acl_ids.is_empty() {
            return Ok(Vec::new());
        }

        let acls = self
            .store
            .query(ACL_TABLE, &[Filter::one_of(SYS_ID, acl_ids)])
            .await?;

        let mut rules = Vec::with_capacity(acls.len());
        for acl in &acls {
            rules.push(self.rule_from_acl(acl).await?);
        }
        Ok(rules)
    }

    async fn rule_from_acl(&mut self, acl: &Record) -> StoreResult<AccessRule> {
        let table = acl.field(fields::NAME).unwrap_or_default().to_string();
        let operation = acl.field(fields::ACL_OPERATION).unwrap_or_default().to_string();
        let rule_type = acl.field(fields::ACL_TYPE).unwrap_or_default().to_string();

        let table_package = self.table_package(&table).await?;
        let operation_display = self.resolver.operation_label(&operation, &table).await;
        let table_display = self.resolver.table_label(&table).await;
        let type_display = self.resolver.type_label(&rule_type).await;

        Ok(AccessRule {
            table,
            table_display,
            operation,
            operation_display,
            rule_type,
            type_display,
            description: acl.field(fields::DESCRIPTION).map(str::to_string),
            table_package,
        })
    }
}
