//! End-to-end tests for profile building over an in-memory store.
//!
//! Each test seeds a [`MemoryStore`] with the tables a real instance exposes
//! (`sys_user_role`, `sys_user_role_contains`, `sys_security_acl_role`,
//! `sys_security_acl`, `sys_db_object`, `sys_package`, `sys_metadata`) and
//! checks the assembled profile.

use roleaudit_profile::{
    MemoryStore, PackageRef, Profile, ProfileBuilder, Record, RoleProfile, StoreCall, StoreError,
};
use std::collections::{BTreeSet, HashSet};

const BR_ID: &str = "0f0e0d0c0b0a09080706050403020100";

/// Fluent seeding of a store with roles, containment and ACLs.
struct Fixture {
    store: MemoryStore,
    acl_seq: usize,
}

impl Fixture {
    fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            acl_seq: 0,
        }
    }

    fn role(mut self, name: &str) -> Self {
        self.store.insert(
            "sys_user_role",
            Record::new()
                .with("sys_id", id_of(name))
                .with("name", name)
                .with("description", format!("{} role", name)),
        );
        self
    }

    fn role_in_package(mut self, name: &str, package: &str) -> Self {
        self.store.insert(
            "sys_user_role",
            Record::new()
                .with("sys_id", id_of(name))
                .with("name", name)
                .with("sys_package", id_of(package)),
        );
        self
    }

    fn package(mut self, name: &str) -> Self {
        self.store.insert(
            "sys_package",
            Record::new().with("sys_id", id_of(name)).with("name", name),
        );
        self
    }

    fn table_in_package(mut self, table: &str, package: &str) -> Self {
        self.store.insert(
            "sys_db_object",
            Record::new().with("name", table).with("sys_package", id_of(package)),
        );
        self
    }

    fn contains(mut self, parent: &str, child: &str) -> Self {
        self.store.insert(
            "sys_user_role_contains",
            Record::new().with("role", id_of(parent)).with("contains", id_of(child)),
        );
        self
    }

    fn acl(mut self, role: &str, table: &str, operation: &str) -> Self {
        self.acl_seq += 1;
        let acl_id = format!("acl{}", self.acl_seq);
        self.store.insert(
            "sys_security_acl_role",
            Record::new().with("sys_user_role", id_of(role)).with("sys_security_acl", acl_id.clone()),
        );
        self.store.insert(
            "sys_security_acl",
            Record::new()
                .with("sys_id", acl_id)
                .with("name", table)
                .with("operation", operation)
                .with("type", "record"),
        );
        self
    }

    fn business_rule(mut self, id: &str, name: &str) -> Self {
        self.store.insert(
            "sys_metadata",
            Record::new().with("sys_id", id).with("sys_class_name", "sys_script"),
        );
        self.store.insert("sys_script", Record::new().with("sys_id", id).with("name", name));
        self
    }

    async fn build(&self, role: &str) -> Profile {
        ProfileBuilder::new(&self.store).build(role).await.unwrap()
    }
}

fn id_of(name: &str) -> String {
    format!("id_{}", name)
}

fn complete(profile: &Profile) -> &RoleProfile {
    profile.complete().expect("profile should resolve")
}

fn role_names(profile: &RoleProfile) -> Vec<&str> {
    profile.all_roles.iter().map(|r| r.role.name.as_str()).collect()
}

#[tokio::test]
async fn test_role_not_found() {
    let fixture = Fixture::new().role("itil");
    let profile = fixture.build("adt_user").await;

    assert_eq!(
        profile,
        Profile::NotFound {
            role_name: "adt_user".to_string()
        }
    );
    assert_eq!(profile.error().unwrap(), "Role not found: adt_user");
}

#[tokio::test]
async fn test_chain_closure_and_direct_flags() {
    let fixture = Fixture::new()
        .role("A")
        .role("B")
        .role("C")
        .contains("A", "B")
        .contains("B", "C");

    let profile = fixture.build("A").await;
    let profile = complete(&profile);

    assert_eq!(role_names(profile), vec!["A", "B", "C"]);
    let direct: Vec<bool> = profile.all_roles.iter().map(|r| r.role.is_direct).collect();
    assert_eq!(direct, vec![true, false, false]);
    assert_eq!(profile.role.name, "A");
    assert_eq!(profile.role.description.as_deref(), Some("A role"));
    assert_eq!(profile.direct_count(), 1);
    assert_eq!(profile.inherited_count(), 2);
}

#[tokio::test]
async fn test_cyclic_hierarchy_has_unique_roles() {
    let fixture = Fixture::new()
        .role("A")
        .role("B")
        .role("C")
        .contains("A", "B")
        .contains("B", "C")
        .contains("C", "A")
        .contains("B", "A");

    let profile = fixture.build("A").await;
    let profile = complete(&profile);

    let ids: HashSet<&str> = profile.all_roles.iter().map(|r| r.role.id.as_str()).collect();
    assert_eq!(ids.len(), profile.all_roles.len());
    assert_eq!(profile.all_roles.len(), 3);
    assert_eq!(profile.all_roles.iter().filter(|r| r.role.is_direct).count(), 1);
}

#[tokio::test]
async fn test_dangling_contained_role_is_skipped() {
    let fixture = Fixture::new().role("A").contains("A", "ghost");

    let profile = fixture.build("A").await;
    assert_eq!(role_names(complete(&profile)), vec!["A"]);
}

#[tokio::test]
async fn test_shared_table_collects_both_roles() {
    let fixture = Fixture::new()
        .role("A")
        .role("B")
        .contains("A", "B")
        .acl("B", "incident", "read")
        .acl("A", "incident", "write");

    let profile = fixture.build("A").await;
    let profile = complete(&profile);

    assert_eq!(profile.applications.len(), 1);
    let incident = &profile.applications[0];
    assert_eq!(incident.name, "incident");
    let roles: BTreeSet<&str> = incident.roles.iter().map(String::as_str).collect();
    assert_eq!(roles, BTreeSet::from(["A", "B"]));
}

#[tokio::test]
async fn test_application_roles_match_rule_owners() {
    let fixture = Fixture::new()
        .role("A")
        .role("B")
        .role("C")
        .contains("A", "B")
        .contains("A", "C")
        .acl("A", "incident", "read")
        .acl("B", "problem", "read")
        .acl("C", "incident", "delete")
        .acl("C", "incident.state", "write")
        .acl("C", "problem", "write");

    let profile = fixture.build("A").await;
    let profile = complete(&profile);

    for app in &profile.applications {
        let expected: BTreeSet<&str> = profile
            .all_roles
            .iter()
            .filter(|access| access.rules.iter().any(|rule| rule.table == app.name))
            .map(|access| access.role.name.as_str())
            .collect();
        let actual: BTreeSet<&str> = app.roles.iter().map(String::as_str).collect();
        assert_eq!(actual, expected, "roles of {}", app.name);
        assert_eq!(actual.len(), app.roles.len(), "duplicate roles on {}", app.name);
    }
    assert_eq!(profile.applications.len(), 3);
    assert_eq!(profile.rule_count(), 5);
}

#[tokio::test]
async fn test_business_rule_operation_display() {
    let fixture = Fixture::new()
        .role("A")
        .business_rule(BR_ID, "X")
        .acl("A", "incident", BR_ID)
        .acl("A", "problem", BR_ID);

    let profile = fixture.build("A").await;
    let rules = &complete(&profile).all_roles[0].rules;

    assert_eq!(rules.len(), 2);
    for rule in rules {
        assert_eq!(rule.operation, BR_ID);
        assert_eq!(rule.operation_display, "Business Rule: X");
    }

    // The operation id is resolved once per build
    let metadata_lookups = fixture
        .store
        .calls()
        .await
        .into_iter()
        .filter(|call| matches!(call, StoreCall::Query { table, .. } if table == "sys_metadata"))
        .count();
    assert_eq!(metadata_lookups, 1);
}

#[tokio::test]
async fn test_packages_resolved_for_roles_and_tables() {
    let fixture = Fixture::new()
        .package("ITSM")
        .role_in_package("A", "ITSM")
        .table_in_package("incident", "ITSM")
        .acl("A", "incident", "read")
        .acl("A", "sys_user", "read");

    let profile = fixture.build("A").await;
    let profile = complete(&profile);

    let itsm = PackageRef::new("ITSM", id_of("ITSM"));
    assert_eq!(profile.role.package, itsm);
    let rules = &profile.all_roles[0].rules;
    assert_eq!(rules[0].table_package, itsm);
    assert!(rules[1].table_package.is_global());
    assert_eq!(profile.applications[0].package, itsm);
}

#[tokio::test]
async fn test_builds_are_independent() {
    let fixture = Fixture::new().role("A").business_rule(BR_ID, "X").acl("A", "incident", BR_ID);
    let builder = ProfileBuilder::new(&fixture.store);

    let first = builder.build("A").await.unwrap();
    let second = builder.build("A").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_store_failure_aborts_build() {
    let store = MemoryStore::new()
        .with_record(
            "sys_user_role",
            Record::new().with("sys_id", "r1").with("name", "A"),
        )
        .with_denied_table("sys_security_acl_role");

    let err = ProfileBuilder::new(&store).build("A").await.unwrap_err();
    assert_eq!(err, StoreError::AccessDenied("sys_security_acl_role".to_string()));
}
