//! # roleaudit Profile
//!
//! This crate assembles role access profiles from a ServiceNow-style metadata
//! store: starting from a role name it finds every role the role contains
//! (directly or transitively), the ACLs attached to each of them, and the
//! tables those ACLs govern.
//!
//! ## Overview
//!
//! The roleaudit-profile crate handles:
//! - **Store**: the [`RecordStore`] seam and an in-memory implementation
//! - **Resolver**: readable labels for opaque sys_ids
//! - **Hierarchy**: cycle-safe role containment walking
//! - **Builder**: the [`Profile`] aggregate (closure, rules, tables)
//!
//! ## Architecture
//!
//! ```text
//! ProfileBuilder
//!   ├─ HierarchyWalker ──────┐
//!   ├─ IdentifierResolver ───┼─→ RecordStore (query / get)
//!   └─ package lookups ──────┘
//!         ↓
//!      Profile { role, all_roles: [RoleAccess], applications }
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use roleaudit_profile::{MemoryStore, ProfileBuilder, Record};
//!
//! async fn example() {
//!     let store = MemoryStore::new()
//!         .with_record("sys_user_role", Record::new().with("sys_id", "r1").with("name", "itil"));
//!
//!     let profile = ProfileBuilder::new(&store).build("itil").await.unwrap();
//!     assert!(profile.error().is_none());
//! }
//! ```

pub mod builder;
pub mod error;
pub mod hierarchy;
pub mod labels;
pub mod model;
pub mod resolver;
pub mod schema;
pub mod store;

// Re-export main types for convenience
pub use builder::ProfileBuilder;
pub use error::{StoreError, StoreResult};
pub use hierarchy::HierarchyWalker;
pub use model::{
    AccessRule, Application, PackageRef, Profile, Role, RoleAccess, RoleProfile, GLOBAL_PACKAGE,
};
pub use resolver::{IdentifierResolver, ResolvedRecord};
pub use store::{Filter, MemoryStore, Record, RecordStore, StoreCall};
