//! Role containment walking.
//!
//! A role may contain other roles (`sys_user_role_contains`), which grant their
//! access transitively. [`HierarchyWalker::expand`] collects every role reachable
//! from a root in depth-first, first-discovery order.
//!
//! The walk keeps an explicit stack of pending child lists instead of recursing,
//! and a caller-owned visited set shared by the whole expansion: an id is
//! expanded (its children queried) at most once, so cycles terminate and
//! diamond-shaped hierarchies cost one query per role.

use std::collections::HashSet;
use tracing::{debug, instrument};

use crate::error::StoreResult;
use crate::schema::{fields, ROLE_CONTAINS_TABLE};
use crate::store::{Filter, RecordStore};

/// Walks the role containment graph of a store.
pub struct HierarchyWalker<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> HierarchyWalker<'a, S> {
    /// Create a walker over `store`.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Collect every role id transitively contained in `root_id`.
    ///
    /// # Arguments
    ///
    /// * `root_id` - Role to expand
    /// * `visited` - Ids already expanded; updated in place
    ///
    /// # Returns
    ///
    /// Contained ids without `root_id`, deduplicated, in first-discovery
    /// depth-first order. Empty if `root_id` was already visited.
    #[instrument(skip(self, visited), fields(root = %root_id))]
    pub async fn expand(&self, root_id: &str, visited: &mut HashSet<String>) -> StoreResult<Vec<String>> {
        if !visited.insert(root_id.to_string()) {
            return Ok(Vec::new());
        }

        let mut discovered: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::from([root_id.to_string()]);
        let mut stack = vec![self.children(root_id).await?.into_iter()];

        loop {
            let next = match stack.last_mut() {
                Some(pending) => pending.next(),
                None => break,
            };

            let Some(child) = next else {
                stack.pop();
                continue;
            };

            if seen.insert(child.clone()) {
                discovered.push(child.clone());
            }
            if visited.insert(child.clone()) {
                let grandchildren = self.children(&child).await?;
                stack.push(grandchildren.into_iter());
            }
        }

        debug!(count = discovered.len(), "Expanded role hierarchy");
        Ok(discovered)
    }

    /// Ids of the roles directly contained in `role_id`, in store order.
    pub async fn children(&self, role_id: &str) -> StoreResult<Vec<String>> {
        let rows = self
            .store
            .query(ROLE_CONTAINS_TABLE, &[Filter::eq(fields::CONTAINS_PARENT, role_id)])
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.field(fields::CONTAINS_CHILD))
            .map(str::to_string)
            .collect())
    }
}
