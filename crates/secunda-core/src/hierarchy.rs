//! # Activity Hierarchy
//!
//! The activity taxonomy is an adjacency list: each node stores only its
//! parent. Depth is computed by walking the parent chain, and every walk
//! carries a visited set so that malformed stored data (a cycle or a
//! dangling parent) terminates instead of looping.
//!
//! The nesting bound is [`MAX_DEPTH`] levels, root counting as depth 1.
//! [`validate_nesting`] is the single gate every create and reparent goes
//! through; [`expand_subtree`] is the breadth-first descent used by the
//! search-by-activity-name query.
//!
//! Stores expose the tree through the [`ActivityGraph`] trait so the same
//! logic runs over Postgres and the in-memory store.

use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;

use crate::error::DirectoryError;
use crate::identity::ActivityId;

/// Maximum nesting depth of the activity tree. A root has depth 1.
pub const MAX_DEPTH: usize = 3;

/// Read access to the parent/child structure of the activity tree.
#[async_trait]
pub trait ActivityGraph: Send {
    /// Parent of `id`.
    ///
    /// `None` when the activity does not exist, `Some(None)` for a root.
    async fn parent_of(
        &mut self,
        id: ActivityId,
    ) -> Result<Option<Option<ActivityId>>, DirectoryError>;

    /// Direct children of every id in `parents`, in any order.
    async fn children_of(
        &mut self,
        parents: &[ActivityId],
    ) -> Result<Vec<ActivityId>, DirectoryError>;
}

/// Depth of an existing activity: 1 for a root, parent's depth + 1 otherwise.
///
/// A cycle or a parent pointer to a missing row ends the walk; the depth
/// counted so far is returned and a warning is logged.
pub async fn depth<G>(graph: &mut G, id: ActivityId) -> Result<usize, DirectoryError>
where
    G: ActivityGraph + ?Sized,
{
    let mut parent = graph
        .parent_of(id)
        .await?
        .ok_or_else(|| DirectoryError::activity_not_found(id))?;

    let mut visited = HashSet::from([id]);
    let mut depth = 1;

    while let Some(current) = parent {
        if !visited.insert(current) {
            tracing::warn!(activity_id = %id, at = %current, "cycle in activity parent chain");
            break;
        }
        match graph.parent_of(current).await? {
            Some(next) => {
                depth += 1;
                parent = next;
            }
            None => {
                tracing::warn!(activity_id = %id, missing = %current, "dangling activity parent");
                break;
            }
        }
    }
    Ok(depth)
}

/// Number of levels in the subtree rooted at `id`, counting `id` itself.
/// A leaf has height 1.
pub async fn subtree_height<G>(graph: &mut G, id: ActivityId) -> Result<usize, DirectoryError>
where
    G: ActivityGraph + ?Sized,
{
    let mut visited = HashSet::from([id]);
    let mut frontier = vec![id];
    let mut height = 0;

    while !frontier.is_empty() {
        height += 1;
        let children = graph.children_of(&frontier).await?;
        frontier = children
            .into_iter()
            .filter(|child| visited.insert(*child))
            .collect();
    }
    Ok(height)
}

/// Check that `current` (or a new node, when `None`) may sit under
/// `proposed_parent`.
///
/// - No parent is always allowed.
/// - Self-parenting fails with [`DirectoryError::SelfParent`].
/// - A missing parent fails with [`DirectoryError::NotFound`].
/// - The deepest node of the moved subtree must stay within [`MAX_DEPTH`],
///   otherwise [`DirectoryError::DepthExceeded`]. For a new node this is
///   `depth(parent) < MAX_DEPTH`.
pub async fn validate_nesting<G>(
    graph: &mut G,
    proposed_parent: Option<ActivityId>,
    current: Option<ActivityId>,
) -> Result<(), DirectoryError>
where
    G: ActivityGraph + ?Sized,
{
    let Some(parent_id) = proposed_parent else {
        return Ok(());
    };
    if current == Some(parent_id) {
        return Err(DirectoryError::SelfParent(parent_id));
    }

    let parent_depth = depth(graph, parent_id).await?;
    let height = match current {
        Some(id) => subtree_height(graph, id).await?,
        None => 1,
    };

    if parent_depth + height > MAX_DEPTH {
        return Err(DirectoryError::DepthExceeded {
            parent_id,
            parent_depth,
            subtree_height: height,
        });
    }
    Ok(())
}

/// Collect `roots` and every descendant reachable within `max_hops` levels
/// below them.
///
/// Each round fetches the children of the previous frontier, discarding
/// ids already collected. The walk ends when a round adds nothing or the
/// hop budget is spent.
pub async fn expand_subtree<G>(
    graph: &mut G,
    roots: &[ActivityId],
    max_hops: usize,
) -> Result<BTreeSet<ActivityId>, DirectoryError>
where
    G: ActivityGraph + ?Sized,
{
    let mut collected: BTreeSet<ActivityId> = roots.iter().copied().collect();
    let mut frontier: Vec<ActivityId> = collected.iter().copied().collect();

    for _ in 0..max_hops {
        if frontier.is_empty() {
            break;
        }
        let children = graph.children_of(&frontier).await?;
        frontier = children
            .into_iter()
            .filter(|child| collected.insert(*child))
            .collect();
    }
    Ok(collected)
}
