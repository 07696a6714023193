//! Category tree reconciliation: turning a category forest plus interaction
//! state into renderable rows, and answering the structural queries safe
//! editing needs.

pub mod tree;

pub use tree::{
    count_descendants, find_by_id, flatten, is_descendant_of, reparent_candidates, search,
    ExpandedKeys,
};
