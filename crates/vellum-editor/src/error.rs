use thiserror::Error;
use vellum_core::{NodeId, QueryError};

/// Why the reducer rejected an action. A rejected action leaves the state
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReducerError {
    #[error("node not found: {0}")]
    NotFound(NodeId),
    #[error(transparent)]
    InvalidSelector(#[from] QueryError),
    #[error("cannot move {node} into {target}: {target} is inside {node}")]
    CyclicReparent { node: NodeId, target: NodeId },
    #[error("{0} cannot contain children")]
    NotAContainer(NodeId),
    #[error("scene not found: {0}")]
    SceneNotFound(NodeId),
    #[error("the last scene cannot be deleted")]
    LastScene,
    #[error("action has no target")]
    EmptyTarget,
}
