use thiserror::Error;

/// Structural problems found when a project snapshot is imported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    #[error("duplicate node id `{0}`")]
    DuplicateNodeId(String),
    #[error("duplicate edge id `{0}`")]
    DuplicateEdgeId(String),
    #[error("node `{node}` references missing parent `{parent}`")]
    MissingParent { node: String, parent: String },
    #[error("node `{node}` has parent `{parent}` which is not a group")]
    ParentNotGroup { node: String, parent: String },
    #[error("parent chain of node `{0}` forms a cycle")]
    ParentCycle(String),
    #[error("edge `{edge}` references missing node `{node}`")]
    DanglingEdge { edge: String, node: String },
}
