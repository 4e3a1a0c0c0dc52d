//! Frame graph error types.

use thiserror::Error;

use crate::frame_graph::{ResourceId, TaskId};

/// Errors reported by a backend while realizing or derealizing a resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Failed to create resource: {0}")]
    CreationFailed(String),
    #[error("Failed to release resource: {0}")]
    ReleaseFailed(String),
}

/// Errors that can occur while building, compiling or executing a frame graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The handle was issued by another graph, or by this graph before it was cleared.
    #[error("Resource handle {0:?} does not belong to this frame graph")]
    ForeignResource(ResourceId),

    /// The handle points past the end of the resource arena.
    #[error("Invalid resource handle: {0:?}")]
    InvalidResourceHandle(ResourceId),

    /// The handle does not refer to a task of this graph.
    #[error("Invalid task handle: {0:?}")]
    InvalidTaskHandle(TaskId),

    /// A surviving task reads a transient resource that has no surviving producer
    /// declared before it.
    #[error("Resource '{resource}' read by task '{reader}' has no producer that runs before it")]
    UndefinedLifetime { resource: String, reader: String },

    /// `execute` was called without a timeline matching the current topology.
    #[error("Frame graph must be compiled before execution")]
    NotCompiled,

    /// A task asked for the backing object of a resource outside its lifetime.
    #[error("Resource '{0}' is not realized")]
    ResourceNotRealized(String),

    /// A typed handle was used on a resource of a different type.
    #[error("Resource '{0}' does not have the requested type")]
    ResourceTypeMismatch(String),

    /// The backend failed to realize a resource. The frame was aborted.
    #[error("Failed to realize resource '{name}': {source}")]
    Realize {
        name: String,
        #[source]
        source: ResourceError,
    },

    /// The backend failed to derealize a resource. The frame was aborted.
    #[error("Failed to derealize resource '{name}': {source}")]
    Derealize {
        name: String,
        #[source]
        source: ResourceError,
    },
}

pub type GraphResult<T> = Result<T, GraphError>;
