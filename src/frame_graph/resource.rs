//! Resources of the frame graph.
//!
//! A resource is either *transient* (created by a task during setup, backed only
//! between its realize and derealize steps of the timeline) or *retained*
//! (backed by an object the caller hands to the graph, never realized by it).

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{GraphError, GraphResult, ResourceError};
use crate::frame_graph::TaskId;

/// Identity of a frame graph.
///
/// Every graph gets a fresh identity when created and when cleared, so handles
/// issued before can be told apart from current ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(u32);

impl GraphId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Untyped identifier of a resource in a frame graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId {
    graph: GraphId,
    index: usize,
}

impl ResourceId {
    pub(crate) fn new(graph: GraphId, index: usize) -> Self {
        Self { graph, index }
    }

    /// Position of the resource in declaration order.
    pub fn index(self) -> usize {
        self.index
    }

    pub(crate) fn graph(self) -> GraphId {
        self.graph
    }
}

/// Typed handle to a resource in a frame graph.
///
/// `ResourceHandle` is `Copy` and cheap to pass around. It is only valid within
/// the graph that created it, and only until that graph is cleared.
pub struct ResourceHandle<R> {
    id: ResourceId,
    _marker: PhantomData<fn() -> R>,
}

impl<R> ResourceHandle<R> {
    pub(crate) fn new(id: ResourceId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Get the untyped identifier of this resource.
    pub fn id(&self) -> ResourceId {
        self.id
    }
}

impl<R> Clone for ResourceHandle<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for ResourceHandle<R> {}

impl<R> PartialEq for ResourceHandle<R> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<R> Eq for ResourceHandle<R> {}

impl<R> Hash for ResourceHandle<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<R> fmt::Debug for ResourceHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceHandle").field(&self.id).finish()
    }
}

impl<R> From<ResourceHandle<R>> for ResourceId {
    fn from(handle: ResourceHandle<R>) -> Self {
        handle.id
    }
}

/// Backend contract for anything the frame graph can hold as a resource.
///
/// The implementing type is the backing object itself (a texture, a buffer...),
/// and [`Realize::Description`] is what the graph keeps while it is not backed.
///
/// ```ignore
/// impl Realize for Texture {
///     type Description = TextureDescriptor;
///
///     fn realize(description: &TextureDescriptor) -> Result<Self, ResourceError> {
///         DEVICE.create_texture(description).map_err(|_| ResourceError::OutOfMemory)
///     }
/// }
/// ```
pub trait Realize: Sized + 'static {
    /// Immutable description used to allocate the backing object.
    type Description: 'static;

    /// Allocate a new backing object. Called once per frame for transient resources.
    fn realize(description: &Self::Description) -> Result<Self, ResourceError>;

    /// Release the backing object. Dropping it is enough for most backends.
    fn derealize(self, _description: &Self::Description) -> Result<(), ResourceError> {
        Ok(())
    }
}

/// Type-erased view of a typed resource, used by the compiler and executor.
pub(crate) trait ErasedResource {
    fn is_transient(&self) -> bool;
    fn is_realized(&self) -> bool;
    fn realize(&mut self) -> Result<(), ResourceError>;
    fn derealize(&mut self) -> Result<(), ResourceError>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

enum Backing<R> {
    Transient(Option<R>),
    Retained(R),
}

pub(crate) struct TypedResource<R: Realize> {
    description: R::Description,
    backing: Backing<R>,
}

impl<R: Realize> TypedResource<R> {
    pub(crate) fn description(&self) -> &R::Description {
        &self.description
    }

    pub(crate) fn actual(&self) -> Option<&R> {
        match &self.backing {
            Backing::Transient(actual) => actual.as_ref(),
            Backing::Retained(actual) => Some(actual),
        }
    }

    pub(crate) fn actual_mut(&mut self) -> Option<&mut R> {
        match &mut self.backing {
            Backing::Transient(actual) => actual.as_mut(),
            Backing::Retained(actual) => Some(actual),
        }
    }
}

impl<R: Realize> ErasedResource for TypedResource<R> {
    fn is_transient(&self) -> bool {
        matches!(self.backing, Backing::Transient(_))
    }

    fn is_realized(&self) -> bool {
        matches!(self.backing, Backing::Transient(Some(_)))
    }

    fn realize(&mut self) -> Result<(), ResourceError> {
        if let Backing::Transient(actual @ None) = &mut self.backing {
            *actual = Some(R::realize(&self.description)?);
        }
        Ok(())
    }

    fn derealize(&mut self) -> Result<(), ResourceError> {
        if let Backing::Transient(actual) = &mut self.backing {
            if let Some(actual) = actual.take() {
                actual.derealize(&self.description)?;
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A resource together with the edges declared against it.
pub(crate) struct ResourceNode {
    pub(crate) id: ResourceId,
    pub(crate) name: String,
    pub(crate) producer: Option<TaskId>,
    pub(crate) readers: Vec<TaskId>,
    pub(crate) writers: Vec<TaskId>,
    /// Number of readers not culled yet. Scratch state of the compiler.
    pub(crate) ref_count: usize,
    pub(crate) resource: Box<dyn ErasedResource>,
}

impl ResourceNode {
    pub(crate) fn transient<R: Realize>(
        id: ResourceId,
        name: String,
        producer: TaskId,
        description: R::Description,
    ) -> Self {
        Self::new(
            id,
            name,
            Some(producer),
            TypedResource::<R> {
                description,
                backing: Backing::Transient(None),
            },
        )
    }

    pub(crate) fn retained<R: Realize>(
        id: ResourceId,
        name: String,
        description: R::Description,
        actual: R,
    ) -> Self {
        Self::new(
            id,
            name,
            None,
            TypedResource::<R> {
                description,
                backing: Backing::Retained(actual),
            },
        )
    }

    fn new<R: Realize>(
        id: ResourceId,
        name: String,
        producer: Option<TaskId>,
        resource: TypedResource<R>,
    ) -> Self {
        Self {
            id,
            name,
            producer,
            readers: Vec::new(),
            writers: Vec::new(),
            ref_count: 0,
            resource: Box::new(resource),
        }
    }

    pub(crate) fn is_transient(&self) -> bool {
        self.resource.is_transient()
    }

    pub(crate) fn typed<R: Realize>(&self) -> GraphResult<&TypedResource<R>> {
        self.resource
            .as_any()
            .downcast_ref::<TypedResource<R>>()
            .ok_or_else(|| GraphError::ResourceTypeMismatch(self.name.clone()))
    }

    pub(crate) fn typed_mut<R: Realize>(&mut self) -> GraphResult<&mut TypedResource<R>> {
        match self.resource.as_any_mut().downcast_mut::<TypedResource<R>>() {
            Some(typed) => Ok(typed),
            None => Err(GraphError::ResourceTypeMismatch(self.name.clone())),
        }
    }
}

/// Look up the node behind a resource identifier, rejecting foreign handles.
pub(crate) fn lookup(
    graph: GraphId,
    nodes: &[ResourceNode],
    id: ResourceId,
) -> GraphResult<&ResourceNode> {
    if id.graph() != graph {
        return Err(GraphError::ForeignResource(id));
    }
    nodes
        .get(id.index())
        .ok_or(GraphError::InvalidResourceHandle(id))
}

pub(crate) fn lookup_mut(
    graph: GraphId,
    nodes: &mut [ResourceNode],
    id: ResourceId,
) -> GraphResult<&mut ResourceNode> {
    if id.graph() != graph {
        return Err(GraphError::ForeignResource(id));
    }
    nodes
        .get_mut(id.index())
        .ok_or(GraphError::InvalidResourceHandle(id))
}

/// Read-only view of a resource, for debugging and export tools.
#[derive(Debug, Clone, Copy)]
pub struct ResourceInfo<'a> {
    pub id: ResourceId,
    pub name: &'a str,
    /// `false` for resources added with `add_retained_resource`.
    pub transient: bool,
    pub producer: Option<TaskId>,
    pub readers: &'a [TaskId],
    pub writers: &'a [TaskId],
}

impl<'a> From<&'a ResourceNode> for ResourceInfo<'a> {
    fn from(node: &'a ResourceNode) -> Self {
        Self {
            id: node.id,
            name: &node.name,
            transient: node.is_transient(),
            producer: node.producer,
            readers: &node.readers,
            writers: &node.writers,
        }
    }
}
