//! Render tasks of the frame graph.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::frame_graph::executor::Resources;
use crate::frame_graph::resource::{GraphId, ResourceId};

/// Untyped identifier of a render task in a frame graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    graph: GraphId,
    index: usize,
}

impl TaskId {
    pub(crate) fn new(graph: GraphId, index: usize) -> Self {
        Self { graph, index }
    }

    /// Position of the task in declaration order.
    pub fn index(self) -> usize {
        self.index
    }

    pub(crate) fn graph(self) -> GraphId {
        self.graph
    }
}

/// Typed handle to a render task, returned by
/// [`FrameGraph::add_render_task`](crate::FrameGraph::add_render_task).
///
/// The type parameter is the task's payload, so the handle can be used to get
/// the payload back after setup.
pub struct TaskHandle<D> {
    id: TaskId,
    _marker: PhantomData<fn() -> D>,
}

impl<D> TaskHandle<D> {
    pub(crate) fn new(id: TaskId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Get the untyped identifier of this task.
    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl<D> Clone for TaskHandle<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for TaskHandle<D> {}

impl<D> PartialEq for TaskHandle<D> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<D> Eq for TaskHandle<D> {}

impl<D> Hash for TaskHandle<D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<D> fmt::Debug for TaskHandle<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TaskHandle").field(&self.id).finish()
    }
}

impl<D> From<TaskHandle<D>> for TaskId {
    fn from(handle: TaskHandle<D>) -> Self {
        handle.id
    }
}

/// Type-erased view of a typed task.
pub(crate) trait ErasedTask {
    fn execute(&mut self, resources: &Resources<'_>);
    fn as_any(&self) -> &dyn Any;
}

pub(crate) type ExecuteFn<D> = Box<dyn FnMut(&D, &Resources<'_>)>;

pub(crate) struct TypedTask<D> {
    pub(crate) data: D,
    execute: ExecuteFn<D>,
}

impl<D: 'static> TypedTask<D> {
    pub(crate) fn new(data: D, execute: ExecuteFn<D>) -> Self {
        Self { data, execute }
    }
}

impl<D: 'static> ErasedTask for TypedTask<D> {
    fn execute(&mut self, resources: &Resources<'_>) {
        (self.execute)(&self.data, resources);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Edges a task declares during setup.
///
/// Each list keeps declaration order and holds a resource at most once.
#[derive(Debug, Default)]
pub(crate) struct TaskEdges {
    pub(crate) creates: Vec<ResourceId>,
    pub(crate) reads: Vec<ResourceId>,
    pub(crate) writes: Vec<ResourceId>,
    pub(crate) cull_immune: bool,
}

impl TaskEdges {
    /// Distinct resources the task creates or writes.
    pub(crate) fn outputs(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.creates.iter().copied().chain(
            self.writes
                .iter()
                .copied()
                .filter(move |resource| !self.creates.contains(resource)),
        )
    }

    /// Resources the task reads that it did not create itself.
    ///
    /// A read-modify-write of another task's resource is included: it needs
    /// what was written before.
    pub(crate) fn consumed(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.reads
            .iter()
            .copied()
            .filter(move |resource| !self.creates.contains(resource))
    }
}

/// A task together with the edges it declared.
pub(crate) struct TaskNode {
    pub(crate) id: TaskId,
    pub(crate) name: String,
    pub(crate) edges: TaskEdges,
    /// Number of outputs still in use. Scratch state of the compiler.
    pub(crate) ref_count: usize,
    pub(crate) culled: bool,
    pub(crate) task: Box<dyn ErasedTask>,
}

impl TaskNode {
    pub(crate) fn data<D: 'static>(&self) -> Option<&D> {
        self.task
            .as_any()
            .downcast_ref::<TypedTask<D>>()
            .map(|typed| &typed.data)
    }
}

/// Read-only view of a task, for debugging and export tools.
#[derive(Debug, Clone, Copy)]
pub struct TaskInfo<'a> {
    pub id: TaskId,
    pub name: &'a str,
    pub creates: &'a [ResourceId],
    pub reads: &'a [ResourceId],
    pub writes: &'a [ResourceId],
    pub cull_immune: bool,
    /// Set by the last successful compile.
    pub culled: bool,
}

impl<'a> From<&'a TaskNode> for TaskInfo<'a> {
    fn from(node: &'a TaskNode) -> Self {
        Self {
            id: node.id,
            name: &node.name,
            creates: &node.edges.creates,
            reads: &node.edges.reads,
            writes: &node.edges.writes,
            cull_immune: node.edges.cull_immune,
            culled: node.culled,
        }
    }
}
