//! Setup-time access to the frame graph.

use log::trace;

use crate::error::GraphResult;
use crate::frame_graph::resource::{
    self, GraphId, Realize, ResourceHandle, ResourceId, ResourceNode,
};
use crate::frame_graph::task::{TaskEdges, TaskId};

/// Declares the resources a render task creates, reads and writes.
///
/// A builder is handed to the setup callback of
/// [`FrameGraph::add_render_task`](crate::FrameGraph::add_render_task) and only
/// lives for the duration of that call.
///
/// ```ignore
/// graph.add_render_task(
///     "lighting",
///     |builder, data: &mut LightingData| {
///         data.gbuffer = builder.read(gbuffer)?;
///         data.output = builder.create::<Texture>("hdr", hdr_desc);
///         Ok(())
///     },
///     |data, resources| { /* record commands */ },
/// )?;
/// ```
pub struct TaskBuilder<'a> {
    graph: GraphId,
    task: TaskId,
    task_name: &'a str,
    resources: &'a mut Vec<ResourceNode>,
    edges: &'a mut TaskEdges,
}

impl<'a> TaskBuilder<'a> {
    pub(crate) fn new(
        graph: GraphId,
        task: TaskId,
        task_name: &'a str,
        resources: &'a mut Vec<ResourceNode>,
        edges: &'a mut TaskEdges,
    ) -> Self {
        Self {
            graph,
            task,
            task_name,
            resources,
            edges,
        }
    }

    /// Create a new transient resource produced by this task.
    ///
    /// The graph owns the resource and realizes it only while the compiled
    /// timeline needs it.
    pub fn create<R: Realize>(
        &mut self,
        name: impl Into<String>,
        description: R::Description,
    ) -> ResourceHandle<R> {
        let id = ResourceId::new(self.graph, self.resources.len());
        let name = name.into();
        trace!("task '{}' creates resource '{}'", self.task_name, name);

        self.resources
            .push(ResourceNode::transient::<R>(id, name, self.task, description));
        self.edges.creates.push(id);
        ResourceHandle::new(id)
    }

    /// Declare that this task reads a resource.
    ///
    /// Returns the same handle for chaining.
    pub fn read<R: Realize>(
        &mut self,
        handle: ResourceHandle<R>,
    ) -> GraphResult<ResourceHandle<R>> {
        let node = resource::lookup_mut(self.graph, self.resources, handle.id())?;
        node.typed::<R>()?;

        if self.edges.reads.contains(&handle.id()) {
            trace!(
                "task '{}' already reads '{}', ignoring duplicate",
                self.task_name,
                node.name
            );
        } else {
            node.readers.push(self.task);
            self.edges.reads.push(handle.id());
        }
        Ok(handle)
    }

    /// Declare that this task writes a resource.
    ///
    /// Returns the same handle for chaining.
    pub fn write<R: Realize>(
        &mut self,
        handle: ResourceHandle<R>,
    ) -> GraphResult<ResourceHandle<R>> {
        let node = resource::lookup_mut(self.graph, self.resources, handle.id())?;
        node.typed::<R>()?;

        if self.edges.writes.contains(&handle.id()) {
            trace!(
                "task '{}' already writes '{}', ignoring duplicate",
                self.task_name,
                node.name
            );
        } else {
            node.writers.push(self.task);
            self.edges.writes.push(handle.id());
        }
        Ok(handle)
    }

    /// Keep this task even if nothing consumes its outputs.
    ///
    /// Use for tasks with side effects outside the graph, such as presenting.
    pub fn cull_immune(&mut self) {
        self.edges.cull_immune = true;
    }

    /// Name of the task being set up.
    pub fn task_name(&self) -> &str {
        self.task_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GraphError, ResourceError};

    struct Texture;

    impl Realize for Texture {
        type Description = (u32, u32);

        fn realize(_: &(u32, u32)) -> Result<Self, ResourceError> {
            Ok(Texture)
        }
    }

    struct Buffer;

    impl Realize for Buffer {
        type Description = u64;

        fn realize(_: &u64) -> Result<Self, ResourceError> {
            Ok(Buffer)
        }
    }

    #[test]
    fn test_create_sets_producer() {
        let graph = GraphId::next();
        let task = TaskId::new(graph, 0);
        let mut resources = Vec::new();
        let mut edges = TaskEdges::default();

        let handle = {
            let mut builder =
                TaskBuilder::new(graph, task, "gbuffer", &mut resources, &mut edges);
            builder.create::<Texture>("albedo", (1920, 1080))
        };

        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].producer, Some(task));
        assert_eq!(resources[0].name, "albedo");
        assert_eq!(edges.creates, vec![handle.id()]);
    }

    #[test]
    fn test_read_write_are_bidirectional() {
        let graph = GraphId::next();
        let producer = TaskId::new(graph, 0);
        let consumer = TaskId::new(graph, 1);
        let mut resources = Vec::new();

        let mut producer_edges = TaskEdges::default();
        let handle = TaskBuilder::new(graph, producer, "p", &mut resources, &mut producer_edges)
            .create::<Texture>("color", (64, 64));

        let mut edges = TaskEdges::default();
        let mut builder =
            TaskBuilder::new(graph, consumer, "c", &mut resources, &mut edges);
        builder.read(handle).unwrap();
        builder.write(handle).unwrap();

        assert_eq!(resources[0].readers, vec![consumer]);
        assert_eq!(resources[0].writers, vec![consumer]);
        assert_eq!(edges.reads, vec![handle.id()]);
        assert_eq!(edges.writes, vec![handle.id()]);
    }

    #[test]
    fn test_duplicate_edges_recorded_once() {
        let graph = GraphId::next();
        let task = TaskId::new(graph, 0);
        let mut resources = Vec::new();
        let mut edges = TaskEdges::default();

        let mut builder =
            TaskBuilder::new(graph, task, "blur", &mut resources, &mut edges);
        let handle = builder.create::<Buffer>("weights", 128);
        builder.read(handle).unwrap();
        builder.read(handle).unwrap();
        builder.write(handle).unwrap();
        builder.write(handle).unwrap();

        assert_eq!(resources[0].readers.len(), 1);
        assert_eq!(resources[0].writers.len(), 1);
        assert_eq!(edges.reads.len(), 1);
        assert_eq!(edges.writes.len(), 1);
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let other_graph = GraphId::next();
        let mut other_resources = Vec::new();
        let mut other_edges = TaskEdges::default();
        let foreign = TaskBuilder::new(
            other_graph,
            TaskId::new(other_graph, 0),
            "other",
            &mut other_resources,
            &mut other_edges,
        )
        .create::<Buffer>("foreign", 4);

        let graph = GraphId::next();
        let mut resources = Vec::new();
        let mut edges = TaskEdges::default();
        let mut builder =
            TaskBuilder::new(graph, TaskId::new(graph, 0), "t", &mut resources, &mut edges);

        assert_eq!(
            builder.read(foreign),
            Err(GraphError::ForeignResource(foreign.id()))
        );
        assert_eq!(
            builder.write(foreign),
            Err(GraphError::ForeignResource(foreign.id()))
        );
        assert!(edges.reads.is_empty());
        assert!(edges.writes.is_empty());
    }

    #[test]
    fn test_cull_immune() {
        let graph = GraphId::next();
        let mut resources = Vec::new();
        let mut edges = TaskEdges::default();
        let mut builder =
            TaskBuilder::new(graph, TaskId::new(graph, 0), "present", &mut resources, &mut edges);

        assert_eq!(builder.task_name(), "present");
        builder.cull_immune();
        assert!(edges.cull_immune);
    }
}
