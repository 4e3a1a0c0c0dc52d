//! The frame graph: owner of tasks, resources and the compiled timeline.

use log::debug;

use crate::error::{GraphError, GraphResult};
use crate::frame_graph::builder::TaskBuilder;
use crate::frame_graph::compiler;
use crate::frame_graph::executor::{self, Resources};
use crate::frame_graph::resource::{
    self, GraphId, Realize, ResourceHandle, ResourceId, ResourceInfo, ResourceNode,
};
use crate::frame_graph::task::{TaskEdges, TaskHandle, TaskId, TaskInfo, TaskNode, TypedTask};
use crate::frame_graph::timeline::Timeline;

/// Declares, schedules and executes the render tasks of a frame.
///
/// # Construction
///
/// Tasks are added with [`add_render_task`](Self::add_render_task). Their setup
/// callback runs immediately and declares what the task creates, reads and
/// writes. Resources owned by the caller are added with
/// [`add_retained_resource`](Self::add_retained_resource).
///
/// # Compilation
///
/// [`compile`](Self::compile) culls tasks whose outputs are never consumed and
/// schedules when each transient resource is realized and derealized.
///
/// # Execution
///
/// [`execute`](Self::execute) walks the compiled timeline. It can be called
/// once per frame for as long as the topology does not change.
///
/// ```ignore
/// let mut graph = FrameGraph::new();
/// let backbuffer = graph.add_retained_resource("backbuffer", desc, swapchain_image);
///
/// let gbuffer = graph.add_render_task(
///     "gbuffer",
///     |builder, data: &mut GBufferData| {
///         data.albedo = builder.create::<Texture>("albedo", albedo_desc);
///         Ok(())
///     },
///     |data, resources| { /* ... */ },
/// )?;
///
/// graph.compile()?;
/// graph.execute()?;
/// ```
pub struct FrameGraph {
    id: GraphId,
    label: String,
    tasks: Vec<TaskNode>,
    resources: Vec<ResourceNode>,
    timeline: Timeline,
    /// Whether `timeline` matches the current topology.
    compiled: bool,
}

impl FrameGraph {
    /// Create a new empty frame graph.
    pub fn new() -> Self {
        Self::with_label("frame graph")
    }

    /// Create a new empty frame graph with a label used in log messages.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            id: GraphId::next(),
            label: label.into(),
            tasks: Vec::new(),
            resources: Vec::new(),
            timeline: Timeline::default(),
            compiled: false,
        }
    }

    /// Get the label of this graph.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Add a render task.
    ///
    /// `setup` runs once, before this call returns, with a [`TaskBuilder`] and a
    /// default-constructed payload. `execute` runs once per [`execute`](Self::execute)
    /// call while the task survives compilation.
    ///
    /// If `setup` fails, the task and everything it declared are discarded.
    pub fn add_render_task<D, S, E>(
        &mut self,
        name: impl Into<String>,
        setup: S,
        execute: E,
    ) -> GraphResult<TaskHandle<D>>
    where
        D: Default + 'static,
        S: FnOnce(&mut TaskBuilder<'_>, &mut D) -> GraphResult<()>,
        E: FnMut(&D, &Resources<'_>) + 'static,
    {
        let name = name.into();
        let id = TaskId::new(self.id, self.tasks.len());
        let resource_count = self.resources.len();

        let mut data = D::default();
        let mut edges = TaskEdges::default();
        let result = {
            let mut builder =
                TaskBuilder::new(self.id, id, &name, &mut self.resources, &mut edges);
            setup(&mut builder, &mut data)
        };

        if let Err(err) = result {
            debug!("[{}] setup of task '{}' failed: {}", self.label, name, err);
            self.rollback(id, resource_count, &edges);
            return Err(err);
        }

        debug!(
            "[{}] added task '{}' (creates {}, reads {}, writes {})",
            self.label,
            name,
            edges.creates.len(),
            edges.reads.len(),
            edges.writes.len()
        );

        self.tasks.push(TaskNode {
            id,
            name,
            edges,
            ref_count: 0,
            culled: false,
            task: Box::new(TypedTask::new(data, Box::new(execute))),
        });
        self.compiled = false;
        Ok(TaskHandle::new(id))
    }

    /// Undo the edges of a task whose setup failed.
    fn rollback(&mut self, task: TaskId, resource_count: usize, edges: &TaskEdges) {
        self.resources.truncate(resource_count);
        for id in edges.reads.iter().chain(&edges.writes) {
            if let Some(node) = self.resources.get_mut(id.index()) {
                node.readers.retain(|&reader| reader != task);
                node.writers.retain(|&writer| writer != task);
            }
        }
    }

    /// Add a resource whose backing object is owned by the caller, such as a
    /// swapchain image.
    ///
    /// Retained resources are never realized or derealized by the graph, and
    /// tasks writing them are never culled.
    pub fn add_retained_resource<R: Realize>(
        &mut self,
        name: impl Into<String>,
        description: R::Description,
        actual: R,
    ) -> ResourceHandle<R> {
        let id = ResourceId::new(self.id, self.resources.len());
        let name = name.into();
        debug!("[{}] added retained resource '{}'", self.label, name);

        self.resources
            .push(ResourceNode::retained(id, name, description, actual));
        self.compiled = false;
        ResourceHandle::new(id)
    }

    /// Mark a task as cull-immune, or clear the flag.
    pub fn set_cull_immune(
        &mut self,
        task: impl Into<TaskId>,
        cull_immune: bool,
    ) -> GraphResult<()> {
        let index = self.task_index(task.into())?;
        self.tasks[index].edges.cull_immune = cull_immune;
        self.compiled = false;
        Ok(())
    }

    /// Compile the graph into a timeline.
    ///
    /// Must be called again after the topology changes. On error the previous
    /// timeline is discarded.
    pub fn compile(&mut self) -> GraphResult<&Timeline> {
        self.compiled = false;
        compiler::compile_into(&mut self.tasks, &mut self.resources, &mut self.timeline)?;
        self.compiled = true;

        debug!(
            "[{}] timeline: {}",
            self.label,
            self.timeline
                .task_order()
                .map(|task| self.tasks[task.index()].name.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Ok(&self.timeline)
    }

    /// Execute the compiled timeline once.
    pub fn execute(&mut self) -> GraphResult<()> {
        if !self.compiled {
            return Err(GraphError::NotCompiled);
        }
        executor::execute_timeline(
            self.id,
            &self.timeline,
            &mut self.tasks,
            &mut self.resources,
        )
    }

    /// Remove all tasks and resources.
    ///
    /// Handles issued before are invalidated.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.resources.clear();
        self.timeline.clear();
        self.compiled = false;
        self.id = GraphId::next();
    }

    /// Get the timeline of the last successful compile.
    pub fn timeline(&self) -> Option<&Timeline> {
        self.compiled.then_some(&self.timeline)
    }

    /// Check if the graph has a timeline matching its current topology.
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Get the number of tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Get the number of resources.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Iterate over all tasks in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = TaskInfo<'_>> {
        self.tasks.iter().map(TaskInfo::from)
    }

    /// Iterate over all resources in declaration order.
    pub fn resources(&self) -> impl Iterator<Item = ResourceInfo<'_>> {
        self.resources.iter().map(ResourceInfo::from)
    }

    /// Get a task by id.
    pub fn task(&self, task: impl Into<TaskId>) -> GraphResult<TaskInfo<'_>> {
        let index = self.task_index(task.into())?;
        Ok(TaskInfo::from(&self.tasks[index]))
    }

    /// Get a resource by id.
    pub fn resource(&self, resource: impl Into<ResourceId>) -> GraphResult<ResourceInfo<'_>> {
        resource::lookup(self.id, &self.resources, resource.into()).map(ResourceInfo::from)
    }

    /// Get the payload a task's setup filled in.
    pub fn task_data<D: 'static>(&self, task: TaskHandle<D>) -> GraphResult<&D> {
        let index = self.task_index(task.id())?;
        self.tasks[index]
            .data::<D>()
            .ok_or(GraphError::InvalidTaskHandle(task.id()))
    }

    /// Check whether the last compile culled a task.
    pub fn is_culled(&self, task: impl Into<TaskId>) -> GraphResult<bool> {
        let index = self.task_index(task.into())?;
        Ok(self.tasks[index].culled)
    }

    /// Get the description of a resource.
    pub fn description<R: Realize>(
        &self,
        resource: ResourceHandle<R>,
    ) -> GraphResult<&R::Description> {
        let node = resource::lookup(self.id, &self.resources, resource.id())?;
        Ok(node.typed::<R>()?.description())
    }

    /// Get the backing object of a retained resource, or of a transient one
    /// while it is realized.
    pub fn actual<R: Realize>(&self, resource: ResourceHandle<R>) -> GraphResult<&R> {
        Resources::new(self.id, &self.resources).get(resource)
    }

    /// Mutable variant of [`actual`](Self::actual), e.g. to swap the image
    /// behind a retained swapchain resource between frames.
    pub fn actual_mut<R: Realize>(
        &mut self,
        resource: ResourceHandle<R>,
    ) -> GraphResult<&mut R> {
        let node = resource::lookup_mut(self.id, &mut self.resources, resource.id())?;
        let name = node.name.clone();
        node.typed_mut::<R>()?
            .actual_mut()
            .ok_or(GraphError::ResourceNotRealized(name))
    }

    fn task_index(&self, task: TaskId) -> GraphResult<usize> {
        if task.graph() != self.id || task.index() >= self.tasks.len() {
            return Err(GraphError::InvalidTaskHandle(task));
        }
        Ok(task.index())
    }
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}
