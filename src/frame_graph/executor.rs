//! Timeline execution.

use log::{trace, warn};

use crate::error::{GraphError, GraphResult};
use crate::frame_graph::resource::{self, GraphId, Realize, ResourceHandle, ResourceNode};
use crate::frame_graph::task::TaskNode;
use crate::frame_graph::timeline::Timeline;

/// Read access to backing objects, handed to task execute callbacks.
pub struct Resources<'a> {
    graph: GraphId,
    nodes: &'a [ResourceNode],
}

impl<'a> Resources<'a> {
    pub(crate) fn new(graph: GraphId, nodes: &'a [ResourceNode]) -> Self {
        Self { graph, nodes }
    }

    /// Get the backing object of a resource.
    ///
    /// Retained resources are always available. Transient resources are only
    /// available between their realize and derealize steps.
    pub fn get<R: Realize>(&self, handle: ResourceHandle<R>) -> GraphResult<&'a R> {
        let node = resource::lookup(self.graph, self.nodes, handle.id())?;
        node.typed::<R>()?
            .actual()
            .ok_or_else(|| GraphError::ResourceNotRealized(node.name.clone()))
    }

    /// Get the description a resource was declared with.
    pub fn description<R: Realize>(
        &self,
        handle: ResourceHandle<R>,
    ) -> GraphResult<&'a R::Description> {
        let node = resource::lookup(self.graph, self.nodes, handle.id())?;
        Ok(node.typed::<R>()?.description())
    }

    /// Check if a resource is currently backed.
    pub fn is_realized<R: Realize>(&self, handle: ResourceHandle<R>) -> bool {
        self.get(handle).is_ok()
    }
}

/// Walk the timeline once: realize, execute, derealize.
///
/// A backend failure aborts the frame. Everything still realized at that point
/// is derealized before the error is returned.
pub(crate) fn execute_timeline(
    graph: GraphId,
    timeline: &Timeline,
    tasks: &mut [TaskNode],
    resources: &mut [ResourceNode],
) -> GraphResult<()> {
    for (index, step) in timeline.steps().iter().enumerate() {
        for &id in &step.realize {
            let node = &mut resources[id.index()];
            trace!("step {}: realize '{}'", index, node.name);
            if let Err(source) = node.resource.realize() {
                let name = node.name.clone();
                release_realized(resources);
                return Err(GraphError::Realize { name, source });
            }
        }

        let task = &mut tasks[step.task.index()];
        trace!("step {}: execute '{}'", index, task.name);
        task.task.execute(&Resources::new(graph, resources));

        for &id in &step.derealize {
            let node = &mut resources[id.index()];
            trace!("step {}: derealize '{}'", index, node.name);
            if let Err(source) = node.resource.derealize() {
                let name = node.name.clone();
                release_realized(resources);
                return Err(GraphError::Derealize { name, source });
            }
        }
    }

    Ok(())
}

fn release_realized(resources: &mut [ResourceNode]) {
    for node in resources
        .iter_mut()
        .filter(|node| node.resource.is_realized())
    {
        if let Err(err) = node.resource.derealize() {
            warn!("failed to release '{}' after aborted frame: {}", node.name, err);
        }
    }
}
