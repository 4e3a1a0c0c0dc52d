//! Compiled execution schedule of a frame graph.

use std::collections::HashMap;

use crate::frame_graph::{ResourceId, TaskId};

/// One entry of the timeline: a task and the transient resources whose
/// lifetime starts right before it or ends right after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub task: TaskId,
    /// Resources realized immediately before the task executes.
    pub realize: Vec<ResourceId>,
    /// Resources derealized immediately after the task executes.
    pub derealize: Vec<ResourceId>,
}

/// Resource lifetime in terms of timeline step indices (both inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLifetime {
    pub realize_step: usize,
    pub derealize_step: usize,
}

impl ResourceLifetime {
    /// Check whether the resource is backed while the given step executes.
    pub fn contains(&self, step: usize) -> bool {
        step >= self.realize_step && step <= self.derealize_step
    }
}

/// Ordered schedule produced by [`FrameGraph::compile`](crate::FrameGraph::compile).
///
/// Only surviving tasks appear, in declaration order. Retained resources never
/// appear in any realize or derealize set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Timeline {
    steps: Vec<Step>,
    lifetimes: HashMap<ResourceId, ResourceLifetime>,
}

impl Timeline {
    pub(crate) fn new(
        steps: Vec<Step>,
        lifetimes: HashMap<ResourceId, ResourceLifetime>,
    ) -> Self {
        Self { steps, lifetimes }
    }

    /// Get the steps in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Get the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if nothing survived compilation.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Tasks in execution order.
    pub fn task_order(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.steps.iter().map(|step| step.task)
    }

    /// Get the lifetime of a surviving transient resource.
    pub fn lifetime(&self, resource: impl Into<ResourceId>) -> Option<ResourceLifetime> {
        self.lifetimes.get(&resource.into()).copied()
    }

    /// Check if a resource is backed at a given execution step.
    pub fn is_resource_alive(&self, resource: impl Into<ResourceId>, step: usize) -> bool {
        self.lifetime(resource)
            .is_some_and(|lifetime| lifetime.contains(step))
    }

    pub(crate) fn clear(&mut self) {
        self.steps.clear();
        self.lifetimes.clear();
    }
}
