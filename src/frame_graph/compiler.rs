//! Frame graph compilation.
//!
//! Turns the declared tasks and resources into a [`Timeline`]:
//!
//! 1. **Reference counting** - every resource counts its readers. Every edge
//!    from a task to a resource it creates or writes counts the readers of
//!    that resource declared after the task, and every task counts its edges
//!    with a non-zero count. Edges into retained resources always count.
//! 2. **Culling** - the explicit worklist starts with the tasks no edge counts
//!    for. Culling a task decrements the edges of everything written before
//!    it into the resources it reads. A task left without counted edges is
//!    culled in turn, unless it is cull-immune.
//! 3. **Validation** - every surviving reader of a transient resource it did
//!    not create must run after a surviving producer.
//! 4. **Lifetimes** - a transient resource is realized before the first
//!    surviving task that uses it and derealized after the last one.
//!
//! A write is only observed by tasks declared after it, so the counted edges
//! always point forward and a read-modify-write never keeps itself alive.
//!
//! Surviving tasks keep their declaration order. A task can only reference a
//! resource that already exists when it is set up, so declaration order is
//! always a valid topological order.

use std::collections::HashMap;

use log::debug;

use crate::error::{GraphError, GraphResult};
use crate::frame_graph::resource::ResourceNode;
use crate::frame_graph::task::TaskNode;
use crate::frame_graph::timeline::{ResourceLifetime, Step, Timeline};

/// Remaining later readers per `(task index, resource index)` output edge.
///
/// Edges into retained resources are pinned and never stored here.
type EdgeCounts = HashMap<(usize, usize), usize>;

/// Compile tasks and resources into `target`, replacing its previous contents.
///
/// On error `target` is left empty.
pub(crate) fn compile_into(
    tasks: &mut [TaskNode],
    resources: &mut [ResourceNode],
    target: &mut Timeline,
) -> GraphResult<()> {
    target.clear();

    let mut edges = count_references(tasks, resources);
    cull(tasks, resources, &mut edges);
    validate(tasks, resources)?;

    let survivors: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| !task.culled)
        .map(|(index, _)| index)
        .collect();

    let lifetimes = compute_lifetimes(tasks, resources, &survivors);

    let mut steps: Vec<Step> = survivors
        .iter()
        .map(|&index| Step {
            task: tasks[index].id,
            realize: Vec::new(),
            derealize: Vec::new(),
        })
        .collect();

    // Resource declaration order keeps every set deterministic
    for resource in resources.iter() {
        if let Some(lifetime) = lifetimes.get(&resource.id.index()) {
            steps[lifetime.realize_step].realize.push(resource.id);
            steps[lifetime.derealize_step].derealize.push(resource.id);
        }
    }

    debug!(
        "compiled frame graph: {} of {} tasks kept, {} transient resources scheduled",
        steps.len(),
        tasks.len(),
        lifetimes.len()
    );

    *target = Timeline::new(
        steps,
        lifetimes
            .into_iter()
            .map(|(index, lifetime)| (resources[index].id, lifetime))
            .collect(),
    );
    Ok(())
}

fn count_references(tasks: &mut [TaskNode], resources: &mut [ResourceNode]) -> EdgeCounts {
    for resource in resources.iter_mut() {
        resource.ref_count = resource.readers.len();
    }

    let mut edges = EdgeCounts::new();
    for (index, task) in tasks.iter_mut().enumerate() {
        task.culled = false;
        task.ref_count = 0;
        for output in task.edges.outputs() {
            let resource = &resources[output.index()];
            if !resource.is_transient() {
                task.ref_count += 1;
                continue;
            }

            let later_readers = resource
                .readers
                .iter()
                .filter(|reader| reader.index() > index)
                .count();
            if later_readers > 0 {
                edges.insert((index, output.index()), later_readers);
                task.ref_count += 1;
            }
        }
    }
    edges
}

fn cull(tasks: &mut [TaskNode], resources: &mut [ResourceNode], edges: &mut EdgeCounts) {
    let mut stack: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| task.ref_count == 0 && !task.edges.cull_immune)
        .map(|(index, _)| index)
        .collect();

    while let Some(index) = stack.pop() {
        let task = &mut tasks[index];
        if task.culled {
            continue;
        }
        task.culled = true;
        debug!("culled task '{}'", task.name);

        let reads: Vec<usize> = task.edges.reads.iter().map(|id| id.index()).collect();
        for read in reads {
            let resource = &mut resources[read];
            resource.ref_count = resource.ref_count.saturating_sub(1);

            let earlier_users: Vec<usize> = resource
                .producer
                .iter()
                .chain(
                    resource
                        .writers
                        .iter()
                        .filter(|&&writer| Some(writer) != resource.producer),
                )
                .map(|user| user.index())
                .filter(|&user| user < index)
                .collect();

            for user in earlier_users {
                let Some(count) = edges.get_mut(&(user, read)) else {
                    continue;
                };
                *count -= 1;
                if *count > 0 {
                    continue;
                }
                edges.remove(&(user, read));

                let node = &mut tasks[user];
                node.ref_count = node.ref_count.saturating_sub(1);
                if node.ref_count == 0 && !node.edges.cull_immune && !node.culled {
                    stack.push(user);
                }
            }
        }
    }
}

fn validate(tasks: &[TaskNode], resources: &[ResourceNode]) -> GraphResult<()> {
    for (reader_index, task) in tasks.iter().enumerate() {
        if task.culled {
            continue;
        }

        for consumed in task.edges.consumed() {
            let resource = &resources[consumed.index()];
            if !resource.is_transient() {
                continue;
            }

            let produced_before = resource.producer.is_some_and(|producer| {
                producer.index() < reader_index && !tasks[producer.index()].culled
            });
            if !produced_before {
                return Err(GraphError::UndefinedLifetime {
                    resource: resource.name.clone(),
                    reader: task.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Lifetimes of surviving transient resources, keyed by resource index.
fn compute_lifetimes(
    tasks: &[TaskNode],
    resources: &[ResourceNode],
    survivors: &[usize],
) -> HashMap<usize, ResourceLifetime> {
    let mut lifetimes: HashMap<usize, ResourceLifetime> = HashMap::new();

    for (step, &task_index) in survivors.iter().enumerate() {
        let edges = &tasks[task_index].edges;
        for id in edges.creates.iter().chain(&edges.writes).chain(&edges.reads) {
            if !resources[id.index()].is_transient() {
                continue;
            }

            lifetimes
                .entry(id.index())
                .and_modify(|lifetime| lifetime.derealize_step = step)
                .or_insert(ResourceLifetime {
                    realize_step: step,
                    derealize_step: step,
                });
        }
    }

    lifetimes
}
