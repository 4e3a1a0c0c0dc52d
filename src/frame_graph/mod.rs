//! Frame graph system
//!
//! Render tasks declare what they create, read and write during setup. The
//! graph culls tasks whose outputs are never consumed, orders the rest and
//! decides when each transient resource is realized and derealized.
//!
//! | Stage | Entry point | Result |
//! |-------|-------------|--------|
//! | Setup | [`FrameGraph::add_render_task`], [`TaskBuilder`] | Tasks and edges |
//! | Compile | [`FrameGraph::compile`] | [`Timeline`] |
//! | Execute | [`FrameGraph::execute`] | Realize, execute, derealize per step |

mod builder;
mod compiler;
mod executor;
mod graph;
pub mod graphviz;
mod resource;
mod task;
mod timeline;

pub use builder::TaskBuilder;
pub use executor::Resources;
pub use graph::FrameGraph;
pub use graphviz::GraphvizStyle;
pub use resource::{Realize, ResourceHandle, ResourceId, ResourceInfo};
pub use task::{TaskHandle, TaskId, TaskInfo};
pub use timeline::{ResourceLifetime, Step, Timeline};
