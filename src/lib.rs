//! RedLilium Frame Graph - render pass scheduling with automatic culling
//!
//! Render passes declare the resources they create, read and write. The frame
//! graph works out which passes are needed, runs them in order, and allocates
//! each transient resource only for the span of passes that use it.
//!
//! # Features
//! - Typed resource and task handles
//! - Reference-counted culling of passes whose output is never consumed
//! - Cull-immune passes for side effects such as presentation
//! - Retained resources backed by caller-owned objects
//! - Graphviz export for debugging
//!
//! # Example
//!
//! ```ignore
//! use redlilium_framegraph::FrameGraph;
//!
//! let mut graph = FrameGraph::new();
//! let shadow = graph.add_render_task(
//!     "shadow",
//!     |builder, data: &mut ShadowData| {
//!         data.map = Some(builder.create::<Texture>("shadow_map", shadow_desc));
//!         Ok(())
//!     },
//!     |data, resources| {
//!         if let Ok(map) = resources.get(data.map.unwrap()) {
//!             draw_shadows(map);
//!         }
//!     },
//! )?;
//!
//! graph.compile()?;
//! loop {
//!     graph.execute()?;
//! }
//! ```

pub mod error;
pub mod frame_graph;

pub use error::{GraphError, GraphResult, ResourceError};
pub use frame_graph::{
    FrameGraph, GraphvizStyle, Realize, ResourceHandle, ResourceId, ResourceInfo,
    ResourceLifetime, Resources, Step, TaskBuilder, TaskHandle, TaskId, TaskInfo, Timeline,
};

/// Frame graph library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
