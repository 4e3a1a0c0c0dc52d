//! Graphviz export of a frame graph, for offline inspection.
//!
//! Only the public introspection API is used, so the same output can be
//! produced by external tools.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::frame_graph::FrameGraph;

/// Colors and layout of the DOT output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphvizStyle {
    /// Graphviz `rankdir`, e.g. `LR` or `TB`.
    pub rank_direction: String,
    pub task_color: String,
    /// Color of tasks removed by the last compile.
    pub culled_task_color: String,
    pub transient_color: String,
    pub retained_color: String,
    pub create_color: String,
    pub read_color: String,
    pub write_color: String,
}

impl Default for GraphvizStyle {
    fn default() -> Self {
        Self {
            rank_direction: "LR".to_string(),
            task_color: "orange".to_string(),
            culled_task_color: "gray".to_string(),
            transient_color: "blue".to_string(),
            retained_color: "navy".to_string(),
            create_color: "green".to_string(),
            read_color: "red".to_string(),
            write_color: "yellow".to_string(),
        }
    }
}

/// Escape a name for use as a quoted DOT identifier.
fn quote(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// DOT rendering of a graph, written through [`fmt::Display`].
///
/// Tasks and resources are identified by index so duplicate names do not
/// merge nodes; names are used as labels.
pub struct Dot<'a> {
    graph: &'a FrameGraph,
    style: &'a GraphvizStyle,
}

impl<'a> Dot<'a> {
    pub fn new(graph: &'a FrameGraph, style: &'a GraphvizStyle) -> Self {
        Self { graph, style }
    }
}

/// Render the graph as a DOT digraph.
pub fn to_dot(graph: &FrameGraph, style: &GraphvizStyle) -> String {
    Dot::new(graph, style).to_string()
}

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = self.style;
        writeln!(f, "digraph framegraph {{")?;
        writeln!(f, "\trankdir = {}", style.rank_direction)?;
        writeln!(f, "\tnode [shape=rectangle]")?;

        for task in self.graph.tasks() {
            let color = if task.culled {
                &style.culled_task_color
            } else {
                &style.task_color
            };
            writeln!(
                f,
                "\tt{} [label={}, color={color}, fontcolor={color}]",
                task.id.index(),
                quote(task.name)
            )?;
        }

        for resource in self.graph.resources() {
            let color = if resource.transient {
                &style.transient_color
            } else {
                &style.retained_color
            };
            writeln!(
                f,
                "\tr{} [label={}, color={color}, fontcolor={color}]",
                resource.id.index(),
                quote(resource.name)
            )?;
        }

        for task in self.graph.tasks() {
            let t = task.id.index();
            for resource in task.creates {
                writeln!(f, "\tt{t} -> r{} [color={}]", resource.index(), style.create_color)?;
            }
            for resource in task.reads {
                writeln!(f, "\tr{} -> t{t} [color={}]", resource.index(), style.read_color)?;
            }
            for resource in task.writes {
                writeln!(f, "\tt{t} -> r{} [color={}]", resource.index(), style.write_color)?;
                writeln!(f, "\tr{} -> t{t} [color={}]", resource.index(), style.write_color)?;
            }
        }

        writeln!(f, "}}")
    }
}

impl FrameGraph {
    /// Render the graph as Graphviz DOT text with the default style.
    pub fn to_graphviz(&self) -> String {
        to_dot(self, &GraphvizStyle::default())
    }

    /// Write the graph as Graphviz DOT text.
    pub fn export_graphviz<W: Write>(
        &self,
        writer: &mut W,
        style: &GraphvizStyle,
    ) -> io::Result<()> {
        write!(writer, "{}", Dot::new(self, style))
    }

    /// Write the graph as Graphviz DOT text to a file, with the default style.
    pub fn export_graphviz_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.export_graphviz(&mut writer, &GraphvizStyle::default())?;
        writer.flush()
    }
}
