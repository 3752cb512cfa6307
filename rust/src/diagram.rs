//! Render-ready projection of a network and Graphviz dot output.

use std::fmt;

use chrono::{Local, NaiveDateTime};

use crate::activity::{ActivityId, Role};
use crate::analysis::ActivityTiming;
use crate::network::Network;

#[derive(Clone, Debug, PartialEq)]
pub struct DiagramNode {
    pub id: ActivityId,
    pub reference: String,
    pub description: String,
    pub role: Role,
    pub timing: ActivityTiming,
}

/// A precedence edge; `critical` when both endpoints are on the critical path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagramEdge {
    pub from: ActivityId,
    pub to: ActivityId,
    pub critical: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diagram {
    /// Every activity in id order, sentinels first.
    pub nodes: Vec<DiagramNode>,
    /// Edges grouped by source node, in successor order.
    pub edges: Vec<DiagramEdge>,
}

#[derive(Clone, Debug, Default)]
pub struct DotOptions {
    /// Timestamp for the header comment; the current local time when unset.
    pub generated_at: Option<NaiveDateTime>,
}

/// Escape a string for use inside a record label.
fn escape_label(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '"' | '{' | '}' | '|' | '<' | '>') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape a string for use as a quoted node id.
fn escape_id(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Display adapter writing a diagram in dot syntax.
pub struct Dot<'a> {
    diagram: &'a Diagram,
    generated_at: NaiveDateTime,
}

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "/* Generated by precedence on {} */",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "digraph network {{")?;
        writeln!(f, "\trankdir=LR;")?;
        writeln!(f, "\tnode [shape=record];")?;
        writeln!(f)?;
        writeln!(f, "\t/* Activities */")?;
        for node in &self.diagram.nodes {
            let id = escape_id(&node.reference);
            let description = escape_label(&node.description);
            let t = &node.timing;
            match node.role {
                Role::Start => writeln!(f, "\t\"{}\" [label=\"{}\"];", id, description)?,
                Role::Finish => writeln!(
                    f,
                    "\t\"{}\" [label=\"{{{}|{}}}\"];",
                    id, description, t.earliest_finish
                )?,
                Role::Normal => writeln!(
                    f,
                    "\t\"{}\" [label=\"{}|{{{{{}|{}}}|{{{}|{{{}|{}}}}}|{{{}|{}}}}}|{}\"];",
                    id,
                    escape_label(&node.reference),
                    t.earliest_start,
                    t.latest_start,
                    description,
                    t.total_float,
                    t.early_float,
                    t.earliest_finish,
                    t.latest_finish,
                    t.duration
                )?,
            }
        }
        writeln!(f)?;
        writeln!(f, "\t/* Dependencies */")?;
        for edge in &self.diagram.edges {
            let from = escape_id(&self.diagram.nodes[edge.from.index()].reference);
            let to = escape_id(&self.diagram.nodes[edge.to.index()].reference);
            if edge.critical {
                writeln!(f, "\t\"{}\" -> \"{}\" [style=bold];", from, to)?;
            } else {
                writeln!(f, "\t\"{}\" -> \"{}\";", from, to)?;
            }
        }
        writeln!(f, "}}")
    }
}

impl Diagram {
    pub fn dot(&self, options: &DotOptions) -> Dot<'_> {
        Dot {
            diagram: self,
            generated_at: options
                .generated_at
                .unwrap_or_else(|| Local::now().naive_local()),
        }
    }

    pub fn to_dot(&self, options: &DotOptions) -> String {
        self.dot(options).to_string()
    }
}

impl Network {
    /// Read-only projection of the current graph and its timings.
    pub fn diagram(&self) -> Diagram {
        let analysis = self.analysis();
        let nodes = self
            .activities()
            .map(|(id, activity)| DiagramNode {
                id,
                reference: activity.reference().to_string(),
                description: activity.description().to_string(),
                role: activity.role(),
                timing: analysis.timing(id),
            })
            .collect();
        let edges = self
            .activities()
            .flat_map(|(from, activity)| {
                activity.successors().iter().map(move |&to| (from, to))
            })
            .map(|(from, to)| DiagramEdge {
                from,
                to,
                critical: analysis.on_critical_path(from) && analysis.on_critical_path(to),
            })
            .collect();
        Diagram { nodes, edges }
    }

    /// Graphviz dot text stamped with the current time.
    pub fn to_dot(&self) -> String {
        self.diagram().to_dot(&DotOptions::default())
    }
}
