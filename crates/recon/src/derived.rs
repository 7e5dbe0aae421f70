//! Renderer-facing views layered on top of a built [`FlowGraph`].

use serde_json::{json, Value};

use crate::model::FlowGraph;

/// Node padding and thickness handed to the diagram renderer.
pub const NODE_PAD: u32 = 50;
pub const NODE_THICKNESS: u32 = 30;
const NODE_LINE_COLOR: &str = "#334155";

impl FlowGraph {
    /// The graph as a Sankey trace: parallel `label`/`color` arrays for nodes
    /// and `source`/`target`/`value`/`color` arrays for links, in the shape
    /// plotting libraries expect.
    pub fn sankey_trace(&self) -> Value {
        json!({
            "type": "sankey",
            "orientation": "h",
            "node": {
                "label": self.nodes.iter().map(|n| n.label.as_str()).collect::<Vec<_>>(),
                "color": self.nodes.iter().map(|n| n.color.as_str()).collect::<Vec<_>>(),
                "pad": NODE_PAD,
                "thickness": NODE_THICKNESS,
                "line": { "color": NODE_LINE_COLOR, "width": 1 },
            },
            "link": {
                "source": self.links.iter().map(|l| l.source).collect::<Vec<_>>(),
                "target": self.links.iter().map(|l| l.target).collect::<Vec<_>>(),
                "value": self.links.iter().map(|l| l.value).collect::<Vec<_>>(),
                "color": self.links.iter().map(|l| l.color.as_str()).collect::<Vec<_>>(),
            },
        })
    }

    /// Column headings for the six stages, with the stage totals filled in.
    pub fn stage_headings(&self) -> [String; 6] {
        let t = &self.totals;
        [
            "Connects by Industry".to_string(),
            format!("Total Connects: {}", t.connects),
            format!("Conversations: {} ({})", t.conversations, t.conversation_rate),
            format!("Meetings: {} ({})", t.meetings, t.meeting_rate),
            format!("Applications: {} ({})", t.applications, t.application_rate),
            "Outcome".to_string(),
        ]
    }
}
