use crate::layout::{Layout, Placement, Primitive};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Debug view of a computed layout: where every person landed plus a count
/// of the emitted primitives by kind.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub kind: String,
    pub focus: Option<String>,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub primitives: PrimitiveCounts,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub placement: Placement,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveCounts {
    pub rects: usize,
    pub gradient_rects: usize,
    pub polylines: usize,
    pub texts: usize,
    pub hidden_texts: usize,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.to_string(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                placement: node.placement,
            })
            .collect();

        let mut primitives = PrimitiveCounts::default();
        for primitive in &layout.primitives {
            match primitive {
                Primitive::Rect(rect) => {
                    primitives.rects += 1;
                    if matches!(rect.fill, crate::layout::Paint::Gradient(_)) {
                        primitives.gradient_rects += 1;
                    }
                }
                Primitive::Polyline(_) => primitives.polylines += 1,
                Primitive::Text(text) => {
                    primitives.texts += 1;
                    if text.hidden {
                        primitives.hidden_texts += 1;
                    }
                }
            }
        }

        LayoutDump {
            kind: format!("{:?}", layout.kind),
            focus: layout.focus.as_ref().map(ToString::to_string),
            width: layout.width,
            height: layout.height,
            nodes,
            primitives,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
