use serde::Serialize;

use crate::ir::GrampsId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientStop {
    pub offset: f32,
    pub color: String,
    pub opacity: f32,
}

/// Gradient in user-space coordinates, running from `(x1, y1)` to `(x2, y2)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearGradient {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub stops: Vec<GradientStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Paint {
    Color(String),
    Gradient(LinearGradient),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RectPrimitive {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: Paint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolylinePrimitive {
    pub points: Vec<(f32, f32)>,
    pub stroke: String,
    pub stroke_width: f32,
}

/// Text anchored at its baseline start. Hidden texts are drawn fully
/// transparent; they carry a person ID for the hyperlink pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPrimitive {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub font_size: f32,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Primitive {
    Rect(RectPrimitive),
    Polyline(PolylinePrimitive),
    Text(TextPrimitive),
}

impl Primitive {
    /// Paint order: connectors below boxes, labels on top.
    pub fn layer(&self) -> u8 {
        match self {
            Primitive::Polyline(_) => 0,
            Primitive::Rect(_) => 1,
            Primitive::Text(_) => 2,
        }
    }

    pub fn as_rect(&self) -> Option<&RectPrimitive> {
        match self {
            Primitive::Rect(rect) => Some(rect),
            _ => None,
        }
    }

    pub fn as_polyline(&self) -> Option<&PolylinePrimitive> {
        match self {
            Primitive::Polyline(line) => Some(line),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextPrimitive> {
        match self {
            Primitive::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Placement {
    /// Row of the full-tree timeline.
    Row(usize),
    /// Cell of the ego grid; generation 0 is the topmost drawn band.
    Cell { generation: usize, column: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedNode {
    pub id: GrampsId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub placement: Placement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagramKind {
    FullTree,
    Ego,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub kind: DiagramKind,
    pub focus: Option<GrampsId>,
    pub width: f32,
    pub height: f32,
    /// Placed persons in placement order.
    pub nodes: Vec<PlacedNode>,
    /// Draw primitives in emission order.
    pub primitives: Vec<Primitive>,
}

impl Layout {
    pub fn node(&self, id: &GrampsId) -> Option<&PlacedNode> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    pub fn rects(&self) -> impl Iterator<Item = &RectPrimitive> {
        self.primitives.iter().filter_map(Primitive::as_rect)
    }

    pub fn polylines(&self) -> impl Iterator<Item = &PolylinePrimitive> {
        self.primitives.iter().filter_map(Primitive::as_polyline)
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextPrimitive> {
        self.primitives.iter().filter_map(Primitive::as_text)
    }
}

/// Result of an ego-centered layout.
#[derive(Debug, Clone)]
pub enum EgoOutcome {
    Drawn(Layout),
    /// The person has neither parents nor partner families; nothing to draw.
    NoRelations,
}

impl EgoOutcome {
    pub fn into_layout(self) -> Option<Layout> {
        match self {
            EgoOutcome::Drawn(layout) => Some(layout),
            EgoOutcome::NoRelations => None,
        }
    }
}
