use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let mut b = Self {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in it {
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
        Some(b)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPoint {
    pub x: f64,
    pub y: f64,
}

/// Wheel coordinates: angle `0` is 12 o'clock, angles grow clockwise, y grows downwards.
pub fn polar_xy(radius: f64, angle: f64) -> LayoutPoint {
    LayoutPoint {
        x: radius * angle.sin(),
        y: -radius * angle.cos(),
    }
}

/// An annular sector. Backends sweep clockwise from `start_angle` to `end_angle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcPrimitive {
    pub start_angle: f64,
    pub end_angle: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub cycle_index: i64,
    pub fill: String,
}

/// A filled dot centred on `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointPrimitive {
    pub angle: f64,
    pub radius: f64,
    pub x: f64,
    pub y: f64,
    pub dot_radius: f64,
    pub fill: String,
}

/// A radial segment from `from_radius` to `to_radius` along `angle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePrimitive {
    pub angle: f64,
    pub from_radius: f64,
    pub to_radius: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    pub stroke: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPrimitive {
    pub angle: f64,
    pub radius: f64,
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Primitive {
    Arc(ArcPrimitive),
    Point(PointPrimitive),
    Line(LinePrimitive),
    Label(LabelPrimitive),
}

impl Primitive {
    /// Outermost radius this primitive paints (labels count as their anchor only).
    pub fn outer_reach(&self) -> f64 {
        match self {
            Primitive::Arc(a) => a.outer_radius,
            Primitive::Point(p) => p.radius + p.dot_radius,
            Primitive::Line(l) => l.from_radius.max(l.to_radius) + l.width / 2.0,
            Primitive::Label(l) => l.radius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKind {
    Dataset,
    Annotations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    pub kind: LayerKind,
    /// Dataset fill color; annotation primitives carry their own colors.
    pub color: Option<String>,
    pub primitives: Vec<Primitive>,
}

/// Renderer-agnostic snapshot of a chart, layers in z-order (first = bottom).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartLayout {
    pub period: i64,
    pub epoch: Option<Timestamp>,
    pub max_cycle_index: Option<i64>,
    /// Outermost radius reached by any primitive; `0` for an empty chart.
    pub extent_radius: f64,
    pub bounds: Option<Bounds>,
    pub layers: Vec<Layer>,
}

impl ChartLayout {
    pub fn primitive_count(&self) -> usize {
        self.layers.iter().map(|l| l.primitives.len()).sum()
    }

    /// Feeds every primitive to `sink`, bottom layer first.
    pub fn replay(&self, sink: &mut dyn PrimitiveSink) {
        for layer in &self.layers {
            sink.begin_layer(layer);
            for primitive in &layer.primitives {
                match primitive {
                    Primitive::Arc(a) => sink.arc(a),
                    Primitive::Point(p) => sink.point(p),
                    Primitive::Line(l) => sink.line(l),
                    Primitive::Label(l) => sink.label(l),
                }
            }
            sink.end_layer(layer);
        }
    }
}

/// A drawing backend.
///
/// Arcs honour the short-arc contract: `end_angle - start_angle` is never negative and never
/// the long way round, so a backend only has to sweep clockwise.
pub trait PrimitiveSink {
    fn begin_layer(&mut self, _layer: &Layer) {}
    fn arc(&mut self, arc: &ArcPrimitive);
    fn point(&mut self, point: &PointPrimitive);
    fn line(&mut self, line: &LinePrimitive);
    fn label(&mut self, label: &LabelPrimitive);
    fn end_layer(&mut self, _layer: &Layer) {}
}
