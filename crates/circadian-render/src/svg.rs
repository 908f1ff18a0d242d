use crate::text::{LINE_HEIGHT_EM, TextMeasurer, label_lines, measure_label};
use crate::{Error, Result};
use circadian_core::{
    ArcPrimitive, Bounds, ChartLayout, LabelPrimitive, Layer, LayerKind, LinePrimitive,
    PointPrimitive, PrimitiveSink,
};
use std::fmt::Write as _;

mod path;

pub use path::annular_sector_path;

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    /// Root `<svg id>`; also prefixes layer ids and scopes the CSS.
    pub diagram_id: Option<String>,
    /// Extra space around the fitted viewBox, in output units.
    pub margin: f64,
    /// Uniform scale applied around the wheel centre.
    pub scale: f64,
    /// CSS background color; `None` leaves the SVG transparent.
    pub background: Option<String>,
    pub arc_opacity: f64,
    pub font_family: String,
    pub label_font_size: f64,
    /// Gap between the end of an annotation line and its label.
    pub label_offset: f64,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            diagram_id: None,
            margin: 10.0,
            scale: 1.0,
            background: Some("white".to_string()),
            arc_opacity: 1.0,
            font_family: r#""trebuchet ms",verdana,arial,sans-serif"#.to_string(),
            label_font_size: 14.0,
            label_offset: 4.0,
        }
    }
}

impl SvgRenderOptions {
    fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::InvalidOptions {
                message: format!("scale must be positive, got {}", self.scale),
            });
        }
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err(Error::InvalidOptions {
                message: format!("margin must be non-negative, got {}", self.margin),
            });
        }
        if !(self.arc_opacity.is_finite() && (0.0..=1.0).contains(&self.arc_opacity)) {
            return Err(Error::InvalidOptions {
                message: format!("arc opacity must be within 0..=1, got {}", self.arc_opacity),
            });
        }
        Ok(())
    }
}

pub(crate) fn fmt(v: f64) -> String {
    if !v.is_finite() || v.abs() < 0.0005 {
        return "0".to_string();
    }
    let mut s = format!("{:.3}", (v * 1000.0).round() / 1000.0);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" { "0".to_string() } else { s }
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Labels on the left half of the wheel grow leftwards, away from the rings.
fn label_anchor(label: &LabelPrimitive) -> &'static str {
    if label.x < -0.0005 { "end" } else { "start" }
}

fn label_position(label: &LabelPrimitive, offset: f64) -> (f64, f64) {
    let p = circadian_core::polar_xy(label.radius + offset, label.angle);
    (p.x, p.y)
}

fn label_bounds(
    layout: &ChartLayout,
    measurer: &dyn TextMeasurer,
    options: &SvgRenderOptions,
) -> Vec<(f64, f64)> {
    let mut pts = Vec::new();
    for layer in &layout.layers {
        for p in &layer.primitives {
            let circadian_core::Primitive::Label(label) = p else {
                continue;
            };
            let metrics = measure_label(measurer, &label.text, options.label_font_size);
            let (x, y) = label_position(label, options.label_offset);
            let (x0, x1) = match label_anchor(label) {
                "end" => (x - metrics.width, x),
                _ => (x, x + metrics.width),
            };
            pts.push((x0, y - metrics.height / 2.0));
            pts.push((x1, y + metrics.height / 2.0));
        }
    }
    pts
}

fn chart_css(diagram_id: &str, options: &SvgRenderOptions) -> String {
    let id = escape_xml(diagram_id);
    format!(
        "#{id}{{font-family:{ff};}}#{id} .arc{{stroke:none;}}#{id} .annotation-line{{stroke-linecap:round;}}#{id} .annotation-label{{font-size:{fs}px;dominant-baseline:central;}}",
        ff = options.font_family,
        fs = fmt(options.label_font_size),
    )
}

struct SvgSink<'a> {
    out: String,
    diagram_id: &'a str,
    options: &'a SvgRenderOptions,
}

impl PrimitiveSink for SvgSink<'_> {
    fn begin_layer(&mut self, layer: &Layer) {
        let (class, fill) = match layer.kind {
            LayerKind::Dataset => ("layer dataset", layer.color.as_deref()),
            LayerKind::Annotations => ("layer annotations", None),
        };
        let _ = write!(
            &mut self.out,
            r#"<g id="{id}-{layer}" class="{class}""#,
            id = escape_xml(self.diagram_id),
            layer = escape_xml(&layer.id),
        );
        if let Some(fill) = fill {
            let _ = write!(&mut self.out, r#" fill="{}""#, escape_xml(fill));
        }
        if layer.kind == LayerKind::Dataset && self.options.arc_opacity < 1.0 {
            let _ = write!(
                &mut self.out,
                r#" fill-opacity="{}""#,
                fmt(self.options.arc_opacity)
            );
        }
        self.out.push('>');
    }

    fn arc(&mut self, arc: &ArcPrimitive) {
        let Some(d) = annular_sector_path(arc) else {
            return;
        };
        let _ = write!(
            &mut self.out,
            r#"<path class="arc" data-cycle="{cycle}" d="{d}" fill="{fill}" fill-rule="evenodd"/>"#,
            cycle = arc.cycle_index,
            fill = escape_xml(&arc.fill),
        );
    }

    fn point(&mut self, point: &PointPrimitive) {
        let _ = write!(
            &mut self.out,
            r#"<circle class="annotation-dot" cx="{cx}" cy="{cy}" r="{r}" fill="{fill}"/>"#,
            cx = fmt(point.x),
            cy = fmt(point.y),
            r = fmt(point.dot_radius),
            fill = escape_xml(&point.fill),
        );
    }

    fn line(&mut self, line: &LinePrimitive) {
        let _ = write!(
            &mut self.out,
            r#"<line class="annotation-line" x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{stroke}" stroke-width="{w}"/>"#,
            x1 = fmt(line.x1),
            y1 = fmt(line.y1),
            x2 = fmt(line.x2),
            y2 = fmt(line.y2),
            stroke = escape_xml(&line.stroke),
            w = fmt(line.width),
        );
    }

    fn label(&mut self, label: &LabelPrimitive) {
        let (x, y) = label_position(label, self.options.label_offset);
        let lines = label_lines(&label.text);
        let _ = write!(
            &mut self.out,
            r#"<text class="annotation-label" x="{x}" y="{y}" fill="{fill}" text-anchor="{anchor}">"#,
            x = fmt(x),
            y = fmt(y),
            fill = escape_xml(&label.fill),
            anchor = label_anchor(label),
        );
        if let [line] = lines.as_slice() {
            self.out.push_str(&escape_xml(line));
        } else {
            // One tspan per line, stacked so the block stays centred on `y`.
            let line_height = self.options.label_font_size * LINE_HEIGHT_EM;
            for (i, line) in lines.iter().enumerate() {
                let dy = if i == 0 {
                    -((lines.len() - 1) as f64) * line_height / 2.0
                } else {
                    line_height
                };
                let _ = write!(
                    &mut self.out,
                    r#"<tspan x="{x}" dy="{dy}">{text}</tspan>"#,
                    x = fmt(x),
                    dy = fmt(dy),
                    text = escape_xml(line),
                );
            }
        }
        self.out.push_str("</text>");
    }

    fn end_layer(&mut self, _layer: &Layer) {
        self.out.push_str("</g>");
    }
}

/// Renders a chart layout as a standalone SVG document centred on the wheel.
///
/// The viewBox is fitted to every primitive plus measured label boxes, then scaled and padded
/// by `options.margin`.
pub fn render_chart_svg(
    layout: &ChartLayout,
    measurer: &dyn TextMeasurer,
    options: &SvgRenderOptions,
) -> Result<String> {
    options.validate()?;

    let diagram_id = options.diagram_id.as_deref().unwrap_or("circadian");
    let diagram_id_esc = escape_xml(diagram_id);

    let mut pts: Vec<(f64, f64)> = Vec::new();
    if let Some(b) = &layout.bounds {
        pts.push((b.min_x, b.min_y));
        pts.push((b.max_x, b.max_y));
    }
    pts.extend(label_bounds(layout, measurer, options));
    let bounds = Bounds::from_points(pts).unwrap_or(Bounds {
        min_x: -50.0,
        min_y: -50.0,
        max_x: 50.0,
        max_y: 50.0,
    });

    let s = options.scale;
    let m = options.margin;
    let vb_min_x = bounds.min_x * s - m;
    let vb_min_y = bounds.min_y * s - m;
    let vb_w = (bounds.width() * s + m * 2.0).max(1.0);
    let vb_h = (bounds.height() * s + m * 2.0).max(1.0);

    tracing::debug!(
        layers = layout.layers.len(),
        primitives = layout.primitive_count(),
        vb_w,
        vb_h,
        "rendering chart svg"
    );

    let mut out = String::new();
    let _ = write!(
        &mut out,
        r#"<svg id="{id}" width="100%" xmlns="http://www.w3.org/2000/svg" viewBox="{x} {y} {w} {h}" style="max-width: {w}px;{bg}" role="graphics-document document" aria-roledescription="periodic">"#,
        id = diagram_id_esc,
        x = fmt(vb_min_x),
        y = fmt(vb_min_y),
        w = fmt(vb_w),
        h = fmt(vb_h),
        bg = options
            .background
            .as_deref()
            .map(|bg| format!(" background-color: {};", escape_xml(bg)))
            .unwrap_or_default(),
    );
    let _ = write!(
        &mut out,
        "<style>{}</style>",
        chart_css(diagram_id, options)
    );

    if s == 1.0 {
        out.push_str(r#"<g class="chart">"#);
    } else {
        let _ = write!(&mut out, r#"<g class="chart" transform="scale({})">"#, fmt(s));
    }

    let mut sink = SvgSink {
        out,
        diagram_id,
        options,
    };
    layout.replay(&mut sink);
    let mut out = sink.out;

    out.push_str("</g></svg>\n");
    Ok(out)
}
