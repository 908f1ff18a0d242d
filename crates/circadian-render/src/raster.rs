use crate::svg::{SvgRenderOptions, render_chart_svg};
use crate::text::TextMeasurer;
use circadian_core::ChartLayout;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error(transparent)]
    Render(#[from] crate::Error),
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("chart SVG has no usable viewBox")]
    MissingViewBox,
    #[error("failed to allocate pixmap for raster rendering")]
    PixmapAlloc,
    #[error("failed to encode PNG")]
    PngEncode,
    #[error("invalid background color: {0}")]
    Background(String),
}

pub type Result<T> = std::result::Result<T, RasterError>;

#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub scale: f32,
    /// Fills the pixmap before drawing; `None` keeps it transparent.
    pub background: Option<String>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: None,
        }
    }
}

pub fn render_chart_png(
    layout: &ChartLayout,
    measurer: &dyn TextMeasurer,
    svg_options: &SvgRenderOptions,
    raster: &RasterOptions,
) -> Result<Vec<u8>> {
    let svg = render_chart_svg(layout, measurer, svg_options)?;
    svg_to_png(&svg, raster)
}

pub fn svg_to_png(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let pixmap = svg_to_pixmap(svg, options.scale, options.background.as_deref())?;
    pixmap.encode_png().map_err(|_| RasterError::PngEncode)
}

fn parse_viewbox_size(svg: &str) -> Option<(f32, f32)> {
    // Cheap, non-validating parse for the root `viewBox="minX minY w h"` we emit ourselves.
    let i = svg.find("viewBox=\"")?;
    let rest = &svg[i + "viewBox=\"".len()..];
    let end = rest.find('"')?;
    let mut it = rest[..end].split_whitespace().skip(2);
    let width = it.next()?.parse::<f32>().ok()?;
    let height = it.next()?.parse::<f32>().ok()?;
    (width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0)
        .then_some((width, height))
}

fn svg_to_pixmap(svg: &str, scale: f32, background: Option<&str>) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    // Keep label output stable-ish across environments while still using system fonts.
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = "Arial".to_string();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|_| RasterError::SvgParse)?;
    // `usvg` already maps the viewBox min corner to (0,0); only the size matters here.
    let (width, height) = parse_viewbox_size(svg).ok_or(RasterError::MissingViewBox)?;

    let width_px = (width * scale).ceil().max(1.0) as u32;
    let height_px = (height * scale).ceil().max(1.0) as u32;
    let mut pixmap =
        tiny_skia::Pixmap::new(width_px, height_px).ok_or(RasterError::PixmapAlloc)?;

    if let Some(bg) = background {
        let color = parse_background(bg).ok_or_else(|| RasterError::Background(bg.into()))?;
        pixmap.fill(color);
    }

    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    Ok(pixmap)
}

/// Accepts any SVG/CSS color spelling, so `--background` means the same for SVG and PNG.
pub fn parse_background(text: &str) -> Option<tiny_skia::Color> {
    let c = text.trim().parse::<svgtypes::Color>().ok()?;
    Some(tiny_skia::Color::from_rgba8(c.red, c.green, c.blue, c.alpha))
}
