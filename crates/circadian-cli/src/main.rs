mod source;

use circadian_core::time::{Timestamp, parse_timestamp};
use circadian_core::{ChartConfig, ChartLayout, DatasetSummary, PeriodicChart};
use circadian_render::raster::{RasterError, RasterOptions, svg_to_png};
use circadian_render::svg::{SvgRenderOptions, render_chart_svg};
use circadian_render::text::DeterministicTextMeasurer;
use serde::Serialize;
use source::{Mapping, SourceError};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Chart(circadian_core::Error),
    Render(circadian_render::Error),
    Raster(RasterError),
    Json(serde_json::Error),
    Source { path: PathBuf, err: SourceError },
    NoData,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Chart(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Raster(err) => write!(f, "raster error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Source { path, err } => write!(f, "{}: {err}", path.display()),
            CliError::NoData => write!(f, "No datasets given (use --dataset <mapping>:<path>)"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<circadian_core::Error> for CliError {
    fn from(value: circadian_core::Error) -> Self {
        Self::Chart(value)
    }
}

impl From<circadian_render::Error> for CliError {
    fn from(value: circadian_render::Error) -> Self {
        Self::Render(value)
    }
}

impl From<RasterError> for CliError {
    fn from(value: RasterError) -> Self {
        Self::Raster(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    Layout,
    #[default]
    Render,
}

#[derive(Debug, Clone, Copy, Default)]
enum RenderFormat {
    #[default]
    Svg,
    Png,
}

impl FromStr for RenderFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
struct DatasetArg {
    mapping: Mapping,
    path: PathBuf,
    color: Option<String>,
}

#[derive(Debug, Clone)]
struct AnnotationArg {
    label: String,
    at: Timestamp,
    color: Option<String>,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    datasets: Vec<DatasetArg>,
    annotations: Vec<AnnotationArg>,
    config: Option<String>,
    epoch: Option<Timestamp>,
    pretty: bool,
    verbose: bool,
    render_format: RenderFormat,
    scale: f64,
    background: Option<String>,
    diagram_id: Option<String>,
    out: Option<String>,
}

#[derive(Serialize)]
struct LayoutOut<'a> {
    datasets: &'a [DatasetSummary],
    layout: &'a ChartLayout,
}

fn usage() -> &'static str {
    "circadian-cli\n\
\n\
USAGE:\n\
  circadian-cli layout [--pretty] [--config <path|json>] [--epoch <timestamp>] --dataset <mapping>:<path>[:<color>]... [--annotate <label>@<timestamp>[@<color>]]... [--verbose]\n\
  circadian-cli [render] [--format svg|png] [--scale <n>] [--background <css-color>] [--id <diagram-id>] [--out <path>] [--config <path|json>] [--epoch <timestamp>] --dataset <mapping>:<path>[:<color>]... [--annotate <label>@<timestamp>[@<color>]]... [--verbose]\n\
\n\
NOTES:\n\
  - <mapping> is one of: sleep (Time, Duration(minutes)), nursing (Time, Left duration, Right duration), events (start, duration).\n\
  - Datasets are drawn in the order given; annotations are placed after all datasets.\n\
  - Timestamps accept `dd/mm/yyyy, HH:MM`, `YYYY-MM-DD HH:MM[:SS]`, RFC 3339, or integer milliseconds.\n\
  - --config takes a JSON object inline or a path to a JSON file.\n\
  - render prints SVG to stdout by default; PNG output defaults to ./out.png. Use --out - for stdout.\n\
  - Logging goes to stderr; RUST_LOG overrides the default level (warn, or debug with --verbose).\n\
"
}

fn parse_when(text: &str) -> Option<Timestamp> {
    parse_timestamp(text).or_else(|| text.trim().parse::<i64>().ok())
}

fn parse_dataset_arg(spec: &str) -> Option<DatasetArg> {
    let (mapping, rest) = spec.split_once(':')?;
    let mapping = mapping.parse::<Mapping>().ok()?;
    // A trailing `:<color>` is only taken when it cannot be part of a path.
    let (path, color) = match rest.rsplit_once(':') {
        Some((path, color))
            if !path.is_empty()
                && !color.is_empty()
                && !color.contains(['/', '\\', '.']) =>
        {
            (path, Some(color.to_string()))
        }
        _ => (rest, None),
    };
    if path.is_empty() {
        return None;
    }
    Some(DatasetArg {
        mapping,
        path: PathBuf::from(path),
        color,
    })
}

fn parse_annotation_arg(spec: &str) -> Option<AnnotationArg> {
    let mut parts = spec.splitn(3, '@');
    let label = parts.next()?.trim();
    let at = parse_when(parts.next()?)?;
    let color = parts
        .next()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    Some(AnnotationArg {
        label: label.to_string(),
        at,
        color,
    })
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        scale: 1.0,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "--verbose" | "-v" => args.verbose = true,
            "--dataset" => {
                let Some(spec) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let dataset = parse_dataset_arg(spec).ok_or(CliError::Usage(usage()))?;
                args.datasets.push(dataset);
            }
            "--annotate" => {
                let Some(spec) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let annotation = parse_annotation_arg(spec).ok_or(CliError::Usage(usage()))?;
                args.annotations.push(annotation);
            }
            "--config" => {
                let Some(cfg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(cfg.clone());
            }
            "--epoch" => {
                let Some(epoch) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.epoch = Some(parse_when(epoch).ok_or(CliError::Usage(usage()))?);
            }
            "--format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.render_format = fmt
                    .parse::<RenderFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--scale" => {
                let Some(scale) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.scale = scale.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
                if !(args.scale.is_finite() && args.scale > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--background" => {
                let Some(bg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--id" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.diagram_id = Some(id.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            _ => return Err(CliError::Usage(usage())),
        }
    }

    Ok(args)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(args: &Args) -> Result<ChartConfig, CliError> {
    let mut config = match args.config.as_deref() {
        None => ChartConfig::default(),
        Some(text) if text.trim_start().starts_with('{') => ChartConfig::from_json_str(text)?,
        Some(path) => ChartConfig::from_json_str(&std::fs::read_to_string(path)?)?,
    };
    if let Some(epoch) = args.epoch {
        config = config.with_epoch(epoch);
    }
    Ok(config)
}

/// Layer ids follow the mapping name; repeats get a numeric suffix.
fn layer_id(mapping: Mapping, used: &[String]) -> String {
    let base = mapping.name();
    if !used.iter().any(|id| id == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|id| !used.contains(id))
        .unwrap_or_else(|| base.to_string())
}

fn build_chart(args: &Args) -> Result<(PeriodicChart, Vec<DatasetSummary>), CliError> {
    let mut chart = PeriodicChart::new(load_config(args)?)?;

    // Every source is loaded before the first layer is drawn.
    let mut loaded = Vec::with_capacity(args.datasets.len());
    for dataset in &args.datasets {
        let records = source::load_records(&dataset.path, dataset.mapping).map_err(|err| {
            CliError::Source {
                path: dataset.path.clone(),
                err,
            }
        })?;
        loaded.push((dataset, records));
    }

    let mut used = Vec::new();
    let mut summaries = Vec::with_capacity(loaded.len());
    for (dataset, records) in loaded {
        let id = layer_id(dataset.mapping, &used);
        let color = dataset
            .color
            .as_deref()
            .unwrap_or(dataset.mapping.default_color());
        let summary = chart.render_named_dataset(&id, &records, color)?;
        tracing::info!(
            layer = %summary.layer_id,
            records = summary.record_count,
            wrapped = summary.wrapped_count,
            "dataset drawn"
        );
        used.push(id);
        summaries.push(summary);
    }

    for annotation in &args.annotations {
        let color = annotation.color.as_deref().unwrap_or("black");
        chart.annotate_point(&annotation.label, annotation.at, color)?;
    }

    Ok((chart, summaries))
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn write_bytes(bytes: &[u8], out: &str) -> Result<(), CliError> {
    if out == "-" {
        use std::io::Write;
        std::io::stdout().lock().write_all(bytes)?;
    } else {
        std::fs::write(out, bytes)?;
    }
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    init_tracing(args.verbose);

    if args.datasets.is_empty() {
        return Err(CliError::NoData);
    }

    let (chart, summaries) = build_chart(&args)?;
    let layout = chart.layout();

    match args.command {
        Command::Layout => {
            write_json(
                &LayoutOut {
                    datasets: &summaries,
                    layout: &layout,
                },
                args.pretty,
            )?;
            println!();
            Ok(())
        }
        Command::Render => {
            let mut svg_options = SvgRenderOptions {
                diagram_id: args.diagram_id.clone(),
                scale: args.scale,
                ..Default::default()
            };
            if let Some(bg) = &args.background {
                svg_options.background = Some(bg.clone());
            }
            let measurer = DeterministicTextMeasurer::default();
            let svg = render_chart_svg(&layout, &measurer, &svg_options)?;

            match args.render_format {
                RenderFormat::Svg => write_text(&svg, args.out.as_deref()),
                RenderFormat::Png => {
                    let raster = RasterOptions {
                        scale: 1.0,
                        background: svg_options.background.clone(),
                    };
                    let bytes = svg_to_png(&svg, &raster)?;
                    write_bytes(&bytes, args.out.as_deref().unwrap_or("out.png"))
                }
            }
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(CliError::NoData) => {
            eprintln!("{}", CliError::NoData);
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
