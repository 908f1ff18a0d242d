use crate::config::ChartConfig;
use crate::model::{
    ArcPrimitive, Bounds, ChartLayout, LabelPrimitive, Layer, LayerKind, LinePrimitive,
    PointPrimitive, Primitive, polar_xy,
};
use crate::record::{ConditionedRecord, EventRecord, condition_record, validate_record};
use crate::time::{CycleClock, Timestamp};
use crate::{Error, Result};
use serde::Serialize;

const ANNOTATION_LAYER_ID: &str = "annotations";

/// What one `render_dataset` call added to the chart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub layer_id: String,
    pub record_count: usize,
    /// Records drawn across the cycle boundary.
    pub wrapped_count: usize,
    /// Highest cycle index in this dataset alone.
    pub max_cycle_index: Option<i64>,
}

/// One chart session: datasets are overlaid in call order, annotations sit above them.
///
/// The epoch is frozen by the first dataset (or taken from the config) and `max_cycle_index`
/// only grows. Every operation validates before it mutates, so a failed call leaves the chart
/// as it was.
#[derive(Debug, Clone)]
pub struct PeriodicChart {
    config: ChartConfig,
    clock: CycleClock,
    max_cycle_index: Option<i64>,
    dataset_layers: Vec<Layer>,
    annotations: Option<Layer>,
}

impl PeriodicChart {
    pub fn new(config: ChartConfig) -> Result<Self> {
        config.validate()?;
        let clock = CycleClock::new(config.period)?.with_epoch(config.epoch);
        Ok(Self {
            config,
            clock,
            max_cycle_index: None,
            dataset_layers: Vec::new(),
            annotations: None,
        })
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn clock(&self) -> &CycleClock {
        &self.clock
    }

    pub fn epoch(&self) -> Option<Timestamp> {
        self.clock.epoch()
    }

    pub fn max_cycle_index(&self) -> Option<i64> {
        self.max_cycle_index
    }

    pub fn dataset_count(&self) -> usize {
        self.dataset_layers.len()
    }

    pub fn angle_of(&self, ts: Timestamp) -> f64 {
        self.clock.angle_of(ts)
    }

    pub fn cycle_index_of(&self, ts: Timestamp) -> Result<i64> {
        self.clock.cycle_index_of(ts)
    }

    /// Inner edge of annulus `cycle_index`.
    pub fn inner_radius(&self, cycle_index: i64) -> f64 {
        (self.config.centre_radius + cycle_index as f64 * self.config.ring_step()).floor()
    }

    /// Outer edge of annulus `cycle_index`; the gap to the next annulus stays empty.
    pub fn outer_radius(&self, cycle_index: i64) -> f64 {
        (self.config.centre_radius + (cycle_index + 1) as f64 * self.config.ring_step()
            - self.config.arc_gap)
            .floor()
    }

    /// Maps records onto the wheel without touching chart state.
    ///
    /// Uses the frozen epoch, or the epoch `records` would establish if none is set yet.
    pub fn condition(&self, records: &[EventRecord]) -> Result<Vec<ConditionedRecord>> {
        let (_, conditioned) = self.condition_with_clock(records)?;
        Ok(conditioned)
    }

    fn condition_with_clock(
        &self,
        records: &[EventRecord],
    ) -> Result<(Option<CycleClock>, Vec<ConditionedRecord>)> {
        for (i, r) in records.iter().enumerate() {
            validate_record(i, r, self.clock.period())?;
        }
        let clock = match self.clock.epoch() {
            Some(_) => self.clock,
            None => match self.clock.derive_epoch(records.iter().map(|r| r.start)) {
                Some(epoch) => self.clock.with_epoch(Some(epoch)),
                None => return Ok((None, Vec::new())),
            },
        };
        let conditioned = records
            .iter()
            .enumerate()
            .map(|(i, r)| condition_record(&clock, i, r))
            .collect::<Result<Vec<_>>>()?;
        Ok((Some(clock), conditioned))
    }

    pub fn render_dataset(
        &mut self,
        records: &[EventRecord],
        color: &str,
    ) -> Result<DatasetSummary> {
        let mut n = self.dataset_layers.len();
        let layer_id = loop {
            let id = format!("dataset-{n}");
            if !self.layer_id_taken(&id) {
                break id;
            }
            n += 1;
        };
        self.render_layer(layer_id, records, color)
    }

    /// Like [`Self::render_dataset`], with a caller-chosen layer id (e.g. `"sleep"`).
    ///
    /// Fails with [`Error::DuplicateLayer`] if `name` is already used by a dataset layer or is
    /// the reserved annotation layer id.
    pub fn render_named_dataset(
        &mut self,
        name: &str,
        records: &[EventRecord],
        color: &str,
    ) -> Result<DatasetSummary> {
        if self.layer_id_taken(name) {
            return Err(Error::DuplicateLayer {
                id: name.to_string(),
            });
        }
        self.render_layer(name.to_string(), records, color)
    }

    fn layer_id_taken(&self, id: &str) -> bool {
        id == ANNOTATION_LAYER_ID || self.dataset_layers.iter().any(|l| l.id == id)
    }

    fn render_layer(
        &mut self,
        layer_id: String,
        records: &[EventRecord],
        color: &str,
    ) -> Result<DatasetSummary> {
        if !self.dataset_layers.is_empty() && self.config.epoch.is_none() {
            tracing::warn!(
                layer = %layer_id,
                "overlaying a dataset on an auto-derived epoch; earlier events will be rejected"
            );
        }

        let (clock, conditioned) = self.condition_with_clock(records)?;

        if let Some(epoch) = clock.and_then(|c| c.epoch()) {
            if self.clock.epoch().is_none() {
                tracing::debug!(epoch, layer = %layer_id, "derived chart epoch from first dataset");
                self.clock.freeze_epoch(epoch);
            }
        }

        let mut primitives = Vec::with_capacity(conditioned.len());
        let mut dataset_max: Option<i64> = None;
        let mut wrapped_count = 0usize;
        for c in &conditioned {
            tracing::trace!(
                start_angle = c.start_angle,
                end_angle = c.end_angle,
                cycle_index = c.cycle_index,
                "conditioned record"
            );
            if c.crosses_boundary() {
                wrapped_count += 1;
            }
            dataset_max = Some(dataset_max.map_or(c.cycle_index, |m| m.max(c.cycle_index)));
            primitives.push(Primitive::Arc(ArcPrimitive {
                start_angle: c.start_angle,
                end_angle: c.end_angle,
                inner_radius: self.inner_radius(c.cycle_index),
                outer_radius: self.outer_radius(c.cycle_index),
                cycle_index: c.cycle_index,
                fill: color.to_string(),
            }));
        }

        if let Some(m) = dataset_max {
            self.max_cycle_index = Some(self.max_cycle_index.map_or(m, |cur| cur.max(m)));
        }

        tracing::debug!(
            layer = %layer_id,
            records = records.len(),
            wrapped = wrapped_count,
            max_cycle_index = ?self.max_cycle_index,
            "laid out dataset"
        );

        self.dataset_layers.push(Layer {
            id: layer_id.clone(),
            kind: LayerKind::Dataset,
            color: Some(color.to_string()),
            primitives,
        });

        Ok(DatasetSummary {
            layer_id,
            record_count: conditioned.len(),
            wrapped_count,
            max_cycle_index: dataset_max,
        })
    }

    /// Adds a dot on the timestamp's own annulus, a radial line out past the outermost
    /// annulus, and a label at the line's outer end.
    pub fn annotate_point(&mut self, label: &str, ts: Timestamp, color: &str) -> Result<()> {
        let Some(max_cycle_index) = self.max_cycle_index else {
            return Err(Error::Configuration {
                message: format!(
                    "cannot place annotation `{label}` before any dataset records were laid out"
                ),
            });
        };
        let cycle_index = self.clock.cycle_index_of(ts)?;
        if cycle_index < 0 || cycle_index > max_cycle_index {
            return Err(Error::AnnotationOutOfRange {
                label: label.to_string(),
                cycle_index,
                max_cycle_index,
            });
        }

        let cfg = &self.config;
        let angle = self.clock.angle_of(ts);
        let native_radius = self.inner_radius(cycle_index);
        let boundary_radius = self.inner_radius(max_cycle_index + 1);
        let line_from = native_radius + cfg.annotation_radius;
        let line_to = boundary_radius + cfg.annotation_radius + cfg.annotation_padding;

        let dot = polar_xy(native_radius, angle);
        let p1 = polar_xy(line_from, angle);
        let p2 = polar_xy(line_to, angle);

        let primitives = [
            Primitive::Point(PointPrimitive {
                angle,
                radius: native_radius,
                x: dot.x,
                y: dot.y,
                dot_radius: cfg.annotation_radius,
                fill: color.to_string(),
            }),
            Primitive::Line(LinePrimitive {
                angle,
                from_radius: line_from,
                to_radius: line_to,
                x1: p1.x,
                y1: p1.y,
                x2: p2.x,
                y2: p2.y,
                width: cfg.annotation_line_width,
                stroke: color.to_string(),
            }),
            Primitive::Label(LabelPrimitive {
                angle,
                radius: line_to,
                x: p2.x,
                y: p2.y,
                text: label.to_string(),
                fill: color.to_string(),
            }),
        ];

        tracing::debug!(label, cycle_index, angle, "placed annotation");

        let layer = self.annotations.get_or_insert_with(|| Layer {
            id: ANNOTATION_LAYER_ID.to_string(),
            kind: LayerKind::Annotations,
            color: None,
            primitives: Vec::new(),
        });
        layer.primitives.extend(primitives);
        Ok(())
    }

    pub fn layout(&self) -> ChartLayout {
        let layers: Vec<Layer> = self
            .dataset_layers
            .iter()
            .chain(self.annotations.iter())
            .cloned()
            .collect();

        let extent_radius = layers
            .iter()
            .flat_map(|l| l.primitives.iter())
            .map(Primitive::outer_reach)
            .fold(0.0_f64, f64::max);

        let bounds = Bounds::from_points(
            layers
                .iter()
                .flat_map(|l| l.primitives.iter())
                .flat_map(primitive_extremes),
        );

        ChartLayout {
            period: self.clock.period(),
            epoch: self.clock.epoch(),
            max_cycle_index: self.max_cycle_index,
            extent_radius,
            bounds,
            layers,
        }
    }
}

fn primitive_extremes(p: &Primitive) -> Vec<(f64, f64)> {
    match p {
        // The full annulus square is a safe envelope for any sector of it.
        Primitive::Arc(a) => {
            let r = a.outer_radius;
            vec![(-r, -r), (r, r)]
        }
        Primitive::Point(pt) => {
            let r = pt.dot_radius;
            vec![(pt.x - r, pt.y - r), (pt.x + r, pt.y + r)]
        }
        Primitive::Line(l) => {
            let h = l.width / 2.0;
            vec![
                (l.x1.min(l.x2) - h, l.y1.min(l.y2) - h),
                (l.x1.max(l.x2) + h, l.y1.max(l.y2) + h),
            ]
        }
        Primitive::Label(l) => vec![(l.x, l.y)],
    }
}
