#![forbid(unsafe_code)]

//! Periodic coordinate transform + concentric arc layout (headless).
//!
//! Events are `(start, duration)` pairs. Each one becomes an annular sector whose angle encodes
//! the time within a cycle (a day, by default) and whose radius encodes which cycle it fell in.
//! Several datasets can be overlaid on one [`PeriodicChart`]; point annotations are placed on
//! the same scale. Output is a renderer-agnostic [`ChartLayout`].
//!
//! ```
//! use circadian_core::{ChartConfig, EventRecord, PeriodicChart, time::MILLIS_PER_HOUR};
//!
//! let mut chart = PeriodicChart::new(ChartConfig::default().with_epoch(0)).unwrap();
//! chart
//!     .render_dataset(&[EventRecord::new(8 * MILLIS_PER_HOUR, MILLIS_PER_HOUR)], "#333")
//!     .unwrap();
//! assert_eq!(chart.max_cycle_index(), Some(0));
//! ```

pub mod chart;
pub mod config;
pub mod error;
pub mod model;
pub mod record;
pub mod time;

pub use chart::{DatasetSummary, PeriodicChart};
pub use config::ChartConfig;
pub use error::{Error, Result};
pub use model::{
    ArcPrimitive, Bounds, ChartLayout, LabelPrimitive, Layer, LayerKind, LayoutPoint,
    LinePrimitive, PointPrimitive, Primitive, PrimitiveSink, polar_xy,
};
pub use record::{ConditionedRecord, EventRecord};
pub use time::{CycleClock, Timestamp};

#[cfg(test)]
mod tests;
