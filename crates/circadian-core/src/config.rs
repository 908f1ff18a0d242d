use crate::time::{MILLIS_PER_DAY, Timestamp, parse_timestamp};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Geometry and timing of one chart instance.
///
/// Radii and thicknesses are in drawing units; `period` and `epoch` are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartConfig {
    pub period: i64,
    /// Start of cycle index 0. Pass it explicitly when overlaying more than one dataset.
    pub epoch: Option<Timestamp>,
    #[serde(alias = "centreWidth")]
    pub centre_radius: f64,
    pub arc_thickness: f64,
    pub arc_gap: f64,
    pub annotation_radius: f64,
    pub annotation_padding: f64,
    pub annotation_line_width: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            period: MILLIS_PER_DAY,
            epoch: None,
            centre_radius: 50.0,
            arc_thickness: 1.0,
            arc_gap: 2.0,
            annotation_radius: 20.0,
            annotation_padding: 15.0,
            annotation_line_width: 3.0,
        }
    }
}

fn lookup<'a>(cfg: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = cfg;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

fn json_f64(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_i64().map(|n| n as f64))
        .or_else(|| v.as_u64().map(|n| n as f64))
}

/// Missing or `null` keys fall back to `default`; any other non-number is an error.
fn config_f64(cfg: &Value, key: &'static str, default: f64) -> Result<f64> {
    match lookup(cfg, &[key]) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => json_f64(v).ok_or_else(|| Error::InvalidConfig {
            field: key,
            message: format!("expected a number, got {v}"),
        }),
    }
}

fn config_millis(cfg: &Value, key: &'static str) -> Result<Option<i64>> {
    let Some(v) = lookup(cfg, &[key]) else {
        return Ok(None);
    };
    if v.is_null() {
        return Ok(None);
    }
    if let Some(n) = v.as_i64() {
        return Ok(Some(n));
    }
    if let Some(n) = v.as_f64().filter(|n| n.is_finite()) {
        return Ok(Some(n.floor() as i64));
    }
    if let Some(s) = v.as_str() {
        return match parse_timestamp(s) {
            Some(ts) => Ok(Some(ts)),
            None => Err(Error::InvalidConfig {
                field: key,
                message: format!("unrecognized timestamp {s:?}"),
            }),
        };
    }
    Err(Error::InvalidConfig {
        field: key,
        message: format!("expected milliseconds or a date string, got {v}"),
    })
}

impl ChartConfig {
    /// Reads a (possibly partial) JSON config object; missing keys keep their defaults.
    pub fn from_value(cfg: &Value) -> Result<Self> {
        if !cfg.is_object() && !cfg.is_null() {
            return Err(Error::InvalidConfig {
                field: "config",
                message: "expected a JSON object".to_string(),
            });
        }
        let d = Self::default();
        let centre_radius = match lookup(cfg, &["centreRadius"]) {
            Some(_) => config_f64(cfg, "centreRadius", d.centre_radius)?,
            None => config_f64(cfg, "centreWidth", d.centre_radius)?,
        };
        let out = Self {
            period: config_millis(cfg, "period")?.unwrap_or(d.period),
            epoch: config_millis(cfg, "epoch")?,
            centre_radius,
            arc_thickness: config_f64(cfg, "arcThickness", d.arc_thickness)?,
            arc_gap: config_f64(cfg, "arcGap", d.arc_gap)?,
            annotation_radius: config_f64(cfg, "annotationRadius", d.annotation_radius)?,
            annotation_padding: config_f64(cfg, "annotationPadding", d.annotation_padding)?,
            annotation_line_width: config_f64(
                cfg,
                "annotationLineWidth",
                d.annotation_line_width,
            )?,
        };
        out.validate()?;
        Ok(out)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let v: Value = serde_json::from_str(text)?;
        Self::from_value(&v)
    }

    pub fn with_epoch(mut self, epoch: Timestamp) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.period <= 0 {
            return Err(Error::InvalidConfig {
                field: "period",
                message: format!("must be positive, got {}", self.period),
            });
        }

        let lengths: [(&'static str, f64); 5] = [
            ("centreRadius", self.centre_radius),
            ("arcGap", self.arc_gap),
            ("annotationRadius", self.annotation_radius),
            ("annotationPadding", self.annotation_padding),
            ("annotationLineWidth", self.annotation_line_width),
        ];
        for (field, v) in lengths {
            if !(v.is_finite() && v >= 0.0) {
                return Err(Error::InvalidConfig {
                    field,
                    message: format!("must be a finite, non-negative length, got {v}"),
                });
            }
        }

        // Radii are floored to whole units; anything thinner could collapse an annulus.
        if !(self.arc_thickness.is_finite() && self.arc_thickness >= 1.0) {
            return Err(Error::InvalidConfig {
                field: "arcThickness",
                message: format!("must be at least 1 unit, got {}", self.arc_thickness),
            });
        }
        Ok(())
    }

    /// Radial distance between the inner edges of consecutive annuli.
    pub fn ring_step(&self) -> f64 {
        self.arc_thickness + self.arc_gap
    }
}
