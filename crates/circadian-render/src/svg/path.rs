// Annular sector paths.
//
// Angles follow the wheel convention of `circadian_core::polar_xy`: `0` at 12 o'clock, growing
// clockwise in SVG's y-down space, so SVG arc sweep-flag `1` is the clockwise direction.

use super::fmt;
use circadian_core::{ArcPrimitive, polar_xy};
use std::f64::consts::{PI, TAU};

const ANGLE_EPSILON: f64 = 1e-9;

fn push_point(out: &mut String, cmd: char, radius: f64, angle: f64) {
    let p = polar_xy(radius, angle);
    out.push(cmd);
    out.push_str(&fmt(p.x));
    out.push(',');
    out.push_str(&fmt(p.y));
}

fn push_arc_to(out: &mut String, radius: f64, large: bool, clockwise: bool, angle: f64) {
    let r = fmt(radius);
    let p = polar_xy(radius, angle);
    out.push_str(&format!(
        "A{r},{r},0,{},{},{},{}",
        u8::from(large),
        u8::from(clockwise),
        fmt(p.x),
        fmt(p.y)
    ));
}

/// Full circle as two half arcs starting and ending at 12 o'clock.
fn push_circle(out: &mut String, radius: f64, clockwise: bool) {
    push_point(out, 'M', radius, 0.0);
    push_arc_to(out, radius, true, clockwise, PI);
    push_arc_to(out, radius, true, clockwise, 0.0);
    out.push('Z');
}

/// SVG path data for one sector, or `None` when it would paint nothing.
///
/// Sweeps of a full turn or more become a whole ring (drawn with an `evenodd`-safe reversed
/// inner circle).
pub fn annular_sector_path(arc: &ArcPrimitive) -> Option<String> {
    let outer = arc.outer_radius.max(0.0);
    let inner = arc.inner_radius.clamp(0.0, outer);
    let sweep = arc.end_angle - arc.start_angle;
    if !(sweep.is_finite() && sweep > ANGLE_EPSILON) || outer <= inner {
        return None;
    }

    let mut d = String::new();
    if sweep >= TAU - ANGLE_EPSILON {
        push_circle(&mut d, outer, true);
        if inner > 0.0 {
            push_circle(&mut d, inner, false);
        }
        return Some(d);
    }

    let large = sweep > PI;
    let (a0, a1) = (arc.start_angle, arc.end_angle);
    push_point(&mut d, 'M', outer, a0);
    push_arc_to(&mut d, outer, large, true, a1);
    if inner > 0.0 {
        push_point(&mut d, 'L', inner, a1);
        push_arc_to(&mut d, inner, large, false, a0);
    } else {
        d.push_str("L0,0");
    }
    d.push('Z');
    Some(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc(start_angle: f64, end_angle: f64, inner: f64, outer: f64) -> ArcPrimitive {
        ArcPrimitive {
            start_angle,
            end_angle,
            inner_radius: inner,
            outer_radius: outer,
            cycle_index: 0,
            fill: "#333".to_string(),
        }
    }

    #[test]
    fn quarter_sector_from_noon_to_three() {
        let d = annular_sector_path(&arc(0.0, PI / 2.0, 50.0, 51.0)).unwrap();
        assert_eq!(d, "M0,-51A51,51,0,0,1,51,0L50,0A50,50,0,0,0,0,-50Z");
    }

    #[test]
    fn wrapped_sector_sweeps_through_twelve_o_clock() {
        // 23:30 -> 00:30 on a 24h wheel.
        let d = annular_sector_path(&arc(-TAU / 48.0, TAU / 48.0, 50.0, 51.0)).unwrap();
        assert!(d.starts_with("M-6.657,-50.564A51,51,0,0,1,6.657,-50.564"), "{d}");
        assert!(d.contains("A50,50,0,0,0,-6.526,-49.572Z"), "{d}");
    }

    #[test]
    fn long_sector_sets_the_large_arc_flag() {
        let d = annular_sector_path(&arc(0.0, 1.5 * PI, 10.0, 20.0)).unwrap();
        assert!(d.contains("A20,20,0,1,1,-20,0"), "{d}");
        assert!(d.contains("A10,10,0,1,0,0,-10"), "{d}");
    }

    #[test]
    fn empty_sectors_are_skipped() {
        assert!(annular_sector_path(&arc(1.0, 1.0, 50.0, 51.0)).is_none());
        assert!(annular_sector_path(&arc(0.0, 1.0, 51.0, 51.0)).is_none());
        assert!(annular_sector_path(&arc(0.0, f64::NAN, 50.0, 51.0)).is_none());
    }

    #[test]
    fn full_turn_becomes_a_ring() {
        let d = annular_sector_path(&arc(0.0, TAU, 5.0, 8.0)).unwrap();
        assert_eq!(
            d,
            "M0,-8A8,8,0,1,1,0,8A8,8,0,1,1,0,-8ZM0,-5A5,5,0,1,0,0,5A5,5,0,1,0,0,-5Z"
        );
    }

    #[test]
    fn zero_inner_radius_draws_a_pie_slice() {
        let d = annular_sector_path(&arc(0.0, PI / 2.0, 0.0, 10.0)).unwrap();
        assert_eq!(d, "M0,-10A10,10,0,0,1,10,0L0,0Z");
    }
}
