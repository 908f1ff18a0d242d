/// Baseline-to-baseline distance, in ems, between the lines of one label.
pub const LINE_HEIGHT_EM: f64 = 1.2;

/// Sizes one drawn line of an annotation label.
pub trait TextMeasurer {
    fn line_width(&self, line: &str, font_size: f64) -> f64;
}

/// Font-free estimate: every char is 0.6 em wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicTextMeasurer;

impl TextMeasurer for DeterministicTextMeasurer {
    fn line_width(&self, line: &str, font_size: f64) -> f64 {
        line.chars().count() as f64 * font_size.max(1.0) * 0.6
    }
}

/// Lines of a label as they are drawn, one `<tspan>` each.
pub fn label_lines(text: &str) -> Vec<&str> {
    text.split('\n').map(|l| l.trim_end_matches('\r')).collect()
}

/// Box of a label drawn at `font_size`, lines stacked around the anchor point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBox {
    pub width: f64,
    pub height: f64,
}

pub fn measure_label(measurer: &dyn TextMeasurer, text: &str, font_size: f64) -> LabelBox {
    let lines = label_lines(text);
    let width = lines
        .iter()
        .map(|line| measurer.line_width(line, font_size))
        .fold(0.0_f64, f64::max);
    LabelBox {
        width,
        height: lines.len() as f64 * font_size * LINE_HEIGHT_EM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_scales_with_font_size() {
        let m = DeterministicTextMeasurer;
        let small = m.line_width("sunrise", 14.0);
        assert!((small - 7.0 * 14.0 * 0.6).abs() < 1e-9);
        assert!((m.line_width("sunrise", 28.0) - 2.0 * small).abs() < 1e-9);
    }

    #[test]
    fn label_box_uses_the_widest_line_and_stacks_heights() {
        let b = measure_label(&DeterministicTextMeasurer, "DST\nends today", 10.0);
        assert!((b.width - 10.0 * 10.0 * 0.6).abs() < 1e-9);
        assert!((b.height - 2.0 * 10.0 * LINE_HEIGHT_EM).abs() < 1e-9);
        assert_eq!(label_lines("a\r\nb"), vec!["a", "b"]);
    }
}
