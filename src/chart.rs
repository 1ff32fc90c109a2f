use crate::models::DailyCount;

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 260.0;
const PADDING_X: f64 = 44.0;
const PADDING_Y: f64 = 34.0;
const TOP: f64 = 24.0;
const TICKS: u32 = 4;

/// SVG line chart with point markers, one point per day. `None` when there is
/// nothing to plot.
pub fn render_daily_chart(points: &[DailyCount]) -> Option<String> {
    if points.is_empty() {
        return None;
    }

    let values: Vec<f64> = points.iter().map(|point| point.count as f64).collect();
    let mut min = values.iter().copied().fold(0.0_f64, f64::min);
    let mut max = values.iter().copied().fold(0.0_f64, f64::max);
    if min == max {
        min -= 1.0;
        max += 1.0;
    }

    let range = max - min;
    let x_step = if points.len() > 1 {
        (WIDTH - PADDING_X * 2.0) / (points.len() - 1) as f64
    } else {
        0.0
    };
    let scale_y = (HEIGHT - TOP - PADDING_Y) / range;
    let x = |index: usize| PADDING_X + index as f64 * x_step;
    let y = |value: f64| HEIGHT - PADDING_Y - (value - min) * scale_y;

    let mut svg = format!(
        r#"<svg class="chart" viewBox="0 0 {WIDTH} {HEIGHT}" role="img" aria-label="Contact messages over time">"#
    );

    for tick in 0..=TICKS {
        let value = min + range * f64::from(tick) / f64::from(TICKS);
        let y_pos = y(value);
        svg.push_str(&format!(
            r#"<line class="chart-grid" x1="{PADDING_X}" y1="{y_pos:.2}" x2="{}" y2="{y_pos:.2}" />"#,
            WIDTH - PADDING_X
        ));
        svg.push_str(&format!(
            r#"<text class="chart-label" x="{}" y="{:.2}" text-anchor="end">{}</text>"#,
            PADDING_X - 10.0,
            y_pos + 4.0,
            format_axis_value(value)
        ));
    }

    let path = values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let command = if index == 0 { 'M' } else { 'L' };
            format!("{command} {:.2} {:.2}", x(index), y(*value))
        })
        .collect::<Vec<_>>()
        .join(" ");
    svg.push_str(&format!(r#"<path class="chart-line" d="{path}" />"#));

    for (index, point) in points.iter().enumerate() {
        svg.push_str(&format!(
            r#"<circle class="chart-point" cx="{:.2}" cy="{:.2}" r="4"><title>{}: {}</title></circle>"#,
            x(index),
            y(point.count as f64),
            point.date,
            point.count
        ));
    }

    let label_every = if points.len() > 8 { 2 } else { 1 };
    for (index, point) in points.iter().enumerate().step_by(label_every) {
        svg.push_str(&format!(
            r#"<text class="chart-label" x="{:.2}" y="{}" text-anchor="middle">{}</text>"#,
            x(index),
            HEIGHT - PADDING_Y + 18.0,
            point.date.format("%m-%d")
        ));
    }

    svg.push_str("</svg>");
    Some(svg)
}

fn format_axis_value(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}
