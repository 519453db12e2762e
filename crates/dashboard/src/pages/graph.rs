use maud::{Markup, html};
use pretty_bytes_typed::pretty_bytes;

use crate::charts::Series;

const WIDTH: f64 = 600.;
const HEIGHT: f64 = 240.;
const LEFT: f64 = 64.;
const RIGHT: f64 = 12.;
const TOP: f64 = 10.;
const BOTTOM: f64 = 28.;
const TICKS: usize = 4;

const BAR_HEIGHT: f64 = 40.;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Axis {
    /// 0 to 100 %
    Percent,
    /// Fixed 20 to 80 °C
    Celsius,
    /// 0 to the largest value, labelled in bytes
    Bytes,
    /// 0 to the largest value, labelled in GB
    Gigabytes,
    /// 0 to the largest value, labelled in MB
    Megabytes,
    /// Scaled to fit the data
    Auto,
}

impl Axis {
    fn bounds(self, series: &[Series]) -> (f64, f64) {
        let values = series.iter().flat_map(|s| s.points.iter().map(|p| p.value));

        match self {
            Self::Percent => (0., 100.),
            Self::Celsius => (20., 80.),
            Self::Bytes | Self::Gigabytes | Self::Megabytes | Self::Auto => {
                let max = values.fold(0_f64, f64::max);
                if max > 0. { (0., max * 1.1) } else { (0., 1.) }
            }
        }
    }

    pub fn label(self, val: f64) -> String {
        match self {
            Self::Percent => format!("{}%", round(val)),
            Self::Celsius => format!("{}ºC", round(val)),
            Self::Bytes => pretty_bytes(val.max(0.) as u64, Some(2)).to_string(),
            Self::Gigabytes => format!("{:.2} GB", val),
            Self::Megabytes => format!("{} MB", val.round()),
            Self::Auto => round(val).to_string(),
        }
    }
}

fn round(val: f64) -> f64 {
    (val * 100.).round() / 100.
}

fn scale_y(val: f64, (min, max): (f64, f64)) -> f64 {
    let frac = ((val - min) / (max - min)).clamp(0., 1.);
    TOP + (1. - frac) * (HEIGHT - TOP - BOTTOM)
}

fn scale_x(idx: usize, len: usize) -> f64 {
    let plot_width = WIDTH - LEFT - RIGHT;
    if len <= 1 {
        return LEFT + plot_width / 2.;
    }
    LEFT + idx as f64 * plot_width / (len - 1) as f64
}

fn polyline_points(series: &Series, len: usize, bounds: (f64, f64)) -> String {
    series
        .points
        .iter()
        .enumerate()
        .map(|(idx, point)| format!("{},{}", scale_x(idx, len), scale_y(point.value, bounds)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn legend(axis: Axis, series: &[Series], with_values: bool) -> Markup {
    html! {
        ul .legend {
            @for s in series {
                li {
                    span .swatch style={"background:" (s.color)} {}
                    (s.name)
                    @if with_values {
                        @if let Some(point) = s.points.first() {
                            ": " (axis.label(point.value))
                        }
                    }
                }
            }
        }
    }
}

/// Line chart with one polyline per series. Points that carry a sample time
/// link to `/pick` for that time.
pub fn line_graph(axis: Axis, series: &[Series]) -> Markup {
    let bounds = axis.bounds(series);
    let len = series.iter().map(|s| s.points.len()).max().unwrap_or(0);

    let labels = series
        .iter()
        .find(|s| s.points.len() == len)
        .map(|s| (s.points.first(), s.points.last()));

    html! {
        svg .graph viewBox={"0 0 " (WIDTH) " " (HEIGHT)} preserveAspectRatio="none" {
            @for tick in 0..=TICKS {
                @let val = bounds.0 + (bounds.1 - bounds.0) * tick as f64 / TICKS as f64;
                @let y = scale_y(val, bounds);
                line .grid x1=(LEFT) x2=(WIDTH - RIGHT) y1=(y) y2=(y) {}
                text .tick x=(LEFT - 6.) y=(y + 4.) text-anchor="end" { (axis.label(val)) }
            }

            @for s in series {
                polyline points=(polyline_points(s, len, bounds)) fill="none" stroke=(s.color) stroke-width="2" {}

                @for (idx, point) in s.points.iter().enumerate() {
                    @let (cx, cy) = (scale_x(idx, len), scale_y(point.value, bounds));
                    @if let Some(pick) = &point.pick {
                        a href={"/pick?ts=" (urlencoding::encode(pick.as_str()).into_owned())} {
                            circle cx=(cx) cy=(cy) r="3" fill=(s.color) {
                                title { (s.name) " " (point.label) ": " (axis.label(point.value)) }
                            }
                        }
                    } @else {
                        circle cx=(cx) cy=(cy) r="3" fill=(s.color) {
                            title { (s.name) ": " (axis.label(point.value)) }
                        }
                    }
                }
            }

            @if let Some((Some(first), Some(last))) = labels {
                text .tick x=(LEFT) y=(HEIGHT - 8.) text-anchor="start" { (first.label) }
                @if len > 1 {
                    text .tick x=(WIDTH - RIGHT) y=(HEIGHT - 8.) text-anchor="end" { (last.label) }
                }
            }
        }
        (legend(axis, series, false))
    }
}

/// Single horizontal bar split into one segment per series, e.g. used and available disk.
pub fn stacked_bar(axis: Axis, series: &[Series]) -> Markup {
    let values: Vec<f64> = series
        .iter()
        .map(|s| s.points.first().map_or(0., |p| p.value.max(0.)))
        .collect();
    let total: f64 = values.iter().sum();
    let plot_width = WIDTH - RIGHT;

    let mut offset = 0.;
    let segments: Vec<(f64, f64, &Series, f64)> = series
        .iter()
        .zip(&values)
        .map(|(s, &val)| {
            let width = if total > 0. { val / total * plot_width } else { 0. };
            let segment = (offset, width, s, val);
            offset += width;
            segment
        })
        .collect();

    html! {
        svg .graph.-bar viewBox={"0 0 " (WIDTH) " " (BAR_HEIGHT)} preserveAspectRatio="none" {
            @for (x, width, s, val) in segments {
                rect x=(x) y="0" width=(width) height=(BAR_HEIGHT) fill=(s.color) {
                    title { (s.name) ": " (axis.label(val)) }
                }
            }
            @if total <= 0. {
                rect x="0" y="0" width=(plot_width) height=(BAR_HEIGHT) fill="var(--gray-3)" {}
            }
        }
        (legend(axis, series, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Point;

    fn series(name: &str, values: &[f64]) -> Series {
        let mut s = Series::new(name, "red");
        s.points = values
            .iter()
            .map(|&value| Point {
                label: format!("t{value}"),
                value,
                pick: None,
            })
            .collect();
        s
    }

    #[test]
    fn celsius_axis_is_fixed() {
        let data = [series("L1", &[10., 95.])];

        assert_eq!(Axis::Celsius.bounds(&data), (20., 80.));
        assert_eq!(scale_y(10., (20., 80.)), HEIGHT - BOTTOM);
        assert_eq!(scale_y(95., (20., 80.)), TOP);
    }

    #[test]
    fn auto_axis_fits_data() {
        let data = [series("load", &[0.5, 2.])];

        let (min, max) = Axis::Auto.bounds(&data);
        assert_eq!(min, 0.);
        assert!((max - 2.2).abs() < 1e-9);

        assert_eq!(Axis::Auto.bounds(&[series("none", &[0.])]), (0., 1.));
    }

    #[test]
    fn axis_labels() {
        assert_eq!(Axis::Percent.label(41.256), "41.26%");
        assert_eq!(Axis::Celsius.label(55.), "55ºC");
        assert_eq!(Axis::Gigabytes.label(1.5), "1.50 GB");
        assert_eq!(Axis::Megabytes.label(2047.6), "2048 MB");
    }

    #[test]
    fn line_graph_draws_each_series() {
        let markup = line_graph(
            Axis::Percent,
            &[series("cpu", &[1., 2., 3.]), series("ram", &[4., 5., 6.])],
        )
        .into_string();

        assert_eq!(markup.matches("<polyline").count(), 2);
        assert_eq!(markup.matches("<circle").count(), 6);

        let points = markup.split(r#"points=""#).nth(1).unwrap();
        let points = &points[..points.find('"').unwrap()];
        assert_eq!(points.split(' ').count(), 3);
        assert!(points.split(' ').all(|pair| pair.split(',').count() == 2));
        assert!(markup.contains("t1"));
        assert!(markup.contains("t3"));
    }

    #[test]
    fn picked_points_link_to_pick() {
        let mut s = series("cpu", &[1.]);
        s.points[0].pick = Some(telemetry::Timestamp::new("2025-07-01 10:00:00"));

        let markup = line_graph(Axis::Percent, &[s]).into_string();

        assert!(markup.contains(r#"href="/pick?ts=2025-07-01%2010%3A00%3A00""#));
    }

    #[test]
    fn stacked_bar_splits_width() {
        let markup = stacked_bar(
            Axis::Bytes,
            &[series("Used", &[25.]), series("Available", &[75.])],
        )
        .into_string();

        let used_width = (WIDTH - RIGHT) * 0.25;
        assert!(markup.contains(&format!(r#"width="{used_width}""#)));
        assert!(markup.contains("Used: "));
        assert!(markup.contains("Available: "));
    }
}
