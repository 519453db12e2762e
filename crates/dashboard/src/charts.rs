use std::collections::{HashMap, hash_map::Entry};

use maud::{Markup, html};
use telemetry::{Timestamp, Timestamped};

use crate::pages::graph::{self, Axis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    StackedBar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub axis: Axis,
}

impl ChartSpec {
    pub const fn line(axis: Axis) -> Self {
        Self {
            kind: ChartKind::Line,
            axis,
        }
    }

    pub const fn stacked_bar(axis: Axis) -> Self {
        Self {
            kind: ChartKind::StackedBar,
            axis,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub label: String,
    pub value: f64,
    /// Time this point was sampled at, if clicking it should pick that time.
    pub pick: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: &'static str,
    pub points: Vec<Point>,
}

impl Series {
    pub fn new(name: impl Into<String>, color: &'static str) -> Self {
        Self {
            name: name.into(),
            color,
            points: Vec::new(),
        }
    }

    /// A single unlabelled value, used for bar segments.
    pub fn single(name: impl Into<String>, color: &'static str, value: f64) -> Self {
        let mut series = Self::new(name, color);
        series.points.push(Point {
            label: String::new(),
            value,
            pick: None,
        });
        series
    }

    /// One point per sample that `value` can read. Points link back to their sample time.
    pub fn from_samples<T, F>(
        name: impl Into<String>,
        color: &'static str,
        samples: &[T],
        mut value: F,
    ) -> Self
    where
        T: Timestamped,
        F: FnMut(&T) -> Option<f64>,
    {
        let mut series = Self::new(name, color);
        series.points = samples
            .iter()
            .filter_map(|sample| {
                let ts = sample.timestamp();
                value(sample).map(|value| Point {
                    label: ts.to_string(),
                    value,
                    pick: Some(ts.clone()),
                })
            })
            .collect();
        series
    }
}

#[derive(Debug)]
struct Chart {
    spec: ChartSpec,
    series: Vec<Series>,
    revision: u64,
}

impl Chart {
    fn draw(&self) -> Markup {
        match self.spec.kind {
            ChartKind::Line => graph::line_graph(self.spec.axis, &self.series),
            ChartKind::StackedBar => graph::stacked_bar(self.spec.axis, &self.series),
        }
    }
}

/// Live chart instances of one session, keyed by DOM element id.
#[derive(Debug, Default)]
pub struct ChartRegistry {
    charts: HashMap<String, Chart>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the chart for `id` on first use and updates it in place afterwards.
    /// A chart keeps the kind and axis it was created with.
    pub fn render(&mut self, id: &str, spec: ChartSpec, data: Vec<Series>) -> Markup {
        if data.iter().all(|series| series.points.is_empty()) {
            self.destroy(id);

            return html! {
                div .chart.-empty id=(id) {
                    p .alert { "No data available" }
                }
            };
        }

        let chart = match self.charts.entry(id.to_string()) {
            Entry::Occupied(entry) => {
                let chart = entry.into_mut();
                chart.series = data;
                chart.revision += 1;
                chart
            }
            Entry::Vacant(entry) => entry.insert(Chart {
                spec,
                series: data,
                revision: 0,
            }),
        };

        html! {
            figure .chart id=(id) data-revision=(chart.revision) {
                (chart.draw())
            }
        }
    }

    pub fn destroy(&mut self, id: &str) -> bool {
        self.charts.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.charts.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.charts.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    #[cfg(test)]
    pub fn revision(&self, id: &str) -> Option<u64> {
        self.charts.get(id).map(|chart| chart.revision)
    }
}
