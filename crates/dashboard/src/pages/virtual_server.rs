use maud::{Markup, html};
use telemetry::{Timestamp, types::parse_ratio};

use crate::{
    charts::{ChartRegistry, ChartSpec, Series},
    snapshot::VirtualSnapshot,
    view::View,
};

use super::{
    alert,
    format::{self, UsageLevel},
    graph::Axis,
    status_badge,
};

pub fn content(
    view: &View,
    snap: &VirtualSnapshot,
    charts: &mut ChartRegistry,
    picked: Option<&Timestamp>,
) -> Markup {
    let overview = snap.overview.clone().unwrap_or_default();

    // Falls back to the picked time when the overview carries no timestamp
    let shown_at = overview.timestamp.as_ref().or(picked);

    let ram = overview.ram_usage.as_deref().and_then(parse_ratio);

    let disk_series = snap
        .disk
        .as_ref()
        .and_then(|disk| disk.used_total())
        .map(|(used, total)| {
            vec![
                Series::single("Used", "var(--red-6)", used),
                Series::single("Available", "var(--green-6)", (total - used).max(0.)),
            ]
        })
        .unwrap_or_default();

    let ram_series = snap
        .ram
        .as_deref()
        .map(|ram| vec![Series::from_samples("Used RAM", "var(--red-6)", ram, |s| s.used())])
        .unwrap_or_default();

    let cpu_series = snap
        .cpu
        .as_deref()
        .map(|cpu| vec![Series::from_samples("CPU Usage", "var(--green-6)", cpu, |s| s.cpu_usage)])
        .unwrap_or_default();

    html! {
        div .card-grid {
            section {
                h2 { "Disk" }
                @if snap.disk.is_none() {
                    (alert("Failed to load disk usage"))
                } @else {
                    (charts.render(&view.dom_id("disk_chart"), ChartSpec::stacked_bar(Axis::Gigabytes), disk_series))
                }
            }

            section .span-2 {
                h2 { "Status" }
                @if snap.overview.is_none() {
                    (alert("Failed to load virtual server details"))
                }
                ul .summary {
                    li { "Date: " (format::or_na(shown_at.and_then(Timestamp::date_label))) }
                    li { "Time: " (format::or_na(shown_at.and_then(Timestamp::time_label))) }
                    li { "Status: " (status_badge(overview.status.as_deref())) }
                    li {
                        "RAM: "
                        @match (ram, overview.ram_usage.as_deref()) {
                            (Some((used, total)), _) => {
                                (format::megabytes(used)) " / " (format::megabytes(total))
                            }
                            (None, Some(raw)) => (format::megabytes_raw(raw)),
                            (None, None) => (format::NA),
                        }
                    }
                    li {
                        "CPU: "
                        @match overview.cpu_usage {
                            Some(cpu) => {
                                span .usage.(UsageLevel::of(cpu).class()) { (format::round2(cpu)) "%" }
                                @if let Some(cores) = overview.num_cores {
                                    " of " (cores) " cores"
                                }
                            }
                            None => (format::NA),
                        }
                    }
                }
            }

            section .span-3 {
                h2 { "RAM" }
                @if snap.ram.is_none() {
                    (alert("Failed to load RAM history"))
                } @else {
                    (charts.render(&view.dom_id("ram_chart"), ChartSpec::line(Axis::Megabytes), ram_series))
                }
            }

            section .span-3 {
                h2 { "CPU" }
                @if snap.cpu.is_none() {
                    (alert("Failed to load CPU history"))
                } @else {
                    (charts.render(&view.dom_id("cpu_chart"), ChartSpec::line(Axis::Percent), cpu_series))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use telemetry::types::{VmCpuSample, VmDiskUsage, VmOverview, VmRamSample};

    use super::*;

    fn view() -> View {
        View::VirtualServer {
            tank: "1".into(),
            server: "pve-01".into(),
            vm: "web".into(),
        }
    }

    #[test]
    fn renders_details_and_charts() {
        let snap = VirtualSnapshot {
            overview: Some(VmOverview {
                timestamp: Some(Timestamp::new("2025-07-01 10:15:00")),
                status: Some("stopped".into()),
                cpu_usage: Some(12.5),
                num_cores: Some(4.),
                ram_usage: Some("2048/4096".into()),
                disk_usage: None,
            }),
            disk: Some(VmDiskUsage {
                disk_usage: "30/100".into(),
            }),
            ram: Some(vec![VmRamSample {
                timestamp: Timestamp::new("2025-07-01 10:00:00"),
                ram_usage: Some("2048/4096".into()),
            }]),
            cpu: Some(vec![VmCpuSample {
                timestamp: Timestamp::new("2025-07-01 10:00:00"),
                cpu_usage: Some(12.5),
                num_cores: Some(4.),
            }]),
        };
        let mut charts = ChartRegistry::new();

        let html = content(&view(), &snap, &mut charts, None).into_string();

        assert!(html.contains("Date: 07/01/2025"));
        assert!(html.contains("Time: 10:15:00"));
        assert!(html.contains("badge -stopped"));
        assert!(html.contains("RAM: 2048.00 MB / 4096.00 MB"));
        assert!(!html.contains("2048.00 GB"));
        assert!(html.contains(r#"<span class="usage -ok">12.5%</span> of 4 cores"#));
        assert!(html.contains(r#"id="1_pve-01_web_disk_chart""#));
        assert!(html.contains(r#"id="1_pve-01_web_ram_chart""#));
        assert!(html.contains(r#"id="1_pve-01_web_cpu_chart""#));
    }

    #[test]
    fn picked_time_shown_without_overview() {
        let snap = VirtualSnapshot {
            overview: None,
            disk: None,
            ram: Some(Vec::new()),
            cpu: None,
        };
        let mut charts = ChartRegistry::new();
        let picked = Timestamp::new("2025-07-01 08:00:00");

        let html = content(&view(), &snap, &mut charts, Some(&picked)).into_string();

        assert!(html.contains("Failed to load virtual server details"));
        assert!(html.contains("Time: 08:00:00"));
        assert!(html.contains("Status: "));
        assert!(html.contains("No data available"));
        assert!(html.contains("Failed to load disk usage"));
    }
}
