use maud::{Markup, html};
use telemetry::{
    Timestamp,
    timestamp::at_or_before,
    types::parse_ratio,
};

use crate::{
    charts::{ChartRegistry, ChartSpec, Series},
    snapshot::{PhysicalSnapshot, VmCard},
    view::View,
};

use super::{
    alert,
    format::{self, UsageLevel},
    graph::Axis,
    status_badge, temperature, usage_meter,
};

const SENSOR_COLORS: [&str; 6] = [
    "var(--red-6)",
    "var(--orange-6)",
    "var(--green-6)",
    "var(--blue-6)",
    "var(--purple-6)",
    "var(--pink-6)",
];

fn cpu_line(percent: Option<f64>, cores: Option<f64>) -> Markup {
    html! {
        @match percent {
            Some(percent) => {
                span .usage.(UsageLevel::of(percent).class()) { (format::round2(percent)) "%" }
                @if let Some(cores) = cores {
                    " of " (cores) " cores"
                }
            }
            None => (format::NA),
        }
    }
}

fn vm_card(view: &View, card: &VmCard) -> Markup {
    let (Some(tank), Some(server)) = (view.tank(), view.server()) else {
        return html! {};
    };
    let vm_view = View::VirtualServer {
        tank: tank.to_string(),
        server: server.to_string(),
        vm: card.name.clone(),
    };
    let overview = card.overview.clone().unwrap_or_default();

    let ram = overview.ram_usage.as_deref().and_then(parse_ratio);
    let disk = card.disk.as_ref().and_then(|disk| disk.used_total());

    html! {
        a .card href=(vm_view.path()) id=(vm_view.dom_id("card")) {
            h3 { (card.name) " " (status_badge(overview.status.as_deref())) }
            (usage_meter("RAM", ram.map(|x| x.0), ram.map(|x| x.1), format::megabytes))
            p { "CPU: " (cpu_line(overview.cpu_usage, overview.num_cores)) }
            (usage_meter("Disk", disk.map(|x| x.0), disk.map(|x| x.1), format::gigabytes))
        }
    }
}

/// Readings at or before the picked time, for each series that has one.
fn picked_readings(snap: &PhysicalSnapshot, picked: &Timestamp) -> Markup {
    let cpu = snap.cpu.as_deref().and_then(|cpu| at_or_before(cpu, picked));
    let ram = snap.ram.as_deref().and_then(|ram| at_or_before(ram, picked));
    let sensors = snap.temperatures.iter().flatten().filter_map(|sensor| {
        at_or_before(&sensor.data, picked).map(|sample| (&sensor.name, sample))
    });

    html! {
        h3 { "At " (picked.to_string()) }
        ul .summary {
            @if let Some(sample) = cpu {
                li { "CPU Usage: " (cpu_line(sample.cpu_percent_used, sample.logical_cores)) }
            }
            @if let Some(sample) = ram {
                li { "RAM: " (format::or_na(sample.used_ram.map(format::bytes))) }
            }
            @for (name, sample) in sensors {
                li { (name) ": " (temperature(sample.avg_temp)) " (" (sample.timestamp.to_string()) ")" }
            }
        }
    }
}

pub fn content(
    view: &View,
    snap: &PhysicalSnapshot,
    charts: &mut ChartRegistry,
    picked: Option<&Timestamp>,
) -> Markup {
    let summary = snap.summary.clone().unwrap_or_default();

    let temperature_series: Vec<Series> = snap
        .temperatures
        .iter()
        .flatten()
        .zip(SENSOR_COLORS.into_iter().cycle())
        .map(|(sensor, color)| {
            Series::from_samples(&sensor.name, color, &sensor.data, |s| s.avg_temp)
        })
        .collect();

    let ram_series = snap
        .ram
        .as_deref()
        .map(|ram| vec![Series::from_samples("Used RAM", "var(--red-6)", ram, |s| s.used_ram)])
        .unwrap_or_default();

    let cpu_series = snap
        .cpu
        .as_deref()
        .map(|cpu| {
            vec![Series::from_samples("CPU Usage", "var(--green-6)", cpu, |s| {
                s.cpu_percent_used
            })]
        })
        .unwrap_or_default();

    let disk_series = snap
        .disk
        .as_ref()
        .map(|disk| {
            vec![
                Series::single("Used", "var(--red-6)", disk.used_bytes),
                Series::single(
                    "Available",
                    "var(--green-6)",
                    (disk.total_bytes - disk.used_bytes).max(0.),
                ),
            ]
        })
        .unwrap_or_default();

    html! {
        div .card-grid {
            section .span-3 {
                h2 { "Temperature" }
                @if snap.temperatures.is_none() {
                    (alert("Failed to load temperatures"))
                } @else {
                    (charts.render(&view.dom_id("temperature_chart"), ChartSpec::line(Axis::Auto), temperature_series))
                }
            }

            section {
                h2 { "Summary" }
                @if snap.summary.is_none() {
                    (alert("Failed to load server summary"))
                }
                ul .summary {
                    li { "IP: " (format::or_na(summary.ip.as_ref())) }
                    li { (usage_meter("RAM", summary.used_ram, summary.total_ram, format::bytes)) }
                    li { "CPU Temperature: " (temperature(summary.temp)) }
                    li { "CPU Usage: " (cpu_line(summary.cpu_used, None)) }
                    li { (usage_meter("Disk", summary.used_disk, summary.total_disk, format::bytes)) }
                }
                @if let Some(picked) = picked {
                    (picked_readings(snap, picked))
                }
            }

            section .span-2 {
                h2 { "RAM" }
                @if snap.ram.is_none() {
                    (alert("Failed to load RAM history"))
                } @else {
                    (charts.render(&view.dom_id("ram_chart"), ChartSpec::line(Axis::Bytes), ram_series))
                }
            }

            section {
                h2 { "Disk" }
                @match &snap.disk {
                    None => (alert("Failed to load disk usage")),
                    Some(disk) => {
                        p { (format::round2(disk.percent_used)) "% used" }
                        (charts.render(&view.dom_id("disk_chart"), ChartSpec::stacked_bar(Axis::Bytes), disk_series))
                    }
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

            section .span-3 {
                h2 { "Virtual Servers" }
                @match &snap.vms {
                    None => (alert("Failed to load virtual servers")),
                    Some(vms) if vms.is_empty() => (alert("No virtual servers found.")),
                    Some(vms) => {
                        div .card-list {
                            @for card in vms {
                                (vm_card(view, card))
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use telemetry::{
        Timestamp,
        types::{CpuSample, DiskUsage, PhysicalSummary, TemperatureSample, TemperatureSeries, VmDiskUsage, VmOverview},
    };

    use super::*;

    fn view() -> View {
        View::PhysicalServer {
            tank: "1".into(),
            server: "pve-01".into(),
        }
    }

    fn empty() -> PhysicalSnapshot {
        PhysicalSnapshot {
            temperatures: None,
            summary: None,
            ram: None,
            cpu: None,
            disk: None,
            vms: None,
        }
    }

    #[test]
    fn one_line_per_sensor() {
        let sensor = |name: &str| TemperatureSeries {
            name: name.into(),
            data: vec![TemperatureSample {
                timestamp: Timestamp::new("2025-07-01 10:00:00"),
                avg_temp: Some(50.),
            }],
        };
        let snap = PhysicalSnapshot {
            temperatures: Some(vec![sensor("cpu0"), sensor("cpu1")]),
            cpu: Some(vec![CpuSample {
                timestamp: Timestamp::new("2025-07-01 10:00:00"),
                cpu_percent_used: Some(12.),
                logical_cores: Some(8.),
            }]),
            ..empty()
        };
        let mut charts = ChartRegistry::new();

        let html = content(&view(), &snap, &mut charts, None).into_string();

        assert!(html.contains(r#"id="1_pve-01_temperature_chart""#));
        assert!(html.contains(r#"id="1_pve-01_cpu_chart""#));
        assert_eq!(html.matches("<polyline").count(), 3);
        assert_eq!(charts.len(), 2);
    }

    #[test]
    fn summary_and_disk() {
        let snap = PhysicalSnapshot {
            summary: Some(PhysicalSummary {
                ip: Some("10.0.0.5".into()),
                temp: Some(62.),
                cpu_used: Some(85.),
                ..Default::default()
            }),
            disk: Some(DiskUsage {
                percent_used: 40.,
                used_bytes: 400.,
                total_bytes: 1000.,
            }),
            ..empty()
        };
        let mut charts = ChartRegistry::new();

        let html = content(&view(), &snap, &mut charts, None).into_string();

        assert!(html.contains("IP: 10.0.0.5"));
        assert!(html.contains("temp -warm"));
        assert!(html.contains("usage -critical"));
        assert!(html.contains("RAM: N/A"));
        assert!(html.contains("40% used"));
        assert!(html.contains(r#"id="1_pve-01_disk_chart""#));
        assert!(html.contains("Failed to load RAM history"));
    }

    #[test]
    fn vm_cards_link_to_virtual_servers() {
        let snap = PhysicalSnapshot {
            vms: Some(vec![VmCard {
                name: "web".into(),
                overview: Some(VmOverview {
                    status: Some("running".into()),
                    cpu_usage: Some(3.5),
                    num_cores: Some(2.),
                    ram_usage: Some("2048/8192".into()),
                    ..Default::default()
                }),
                disk: Some(VmDiskUsage {
                    disk_usage: "90/100".into(),
                }),
            }]),
            ..empty()
        };
        let mut charts = ChartRegistry::new();

        let html = content(&view(), &snap, &mut charts, None).into_string();

        assert!(html.contains(r#"href="/tank/1/server/pve-01/vm/web""#));
        assert!(html.contains("badge -running"));
        assert!(html.contains("RAM: 2048.00 MB / 8192.00 MB (25%)"));
        assert!(html.contains("bar -critical"));
    }

    #[test]
    fn no_virtual_servers() {
        let snap = PhysicalSnapshot {
            vms: Some(Vec::new()),
            ..empty()
        };
        let mut charts = ChartRegistry::new();

        let html = content(&view(), &snap, &mut charts, None).into_string();

        assert!(html.contains("No virtual servers found."));
    }

    #[test]
    fn picked_time_shows_readings_and_skips_gaps() {
        let cpu = |ts: &str, val: Option<f64>| CpuSample {
            timestamp: Timestamp::new(ts),
            cpu_percent_used: val,
            logical_cores: Some(8.),
        };
        let snap = PhysicalSnapshot {
            cpu: Some(vec![
                cpu("2025-07-01 10:00:00", Some(20.)),
                cpu("2025-07-01 10:05:00", None),
                cpu("2025-07-01 10:10:00", Some(70.)),
            ]),
            ..empty()
        };
        let mut charts = ChartRegistry::new();
        let picked = Timestamp::new("2025-07-01 10:03:00");

        let html = content(&view(), &snap, &mut charts, Some(&picked)).into_string();

        assert!(html.contains("At 07/01/2025 10:03:00"));
        assert!(html.contains(r#"CPU Usage: <span class="usage -ok">20%</span> of 8 cores"#));
        assert!(!html.contains("Failed to load CPU history"));
        assert_eq!(html.matches("<circle").count(), 2);
    }
}
