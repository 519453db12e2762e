use maud::{Markup, html};
use telemetry::{
    Timestamp,
    timestamp::{Timestamped, at_or_before},
    types::{CoreTemperatureRecord, DiskStatRecord, LoadRecord, RamRecord},
};

use crate::{
    charts::{ChartRegistry, ChartSpec, Series},
    snapshot::{HostData, HostReading, MonitorSnapshot},
    view::View,
};

use super::{
    alert,
    format::{self, UsageLevel},
    graph::Axis,
    temperature, usage_meter,
};

const CORE_COLORS: [&str; 4] = ["var(--red-6)", "var(--orange-6)", "var(--blue-6)", "var(--purple-6)"];

/// The record at the picked time, or the newest one.
fn pick_record<'a, T: Timestamped>(records: &'a [T], picked: Option<&Timestamp>) -> Option<&'a T> {
    picked
        .and_then(|picked| at_or_before(records, picked))
        .or_else(|| records.last())
}

fn host_title(host: &HostReading) -> String {
    let details = host.details.as_ref();
    let hostname = details.and_then(|d| d.hostname.as_deref());
    let ip = details.and_then(|d| d.ip_address.as_deref());

    match (hostname, ip) {
        (Some(hostname), Some(ip)) => format!("{hostname} ({ip})"),
        (Some(hostname), None) => hostname.to_string(),
        (None, Some(ip)) => format!("Server {} ({ip})", host.id),
        (None, None) => format!("Server {}", host.id),
    }
}

fn as_of(ts: &Timestamp) -> Markup {
    html! { p .muted { "As of " (ts.to_string()) } }
}

fn disks(
    view: &View,
    host: &str,
    disks: &[(String, Option<Vec<DiskStatRecord>>)],
    charts: &mut ChartRegistry,
    picked: Option<&Timestamp>,
) -> Markup {
    html! {
        @for (disk, records) in disks {
            h3 { (disk) }
            @match records {
                None => (alert(&format!("Failed to load disk {disk}"))),
                Some(records) => {
                    @match pick_record(records, picked) {
                        Some(record) => {
                            (usage_meter("Used", record.used_bytes, record.total_bytes, format::bytes_binary))
                            p { "Available: " (format::or_na(record.available_bytes.map(format::bytes_binary))) }
                            (as_of(&record.timestamp))
                        }
                        None => (alert("No data available")),
                    }
                    @let series = vec![Series::from_samples("Used", "var(--red-6)", records, |r| r.percent_used)];
                    (charts.render(&view.dom_id(&format!("{host}_{disk}_chart")), ChartSpec::line(Axis::Percent), series))
                }
            }
        }
    }
}

fn ram(
    view: &View,
    host: &str,
    records: Option<&[RamRecord]>,
    charts: &mut ChartRegistry,
    picked: Option<&Timestamp>,
) -> Markup {
    let Some(records) = records else {
        return alert("Failed to load RAM usage");
    };

    let series = vec![
        Series::from_samples("Used", "var(--red-6)", records, |r| r.used_ram_mb.map(|mb| mb / 1024.)),
        Series::from_samples("Free", "var(--green-6)", records, |r| r.free_ram_mb.map(|mb| mb / 1024.)),
    ];

    html! {
        @if let Some(record) = pick_record(records, picked) {
            (usage_meter("RAM", record.used_ram_mb, record.total_ram_mb, format::mebibytes))
            p { "Free: " (format::or_na(record.free_ram_mb.map(format::mebibytes))) }
            (as_of(&record.timestamp))
        }
        (charts.render(&view.dom_id(&format!("{host}_ram_chart")), ChartSpec::line(Axis::Gigabytes), series))
    }
}

fn core_temperatures(
    view: &View,
    host: &str,
    cores: &[(String, Option<Vec<CoreTemperatureRecord>>)],
    charts: &mut ChartRegistry,
    picked: Option<&Timestamp>,
) -> Markup {
    let series = cores
        .iter()
        .zip(CORE_COLORS.into_iter().cycle())
        .filter_map(|((label, records), color)| {
            records.as_deref().map(|records| {
                Series::from_samples(label, color, records, |r| r.temperature_celsius)
            })
        })
        .collect();

    html! {
        ul .summary {
            @for (label, records) in cores {
                li {
                    (label) ": "
                    @match records.as_deref().map(|records| pick_record(records, picked)) {
                        None => (alert("Failed to load")),
                        Some(None) => (format::NA),
                        Some(Some(record)) => (temperature(record.temperature_celsius)),
                    }
                }
            }
        }
        (charts.render(&view.dom_id(&format!("{host}_temperature_chart")), ChartSpec::line(Axis::Auto), series))
    }
}

fn cpu_usage(
    view: &View,
    host: &str,
    records: Option<&[LoadRecord]>,
    charts: &mut ChartRegistry,
    picked: Option<&Timestamp>,
) -> Markup {
    let Some(records) = records else {
        return alert("Failed to load CPU usage");
    };

    let series = ["1 min", "5 min", "15 min"]
        .into_iter()
        .zip(["var(--red-6)", "var(--orange-6)", "var(--blue-6)"])
        .enumerate()
        .map(|(idx, (name, color))| {
            Series::from_samples(format!("Load ({name})"), color, records, |r| {
                r.loads().map(|loads| loads[idx])
            })
        })
        .collect();

    html! {
        @if let Some(record) = pick_record(records, picked) {
            p {
                "CPU: "
                @match record.cpu_percent_used {
                    Some(cpu) => span .usage.(UsageLevel::of(cpu).class()) { (format::round2(cpu)) "%" },
                    None => (format::NA),
                }
                @if let Some(cores) = record.logical_cores {
                    " of " (cores) " cores"
                }
            }
            p { "Load average: " (if record.load_average.is_empty() { format::NA } else { record.load_average.as_str() }) }
            (as_of(&record.timestamp))
        }
        (charts.render(&view.dom_id(&format!("{host}_load_chart")), ChartSpec::line(Axis::Auto), series))
    }
}

pub fn content(
    view: &View,
    snap: &MonitorSnapshot,
    charts: &mut ChartRegistry,
    picked: Option<&Timestamp>,
) -> Markup {
    if snap.hosts.is_empty() {
        return alert("No hosts configured. Add host ids to [monitor] servers in dashboard.toml.");
    }

    html! {
        div .card-grid {
            @for host in &snap.hosts {
                section .span-3 id=(view.dom_id(&host.id)) {
                    h2 { (host_title(host)) }
                    @match &host.data {
                        HostData::Disk(list) => (disks(view, &host.id, list, charts, picked)),
                        HostData::Ram(records) => (ram(view, &host.id, records.as_deref(), charts, picked)),
                        HostData::CpuTemperature(cores) => (core_temperatures(view, &host.id, cores, charts, picked)),
                        HostData::CpuUsage(records) => (cpu_usage(view, &host.id, records.as_deref(), charts, picked)),
                    }
                }
            }
        }
    }
}
