use maud::{Markup, html};
use telemetry::{Timestamp, timestamp::at_or_before};

use crate::{
    charts::{ChartRegistry, ChartSpec, Series},
    snapshot::{ServerCard, TankSnapshot},
    view::View,
};

use super::{
    alert,
    format::{self, UsageLevel},
    graph::Axis,
    temperature, usage_meter,
};

const LAYER_COLORS: [&str; 3] = ["var(--red-6)", "var(--green-6)", "var(--blue-6)"];

fn server_card(tank: &str, card: &ServerCard) -> Markup {
    let view = View::PhysicalServer {
        tank: tank.to_string(),
        server: card.entry.server.clone(),
    };
    let overview = card.overview.clone().unwrap_or_default();

    let cpu = overview.cpu_percent_used.map(format::round2);

    html! {
        a .card href=(view.path()) id=(view.dom_id("card")) {
            h3 { "Server " (card.entry.server) }
            p { "IP: " (if card.entry.ip.is_empty() { format::NA } else { card.entry.ip.as_str() }) }
            p { "Temperature: " (temperature(overview.temperature)) }
            p {
                "CPU: "
                @match cpu {
                    Some(cpu) => span .usage.(UsageLevel::of(cpu).class()) { (cpu) "%" },
                    None => (format::NA),
                }
                @if let Some(cores) = overview.logical_cores {
                    " of " (cores) " cores"
                }
            }
            (usage_meter("RAM", overview.used_ram, overview.total_ram, format::bytes))
            (usage_meter("Disk", overview.used_disk, overview.total_disk, format::bytes))
        }
    }
}

pub fn content(
    view: &View,
    snap: &TankSnapshot,
    charts: &mut ChartRegistry,
    picked: Option<&Timestamp>,
) -> Markup {
    let Some(tank) = view.tank() else {
        return alert("Not a tank view");
    };

    let history = snap.history.as_deref().unwrap_or_default();
    let series = ["L1", "L2", "L3"]
        .into_iter()
        .zip(LAYER_COLORS)
        .enumerate()
        .map(|(idx, (name, color))| {
            Series::from_samples(name, color, history, |s| s.layers().map(|layers| layers[idx]))
        })
        .collect();

    let at_pick = picked.and_then(|picked| at_or_before(history, picked));

    html! {
        div .card-grid {
            section .span-3 {
                h2 { "Layer Temperatures" }
                @if snap.history.is_none() {
                    (alert("Failed to load temperature history"))
                } @else {
                    (charts.render(&view.dom_id("layers_chart"), ChartSpec::line(Axis::Celsius), series))
                }
            }

            section {
                h2 { "Current Layers" }
                @match &snap.layers {
                    Some(layers) => {
                        @for (name, val) in ["L1", "L2", "L3"].into_iter().zip(layers.layers()) {
                            p id=(view.dom_id(name)) { (name) ": " (temperature(Some(val))) }
                        }
                    }
                    None => {
                        @for name in ["L1", "L2", "L3"] {
                            p id=(view.dom_id(name)) { (name) ": " (format::NA) }
                        }
                    }
                }
                @if let Some(sample) = at_pick {
                    h3 { "At " (sample.timestamp.to_string()) }
                    @for (name, val) in [("L1", sample.l1), ("L2", sample.l2), ("L3", sample.l3)] {
                        p { (name) ": " (temperature(val)) }
                    }
                }
            }

            @match &snap.servers {
                None => section .span-3 { (alert("Failed to load servers")) },
                Some(servers) if servers.is_empty() => section .span-3 { (alert("No servers found.")) },
                Some(servers) => {
                    section .span-3 {
                        h2 { "Servers" }
                        div .card-list {
                            @for card in servers {
                                (server_card(tank, card))
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
    use telemetry::types::{LayerSample, LayerTemperatures, ServerEntry, ServerOverview};

    use super::*;

    fn view() -> View {
        View::Tank { tank: "1".into() }
    }

    fn sample(ts: &str, base: f64) -> LayerSample {
        LayerSample {
            timestamp: Timestamp::new(ts),
            l1: Some(base),
            l2: Some(base + 1.),
            l3: Some(base + 2.),
        }
    }

    #[test]
    fn renders_layers_chart_and_cards() {
        let snap = TankSnapshot {
            layers: Some(LayerTemperatures {
                l1: 45.,
                l2: 65.,
                l3: 85.,
            }),
            history: Some(vec![
                sample("2025-07-01 10:00:00", 30.),
                sample("2025-07-01 11:00:00", 31.),
            ]),
            servers: Some(vec![ServerCard {
                entry: ServerEntry {
                    tank: "1".into(),
                    server: "pve-01".into(),
                    ip: "10.0.0.5".into(),
                },
                overview: Some(ServerOverview {
                    used_ram: Some(4e9),
                    total_ram: Some(8e9),
                    cpu_percent_used: Some(25.),
                    logical_cores: Some(8.),
                    temperature: Some(70.),
                    ..Default::default()
                }),
            }]),
        };
        let mut charts = ChartRegistry::new();

        let html = content(&view(), &snap, &mut charts, None).into_string();

        assert!(html.contains(r#"id="1_layers_chart""#));
        assert_eq!(html.matches("<polyline").count(), 3);
        assert!(html.contains("temp -hot"));
        assert!(html.contains(r#"href="/tank/1/server/pve-01""#));
        assert!(html.contains(r#"<span class="usage -ok">25%</span> of 8 cores"#));
        assert!(html.contains("(50%)"));
        assert!(html.contains("Disk: N/A"));
    }

    #[test]
    fn failed_fetches_degrade() {
        let snap = TankSnapshot {
            layers: None,
            history: None,
            servers: None,
        };
        let mut charts = ChartRegistry::new();

        let html = content(&view(), &snap, &mut charts, None).into_string();

        assert!(html.contains("Failed to load temperature history"));
        assert!(html.contains("L1: N/A"));
        assert!(html.contains("Failed to load servers"));
        assert!(charts.is_empty());
    }

    #[test]
    fn picked_time_shows_readings() {
        let snap = TankSnapshot {
            layers: None,
            history: Some(vec![
                sample("2025-07-01 10:00:00", 30.),
                sample("2025-07-01 11:00:00", 40.),
            ]),
            servers: Some(Vec::new()),
        };
        let mut charts = ChartRegistry::new();
        let picked = Timestamp::new("2025-07-01 10:30:00");

        let html = content(&view(), &snap, &mut charts, Some(&picked)).into_string();

        assert!(html.contains("At 07/01/2025 10:00:00"));
        assert!(html.contains("31ºC"));
    }
}
