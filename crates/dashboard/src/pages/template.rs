use std::time::Duration;

use maud::{DOCTYPE, Markup, html};

use crate::{
    nav::NavTree,
    session::Controls,
    view::{MonitorTab, View},
};

const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

fn window_form(controls: &Controls) -> Markup {
    let window = &controls.window;

    html! {
        form .controls action="/window" method="get" {
            label {
                "From "
                input type="datetime-local" name="start" value=(window.start.format(INPUT_FORMAT).to_string());
            }
            label {
                "To "
                input type="datetime-local" name="end" value=(window.end.format(INPUT_FORMAT).to_string());
            }
            label {
                "Every "
                input type="text" name="gap" size="6" value=(humantime::format_duration(window.gap).to_string());
            }
            button type="submit" { "Apply" }
            a .button href="/window/reset" { "Reset" }
        }
    }
}

fn monitor_controls(tab: MonitorTab, controls: &Controls) -> Markup {
    html! {
        nav .tabs {
            @for other in MonitorTab::ALL {
                a href=(View::Monitor { tab: other }.path()) .active[other == tab] { (other.label()) }
            }
        }
        form .controls action="/monitor-date" method="get" {
            label {
                "Date "
                input type="date" name="date" value=(controls.monitor_date.format("%Y-%m-%d").to_string());
            }
            button type="submit" { "Show" }
        }
    }
}

pub fn template(
    nav: &NavTree,
    view: &View,
    controls: &Controls,
    cadence: Duration,
    content: Markup,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1";

                title { (view.title()) " - Tank Telemetry" }

                link rel="stylesheet" href="/static/main.css";
            }
            body {
                header {
                    button onclick="document.body.classList.toggle('nav-closed')" { "☰" }
                    "Tank Telemetry"
                    span .view-title { (view.title()) }
                }

                (nav.render(Some(view)))

                main {
                    @match view {
                        View::Monitor { tab } => (monitor_controls(*tab, controls)),
                        _ => (window_form(controls)),
                    }

                    @if let Some(picked) = &controls.picked {
                        p .picked {
                            "Selected time: " (picked.to_string()) " "
                            a href="/pick" { "Clear" }
                        }
                    }

                    section #content data-live=(view.live_path()) data-interval=(cadence.as_millis().to_string()) {
                        (content)
                    }
                }

                footer {}

                script src="/static/main.js" {}
            }
        }
    }
}
