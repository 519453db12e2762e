use hyper::{StatusCode, header::HeaderName};
use maud::{Markup, html};

use crate::{
    charts::ChartRegistry,
    http::{
        request::ServerRequest,
        response::{ServerResponse, not_found},
    },
    poller::first_value,
    snapshot::{Snapshot, start_poller},
    view::{MonitorTab, View},
};

use format::{UsageLevel, calc_percent};
use telemetry::Timestamp;
use template::template;

pub mod format;
pub mod graph;
pub mod misc;
mod monitor;
mod physical;
mod tank;
mod template;
mod virtual_server;

const POLL_STOP: HeaderName = HeaderName::from_static("x-poll-stop");

fn compose(
    view: &View,
    snapshot: Option<&Snapshot>,
    charts: &mut ChartRegistry,
    picked: Option<&Timestamp>,
) -> Markup {
    match (view, snapshot) {
        (View::Tank { .. }, Some(Snapshot::Tank(snap))) => tank::content(view, snap, charts, picked),
        (View::PhysicalServer { .. }, Some(Snapshot::PhysicalServer(snap))) => {
            physical::content(view, snap, charts, picked)
        }
        (View::VirtualServer { .. }, Some(Snapshot::VirtualServer(snap))) => {
            virtual_server::content(view, snap, charts, picked)
        }
        (View::Monitor { .. }, Some(Snapshot::Monitor(snap))) => {
            monitor::content(view, snap, charts, picked)
        }
        _ => html! { p .alert data-pending { "Loading..." } },
    }
}

/// Full page for `view`. Opening a view other than the session's current one
/// resets the session's window, charts and poller.
///
/// Requests without a session cookie only record the view; the poller starts on
/// the first `/live` request, which clients that never run the page script don't make.
pub async fn page(req: ServerRequest, view: View) -> Result<ServerResponse, ServerResponse> {
    let state = req.state();
    let id = req.session_id();
    let fresh = req.new_session_cookie().is_some();

    let rx = state.sessions.with(id, |session| {
        if fresh {
            session.navigate(view.clone());
            None
        } else {
            Some(session.open(view.clone(), |params| start_poller(state, params)))
        }
    });

    let (snapshot, nav) = tokio::join!(
        async {
            match rx {
                Some(rx) => first_value(rx, state.config.request_timeout * 2).await,
                None => None,
            }
        },
        state.nav.get(&state.client),
    );

    let (controls, content) = state.sessions.with(id, |session| {
        let controls = session.controls();
        let (charts, picked) = session.render_parts();
        (controls, compose(&view, snapshot.as_deref(), charts, picked))
    });

    let cadence = view.cadence(&state.config.polling);

    Ok(ServerResponse::new().html(template(&nav, &view, &controls, cadence, content)))
}

/// Latest content for `view`, or a stop signal if the session has moved on.
pub async fn live(req: ServerRequest, view: View) -> Result<ServerResponse, ServerResponse> {
    let state = req.state();
    let id = req.session_id();

    // Swept sessions and pages served without a poller start one here
    let rx = state.sessions.with(id, |session| match session.view() {
        Some(current) if *current != view => None,
        _ => Some(session.open(view.clone(), |params| start_poller(state, params))),
    });

    let Some(rx) = rx else {
        return Ok(ServerResponse::new()
            .status(StatusCode::NO_CONTENT)
            .header(POLL_STOP, "1"));
    };

    let snapshot = first_value(rx, state.config.request_timeout * 2).await;

    let content = state.sessions.with(id, |session| {
        let (charts, picked) = session.render_parts();
        compose(&view, snapshot.as_deref(), charts, picked)
    });

    Ok(ServerResponse::new().html(content))
}

fn monitor_view(tab: &str) -> Result<View, ServerResponse> {
    let tab = MonitorTab::from_slug(tab).ok_or_else(not_found)?;

    Ok(View::Monitor { tab })
}

pub async fn monitor_page(req: ServerRequest, tab: &str) -> Result<ServerResponse, ServerResponse> {
    page(req, monitor_view(tab)?).await
}

pub async fn monitor_live(req: ServerRequest, tab: &str) -> Result<ServerResponse, ServerResponse> {
    live(req, monitor_view(tab)?).await
}

fn alert(msg: &str) -> Markup {
    html! { p .alert { (msg) } }
}

/// `label: used / total (percent)` with a coloured meter, or `N/A` when either side is missing.
fn usage_meter(
    label: &str,
    used: Option<f64>,
    total: Option<f64>,
    fmt: fn(f64) -> String,
) -> Markup {
    match used.zip(total) {
        Some((used, total)) => {
            let percent = calc_percent(used, total);
            let level = UsageLevel::of(percent);

            html! {
                p { (label) ": " (fmt(used)) " / " (fmt(total)) " (" (percent) "%)" }
                div .meter-container {
                    div .bar.(level.class()) style={"--scale:" (percent / 100.)} {}
                }
            }
        }
        None => html! { p { (label) ": " (format::NA) } },
    }
}

fn temperature(val: Option<f64>) -> Markup {
    match val {
        Some(val) => html! {
            span .temp.(format::TempLevel::of(val).class()) { (format::round2(val)) "ºC" }
        },
        None => html! { span .temp { (format::NA) } },
    }
}

fn status_badge(status: Option<&str>) -> Markup {
    let class = match status {
        Some("running") => "-running",
        Some("stopped") => "-stopped",
        _ => "-unknown",
    };

    html! { span .badge.(class) { (status.unwrap_or(format::NA)) } }
}
