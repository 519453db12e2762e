use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};
use telemetry::{TimeWindow, Timestamp};

use crate::{
    http::{
        request::ServerRequest,
        response::{ServerResponse, bad_request, redirect},
    },
    session::Session,
    snapshot::start_poller,
    view::View,
};

const WINDOW_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

#[derive(serde::Deserialize)]
pub struct WindowQuery {
    start: String,
    end: String,
    #[serde(default)]
    gap: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct PickQuery {
    #[serde(default)]
    ts: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct MonitorDateQuery {
    date: String,
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    WINDOW_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
}

fn parse_gap(raw: Option<&str>, current: Duration) -> Result<Duration, ServerResponse> {
    match raw.map(str::trim) {
        None | Some("") => Ok(current),
        Some(gap) => humantime::parse_duration(gap).map_err(|err| {
            debug!("Rejected window gap {gap:?}: {err}");
            bad_request("invalid gap")
        }),
    }
}

/// Applies `update` to the caller's session, restarts its poller, and sends the
/// browser back to whatever it was looking at.
fn update_session(req: &ServerRequest, update: impl FnOnce(&mut Session)) -> ServerResponse {
    let state = req.state();

    let path = state.sessions.with(req.session_id(), |session| {
        update(session);
        session.restart(|params| start_poller(state, params));
        session.view().map(View::path)
    });

    redirect(path.as_deref().unwrap_or("/"))
}

pub async fn index(req: ServerRequest) -> Result<ServerResponse, ServerResponse> {
    let view = View::Tank {
        tank: req.state().config.default_tank.clone(),
    };

    Ok(redirect(&view.path()))
}

pub async fn set_window(req: ServerRequest) -> Result<ServerResponse, ServerResponse> {
    let query = req.extract_query::<WindowQuery>()?;

    let start = parse_datetime(&query.start).ok_or_else(|| bad_request("invalid window start"))?;
    let end = parse_datetime(&query.end).ok_or_else(|| bad_request("invalid window end"))?;

    let current = req
        .state()
        .sessions
        .with(req.session_id(), |session| session.controls().window.gap);
    let gap = parse_gap(query.gap.as_deref(), current)?;

    let window = TimeWindow::new(start, end, gap).map_err(|err| {
        warn!("Rejected time window: {err}");
        bad_request("window start is after its end")
    })?;

    Ok(update_session(&req, |session| session.set_window(window)))
}

pub async fn reset_window(req: ServerRequest) -> Result<ServerResponse, ServerResponse> {
    Ok(update_session(&req, Session::reset_window))
}

pub async fn pick(req: ServerRequest) -> Result<ServerResponse, ServerResponse> {
    let query = req.extract_query::<PickQuery>()?;

    let picked = query
        .ts
        .map(|ts| ts.trim().to_string())
        .filter(|ts| !ts.is_empty())
        .map(Timestamp::new);

    if picked.as_ref().is_some_and(|ts| ts.parse().is_none()) {
        return Err(bad_request("invalid timestamp"));
    }

    Ok(update_session(&req, |session| session.pick(picked)))
}

pub async fn set_monitor_date(req: ServerRequest) -> Result<ServerResponse, ServerResponse> {
    let query = req.extract_query::<MonitorDateQuery>()?;

    let date = NaiveDate::parse_from_str(query.date.trim(), "%Y-%m-%d")
        .map_err(|_| bad_request("invalid date"))?;

    Ok(update_session(&req, |session| session.set_monitor_date(date)))
}
