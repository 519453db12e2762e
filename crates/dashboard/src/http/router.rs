use std::{borrow::Cow, convert::Infallible};

use hyper::Method;
use log::debug;

use crate::{
    pages::{self, misc},
    session::SESSION_COOKIE,
    view::View,
};

use super::{
    request::ServerRequest,
    response::{HyperResponse, not_found},
    statics,
};

const GET: &Method = &Method::GET;

macro_rules! router {
    ($method:expr, $path:expr, {
        $( ($m:pat, $paths:pat) => $handler:expr, )*
        _ => $fallback:expr,
    }) => {{
        match ($method, $path) {
            $( ($m, $paths) => $handler.await, )*
            _ => Err($fallback()),
        }
    }};
}

fn tank(tank: &str) -> View {
    View::Tank {
        tank: tank.to_string(),
    }
}

fn server(tank: &str, server: &str) -> View {
    View::PhysicalServer {
        tank: tank.to_string(),
        server: server.to_string(),
    }
}

fn vm(tank: &str, server: &str, vm: &str) -> View {
    View::VirtualServer {
        tank: tank.to_string(),
        server: server.to_string(),
        vm: vm.to_string(),
    }
}

pub async fn router(req: ServerRequest) -> Result<HyperResponse, Infallible> {
    let method = req.method.clone();
    let path = req.uri.path().to_string();

    let path_segments: Vec<String> = path
        .split('/')
        .filter(|x| !x.is_empty())
        .map(|x| urlencoding::decode(x).map_or_else(|_| x.to_string(), Cow::into_owned))
        .collect();
    let path_segments: Vec<&str> = path_segments.iter().map(String::as_str).collect();

    let new_session = req.new_session_cookie();

    let resp = router!(&method, &path_segments[..], {
        (GET, ["static", "main.css"]) => statics::css(req),
        (GET, ["static", "main.js"]) => statics::js(req),

        (GET, []) => misc::index(req),

        (GET, ["tank", t]) => pages::page(req, tank(t)),
        (GET, ["tank", t, "live"]) => pages::live(req, tank(t)),
        (GET, ["tank", t, "server", s]) => pages::page(req, server(t, s)),
        (GET, ["tank", t, "server", s, "live"]) => pages::live(req, server(t, s)),
        (GET, ["tank", t, "server", s, "vm", v]) => pages::page(req, vm(t, s, v)),
        (GET, ["tank", t, "server", s, "vm", v, "live"]) => pages::live(req, vm(t, s, v)),

        (GET, ["monitor", tab]) => pages::monitor_page(req, tab),
        (GET, ["monitor", tab, "live"]) => pages::monitor_live(req, tab),

        (GET, ["window"]) => misc::set_window(req),
        (GET, ["window", "reset"]) => misc::reset_window(req),
        (GET, ["pick"]) => misc::pick(req),
        (GET, ["monitor-date"]) => misc::set_monitor_date(req),

        _ => not_found,
    });

    let mut resp = resp.unwrap_or_else(|err| err);

    if let Some(id) = new_session {
        resp = resp.set_cookie(SESSION_COOKIE, &id, None);
    }

    debug!("{method} {path} -> {}", resp.get_status());

    Ok(resp.into_hyper())
}
