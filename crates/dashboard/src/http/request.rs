use std::{collections::HashMap, ops::Deref};

use hyper::{header, http::request::Parts};

use crate::{
    AppState, SharedState,
    session::{SESSION_COOKIE, is_valid_session_id, new_session_id},
};

use super::response::{ServerResponse, bad_request};

fn get_cookies(parts: &Parts) -> HashMap<String, String> {
    let cookie_header = parts
        .headers
        .get(header::COOKIE)
        .and_then(|x| x.to_str().ok())
        .unwrap_or_default();

    cookie_header
        .split("; ")
        .filter_map(|x| x.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Request head plus the browser session it belongs to. Bodies are never read.
pub struct ServerRequest {
    parts: Parts,
    state: SharedState,
    session_id: String,
    new_session: bool,
}

impl ServerRequest {
    pub fn new<B>(req: hyper::Request<B>, state: SharedState) -> Self {
        let (parts, _) = req.into_parts();

        let existing = get_cookies(&parts)
            .remove(SESSION_COOKIE)
            .filter(|id| is_valid_session_id(id));

        let (session_id, new_session) = match existing {
            Some(id) => (id, false),
            None => (new_session_id(), true),
        };

        Self {
            parts,
            state,
            session_id,
            new_session,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Session id to hand to the browser, if it didn't send a usable one.
    pub fn new_session_cookie(&self) -> Option<String> {
        self.new_session.then(|| self.session_id.clone())
    }

    pub fn extract_query<Qu: serde::de::DeserializeOwned>(&self) -> Result<Qu, ServerResponse> {
        let query = self.uri.query().unwrap_or_default();

        serde_urlencoded::from_str::<Qu>(query).map_err(|_| bad_request("invalid query params"))
    }
}

impl Deref for ServerRequest {
    type Target = Parts;

    fn deref(&self) -> &Self::Target {
        &self.parts
    }
}
