use http_body_util::Full;
use hyper::{
    HeaderMap, Response, StatusCode,
    body::Bytes,
    header::{self, HeaderName, HeaderValue},
};
use log::warn;
use maud::Markup;

pub type HyperResponse = hyper::Response<Full<Bytes>>;

/// Response under construction. Handlers return `Result<ServerResponse, ServerResponse>`
/// with the error arm carrying an error status.
#[derive(Debug)]
pub struct ServerResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ServerResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header<V>(mut self, name: HeaderName, val: V) -> Self
    where
        V: TryInto<HeaderValue>,
    {
        match val.try_into() {
            Ok(val) => {
                self.headers.append(name, val);
            }
            Err(_) => warn!("Dropping invalid value for header {name}"),
        }
        self
    }

    pub fn body<T: Into<Bytes>>(mut self, body: T) -> Self {
        self.body = body.into();
        self
    }

    pub fn html(self, markup: Markup) -> Self {
        self.header(header::CONTENT_TYPE, "text/html;charset=UTF-8")
            .body(markup.into_string())
    }

    pub fn set_cookie(self, name: &str, val: &str, max_age: Option<u64>) -> Self {
        // Default of roughly 31 years
        let max_age = max_age.unwrap_or(999999999);

        let cookie_val = format!("{name}={val}; Path=/; SameSite=Lax; HttpOnly; Max-Age={max_age}");
        self.header(header::SET_COOKIE, cookie_val)
    }

    pub fn get_status(&self) -> StatusCode {
        self.status
    }

    pub fn get_header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|x| x.to_str().ok())
    }

    #[cfg(test)]
    pub fn get_body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_hyper(self) -> HyperResponse {
        let mut resp = Response::new(Full::new(self.body));
        *resp.status_mut() = self.status;
        *resp.headers_mut() = self.headers;
        resp
    }
}

impl Default for ServerResponse {
    fn default() -> Self {
        Self::new()
    }
}

pub fn not_found() -> ServerResponse {
    ServerResponse::new()
        .status(StatusCode::NOT_FOUND)
        .body("page not found")
}

pub fn bad_request(msg: &'static str) -> ServerResponse {
    ServerResponse::new()
        .status(StatusCode::BAD_REQUEST)
        .body(msg)
}

/// 303 to `path`, so the browser follows up with a GET.
pub fn redirect(path: &str) -> ServerResponse {
    ServerResponse::new()
        .status(StatusCode::SEE_OTHER)
        .header(header::LOCATION, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_header_is_dropped() {
        let resp = ServerResponse::new()
            .header(header::LOCATION, "/ok")
            .header(header::ETAG, "bad\nvalue");

        assert_eq!(resp.get_header(&header::LOCATION), Some("/ok"));
        assert_eq!(resp.get_header(&header::ETAG), None);
    }

    #[test]
    fn converts_to_hyper() {
        let resp = redirect("/tank/1")
            .set_cookie("session", "abc", Some(60))
            .into_hyper();

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/tank/1");
        assert!(
            resp.headers()[header::SET_COOKIE]
                .to_str()
                .unwrap()
                .starts_with("session=abc; Path=/;")
        );
    }
}
