use config::APP_VERSION;
use hyper::{StatusCode, header};

use super::{request::ServerRequest, response::ServerResponse};

macro_rules! static_file {
    ($name:ident, $path:literal, $mime:literal) => {
        pub async fn $name(req: ServerRequest) -> Result<ServerResponse, ServerResponse> {
            let file = include_str!($path);
            let etag = format!("\"{APP_VERSION}-{}\"", stringify!($name));

            let client_etag = req
                .headers
                .get(header::IF_NONE_MATCH)
                .and_then(|x| x.to_str().ok())
                .unwrap_or_default();

            if client_etag == etag {
                Ok(ServerResponse::new().status(StatusCode::NOT_MODIFIED))
            } else {
                Ok(ServerResponse::new()
                    .header(header::CONTENT_TYPE, $mime)
                    .header(header::CACHE_CONTROL, "no-cache")
                    .header(header::ETAG, etag)
                    .body(file))
            }
        }
    };
}

static_file!(js, "../../static/main.js", "text/javascript;charset=UTF-8");
static_file!(css, "../../static/main.css", "text/css;charset=UTF-8");
