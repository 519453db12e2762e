use std::net::{Ipv6Addr, SocketAddr};

use anyhow::{Context, Result};
use flexible_hyper_server_tls::{HttpOrHttpsAcceptor, rustls_helpers};
use hyper::service::service_fn;
use log::{info, warn};
use request::ServerRequest;
use router::router;
use tokio::net::TcpListener;

use crate::SharedState;

pub mod request;
pub mod response;
mod router;
mod statics;

/// Listener for the dashboard UI, plain HTTP or HTTPS depending on `enable_tls`.
pub struct DashboardServer {
    acceptor: HttpOrHttpsAcceptor,
    addr: SocketAddr,
    state: SharedState,
}

impl DashboardServer {
    /// Loads the certificate (when TLS is on) before taking the port, so a bad
    /// cert path fails startup without holding the socket.
    pub async fn bind(state: SharedState) -> Result<Self> {
        let config = state.config;

        let tls = if config.enable_tls {
            let tls = rustls_helpers::get_tlsacceptor_from_files(
                config.cert_path.clone(),
                config.key_path.clone(),
            )
            .await
            .with_context(|| {
                format!(
                    "failed to load TLS certificate {} / key {}",
                    config.cert_path.display(),
                    config.key_path.display()
                )
            })?;
            Some(tls)
        } else {
            None
        };

        let listener = TcpListener::bind(SocketAddr::from((Ipv6Addr::UNSPECIFIED, config.http_port)))
            .await
            .with_context(|| format!("failed to bind dashboard to port {}", config.http_port))?;
        let addr = listener
            .local_addr()
            .context("failed to read dashboard listen address")?;

        let mut acceptor = HttpOrHttpsAcceptor::new(listener)
            .with_err_handler(|err| warn!("Dropped dashboard connection: {err}"));

        let scheme = match tls {
            Some(tls) => {
                acceptor = acceptor.with_tls(tls);
                "https"
            }
            None => "http",
        };
        info!("Serving dashboard on {scheme}://{addr}");

        Ok(Self {
            acceptor,
            addr,
            state,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accepts connections forever; each request gets its own handle on the shared state.
    pub async fn serve(mut self) {
        loop {
            let state = self.state.clone();

            self.acceptor
                .accept(service_fn(move |req| {
                    let req = ServerRequest::new(req, state.clone());
                    async move { router(req).await }
                }))
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use config::dashboard::DashboardConfig;

    use super::*;
    use crate::AppState;

    #[tokio::test]
    async fn missing_certificate_fails_startup() {
        let config = DashboardConfig {
            http_port: 0,
            enable_tls: true,
            cert_path: "/nonexistent/dashboard.crt".into(),
            key_path: "/nonexistent/dashboard.key".into(),
            ..Default::default()
        };
        let config: &'static DashboardConfig = Box::leak(Box::new(config));
        let state = Arc::new(AppState::new(config).unwrap());

        let err = match DashboardServer::bind(state).await {
            Ok(_) => panic!("server started without a certificate"),
            Err(err) => err,
        };

        assert!(
            err.to_string()
                .contains("failed to load TLS certificate /nonexistent/dashboard.crt"),
            "{err}"
        );
    }
}
