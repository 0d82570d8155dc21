//! Actix Web server hosting the bridge.
//!
//! This module starts the HTTP server, wires the routes and middleware, and
//! returns a [`BridgeHandle`] for observing and stopping it.

use crate::bridge::{Bridge, handlers};
use crate::capability::BackendFactory;
use crate::config::{BridgeConfig, validate_config};
use crate::error::{Error, Result};

use actix_cors::Cors;
use actix_web::{
    App, HttpServer, middleware,
    web::{self, Data},
};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing;

/// Register the bridge routes on an Actix service config.
///
/// The [`Bridge`] itself must be supplied as `app_data` by the caller.
pub fn configure_routes(config: &BridgeConfig) -> impl Fn(&mut web::ServiceConfig) + Clone + 'static {
    let sse_path = config.sse_path.clone();
    let messages_path = config.messages_path.clone();
    let max_message_bytes = config.max_message_bytes;

    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::PayloadConfig::new(max_message_bytes))
            .route(&sse_path, web::get().to(handlers::sse_endpoint))
            .route(&messages_path, web::post().to(handlers::post_message));
    }
}

/// Handle for controlling a running bridge server
///
/// Cloneable; all clones control the same server.
#[derive(Clone)]
pub struct BridgeHandle {
    bridge: Data<Bridge>,
    server_handle: actix_web::dev::ServerHandle,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
    local_addrs: Vec<SocketAddr>,
}

impl BridgeHandle {
    /// The bridge served by this server
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Addresses the server is bound to
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    /// Number of open sessions
    pub fn session_count(&self) -> usize {
        self.bridge.sessions().len()
    }

    /// Close every session and stop the server
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down SSE bridge");

        // Open streams end once their channels are gone, letting the
        // graceful stop complete.
        self.bridge.close_all_sessions();
        self.server_handle.stop(true).await;

        let mut task = self.task.lock().await;
        if let Some(h) = task.take() {
            match tokio::time::timeout(Duration::from_secs(5), h).await {
                Ok(result) => {
                    if let Err(e) = result {
                        tracing::warn!("Error while joining bridge server task: {}", e);
                    }
                }
                Err(_) => {
                    tracing::warn!("Timeout waiting for bridge server task to finish");
                }
            }
        }

        Ok(())
    }
}

/// Entry point for running the bridge over HTTP
pub struct BridgeServer;

impl BridgeServer {
    /// Validate `config`, bind, and start serving in a background task.
    ///
    /// # Errors
    ///
    /// * [`Error::ConfigInvalid`] if the configuration fails validation
    /// * [`Error::Other`] if the address cannot be resolved or bound
    pub async fn start(config: BridgeConfig, factory: Arc<dyn BackendFactory>) -> Result<BridgeHandle> {
        validate_config(&config)?;

        let addr_str = format!("{}:{}", config.address, config.port);
        let addr = match addr_str.to_socket_addrs() {
            Ok(mut addrs) => match addrs.next() {
                Some(addr) => addr,
                None => {
                    return Err(Error::Other(format!(
                        "Could not parse socket address: {}",
                        addr_str
                    )));
                }
            },
            Err(e) => {
                return Err(Error::Other(format!(
                    "Failed to parse socket address: {}",
                    e
                )));
            }
        };

        tracing::info!(address = %addr_str, "Starting SSE bridge with Actix Web");

        let bridge = Data::new(Bridge::new(config.clone(), factory));
        let app_bridge = bridge.clone();
        let routes_config = config.clone();

        let workers = config.worker_count();
        tracing::info!(workers = workers, "Setting number of Actix Web workers");

        let server = HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(middleware::Logger::default())
                .wrap(cors)
                .app_data(app_bridge.clone())
                .configure(configure_routes(&routes_config))
        })
        .workers(workers)
        .bind(addr)
        .map_err(|e| Error::Other(format!("Failed to bind server: {}", e)))?;

        let local_addrs = server.addrs();
        let server = server.run();
        let server_handle = server.handle();

        let task = tokio::spawn(async move {
            if let Err(e) = server.await {
                tracing::error!(error = %e, "Actix server task error");
            }
            tracing::info!("SSE bridge server shut down completely");
        });

        tracing::info!(
            addresses = ?local_addrs,
            "SSE bridge server started successfully"
        );

        Ok(BridgeHandle {
            bridge,
            server_handle,
            task: Arc::new(Mutex::new(Some(task))),
            local_addrs,
        })
    }
}
