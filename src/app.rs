use crate::{
    modules,
    types::{Config, Context, ToContext},
    utils::errors,
};
use axum::{extract::DefaultBodyLimit, Router};
use std::{future::Future, io, net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace};

/// Room for multipart boundaries and part headers on top of the file itself.
pub const MULTIPART_OVERHEAD: usize = 2 * 1024 * 1024;

pub struct App {
    ctx: Arc<Context>,
    router: Router,
}

impl App {
    pub fn new(config: Config) -> Self {
        let ctx: Arc<Context> = Arc::new(config.to_context());

        let router = modules::get_router().with_state(ctx.clone()).layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(errors::handle_panic))
                .layer(trace::TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(
                    ctx.upload.max_file_size + MULTIPART_OVERHEAD,
                )),
        );

        Self { ctx, router }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn bind(self) -> io::Result<Server> {
        let listener = TcpListener::bind((self.ctx.app.host.as_str(), self.ctx.app.port)).await?;

        Ok(Server {
            listener,
            router: self.router,
        })
    }
}

pub struct Server {
    listener: TcpListener,
    router: Router,
}

impl Server {
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until `shutdown` resolves, then lets in-flight requests finish.
    pub async fn run<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let port = self.local_addr()?.port();

        tracing::info!("Image Converter API is running on port {}", port);
        tracing::info!("Health check: http://localhost:{}/health", port);
        tracing::info!("Convert endpoint: POST http://localhost:{}/convert", port);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Image Converter API stopped");

        Ok(())
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {:?}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {:?}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
