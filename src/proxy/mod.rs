//! HTTP/1.0 caching forward proxy.

pub mod cache;
pub mod connection;
pub mod error;
pub mod forward;
pub mod header;
pub mod request;
pub mod rwgate;

pub use cache::ObjectCache;
pub use error::ProxyError;
pub use rwgate::RwGate;

use tokio::net::TcpListener;
use tokio::signal;

/// Largest request line the proxy will read before giving up on a
/// connection as malformed.
pub const MAX_REQUEST_LINE: usize = 8192;

/// Bind `port` and serve connections until a shutdown signal arrives.
pub async fn run(port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    let cache = RwGate::new(ObjectCache::new());

    println!("proxy listening on 0.0.0.0:{port}");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        let _ = stream.set_nodelay(true);
                        let cache = cache.clone();
                        tokio::spawn(async move {
                            connection::handle(stream, cache).await;
                        });
                    }
                    Err(_) => continue,
                }
            }
            _ = shutdown_signal() => {
                println!("shutdown signal received, draining connections");
                break;
            }
        }
    }

    println!("proxy shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
