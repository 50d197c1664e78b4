//! Per-connection request handling.
//!
//! HTTP/1.0 only: one request per connection, no keep-alive. The proxy
//! reads a single request line and its headers, resolves a cache key,
//! serves straight from the cache on a hit, or forwards to the origin
//! and fills the cache on a clean miss.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};

use super::cache::ObjectCache;
use super::error::ProxyError;
use super::header::HeaderSet;
use super::request::{parse_request_line, parse_uri, TargetUri};
use super::rwgate::RwGate;
use super::{forward, MAX_REQUEST_LINE};

/// How long a connection may sit idle reading the request line and
/// headers before it's abandoned. Bounds one request's lifetime; it
/// does not bring back keep-alive.
const REQUEST_TIMEOUT_SECS: u64 = 30;

fn cache_key(target: &TargetUri) -> String {
    format!("{}:{}{}", target.host, target.port, target.path)
}

/// Handle one accepted connection end to end, writing either a cached
/// body, a freshly forwarded response, or an error page back to the
/// client. A client-side write failure ends the task quietly — there's
/// no one left to deliver an error page to.
pub async fn handle(mut stream: TcpStream, cache: RwGate<ObjectCache>) {
    match timeout(
        Duration::from_secs(REQUEST_TIMEOUT_SECS),
        handle_inner(&mut stream, cache),
    )
    .await
    {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            let page = err.render(&err.to_string());
            let _ = stream.write_all(&page).await;
            let _ = stream.flush().await;
        }
        Err(_elapsed) => {
            let page = ProxyError::BadRequest.render("request timed out");
            let _ = stream.write_all(&page).await;
            let _ = stream.flush().await;
        }
    }
}

async fn handle_inner(
    stream: &mut TcpStream,
    cache: RwGate<ObjectCache>,
) -> Result<(), ProxyError> {
    let mut reader = BufReader::new(&mut *stream);

    let mut line = String::with_capacity(128);
    let bytes_read = reader
        .read_line(&mut line)
        .await
        .map_err(|_| ProxyError::BadRequest)?;
    if bytes_read == 0 || line.len() > MAX_REQUEST_LINE {
        return Err(ProxyError::BadRequest);
    }
    let request_line = parse_request_line(line.trim_end())?;
    let target = parse_uri(&request_line.uri)?;

    let mut headers = HeaderSet::default();
    loop {
        let mut header_line = String::with_capacity(128);
        let n = reader
            .read_line(&mut header_line)
            .await
            .map_err(|_| ProxyError::BadRequest)?;
        if n == 0 {
            break;
        }
        let trimmed = header_line.trim_end();
        if trimmed.is_empty() {
            break;
        }
        headers.add_line(trimmed);
    }

    let key = cache_key(&target);
    {
        let guard = cache.read().await;
        if let Some(body) = guard.get(&key) {
            drop(guard);
            if stream.write_all(&body).await.is_err() {
                return Ok(());
            }
            let _ = stream.flush().await;
            return Ok(());
        }
    }

    let method_line = format!("GET {} HTTP/1.0", target.path);
    let cached_body = forward::forward(&target, &method_line, &headers, stream).await?;

    if let Some(body) = cached_body {
        let mut guard = cache.write().await;
        guard.put(key, body);
    }

    Ok(())
}
