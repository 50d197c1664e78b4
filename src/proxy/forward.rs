//! Origin connection and response streaming.
//!
//! Connects to the target host, writes the rewritten request, then
//! streams the raw response straight through to the client in fixed-size
//! chunks. While streaming, a copy of the bytes is kept in a bounded
//! buffer so a clean, small-enough response can be folded into the
//! cache once it finishes — a response that overflows the buffer is
//! still delivered to the client in full, it simply never gets cached.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::cache::MAX_OBJECT_SIZE;
use super::error::ProxyError;
use super::header::HeaderSet;
use super::request::TargetUri;

const CHUNK_SIZE: usize = 8192;

/// Connect to `target`, send the request line and headers, then copy the
/// response to `client` while collecting it for the cache.
///
/// Returns `Some(body)` when the whole response fit inside
/// [`MAX_OBJECT_SIZE`] and is eligible for caching, `None` when the
/// response was too large or the connection was severed mid-stream (the
/// client has already received whatever made it across).
pub async fn forward(
    target: &TargetUri,
    method_line: &str,
    headers: &HeaderSet,
    client: &mut (impl tokio::io::AsyncWrite + Unpin),
) -> Result<Option<Vec<u8>>, ProxyError> {
    let mut origin = TcpStream::connect((target.host.as_str(), target.port))
        .await
        .map_err(|_| ProxyError::BadGateway)?;

    let mut request = String::with_capacity(256);
    request.push_str(method_line);
    request.push_str("\r\n");
    request.push_str(&headers.render(&target.host));
    request.push_str("\r\n");

    origin
        .write_all(request.as_bytes())
        .await
        .map_err(|_| ProxyError::BadGateway)?;
    origin.flush().await.map_err(|_| ProxyError::BadGateway)?;

    let mut buf = [0u8; CHUNK_SIZE];
    let mut captured: Vec<u8> = Vec::new();
    let mut poisoned = false;

    loop {
        let n = match origin.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => return Ok(None),
        };
        if client.write_all(&buf[..n]).await.is_err() {
            return Ok(None);
        }
        if !poisoned {
            if captured.len() + n > MAX_OBJECT_SIZE {
                poisoned = true;
                captured.clear();
            } else {
                captured.extend_from_slice(&buf[..n]);
            }
        }
    }

    if client.flush().await.is_err() {
        return Ok(None);
    }

    if poisoned || captured.is_empty() {
        Ok(None)
    } else {
        Ok(Some(captured))
    }
}
