//! Failure kinds surfaced to the client as minimal HTML error pages.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyError {
    /// Request line was missing, truncated, or not `METHOD URI VERSION`.
    BadRequest,
    /// Method other than `GET`.
    NotImplemented,
    /// Origin DNS/TCP connect failed.
    BadGateway,
}

impl ProxyError {
    pub fn status(self) -> (u16, &'static str) {
        match self {
            ProxyError::BadRequest => (400, "Bad Request"),
            ProxyError::NotImplemented => (501, "Not Implemented"),
            ProxyError::BadGateway => (502, "Bad Gateway"),
        }
    }

    /// Render the minimal HTML error page the proxy sends for this
    /// failure, with a short diagnostic string embedded in the body.
    pub fn render(self, detail: &str) -> Vec<u8> {
        let (code, reason) = self.status();
        let body = format!(
            "<html><body><h1>{code} {reason}</h1><p>{detail}</p></body></html>"
        );
        format!(
            "HTTP/1.0 {code} {reason}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .into_bytes()
    }
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (code, reason) = self.status();
        write!(f, "{code} {reason}")
    }
}

impl std::error::Error for ProxyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_expected_status_line() {
        let page = ProxyError::NotImplemented.render("PUT is not supported");
        let text = String::from_utf8(page).unwrap();
        assert!(text.starts_with("HTTP/1.0 501 Not Implemented"));
        assert!(text.contains("PUT is not supported"));
    }
}
