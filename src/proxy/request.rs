//! Request line and target URI parsing.

use super::error::ProxyError;

/// A parsed `GET <uri> HTTP/x.y` request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub uri: String,
    pub version: String,
}

/// Parse a request line, already trimmed of its trailing CRLF: split on
/// whitespace, reject anything but exactly three tokens.
pub fn parse_request_line(line: &str) -> Result<RequestLine, ProxyError> {
    let mut parts = line.split_whitespace();
    let method = parts.next().ok_or(ProxyError::BadRequest)?;
    let uri = parts.next().ok_or(ProxyError::BadRequest)?;
    let version = parts.next().ok_or(ProxyError::BadRequest)?;
    if parts.next().is_some() {
        return Err(ProxyError::BadRequest);
    }
    if !version.starts_with("HTTP/") {
        return Err(ProxyError::BadRequest);
    }
    if method != "GET" {
        return Err(ProxyError::NotImplemented);
    }
    Ok(RequestLine {
        method: method.to_string(),
        uri: uri.to_string(),
        version: version.to_string(),
    })
}

/// The `(host, path, port)` triple a request resolves to, plus the
/// rewritten URI (always carrying a leading `/`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetUri {
    pub host: String,
    pub path: String,
    pub port: u16,
}

const DEFAULT_PORT: u16 = 80;

/// Strip an optional `scheme://` prefix, split host[:port] from path.
/// A URI with no path at all is rewritten to `/`.
pub fn parse_uri(uri: &str) -> Result<TargetUri, ProxyError> {
    let rest = match uri.find("://") {
        Some(idx) => &uri[idx + 3..],
        None => uri,
    };

    let (host_port, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };

    if host_port.is_empty() {
        return Err(ProxyError::BadRequest);
    }

    let (host, port) = match host_port.find(':') {
        Some(idx) => {
            let host = &host_port[..idx];
            let port_str = &host_port[idx + 1..];
            let port: u16 = port_str.parse().map_err(|_| ProxyError::BadRequest)?;
            (host, port)
        }
        None => (host_port, DEFAULT_PORT),
    };

    if host.is_empty() {
        return Err(ProxyError::BadRequest);
    }

    Ok(TargetUri {
        host: host.to_string(),
        path: path.to_string(),
        port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ordinary_get() {
        let line = parse_request_line("GET /foo/bar HTTP/1.0").unwrap();
        assert_eq!(line.method, "GET");
        assert_eq!(line.uri, "/foo/bar");
        assert_eq!(line.version, "HTTP/1.0");
    }

    #[test]
    fn rejects_other_methods_as_not_implemented() {
        assert_eq!(
            parse_request_line("PUT /x HTTP/1.0").unwrap_err(),
            ProxyError::NotImplemented
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(
            parse_request_line("GET /x").unwrap_err(),
            ProxyError::BadRequest
        );
        assert_eq!(parse_request_line("").unwrap_err(), ProxyError::BadRequest);
    }

    #[test]
    fn strips_scheme_and_defaults_port() {
        let target = parse_uri("http://example.com/foo").unwrap();
        assert_eq!(target.host, "example.com");
        assert_eq!(target.path, "/foo");
        assert_eq!(target.port, 80);
    }

    #[test]
    fn parses_explicit_port() {
        let target = parse_uri("example.com:8000/foo/bar").unwrap();
        assert_eq!(target.host, "example.com");
        assert_eq!(target.port, 8000);
        assert_eq!(target.path, "/foo/bar");
    }

    #[test]
    fn uri_without_path_gets_rewritten_to_slash() {
        let target = parse_uri("example.com").unwrap();
        assert_eq!(target.path, "/");
    }

    #[test]
    fn rejects_empty_host() {
        assert!(parse_uri("http:///foo").is_err());
    }
}
