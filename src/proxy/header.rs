//! Header rewrite set applied to every forwarded request.
//!
//! The proxy never forwards the client's headers verbatim: five fields are
//! rewritten or injected before the request line goes to the origin, the
//! rest pass through untouched.

/// The User-Agent the proxy substitutes for the client's own, so origins
/// see a consistent, modern browser string regardless of what actually
/// connected.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3";

const ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_ENCODING: &str = "identity";

/// One forwarded header line, already in `Name: value` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine {
    pub name: String,
    pub value: String,
}

/// Headers collected from the client, with the five rewritten fields
/// dropped and everything else — including a client-supplied `Host` —
/// preserved verbatim in arrival order.
#[derive(Debug, Default)]
pub struct HeaderSet {
    pub lines: Vec<HeaderLine>,
    /// Whether the client's own stream already carried a `Host` header,
    /// so `render` knows whether it still needs to synthesize one.
    host_seen: bool,
}

fn is_rewritten(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "user-agent" | "accept" | "accept-encoding" | "connection" | "proxy-connection"
    )
}

impl HeaderSet {
    /// Parse one `Name: value` header line as read off the wire, folding it
    /// into the set. Only the five rewritten fields are dropped; every
    /// other header — `Host` included — is kept verbatim at its original
    /// position in the stream.
    pub fn add_line(&mut self, line: &str) {
        let Some((name, value)) = line.split_once(':') else {
            return;
        };
        let name = name.trim();
        let value = value.trim();
        if is_rewritten(name) {
            return;
        }
        if name.eq_ignore_ascii_case("host") {
            self.host_seen = true;
        }
        self.lines.push(HeaderLine {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    /// Render the full header block to send to the origin: the client's
    /// headers streamed verbatim (including `Host` at its original spot,
    /// if the client sent one), a synthesized `Host` line only when the
    /// client didn't, then the five proxy-owned fields, each on its own
    /// CRLF-terminated line.
    pub fn render(&self, fallback_host: &str) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.name);
            out.push_str(": ");
            out.push_str(&line.value);
            out.push_str("\r\n");
        }
        if !self.host_seen {
            out.push_str("Host: ");
            out.push_str(fallback_host);
            out.push_str("\r\n");
        }
        out.push_str("User-Agent: ");
        out.push_str(USER_AGENT);
        out.push_str("\r\n");
        out.push_str("Accept: ");
        out.push_str(ACCEPT);
        out.push_str("\r\n");
        out.push_str("Accept-Encoding: ");
        out.push_str(ACCEPT_ENCODING);
        out.push_str("\r\n");
        out.push_str("Connection: close\r\n");
        out.push_str("Proxy-Connection: close\r\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_headers_survive_in_order() {
        let mut set = HeaderSet::default();
        set.add_line("Cookie: a=1");
        set.add_line("X-Custom: yes");
        let rendered = set.render("example.com");
        let cookie_pos = rendered.find("Cookie: a=1").unwrap();
        let custom_pos = rendered.find("X-Custom: yes").unwrap();
        assert!(cookie_pos < custom_pos);
    }

    #[test]
    fn rewritten_headers_are_dropped_from_input_and_replaced() {
        let mut set = HeaderSet::default();
        set.add_line("User-Agent: curl/8.0");
        set.add_line("Accept-Encoding: gzip");
        set.add_line("Connection: keep-alive");
        let rendered = set.render("example.com");
        assert!(!rendered.contains("curl/8.0"));
        assert!(!rendered.contains("gzip"));
        assert!(!rendered.contains("keep-alive"));
        assert!(rendered.contains(USER_AGENT));
        assert!(rendered.contains("Accept-Encoding: identity"));
        assert!(rendered.contains("Connection: close"));
    }

    #[test]
    fn host_falls_back_to_uri_host_when_client_omits_it() {
        let set = HeaderSet::default();
        let rendered = set.render("example.com");
        assert!(rendered.contains("Host: example.com"));
    }

    #[test]
    fn client_supplied_host_is_preserved() {
        let mut set = HeaderSet::default();
        set.add_line("Host: other.example");
        let rendered = set.render("example.com");
        assert!(rendered.contains("Host: other.example"));
        assert!(!rendered.contains("Host: example.com"));
    }

    #[test]
    fn client_supplied_host_streams_at_its_original_position() {
        let mut set = HeaderSet::default();
        set.add_line("Cookie: a=1");
        set.add_line("Host: other.example");
        set.add_line("X-Custom: yes");
        let rendered = set.render("example.com");

        let cookie_pos = rendered.find("Cookie: a=1").unwrap();
        let host_pos = rendered.find("Host: other.example").unwrap();
        let custom_pos = rendered.find("X-Custom: yes").unwrap();
        assert!(cookie_pos < host_pos);
        assert!(host_pos < custom_pos);
    }
}
