//! URL values and the HTTP/1.1 fetcher (spec.md sections 4.1 and 4.2).
//!
//! Parsing and relative resolution are pure string manipulation; issuing the
//! actual request is split out behind a [`Transport`] trait so the
//! redirect/cache/header logic can be exercised in tests without opening a
//! real socket.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpStream;

use log::{debug, trace};

use crate::engine::Engine;
use crate::error::BrowserError;

const MAX_REDIRECTS: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
    File,
}

impl Scheme {
    fn parse(s: &str) -> Result<Scheme, BrowserError> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            "file" => Ok(Scheme::File),
            other => Err(BrowserError::BadStatus(format!("unsupported scheme: {other}"))),
        }
    }

    fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
            Scheme::File => 0,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::File => "file",
        }
    }
}

/// A parsed absolute URL: `scheme://[host[:port]]/path` for `http`/`https`,
/// or `file://path` for a local file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Url {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Url {
    /// Parses `scheme://host[:port]/path`. `http`/`https` default their port
    /// from the scheme; `file` has no host, only a filesystem path.
    pub fn parse(input: &str) -> Result<Url, BrowserError> {
        let (scheme_str, rest) = input
            .split_once("://")
            .ok_or_else(|| BrowserError::BadStatus(format!("missing scheme in {input}")))?;
        let scheme = Scheme::parse(scheme_str)?;

        if scheme == Scheme::File {
            let path = if rest.starts_with('/') { rest.to_string() } else { format!("/{rest}") };
            return Ok(Url { scheme, host: String::new(), port: 0, path });
        }

        let (host_port, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], rest[idx..].to_string()),
            None => (rest, "/".to_string()),
        };
        let (host, port) = match host_port.split_once(':') {
            Some((h, p)) => (
                h.to_string(),
                p.parse::<u16>().map_err(|_| BrowserError::BadStatus(format!("bad port in {input}")))?,
            ),
            None => (host_port.to_string(), scheme.default_port()),
        };

        Ok(Url { scheme, host, port, path })
    }

    /// Resolves `href` against `self` as the base, per spec.md section 4.1:
    /// absolute hrefs (containing `://`) pass through unchanged; scheme-relative
    /// (`//host/path`) inherit the base's scheme; rooted (`/path`) replace the
    /// path outright; otherwise `href` is joined onto the base directory,
    /// consuming one directory level per leading `../`.
    pub fn resolve(&self, href: &str) -> Result<Url, BrowserError> {
        if href.contains("://") {
            return Url::parse(href);
        }
        if let Some(rest) = href.strip_prefix("//") {
            return Url::parse(&format!("{}://{}", self.scheme.as_str(), rest));
        }
        if href.starts_with('/') {
            return Ok(Url { path: href.to_string(), ..self.clone() });
        }

        let mut dir: Vec<&str> = self.path.split('/').collect();
        dir.pop(); // drop the current file segment, leaving the directory
        let mut href_rest = href;
        loop {
            if let Some(rest) = href_rest.strip_prefix("../") {
                dir.pop();
                href_rest = rest;
            } else {
                break;
            }
        }
        let mut path = dir.join("/");
        path.push('/');
        path.push_str(href_rest);
        Ok(Url { path, ..self.clone() })
    }

    /// The canonical string form used as the cache key (invariant (iv) in
    /// spec.md section 3).
    pub fn canonical(&self) -> String {
        match self.scheme {
            Scheme::File => format!("file://{}", self.path),
            _ if self.port == self.scheme.default_port() => {
                format!("{}://{}{}", self.scheme.as_str(), self.host, self.path)
            }
            _ => format!("{}://{}:{}{}", self.scheme.as_str(), self.host, self.port, self.path),
        }
    }

    /// Issues the request, following redirects and consulting `engine`'s
    /// cache. `headers` are caller-supplied overrides (lowercased keys take
    /// precedence over the engine defaults) forwarded across redirects.
    pub fn request(&self, engine: &Engine, headers: &HashMap<String, String>) -> Result<String, BrowserError> {
        self.request_via(engine, headers, &TcpTransport, 0)
    }

    fn request_via(
        &self,
        engine: &Engine,
        headers: &HashMap<String, String>,
        transport: &dyn Transport,
        hop: u32,
    ) -> Result<String, BrowserError> {
        if self.scheme == Scheme::File {
            trace!("reading file {}", self.path);
            return std::fs::read_to_string(&self.path).map_err(BrowserError::Io);
        }

        if hop >= MAX_REDIRECTS {
            return Err(BrowserError::RedirectLoop);
        }

        let cache_key = self.canonical();
        if let Some(body) = engine.cache.get(&cache_key) {
            trace!("cache hit for {cache_key}");
            return Ok(body);
        }
        trace!("cache miss for {cache_key}");

        let mut request_headers: HashMap<String, String> = HashMap::new();
        request_headers.insert("host".to_string(), self.host.clone());
        request_headers.insert("connection".to_string(), "close".to_string());
        request_headers.insert("user-agent".to_string(), "browser".to_string());
        for (k, v) in headers {
            request_headers.insert(k.to_lowercase(), v.clone());
        }

        let mut request = format!("GET {} HTTP/1.1\r\n", self.path);
        for (k, v) in &request_headers {
            request.push_str(&format!("{k}: {v}\r\n"));
        }
        request.push_str("\r\n");

        debug!("requesting {} (hop {hop})", self.canonical());
        let raw = transport.exchange(&self.host, self.port, self.scheme == Scheme::Https, &request)?;
        let response = Response::parse(&raw)?;

        if response.headers.contains_key("transfer-encoding") || response.headers.contains_key("content-encoding") {
            return Err(BrowserError::UnsupportedEncoding(self.canonical()));
        }

        if (300..400).contains(&response.status) {
            let location = response
                .headers
                .get("location")
                .ok_or_else(|| BrowserError::BadStatus("redirect with no Location".to_string()))?;
            debug!("redirect {} -> {location}", self.canonical());
            let next = if location.starts_with('/') {
                Url { path: location.clone(), ..self.clone() }
            } else {
                Url::parse(location)?
            };
            return next.request_via(engine, headers, transport, hop + 1);
        }

        if (200..300).contains(&response.status) {
            if let Some(cache_control) = response.headers.get("cache-control") {
                if let Some(max_age) = parse_max_age(cache_control) {
                    engine.cache.insert(cache_key, response.body.clone(), max_age);
                }
            }
        }

        Ok(response.body)
    }
}

/// Parses a `Cache-Control` header for a literal `max-age=` directive.
/// Other directives (e.g. `public, max-age=60`) are present in real
/// responses but not recognized — spec.md section 9 preserves this
/// narrowing rather than generalizing it.
fn parse_max_age(cache_control: &str) -> Option<u64> {
    cache_control
        .split(',')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("max-age=").and_then(|n| n.parse().ok()))
}

struct Response {
    status: u16,
    headers: HashMap<String, String>,
    body: String,
}

impl Response {
    fn parse(raw: &str) -> Result<Response, BrowserError> {
        let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
        let mut lines = head.split("\r\n");
        let statusline = lines.next().unwrap_or("");
        let mut parts = statusline.splitn(3, ' ');
        let (_version, status, _reason) = (
            parts.next(),
            parts.next(),
            parts.next(),
        );
        let status: u16 = status
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| BrowserError::BadStatus(statusline.to_string()))?;

        let mut headers = HashMap::new();
        for line in lines {
            if let Some((key, value)) = line.split_once(':') {
                headers.insert(key.trim().to_lowercase(), value.trim().to_string());
            }
        }

        Ok(Response { status, headers, body: body.to_string() })
    }
}

/// Isolates the socket layer so the redirect/cache/header logic above can be
/// unit-tested against an in-memory transport. The teacher's `url.rs` has no
/// such seam of its own; this is built fresh in its idiom (a narrow trait,
/// a single concrete implementation, no trait-object soup elsewhere).
trait Transport {
    fn exchange(&self, host: &str, port: u16, tls: bool, request: &str) -> Result<String, BrowserError>;
}

struct TcpTransport;

impl Transport for TcpTransport {
    fn exchange(&self, host: &str, port: u16, tls: bool, request: &str) -> Result<String, BrowserError> {
        let stream = TcpStream::connect((host, port))?;
        let mut buf = Vec::new();
        if tls {
            let connector = native_tls::TlsConnector::new()?;
            let mut stream = connector.connect(host, stream)?;
            stream.write_all(request.as_bytes())?;
            stream.read_to_end(&mut buf)?;
        } else {
            let mut stream = stream;
            stream.write_all(request.as_bytes())?;
            stream.read_to_end(&mut buf)?;
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Replays a scripted sequence of raw HTTP responses, one per call,
    /// ignoring the actual request bytes — enough to drive the redirect,
    /// cache, and header-override logic without a socket.
    struct ScriptedTransport {
        responses: RefCell<std::collections::VecDeque<&'static str>>,
        last_request: RefCell<String>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<&'static str>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                last_request: RefCell::new(String::new()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn exchange(&self, _host: &str, _port: u16, _tls: bool, request: &str) -> Result<String, BrowserError> {
            *self.last_request.borrow_mut() = request.to_string();
            Ok(self
                .responses
                .borrow_mut()
                .pop_front()
                .expect("scripted transport ran out of responses")
                .to_string())
        }
    }

    #[test]
    fn parse_splits_scheme_host_port_path() {
        let url = Url::parse("http://example.org:8080/a/b").unwrap();
        assert_eq!(url.scheme, Scheme::Http);
        assert_eq!(url.host, "example.org");
        assert_eq!(url.port, 8080);
        assert_eq!(url.path, "/a/b");
    }

    #[test]
    fn parse_defaults_port_from_scheme() {
        assert_eq!(Url::parse("http://x/").unwrap().port, 80);
        assert_eq!(Url::parse("https://x/").unwrap().port, 443);
    }

    #[test]
    fn resolve_handles_relative_absolute_and_dotdot() {
        let base = Url::parse("http://x/a/b/c.html").unwrap();
        assert_eq!(base.resolve("d.html").unwrap().path, "/a/b/d.html");
        assert_eq!(base.resolve("/root.html").unwrap().path, "/root.html");
        assert_eq!(base.resolve("../up.html").unwrap().path, "/a/up.html");
        assert_eq!(base.resolve("http://y/z").unwrap().host, "y");
    }

    #[test]
    fn redirect_chain_of_nine_succeeds() {
        let mut responses: Vec<&'static str> = (0..9)
            .map(|_| "HTTP/1.1 302 Found\r\nLocation: /next\r\n\r\n")
            .collect();
        responses.push("HTTP/1.1 200 OK\r\n\r\nfinal body");
        let transport = ScriptedTransport::new(responses);
        let url = Url::parse("http://x/start").unwrap();
        let engine = Engine::new();
        let body = url.request_via(&engine, &HashMap::new(), &transport, 0).unwrap();
        assert_eq!(body, "final body");
    }

    #[test]
    fn redirect_chain_of_ten_fails() {
        let responses: Vec<&'static str> = (0..10)
            .map(|_| "HTTP/1.1 302 Found\r\nLocation: /next\r\n\r\n")
            .collect();
        let transport = ScriptedTransport::new(responses);
        let url = Url::parse("http://x/start").unwrap();
        let engine = Engine::new();
        let err = url.request_via(&engine, &HashMap::new(), &transport, 0).unwrap_err();
        assert!(matches!(err, BrowserError::RedirectLoop));
    }

    #[test]
    fn caller_header_overrides_default_host() {
        let transport = ScriptedTransport::new(vec!["HTTP/1.1 200 OK\r\n\r\nbody"]);
        let url = Url::parse("http://x/").unwrap();
        let engine = Engine::new();
        let mut headers = HashMap::new();
        headers.insert("Host".to_string(), "override.example".to_string());
        url.request_via(&engine, &headers, &transport, 0).unwrap();
        assert!(transport.last_request.borrow().to_lowercase().contains("host: override.example"));
    }

    #[test]
    fn cache_control_max_age_caches_body_until_expiry() {
        let transport = ScriptedTransport::new(vec![
            "HTTP/1.1 200 OK\r\nCache-Control: max-age=60\r\n\r\nbody-v1",
        ]);
        let url = Url::parse("http://x/cached").unwrap();
        let engine = Engine::new();
        let first = url.request_via(&engine, &HashMap::new(), &transport, 0).unwrap();
        assert_eq!(first, "body-v1");
        // second call never touches the transport, which has no more
        // scripted responses — a panic here would mean the cache was bypassed.
        let second = url.request_via(&engine, &HashMap::new(), &transport, 0).unwrap();
        assert_eq!(second, "body-v1");
    }

    #[test]
    fn unsupported_encoding_is_rejected() {
        let transport = ScriptedTransport::new(vec![
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nbody",
        ]);
        let url = Url::parse("http://x/chunked").unwrap();
        let engine = Engine::new();
        let err = url.request_via(&engine, &HashMap::new(), &transport, 0).unwrap_err();
        assert!(matches!(err, BrowserError::UnsupportedEncoding(_)));
    }
}
