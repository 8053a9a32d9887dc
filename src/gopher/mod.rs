//! # Gopher Protocol Client
//!
//! A minimal Gopher (RFC 1436) client covering what the DM browser needs:
//! menu retrieval, text file retrieval, and the search sub-protocol.
//!
//! One TCP connection is opened per request: the selector is written as a
//! single CRLF-terminated line, the response is read to EOF under a bounded
//! timeout, and the body is parsed according to the requested item type.
//! There are no retries; a failed fetch surfaces as a [`GopherError`] for
//! the command router to turn into a user-visible reply.
//!
//! Menu parsing is deliberately defensive. Real-world gopher servers emit
//! lines with missing fields, bogus ports, and stray blank lines; those are
//! tolerated or dropped line-by-line rather than failing the whole fetch.

use std::fmt;
use std::time::Duration;

use percent_encoding::percent_decode_str;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::GopherConfig;

/// Port used when a gopher URL does not carry one.
pub const DEFAULT_PORT: u16 = 70;

/// Type characters we accept in the URL path position. Anything else means
/// the path had no type prefix and the whole path is the selector.
const KNOWN_TYPE_CHARS: &str = "0123456789+ghIisTtP;,dcruwWXsM";

/// Errors that can arise while fetching or parsing a Gopher resource.
#[derive(Debug, Error)]
pub enum GopherError {
    /// The URL could not be parsed into host/port/type/selector.
    #[error("invalid gopher URL: {0}")]
    InvalidUrl(String),

    /// TCP connect failed (unreachable, refused, DNS).
    #[error("connection failed: {0}")]
    Connect(#[source] std::io::Error),

    /// No response within the configured bound.
    #[error("timed out during {0}")]
    Timeout(&'static str),

    /// The response violates the expected Gopher framing.
    #[error("malformed response: {0}")]
    Protocol(String),

    /// The operation does not apply to this item type.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Single-character item type tag from a Gopher menu line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemType {
    /// `0` - plain text file
    File,
    /// `1` - menu / directory
    Menu,
    /// `7` - search endpoint
    Search,
    /// `i` - informational line, never selectable
    Info,
    /// `3` - server-side error line
    Error,
    /// Anything else (binary, images, telnet, ...) - listed but not browsable
    Other(char),
}

impl ItemType {
    pub fn from_char(c: char) -> Self {
        match c {
            '0' => ItemType::File,
            '1' => ItemType::Menu,
            '7' => ItemType::Search,
            'i' => ItemType::Info,
            '3' => ItemType::Error,
            other => ItemType::Other(other),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            ItemType::File => '0',
            ItemType::Menu => '1',
            ItemType::Search => '7',
            ItemType::Info => 'i',
            ItemType::Error => '3',
            ItemType::Other(c) => *c,
        }
    }
}

/// A parsed `gopher://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GopherUrl {
    pub host: String,
    pub port: u16,
    pub item_type: ItemType,
    pub selector: String,
}

impl GopherUrl {
    /// Parse an absolute `gopher://host[:port]/<type><selector>` URL.
    ///
    /// The type character is optional; without one (or with an unknown
    /// character in that position) the whole path is treated as a menu
    /// selector, matching how lenient gopher clients behave. Percent
    /// escapes in the selector are decoded.
    pub fn parse(url: &str, default_port: u16) -> Result<Self, GopherError> {
        let rest = url
            .strip_prefix("gopher://")
            .or_else(|| match (url.get(..9), url.get(9..)) {
                (Some(prefix), Some(rest)) if prefix.eq_ignore_ascii_case("gopher://") => {
                    Some(rest)
                }
                _ => None,
            })
            .ok_or_else(|| GopherError::InvalidUrl("URL must start with gopher://".into()))?;

        let (host_port, path) = match rest.split_once('/') {
            Some((hp, p)) => (hp, p),
            None => (rest, ""),
        };

        let (host, port) = match host_port.split_once(':') {
            Some((h, p)) => {
                let port: u16 = p
                    .parse()
                    .map_err(|_| GopherError::InvalidUrl(format!("bad port: {p}")))?;
                (h, port)
            }
            None => (host_port, default_port),
        };
        if host.is_empty() {
            return Err(GopherError::InvalidUrl("empty host".into()));
        }

        let (item_type, raw_selector) = if path.is_empty() {
            (ItemType::Menu, String::new())
        } else {
            let first = path.chars().next().unwrap_or('1');
            if KNOWN_TYPE_CHARS.contains(first) {
                (ItemType::from_char(first), path[first.len_utf8()..].to_string())
            } else {
                (ItemType::Menu, path.to_string())
            }
        };

        let selector = percent_decode_str(&raw_selector)
            .decode_utf8_lossy()
            .into_owned();

        Ok(GopherUrl {
            host: host.to_string(),
            port,
            item_type,
            selector,
        })
    }
}

impl fmt::Display for GopherUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gopher://{}:{}/{}{}",
            self.host,
            self.port,
            self.item_type.as_char(),
            self.selector
        )
    }
}

/// One entry of a Gopher menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GopherItem {
    pub item_type: ItemType,
    pub display: String,
    pub selector: String,
    pub host: String,
    pub port: u16,
}

impl GopherItem {
    /// Build the URL this item points at. Empty host/zero port fall back to
    /// the menu's own origin, as some servers omit them for local entries.
    pub fn url(&self, origin: &GopherUrl) -> GopherUrl {
        GopherUrl {
            host: if self.host.is_empty() {
                origin.host.clone()
            } else {
                self.host.clone()
            },
            port: if self.port == 0 { origin.port } else { self.port },
            item_type: self.item_type,
            selector: self.selector.clone(),
        }
    }
}

/// What is currently being viewed: a menu or a text file body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Listing {
    Menu(Vec<GopherItem>),
    Text(Vec<String>),
}

/// Parse a menu response body into items.
///
/// Tolerated per line: missing selector/host/port fields (info lines often
/// omit them), unparsable ports (fall back to the default). Dropped per
/// line: non-info entries without a host, since they cannot be fetched.
/// A line consisting solely of `.` terminates the menu.
pub fn parse_menu(body: &str, default_port: u16) -> Vec<GopherItem> {
    let mut items = Vec::new();
    for line in body.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim() == "." {
            break;
        }
        if line.is_empty() {
            continue;
        }
        let mut chars = line.chars();
        let type_char = match chars.next() {
            Some(c) => c,
            None => continue,
        };
        let item_type = ItemType::from_char(type_char);
        let mut fields = chars.as_str().split('\t');
        let display = fields.next().unwrap_or("").to_string();
        let selector = fields.next().unwrap_or("").to_string();
        let host = fields.next().unwrap_or("").to_string();
        let port = fields
            .next()
            .and_then(|p| p.trim().parse::<u16>().ok())
            .unwrap_or(default_port);

        if host.is_empty() && !matches!(item_type, ItemType::Info | ItemType::Error) {
            log::debug!("dropping malformed menu line: {}", crate::logutil::escape_log(line));
            continue;
        }

        items.push(GopherItem {
            item_type,
            display,
            selector,
            host,
            port,
        });
    }
    items
}

/// Split a text response into lines, stripping a trailing `.` terminator
/// line if the server sent one.
fn parse_text(body: &str) -> Vec<String> {
    let mut lines: Vec<String> = body
        .lines()
        .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
        .collect();
    if lines.last().map(|l| l.trim() == ".").unwrap_or(false) {
        lines.pop();
    }
    lines
}

/// Minimal Gopher client. One connection per call, no retries.
#[derive(Debug, Clone)]
pub struct GopherClient {
    connect_timeout: Duration,
    response_timeout: Duration,
    max_response_bytes: usize,
    default_port: u16,
}

impl GopherClient {
    pub fn new(config: &GopherConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            response_timeout: Duration::from_secs(config.response_timeout_secs),
            max_response_bytes: config.max_response_bytes,
            default_port: config.default_port,
        }
    }

    pub fn default_port(&self) -> u16 {
        self.default_port
    }

    /// Fetch a menu or text file. Search and other item types are not
    /// fetchable through this path: search is armed by the router without a
    /// network call, and everything else is unsupported.
    pub async fn fetch(&self, url: &GopherUrl) -> Result<Listing, GopherError> {
        match url.item_type {
            ItemType::Menu => {
                let body = self.transact(&url.host, url.port, &url.selector).await?;
                Ok(Listing::Menu(self.parse_menu_body(&body)?))
            }
            ItemType::File => {
                let body = self.transact(&url.host, url.port, &url.selector).await?;
                Ok(Listing::Text(parse_text(&body)))
            }
            ItemType::Search => Err(GopherError::InvalidOperation(
                "search endpoints need terms; select the item and send `s <terms>`".into(),
            )),
            other => Err(GopherError::InvalidOperation(format!(
                "item type '{}' is not browsable here",
                other.as_char()
            ))),
        }
    }

    /// Run a search against a search-type item: the wire selector is the
    /// item's selector, a TAB, and the terms. The result is always a menu.
    pub async fn search(
        &self,
        item: &GopherItem,
        terms: &str,
    ) -> Result<Listing, GopherError> {
        if item.item_type != ItemType::Search {
            return Err(GopherError::InvalidOperation(format!(
                "item type '{}' does not accept search terms",
                item.item_type.as_char()
            )));
        }
        let wire_selector = format!("{}\t{}", item.selector, terms);
        let body = self.transact(&item.host, item.port, &wire_selector).await?;
        Ok(Listing::Menu(self.parse_menu_body(&body)?))
    }

    fn parse_menu_body(&self, body: &str) -> Result<Vec<GopherItem>, GopherError> {
        let items = parse_menu(body, self.default_port);
        // An utterly unparseable non-empty response (every line dropped) is
        // treated as a framing violation; an empty body is a valid empty menu.
        if items.is_empty() && body.lines().any(|l| !l.trim().is_empty() && l.trim() != ".") {
            return Err(GopherError::Protocol("no parseable menu lines".into()));
        }
        Ok(items)
    }

    /// One request/response cycle: connect, send selector line, read to EOF.
    async fn transact(
        &self,
        host: &str,
        port: u16,
        wire_selector: &str,
    ) -> Result<String, GopherError> {
        log::debug!(
            "gopher request {}:{} selector={}",
            host,
            port,
            crate::logutil::escape_log(wire_selector)
        );

        let mut stream = timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| GopherError::Timeout("connect"))?
            .map_err(GopherError::Connect)?;

        stream
            .write_all(format!("{wire_selector}\r\n").as_bytes())
            .await
            .map_err(GopherError::Connect)?;

        let mut buf = Vec::new();
        let mut capped = stream.take(self.max_response_bytes as u64);
        timeout(self.response_timeout, capped.read_to_end(&mut buf))
            .await
            .map_err(|_| GopherError::Timeout("response"))?
            .map_err(GopherError::Connect)?;

        log::debug!("gopher response {}:{} ({} bytes)", host, port, buf.len());
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
