//! The studio's HTTP surface
//!
//! A deliberately small hand-rolled HTTP/1.1 service over
//! `tokio::net::TcpListener`: one task per connection, full request parsed,
//! routed response written, connection closed. Three routes exist — the
//! form page, the generate action, and the metrics snapshot. Every request
//! resolves a session through a cookie so histories stay isolated per user.

pub mod page;

use crate::assets::{AssetCatalog, png_data_uri};
use crate::color::RgbColor;
use crate::config::ForgeConfig;
use crate::error::{Error, Result};
use crate::metrics;
use crate::qr::{GenerateRequest, PngArtifact, QrImageEncoder, Warning};
use crate::session::{SessionId, SessionStore};
use self::page::{FormValues, PageView, QrResult};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time;
use tracing::{info, warn};

const SESSION_COOKIE: &str = "qrforge_session";
const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Shared state behind the HTTP surface.
pub struct StudioState {
    encoder: QrImageEncoder,
    assets: AssetCatalog,
    sessions: SessionStore,
}

impl StudioState {
    /// Assemble server state from resolved configuration.
    pub fn from_config(config: &ForgeConfig) -> Result<Self> {
        Ok(Self {
            encoder: QrImageEncoder::with_options(
                config.app.base_url.clone(),
                config.render_options()?,
            ),
            assets: AssetCatalog::new(
                config.app.logo_path.clone(),
                config.app.audio_path.clone(),
            ),
            sessions: SessionStore::new(),
        })
    }
}

/// The bound studio server, ready to serve.
pub struct StudioServer {
    listener: TcpListener,
    state: Arc<StudioState>,
}

impl StudioServer {
    /// Bind the listener described by the configuration.
    pub async fn bind(config: &ForgeConfig) -> Result<Self> {
        let state = Arc::new(StudioState::from_config(config)?);
        let addr = config.server.socket_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {addr}: {e}")))?;
        Ok(Self { listener, state })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Error::Io)
    }

    /// Accept connections until the process is stopped.
    pub async fn serve(self) -> Result<()> {
        info!(addr = %self.local_addr()?, "QR studio listening");
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    time::sleep(Duration::from_millis(250)).await;
                    continue;
                }
            };

            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                if let Err(err) = handle_connection(stream, state).await {
                    tracing::debug!(peer = %addr, error = %err, "connection closed");
                }
            });
        }
    }
}

struct Request {
    method: String,
    path: String,
    cookie_session: Option<SessionId>,
    body: Vec<u8>,
}

async fn handle_connection(mut stream: TcpStream, state: Arc<StudioState>) -> Result<()> {
    let request = read_request(&mut stream).await?;

    let (session, fresh) = state.sessions.resolve(request.cookie_session);
    let response = route(&request, session, state.as_ref());
    let set_cookie = fresh.then(|| session.to_cookie_value());

    write_response(&mut stream, &response, set_cookie.as_deref()).await
}

struct Response {
    status_line: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
}

fn route(request: &Request, session: SessionId, state: &StudioState) -> Response {
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/") => html_response("HTTP/1.1 200 OK\r\n", render_form_page(session, state)),
        ("POST", "/generate") => {
            html_response("HTTP/1.1 200 OK\r\n", handle_generate(request, session, state))
        }
        ("GET", "/metrics") => match metrics::snapshot_json() {
            Some(snapshot) => Response {
                status_line: "HTTP/1.1 200 OK\r\n",
                content_type: "application/json",
                body: snapshot.to_string().into_bytes(),
            },
            None => Response {
                status_line: "HTTP/1.1 204 No Content\r\n",
                content_type: "application/json",
                body: Vec::new(),
            },
        },
        _ => html_response(
            "HTTP/1.1 404 Not Found\r\n",
            page::render_not_found(&request.path),
        ),
    }
}

fn html_response(status_line: &'static str, body: String) -> Response {
    Response {
        status_line,
        content_type: "text/html; charset=utf-8",
        body: body.into_bytes(),
    }
}

/// `GET /` — the form with current history; a full page load, so the
/// welcome audio element is injected here (and only here).
fn render_form_page(session: SessionId, state: &StudioState) -> String {
    let history = state.sessions.history(session);
    let view = PageView {
        form: FormValues::default(),
        warnings: &[],
        result: None,
        history: &history,
        audio_uri: state.assets.audio_data_uri(),
    };
    page::render(&view)
}

/// `POST /generate` — validate the form, generate, record history.
fn handle_generate(request: &Request, session: SessionId, state: &StudioState) -> String {
    let fields = parse_form(&request.body);
    let mut warnings = Vec::new();

    let text = field(&fields, "data").trim().to_string();
    let foreground = parse_color_field(&fields, "fg", RgbColor::default_foreground(), &mut warnings);
    let background = parse_color_field(&fields, "bg", RgbColor::default_background(), &mut warnings);
    let add_logo = fields.iter().any(|(name, _)| name == "logo");

    let form = FormValues {
        text: text.clone(),
        foreground,
        background,
        add_logo,
    };

    // Emptiness is rejected here, before generation is invoked.
    if text.is_empty() {
        warnings.push(Warning::EmptyInput);
        metrics::record_warning();
        let history = state.sessions.history(session);
        return page::render(&PageView {
            form,
            warnings: &warnings,
            result: None,
            history: &history,
            audio_uri: None,
        });
    }

    let generate_request = GenerateRequest {
        text: text.clone(),
        foreground,
        background,
        add_logo,
    };

    let started = Instant::now();
    let result = state
        .encoder
        .generate(&generate_request, state.assets.logo_path())
        .and_then(|(image, generation_warnings)| {
            let png = QrImageEncoder::to_png_bytes(&image)?;
            Ok((png, generation_warnings))
        });

    let qr_result = match result {
        Ok((png, generation_warnings)) => {
            metrics::record_generation(started.elapsed(), true);
            for warning in &generation_warnings {
                tracing::warn!(%warning, "generation warning");
                metrics::record_warning();
            }
            warnings.extend(generation_warnings);

            state.sessions.record(session, &text);
            let artifact = PngArtifact::new(png);
            Some(QrResult {
                image_uri: png_data_uri(&artifact.bytes),
                filename: artifact.filename,
            })
        }
        Err(err) => {
            // Library failures become the same non-fatal warning banner as
            // empty input; the page renders, history stays untouched.
            metrics::record_generation(started.elapsed(), false);
            tracing::warn!(error = %err, "generation failed");
            warnings.push(Warning::GenerationFailed(err.to_string()));
            None
        }
    };

    let history = state.sessions.history(session);
    page::render(&PageView {
        form,
        warnings: &warnings,
        result: qr_result,
        history: &history,
        audio_uri: None,
    })
}

fn field<'a>(fields: &'a [(String, String)], name: &str) -> &'a str {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
        .unwrap_or("")
}

fn parse_color_field(
    fields: &[(String, String)],
    name: &str,
    default: RgbColor,
    warnings: &mut Vec<Warning>,
) -> RgbColor {
    let raw = field(fields, name);
    if raw.is_empty() {
        return default;
    }
    match RgbColor::parse(raw) {
        Ok(color) => color,
        Err(_) => {
            warnings.push(Warning::InvalidColor(raw.to_string()));
            metrics::record_warning();
            default
        }
    }
}

async fn read_request(stream: &mut TcpStream) -> Result<Request> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        if let Some(pos) = find_subslice(&buffer, b"\r\n\r\n") {
            break pos;
        }
        if buffer.len() > MAX_REQUEST_BYTES {
            return Err(Error::BadRequest("request headers too large".to_string()));
        }
        let read = stream.read(&mut chunk).await.map_err(Error::Io)?;
        if read == 0 {
            return Err(Error::BadRequest(
                "connection closed mid-request".to_string(),
            ));
        }
        buffer.extend_from_slice(&chunk[..read]);
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).into_owned();
    let mut lines = head.lines();
    let request_line = lines
        .next()
        .ok_or_else(|| Error::BadRequest("empty request".to_string()))?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| Error::BadRequest("missing method".to_string()))?
        .to_string();
    let path = parts
        .next()
        .ok_or_else(|| Error::BadRequest("missing path".to_string()))?
        .to_string();

    let mut content_length = 0usize;
    let mut cookie_session = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "content-length" => {
                content_length = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| Error::BadRequest("invalid content-length".to_string()))?;
            }
            "cookie" => cookie_session = session_from_cookies(value),
            _ => {}
        }
    }

    if content_length > MAX_REQUEST_BYTES {
        return Err(Error::BadRequest("request body too large".to_string()));
    }

    let mut body = buffer[header_end + 4..].to_vec();
    while body.len() < content_length {
        let read = stream.read(&mut chunk).await.map_err(Error::Io)?;
        if read == 0 {
            return Err(Error::BadRequest("connection closed mid-body".to_string()));
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(Request {
        method,
        path,
        cookie_session,
        body,
    })
}

async fn write_response(
    stream: &mut TcpStream,
    response: &Response,
    set_cookie: Option<&str>,
) -> Result<()> {
    let mut bytes = Vec::with_capacity(256 + response.body.len());
    bytes.extend_from_slice(response.status_line.as_bytes());
    bytes.extend_from_slice(b"Connection: close\r\n");
    bytes.extend_from_slice(b"Cache-Control: no-store\r\n");
    bytes.extend_from_slice(b"Content-Type: ");
    bytes.extend_from_slice(response.content_type.as_bytes());
    bytes.extend_from_slice(b"\r\n");
    if let Some(value) = set_cookie {
        let header = format!("Set-Cookie: {SESSION_COOKIE}={value}; HttpOnly; Path=/\r\n");
        bytes.extend_from_slice(header.as_bytes());
    }
    let length_header = format!("Content-Length: {}\r\n\r\n", response.body.len());
    bytes.extend_from_slice(length_header.as_bytes());
    bytes.extend_from_slice(&response.body);

    stream.write_all(&bytes).await.map_err(Error::Io)?;
    stream.shutdown().await.map_err(Error::Io)?;
    Ok(())
}

fn session_from_cookies(header: &str) -> Option<SessionId> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        if name.trim() == SESSION_COOKIE {
            SessionId::parse(value)
        } else {
            None
        }
    })
}

/// Parse an `application/x-www-form-urlencoded` body into field pairs.
fn parse_form(body: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(body);
    text.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (percent_decode(name), percent_decode(value)),
            None => (percent_decode(pair), String::new()),
        })
        .collect()
}

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(high), Some(low)) => {
                        out.push(high << 4 | low);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_parsing_decodes_plus_and_percent_escapes() {
        let fields = parse_form(b"data=hello+world%21&fg=%23FF8A00&logo=on");
        assert_eq!(field(&fields, "data"), "hello world!");
        assert_eq!(field(&fields, "fg"), "#FF8A00");
        assert_eq!(field(&fields, "logo"), "on");
        assert_eq!(field(&fields, "missing"), "");
    }

    #[test]
    fn malformed_percent_escapes_pass_through() {
        let fields = parse_form(b"data=100%25+done&odd=%zz%2");
        assert_eq!(field(&fields, "data"), "100% done");
        assert_eq!(field(&fields, "odd"), "%zz%2");
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let id = SessionId::generate();
        let header = format!(" theme=dark; {}={}; other=1", SESSION_COOKIE, id.to_cookie_value());
        assert_eq!(session_from_cookies(&header), Some(id));
        assert_eq!(session_from_cookies(" theme=dark"), None);
    }

    #[test]
    fn invalid_color_field_falls_back_with_warning() {
        let fields = vec![("fg".to_string(), "#NOPE12".to_string())];
        let mut warnings = Vec::new();
        let color = parse_color_field(&fields, "fg", RgbColor::default_foreground(), &mut warnings);
        assert_eq!(color, RgbColor::default_foreground());
        assert_eq!(warnings.len(), 1);
    }
}
