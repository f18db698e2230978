use std::net::SocketAddr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use qrforge::qr::QrDecoder;
use qrforge::{ForgeConfig, StudioServer};

const BASE_URL: &str = "https://your-app-name.streamlit.app";

async fn spawn_studio() -> SocketAddr {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = ForgeConfig::default();
    config.server.bind_address = "127.0.0.1".to_string();
    config.server.port = 0;
    config.app.logo_path = dir.path().join("logo.png");
    config.app.audio_path = dir.path().join("welcome.mp3");

    let server = StudioServer::bind(&config).await.expect("bind studio");
    let addr = server.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = server.serve().await;
    });
    // The tempdir must outlive the server so asset paths stay stable.
    std::mem::forget(dir);
    addr
}

async fn send(addr: SocketAddr, raw: String) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream.write_all(raw.as_bytes()).await.expect("write request");
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.expect("read response");
    String::from_utf8_lossy(&buf).into_owned()
}

async fn get_index(addr: SocketAddr, cookie: Option<&str>) -> String {
    let cookie_header = cookie
        .map(|value| format!("Cookie: qrforge_session={value}\r\n"))
        .unwrap_or_default();
    send(
        addr,
        format!("GET / HTTP/1.1\r\nHost: localhost\r\n{cookie_header}\r\n"),
    )
    .await
}

async fn post_generate(addr: SocketAddr, cookie: Option<&str>, body: &str) -> String {
    let cookie_header = cookie
        .map(|value| format!("Cookie: qrforge_session={value}\r\n"))
        .unwrap_or_default();
    send(
        addr,
        format!(
            "POST /generate HTTP/1.1\r\nHost: localhost\r\n\
             Content-Type: application/x-www-form-urlencoded\r\n\
             Content-Length: {}\r\n{cookie_header}\r\n{body}",
            body.len()
        ),
    )
    .await
}

fn session_cookie(response: &str) -> Option<String> {
    response.lines().find_map(|line| {
        let value = line.strip_prefix("Set-Cookie: qrforge_session=")?;
        Some(value.split(';').next()?.trim().to_string())
    })
}

fn extract_png(response: &str) -> Vec<u8> {
    let start = response
        .find("src=\"data:image/png;base64,")
        .expect("inline png")
        + "src=\"data:image/png;base64,".len();
    let end = response[start..].find('"').expect("uri end") + start;
    BASE64.decode(&response[start..end]).expect("valid base64")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn index_serves_form_and_assigns_session() {
    let addr = spawn_studio().await;
    let response = get_index(addr, None).await;

    assert!(response.starts_with("HTTP/1.1 200"), "status: {response}");
    assert!(response.contains("name=\"data\""));
    assert!(response.contains("name=\"fg\""));
    assert!(response.contains("name=\"bg\""));
    assert!(response.contains("name=\"logo\""));
    assert!(session_cookie(&response).is_some(), "missing session cookie");
    // No history yet, so no chart.
    assert!(!response.contains("QR Code History"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn generated_image_decodes_to_exact_payload() {
    let addr = spawn_studio().await;
    let response = post_generate(addr, None, "data=hello&fg=%23FF8A00&bg=%23FFFFFF").await;

    assert!(response.starts_with("HTTP/1.1 200"), "status: {response}");
    assert!(response.contains("download=\"qrcode_"));
    assert!(response.contains(".png\""));

    let png = extract_png(&response);
    let image = image::load_from_memory(&png).expect("decode png").to_rgba8();
    let payload = QrDecoder::new().decode(&image).expect("scan image");
    assert_eq!(payload, format!("{BASE_URL}?data=hello"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_input_warns_without_touching_history() {
    let addr = spawn_studio().await;
    let first = post_generate(addr, None, "data=++&fg=%23FF8A00").await;
    let cookie = session_cookie(&first).expect("session cookie");

    assert!(first.contains("Please enter some text or a URL!"));
    assert!(!first.contains("data:image/png"));
    assert!(!first.contains("QR Code History"));

    // History is still empty on the next full page load.
    let index = get_index(addr, Some(&cookie)).await;
    assert!(!index.contains("QR Code History"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn history_grows_in_order_and_keeps_duplicates() {
    let addr = spawn_studio().await;
    let first = post_generate(addr, None, "data=alpha").await;
    let cookie = session_cookie(&first).expect("session cookie");

    post_generate(addr, Some(&cookie), "data=beta").await;
    let third = post_generate(addr, Some(&cookie), "data=alpha").await;

    assert!(third.contains("QR Code History"));
    // Duplicates merge into one bar with a count of two.
    assert!(third.contains("alpha: 2"), "chart: {third}");
    assert!(third.contains("beta: 1"));
    assert!(third.find("alpha").unwrap() < third.find("beta").unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sessions_do_not_share_history() {
    let addr = spawn_studio().await;
    let first = post_generate(addr, None, "data=mine").await;
    assert!(session_cookie(&first).is_some());

    // A different client (no cookie) sees an empty history.
    let other = get_index(addr, None).await;
    assert!(!other.contains("QR Code History"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_logo_warns_and_matches_plain_output() {
    let addr = spawn_studio().await;
    let plain = post_generate(addr, None, "data=hello").await;
    let with_logo = post_generate(addr, None, "data=hello&logo=on").await;

    assert!(with_logo.contains("Logo file not found"));
    assert_eq!(extract_png(&plain), extract_png(&with_logo));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn download_filenames_never_repeat() {
    let addr = spawn_studio().await;
    let mut seen = std::collections::HashSet::new();
    for _ in 0..5 {
        let response = post_generate(addr, None, "data=same-input").await;
        let start = response.find("download=\"").expect("download attr") + "download=\"".len();
        let end = response[start..].find('"').expect("attr end") + start;
        let filename = response[start..end].to_string();
        assert!(filename.starts_with("qrcode_") && filename.ends_with(".png"));
        assert!(seen.insert(filename), "filename collision");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_color_falls_back_with_warning() {
    let addr = spawn_studio().await;
    let response = post_generate(addr, None, "data=hello&fg=notacolor").await;

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("Ignoring invalid color value"));
    // Generation still happened with the default foreground.
    assert!(response.contains("data:image/png;base64,"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn metrics_route_serves_json_once_enabled() {
    qrforge::metrics::enable(10);
    let addr = spawn_studio().await;
    post_generate(addr, None, "data=metrics-probe").await;

    let response = send(
        addr,
        "GET /metrics HTTP/1.1\r\nHost: localhost\r\n\r\n".to_string(),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "status: {response}");

    let body = response.splitn(2, "\r\n\r\n").nth(1).expect("body");
    let payload: serde_json::Value = serde_json::from_str(body).expect("json metrics");
    assert!(payload["generations"].as_u64().unwrap_or_default() >= 1);
    assert!(payload["successes"].as_u64().unwrap_or_default() >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_paths_return_404() {
    let addr = spawn_studio().await;
    let response = send(
        addr,
        "GET /nowhere HTTP/1.1\r\nHost: localhost\r\n\r\n".to_string(),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 404"), "status: {response}");
}
