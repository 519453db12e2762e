use std::time::Duration;

use chrono::NaiveDate;
use telemetry::{ApiConfig, TelemetryClient, TimeWindow, Timestamp};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::oneshot,
};

/// Serves a single canned response and reports the request line it received.
async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let head = String::from_utf8_lossy(&buf);
        let request_line = head.lines().next().unwrap_or_default().to_string();
        let _ = tx.send(request_line);

        let resp = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(resp.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
    });

    (format!("http://{addr}/"), rx)
}

fn client(base_url: String) -> TelemetryClient {
    TelemetryClient::new(ApiConfig {
        base_url,
        location: "north site".into(),
        user_timezone: "Europe/Oslo".into(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
}

#[tokio::test]
async fn lists_tanks() {
    let (url, request) = serve_once("200 OK", r#"[1, "2"]"#).await;

    let tanks = client(url).tanks().await.unwrap();

    assert_eq!(tanks, ["1", "2"]);
    assert_eq!(request.await.unwrap(), "GET /get_tank/north%20site HTTP/1.1");
}

#[tokio::test]
async fn windowed_request_carries_range() {
    let (url, request) = serve_once(
        "200 OK",
        r#"[{"Timestamp": "2025-07-01 10:00:00", "cpu_percent_used": "12.5", "logical_cores": 8}]"#,
    )
    .await;

    let samples = client(url)
        .physical_cpu("1", "pve-01", &TimeWindow::whole_day(day()))
        .await
        .unwrap();

    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].cpu_percent_used, Some(12.5));
    assert_eq!(samples[0].logical_cores, Some(8.));

    let request = request.await.unwrap();
    assert!(
        request.starts_with("GET /cpu/physical-server/north%20site/1/pve-01?"),
        "{request}"
    );
    assert!(request.contains("user_timezone=Europe%2FOslo"), "{request}");
    assert!(request.contains("start=2025-07-01+00%3A00"), "{request}");
    assert!(request.contains("end=2025-07-01+23%3A59"), "{request}");
}

#[tokio::test]
async fn vm_overview_sends_picked_time() {
    let (url, request) = serve_once(
        "200 OK",
        r#"{"Timestamp": "2025-07-01 10:00:00", "status": "running", "CPU_USAGE": 3}"#,
    )
    .await;

    let picked = Timestamp::new("2025-07-01 10:00:00");
    let overview = client(url)
        .vm_overview("1", "pve-01", "web", Some(&picked))
        .await
        .unwrap();

    assert_eq!(overview.status.as_deref(), Some("running"));
    assert_eq!(overview.cpu_usage, Some(3.));

    let request = request.await.unwrap();
    assert!(
        request.starts_with("GET /get_info/specific_time/north%20site/1/pve-01/web?"),
        "{request}"
    );
    assert!(request.contains("timepick=2025-07-01+10%3A00%3A00"), "{request}");
}

#[tokio::test]
async fn host_temperature_sends_adapter_core_and_date() {
    let (url, request) = serve_once(
        "200 OK",
        r#"[{"timestamp": "2025-07-01 10:00:00", "temperature_celsius": 54.0}]"#,
    )
    .await;

    let records = client(url)
        .host_core_temperature("7", "coretemp-isa-0000", "9", day())
        .await
        .unwrap();

    assert_eq!(records[0].temperature_celsius, Some(54.));

    let request = request.await.unwrap();
    assert!(request.starts_with("GET /cpu-temperature/by-server/7?"), "{request}");
    assert!(request.contains("adapter=coretemp-isa-0000"), "{request}");
    assert!(request.contains("core=9"), "{request}");
    assert!(request.contains("date=2025-07-01"), "{request}");
}

#[tokio::test]
async fn error_status_is_an_error() {
    let (url, _request) = serve_once("500 Internal Server Error", r#"{"error": "boom"}"#).await;

    let err = client(url).tank_layers("1").await.unwrap_err();

    assert!(format!("{err:#}").contains("/text/north%20site/1"), "{err:#}");
}

#[tokio::test]
async fn undecodable_body_is_an_error() {
    let (url, _request) = serve_once("200 OK", r#"{"unexpected": true}"#).await;

    let res = client(url).servers("1").await;

    assert!(res.is_err());
}
