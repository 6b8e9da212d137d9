//! Shared utilities for integration tests.
//!
//! Providers and the aggregator are replaced by programmable stubs speaking
//! raw HTTP/1.1 over TCP; the services under test run on ephemeral ports with
//! an in-memory span exporter.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SpanData};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use cep_weather::aggregator::{self, AggregatorState};
use cep_weather::config::{AggregatorConfig, ServiceConfig, ServiceRole, TracingConfig};
use cep_weather::gateway::{self, AggregatorClient, GatewayState};
use cep_weather::http::{build_client, HttpServer};
use cep_weather::lifecycle::Shutdown;
use cep_weather::observability::trace::Telemetry;

pub const API_KEY: &str = "test-key";

/// A request as seen by a stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string.
    pub target: String,
    /// Header names lowercased.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub delay: Option<Duration>,
}

impl StubResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.into(),
            delay: None,
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.into(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A running stub server.
pub struct Stub {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Stub {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Start a programmable stub on an ephemeral port.
pub async fn start_stub<F>(respond: F) -> Stub
where
    F: Fn(&RecordedRequest) -> StubResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let recorded = requests.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let respond = respond.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let response = respond(&request);
                        recorded.lock().unwrap().push(request);

                        if let Some(delay) = response.delay {
                            tokio::time::sleep(delay).await;
                        }

                        let reason = StatusCode::from_u16(response.status)
                            .ok()
                            .and_then(|s| s.canonical_reason())
                            .unwrap_or("Unknown");
                        let raw = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.status,
                            reason,
                            response.content_type,
                            response.body.len(),
                            response.body
                        );
                        let _ = socket.write_all(raw.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    Stub { addr, requests }
}

/// Stub answering every request with the same response.
pub async fn start_fixed_stub(response: StubResponse) -> Stub {
    start_stub(move |_| response.clone()).await
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedRequest {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A service under test.
pub struct TestService {
    pub addr: SocketAddr,
    pub telemetry: Telemetry,
    pub exporter: InMemorySpanExporter,
    shutdown: Shutdown,
}

impl TestService {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every span this service has ended so far.
    pub async fn spans(&self) -> Vec<SpanData> {
        self.telemetry.force_flush().await;
        self.exporter.get_finished_spans().unwrap()
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Short outbound deadlines so failure paths finish quickly.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.timeouts.upstream_secs = 2;
    config.timeouts.connect_secs = 1;
    config
}

pub fn telemetry(service: &str) -> (Telemetry, InMemorySpanExporter) {
    let exporter = InMemorySpanExporter::default();
    let config = TracingConfig {
        service_name: service.to_string(),
        service_version: "test".to_string(),
        ..TracingConfig::default()
    };
    (Telemetry::with_simple_exporter(exporter.clone(), &config), exporter)
}

async fn serve(role: ServiceRole, routes: axum::Router, config: &ServiceConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(role, routes, config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

fn aggregator_state(
    viacep_url: &str,
    weather_url: &str,
    config: &ServiceConfig,
) -> (AggregatorState, Telemetry, InMemorySpanExporter) {
    let (telemetry, exporter) = self::telemetry("aggregator");
    let state = AggregatorState::new(
        telemetry.clone(),
        build_client(&config.timeouts).unwrap(),
        &AggregatorConfig {
            viacep_base_url: viacep_url.to_string(),
            weather_base_url: weather_url.to_string(),
            weather_api_key: API_KEY.to_string(),
        },
        &config.timeouts,
    );
    (state, telemetry, exporter)
}

/// The aggregator's full middleware stack, not bound to a socket.
pub fn aggregator_app(
    viacep_url: &str,
    weather_url: &str,
    config: &ServiceConfig,
) -> (axum::Router, Telemetry, InMemorySpanExporter) {
    let (state, telemetry, exporter) = aggregator_state(viacep_url, weather_url, config);
    let router = HttpServer::new(ServiceRole::Aggregator, aggregator::router(state), config).into_router();
    (router, telemetry, exporter)
}

pub async fn spawn_aggregator(viacep_url: &str, weather_url: &str) -> TestService {
    spawn_aggregator_with(viacep_url, weather_url, &test_config()).await
}

pub async fn spawn_aggregator_with(viacep_url: &str, weather_url: &str, config: &ServiceConfig) -> TestService {
    let (state, telemetry, exporter) = aggregator_state(viacep_url, weather_url, config);
    let (addr, shutdown) = serve(ServiceRole::Aggregator, aggregator::router(state), config).await;
    TestService {
        addr,
        telemetry,
        exporter,
        shutdown,
    }
}

pub async fn spawn_gateway(aggregator_url: &str, relay_upstream_status: bool) -> TestService {
    let config = test_config();
    let (telemetry, exporter) = self::telemetry("gateway");
    let state = GatewayState {
        telemetry: telemetry.clone(),
        aggregator: AggregatorClient::new(build_client(&config.timeouts).unwrap(), aggregator_url),
        relay_upstream_status,
        request_timeout: Duration::from_secs(config.timeouts.request_secs),
    };

    let (addr, shutdown) = serve(ServiceRole::Gateway, gateway::router(state), &config).await;
    TestService {
        addr,
        telemetry,
        exporter,
        shutdown,
    }
}

/// Value of attribute `key` on `span`, rendered as a string.
pub fn attribute(span: &SpanData, key: &str) -> Option<String> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.to_string())
}

/// The span named `name`; panics unless exactly one exists.
pub fn span<'a>(spans: &'a [SpanData], name: &str) -> &'a SpanData {
    let mut matching = spans.iter().filter(|s| s.name == name);
    let span = matching.next().unwrap_or_else(|| panic!("no span named {name:?}"));
    assert!(matching.next().is_none(), "more than one span named {name:?}");
    span
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub const SAO_PAULO_ADDRESS: &str = r#"{
    "cep": "01001-000",
    "logradouro": "Praça da Sé",
    "complemento": "lado ímpar",
    "bairro": "Sé",
    "localidade": "São Paulo",
    "uf": "SP",
    "ibge": "3550308"
}"#;

pub const SAO_PAULO_WEATHER: &str = r#"{
    "location": {"name": "São Paulo", "region": "Sao Paulo", "country": "Brazil"},
    "current": {"temp_c": 25.0, "temp_f": 77.0, "condition": {"text": "Sunny"}}
}"#;

pub const SAO_PAULO_BODY: &str = r#"{"city":"São Paulo","temp_c":25,"temp_f":77,"temp_k":298.15}"#;

/// Providers answering for São Paulo at 25 C.
pub async fn sao_paulo_providers() -> (Stub, Stub) {
    let viacep = start_fixed_stub(StubResponse::json(200, SAO_PAULO_ADDRESS)).await;
    let weather = start_fixed_stub(StubResponse::json(200, SAO_PAULO_WEATHER)).await;
    (viacep, weather)
}
