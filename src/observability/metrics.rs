//! Metrics collection and Prometheus export module.
//!
//! This module provides:
//! - Rate limiting and bearer authentication for the metrics listener
//! - The Prometheus/health HTTP listener
//! - Recording helpers for the screening flow

use anyhow::Result;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

use crate::observability::health_checks::{self, ReadinessState};
use crate::observability_config::ObservabilityConfig;

/// Simple per-IP rate limiter for the metrics listener
#[derive(Debug)]
pub struct RateLimiter {
    requests: Mutex<HashMap<IpAddr, Vec<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_secs: u64) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Check if request is allowed for the given IP
    pub fn is_allowed(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.lock();

        // Clients with no request inside the window are forgotten
        requests.retain(|_, times| {
            times.retain(|&time| now.duration_since(time) < self.window);
            !times.is_empty()
        });

        let client_requests = requests.entry(ip).or_default();
        if client_requests.len() >= self.max_requests {
            return false;
        }

        client_requests.push(now);
        true
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.requests.lock().len()
    }
}

/// Check a request's `Authorization: Bearer` header against the expected token
pub fn check_auth<B>(req: &hyper::Request<B>, expected_token: Option<&str>) -> bool {
    let Some(expected_token) = expected_token else {
        return true;
    };

    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected_token)
}

/// Initialize metrics collection with the Prometheus recorder
pub fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    tracing::info!(
        metrics_enabled = %config.enable_metrics_export,
        "Metrics collection initialized"
    );
    Ok(handle)
}

/// Address the metrics listener binds to: localhost unless told otherwise
pub fn metrics_bind_addr(config: &ObservabilityConfig) -> SocketAddr {
    if config.bind_all_interfaces {
        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), config.metrics_port)
    } else {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), config.metrics_port)
    }
}

fn text_response(status: hyper::StatusCode, body: impl Into<String>) -> hyper::Response<String> {
    let mut response = hyper::Response::new(body.into());
    *response.status_mut() = status;
    response
}

/// Start the metrics listener serving `/metrics`, `/health/live` and `/health/ready`
pub async fn start_metrics_server(
    metrics_handle: PrometheusHandle,
    config: &ObservabilityConfig,
    readiness: ReadinessState,
) -> Result<()> {
    let addr = metrics_bind_addr(config);
    let auth_token = config.metrics_auth_token.clone();
    let readiness = Arc::new(readiness);

    // 10 requests per minute per IP
    let rate_limiter = Arc::new(RateLimiter::new(10, 60));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, bind_all = config.bind_all_interfaces, "Metrics server listening");

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let metrics_handle = metrics_handle.clone();
                    let rate_limiter = Arc::clone(&rate_limiter);
                    let auth_token = auth_token.clone();
                    let readiness = Arc::clone(&readiness);

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = hyper::service::service_fn(
                            move |req: hyper::Request<hyper::body::Incoming>| {
                                let metrics_handle = metrics_handle.clone();
                                let rate_limiter = Arc::clone(&rate_limiter);
                                let auth_token = auth_token.clone();
                                let readiness = Arc::clone(&readiness);
                                async move {
                                    if !rate_limiter.is_allowed(peer_addr.ip()) {
                                        return Ok::<_, std::convert::Infallible>(text_response(
                                            hyper::StatusCode::TOO_MANY_REQUESTS,
                                            "Rate limit exceeded",
                                        ));
                                    }

                                    if !check_auth(&req, auth_token.as_deref()) {
                                        let mut response = text_response(
                                            hyper::StatusCode::UNAUTHORIZED,
                                            "Unauthorized",
                                        );
                                        response.headers_mut().insert(
                                            "www-authenticate",
                                            hyper::header::HeaderValue::from_static("Bearer"),
                                        );
                                        return Ok(response);
                                    }

                                    match (req.method(), req.uri().path()) {
                                        (&hyper::Method::GET, "/metrics") => {
                                            let mut response =
                                                hyper::Response::new(metrics_handle.render());
                                            response.headers_mut().insert(
                                                "content-type",
                                                hyper::header::HeaderValue::from_static(
                                                    "text/plain; version=0.0.4; charset=utf-8",
                                                ),
                                            );
                                            Ok(response)
                                        }
                                        (&hyper::Method::GET, "/health/live") => {
                                            Ok(text_response(hyper::StatusCode::OK, "OK"))
                                        }
                                        (&hyper::Method::GET, "/health/ready") => {
                                            match health_checks::perform_readiness_checks(&readiness) {
                                                Ok(()) => {
                                                    Ok(text_response(hyper::StatusCode::OK, "OK"))
                                                }
                                                Err(e) => Ok(text_response(
                                                    hyper::StatusCode::SERVICE_UNAVAILABLE,
                                                    format!("NOT READY: {}", e),
                                                )),
                                            }
                                        }
                                        _ => Ok(text_response(
                                            hyper::StatusCode::NOT_FOUND,
                                            "Not Found",
                                        )),
                                    }
                                }
                            },
                        );

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await
                        {
                            crate::errors::error_logging::log_network_error(
                                &err,
                                "serve_http_connection",
                                Some(&peer_addr.to_string()),
                            );
                        }
                    });
                }
                Err(e) => {
                    crate::errors::error_logging::log_network_error(
                        &e,
                        "accept_tcp_connection",
                        Some(&addr.to_string()),
                    );
                }
            }
        }
    });

    Ok(())
}

/// Record one verification prompt attempt.
///
/// `origin` is `join_request` or `start_command`; `result` is `sent`,
/// `unreachable` or `failed`.
pub fn record_verification_prompt(origin: &'static str, result: &'static str) {
    ::metrics::counter!("verification_prompts_total", "origin" => origin, "result" => result)
        .increment(1);
}

/// Record how a join request event was handled
pub fn record_join_request(outcome: &'static str) {
    ::metrics::counter!("join_requests_total", "outcome" => outcome).increment(1);
}

/// Record a `/start` command, accepted or filtered out
pub fn record_start_command(accepted: bool) {
    let result = if accepted { "accepted" } else { "ignored" };
    ::metrics::counter!("start_commands_total", "result" => result).increment(1);
}

/// Record the terminal state a button press reached
pub fn record_decision(outcome: &'static str, duration: Duration) {
    ::metrics::counter!("decisions_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("decision_duration_seconds").record(duration.as_secs_f64());
}

/// Record a failed outbound Telegram call
pub fn record_gateway_failure(operation: &'static str) {
    ::metrics::counter!("gateway_failures_total", "operation" => operation).increment(1);
}
