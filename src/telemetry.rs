//! Logging, request correlation and HTTP tracing.

use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::cell::RefCell;
use std::env;
use std::fmt;
use std::future::Future;
use tower_http::{
    classify::{SharedClassifier, StatusInRangeAsFailures},
    trace::{DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, MakeSpan, TraceLayer},
};
use tracing::error;
use uuid::Uuid;

/// Header name for the request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID tracking information
#[derive(Clone, Debug, PartialEq)]
pub struct RequestId(pub String);

impl Default for RequestId {
    fn default() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }
}

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        RequestId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

tokio::task_local! {
    static CURRENT_REQUEST_ID: RefCell<Option<RequestId>>;
}

/// Runs `future` with `request_id` visible through [`current_request_id`].
pub async fn scope_request_id<Fut, R>(request_id: RequestId, future: Fut) -> R
where
    Fut: Future<Output = R>,
{
    CURRENT_REQUEST_ID
        .scope(RefCell::new(Some(request_id)), future)
        .await
}

pub fn current_request_id() -> Option<RequestId> {
    CURRENT_REQUEST_ID
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
}

/// Middleware that reuses or mints an `x-request-id` for every request and
/// echoes it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let (request_id, header) = match request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok().map(|s| (RequestId::new(s), v.clone())))
    {
        Some(found) => found,
        None => {
            let id = RequestId::default();
            // Uuids are always valid header values.
            let header = HeaderValue::from_str(id.as_str()).unwrap_or(HeaderValue::from_static("-"));
            request
                .headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), header.clone());
            (id, header)
        }
    };

    request.extensions_mut().insert(request_id.clone());

    let mut response = scope_request_id(request_id, next.run(request)).await;
    response
        .headers_mut()
        .insert(HeaderName::from_static(REQUEST_ID_HEADER), header);
    response
}

#[derive(Clone, Default)]
pub struct RequestSpanMaker;

impl<B> MakeSpan<B> for RequestSpanMaker {
    fn make_span(&mut self, request: &http::Request<B>) -> tracing::Span {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .cloned()
            .or_else(|| {
                request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(RequestId::new)
            })
            .unwrap_or_default();

        tracing::info_span!(
            "http.request",
            request_id = %request_id,
            method = %request.method(),
            uri = %request.uri(),
        )
    }
}

/// HTTP trace layer; only 5xx responses are classified as failures.
pub fn configure_http_tracing() -> TraceLayer<
    SharedClassifier<StatusInRangeAsFailures>,
    RequestSpanMaker,
    DefaultOnRequest,
    DefaultOnResponse,
> {
    let classifier = SharedClassifier::new(StatusInRangeAsFailures::new(500..=599));
    TraceLayer::new(classifier)
        .make_span_with(RequestSpanMaker)
        .on_request(DefaultOnRequest::default())
        .on_response(DefaultOnResponse::default())
        .on_failure(DefaultOnFailure::default())
}

/// Initializes tracing using the provided log level as the default filter.
///
/// `RUST_LOG` overrides the default directive. Spans are exported over OTLP
/// when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("sales_report_api={},seed_worker={},tower_http=debug", level, level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let Ok(endpoint) = env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        if json {
            let _ = fmt().with_env_filter(filter_directive).json().try_init();
        } else {
            let _ = fmt().with_env_filter(filter_directive).try_init();
        }
        return;
    };

    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let service_name =
        env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string());
    let resource = Resource::new(vec![KeyValue::new("service.name", service_name)]);
    let tracer = match opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(sdktrace::config().with_resource(resource))
        .install_batch(opentelemetry_sdk::runtime::Tokio)
    {
        Ok(tracer) => tracer,
        Err(err) => {
            if json {
                let _ = fmt().with_env_filter(filter_directive).json().try_init();
            } else {
                let _ = fmt().with_env_filter(filter_directive).try_init();
            }
            error!("Failed to install OTLP pipeline: {}", err);
            return;
        }
    };

    let base = tracing_subscriber::registry()
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(EnvFilter::new(filter_directive));

    if json {
        let _ = base.with(fmt::layer().json()).try_init();
    } else {
        let _ = base.with(fmt::layer()).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_id_is_visible_inside_scope_only() {
        assert!(current_request_id().is_none());
        let seen = scope_request_id(RequestId::new("abc"), async { current_request_id() }).await;
        assert_eq!(seen, Some(RequestId::new("abc")));
        assert!(current_request_id().is_none());
    }
}
