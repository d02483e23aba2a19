//! HTTP 요청 metrics middleware.
//!
//! `path` 라벨은 요청마다 새 시계열이 생기지 않도록 다음 순서로 정합니다:
//!
//! 1. 공개 표지 경로(`storage.public_path`) 아래 요청은 `{public_path}/:file`
//! 2. 매칭된 라우트가 있으면 라우트 템플릿 (예: `/api/v1/books/{id}`)
//! 3. 그 외(404 등)는 [`normalize_path`]로 ID 세그먼트를 치환한 경로

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
};

/// 메트릭 `path` 라벨 결정에 필요한 설정.
#[derive(Debug, Clone)]
pub struct MetricsLabels {
    public_path: Arc<str>,
}

impl MetricsLabels {
    /// 업로드된 표지가 노출되는 URL 접두사로 생성합니다. 끝의 `/`는 무시합니다.
    pub fn new(public_path: &str) -> Self {
        Self {
            public_path: Arc::from(public_path.trim_end_matches('/')),
        }
    }

    /// 요청의 `path` 라벨.
    pub fn path_label(&self, request: &Request) -> String {
        let path = request.uri().path();

        if self.is_cover_file(path) {
            return format!("{}/:file", self.public_path);
        }

        match request.extensions().get::<MatchedPath>() {
            Some(matched) => matched.as_str().to_string(),
            None => normalize_path(path),
        }
    }

    fn is_cover_file(&self, path: &str) -> bool {
        if self.public_path.is_empty() {
            return false;
        }
        path.strip_prefix(&*self.public_path)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl Default for MetricsLabels {
    fn default() -> Self {
        Self::new("/uploads")
    }
}

/// HTTP 메트릭을 수집하는 미들웨어 레이어.
///
/// 각 요청에 대해 다음 메트릭을 기록합니다:
/// - `http_requests_total`: 총 요청 수 (method, path 라벨)
/// - `http_responses_total`: 총 응답 수 (method, path, status 라벨)
/// - `http_request_duration_seconds`: 요청 처리 시간 히스토그램
pub async fn metrics_layer(
    State(labels): State<MetricsLabels>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = labels.path_label(&request);

    record_http_request(&method, &path);

    let response = next.run(request).await;

    record_http_response(&method, &path, response.status().as_u16());
    record_http_duration(&method, &path, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "OK"
    }

    fn app(labels: MetricsLabels) -> Router {
        let books = Router::new().route("/{id}", get(ok_handler));
        Router::new()
            .nest("/api/v1/books", books)
            .route("/covers/{file}", get(ok_handler))
            .layer(middleware::from_fn_with_state(labels, metrics_layer))
    }

    fn get_request(uri: &str) -> Request {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    /// 로컬 레코더를 건 채로 요청들을 보내고 렌더링된 메트릭을 반환합니다.
    fn render_after(labels: MetricsLabels, uris: &[&str]) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        ::metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                for uri in uris {
                    app(labels.clone()).oneshot(get_request(uri)).await.unwrap();
                }
            })
        });

        handle.render()
    }

    #[tokio::test]
    async fn test_metrics_middleware_passes_response_through() {
        let response = app(MetricsLabels::default())
            .oneshot(get_request("/api/v1/books/123e4567-e89b-12d3-a456-426614174000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_middleware_keeps_error_status() {
        let response = app(MetricsLabels::default())
            .oneshot(get_request("/missing"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_matched_route_template_is_label() {
        let rendered = render_after(
            MetricsLabels::default(),
            &[
                "/api/v1/books/123e4567-e89b-12d3-a456-426614174000",
                "/api/v1/books/987e6543-e21b-12d3-a456-426614174999",
            ],
        );

        assert!(rendered.contains(r#"path="/api/v1/books/{id}""#));
        assert!(!rendered.contains("123e4567"));
    }

    #[test]
    fn test_cover_files_share_one_label() {
        let rendered = render_after(
            MetricsLabels::new("/covers/"),
            &["/covers/1700000000000_a.png", "/covers/1700000000001_b.png"],
        );

        assert!(rendered.contains(r#"path="/covers/:file""#));
        assert!(!rendered.contains("1700000000000_a.png"));
    }

    #[test]
    fn test_unmatched_path_is_normalized() {
        let rendered = render_after(MetricsLabels::default(), &["/missing/42"]);

        assert!(rendered.contains(r#"path="/missing/:id""#));
        assert!(rendered.contains(r#"status="404""#));
    }

    #[test]
    fn test_public_path_requires_segment_boundary() {
        let labels = MetricsLabels::new("/uploads");
        assert!(labels.is_cover_file("/uploads/a.png"));
        assert!(!labels.is_cover_file("/uploadsfoo"));
        assert!(!labels.is_cover_file("/uploads"));
        assert!(!MetricsLabels::new("").is_cover_file("/a.png"));
    }
}
