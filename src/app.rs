use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{auth, catalog, itineraries, profile, state::AppState, weather};

/// Whole milliseconds, saturating at `u64::MAX`.
fn whole_millis(latency: std::time::Duration) -> u64 {
    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(auth::router())
        .merge(profile::router())
        .merge(itineraries::router())
        .merge(catalog::router())
        .merge(weather::router())
}

pub fn build_app(state: AppState) -> Router {
    let mut app = Router::new().nest("/api", api_router());

    // Client-side routes fall back to index.html.
    if let Some(dir) = &state.config.static_dir {
        tracing::info!(static_dir = %dir.display(), "serving frontend");
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(dir).not_found_service(index));
    }

    app.with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = whole_millis(latency);
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;

    async fn status_of(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn api_is_nested() {
        let app = build_app(AppState::fake());
        assert_eq!(status_of(app.clone(), "/api/health").await, StatusCode::OK);
        assert_eq!(status_of(app.clone(), "/api/places").await, StatusCode::OK);
        assert_eq!(status_of(app, "/places").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn static_dir_serves_files() {
        let mut state = AppState::fake();
        let mut config = (*state.config).clone();
        config.static_dir = Some(config.data_dir.clone());
        state.config = Arc::new(config);

        let app = build_app(state);
        assert_eq!(status_of(app.clone(), "/places.json").await, StatusCode::OK);
        assert_eq!(status_of(app, "/api/health").await, StatusCode::OK);
    }

    #[test]
    fn latency_millis_saturate() {
        use std::time::Duration;

        assert_eq!(whole_millis(Duration::from_micros(2_999)), 2);
        assert_eq!(whole_millis(Duration::MAX), u64::MAX);
    }
}
