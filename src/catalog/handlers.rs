use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    catalog::{search::search, Listing},
    error::AppError,
    extract::AppQuery,
    state::AppState,
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/places", get(list_places))
        .route("/places/search", get(search_places))
        .route("/restaurants", get(list_restaurants))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub category: Option<String>,
}

#[instrument(skip(state))]
pub async fn list_places(State(state): State<AppState>) -> Result<Json<Vec<Listing>>, AppError> {
    Ok(Json(state.catalog.load_places().await?))
}

#[instrument(skip(state))]
pub async fn list_restaurants(
    State(state): State<AppState>,
) -> Result<Json<Vec<Listing>>, AppError> {
    Ok(Json(state.catalog.load_restaurants().await?))
}

#[instrument(skip(state))]
pub async fn search_places(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SearchParams>,
) -> Result<Json<Vec<Listing>>, AppError> {
    let places = state.catalog.load_places().await?;
    // blank category means no category filter
    let category = params.category.as_deref().filter(|c| !c.trim().is_empty());
    let hits: Vec<Listing> = search(&places, &params.query, category)
        .into_iter()
        .cloned()
        .collect();
    debug!(query = %params.query, ?category, hits = hits.len(), "places searched");
    Ok(Json(hits))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let app = catalog_routes().with_state(AppState::fake());
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn lists_places_and_restaurants() {
        let (status, places) = get_json("/places").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(places.as_array().unwrap().len(), 3);

        let (status, restaurants) = get_json("/restaurants").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(restaurants[0]["name"], "Coastal Cuisine");
    }

    #[tokio::test]
    async fn search_filters_by_query_and_category() {
        let (status, hits) = get_json("/places/search?query=MALL").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(hits.as_array().unwrap().len(), 1);
        assert_eq!(hits[0]["id"], "p2");

        let (_, hits) = get_json("/places/search?category=outdoor").await;
        assert_eq!(hits[0]["name"], "Mini Seashore");

        let (_, hits) = get_json("/places/search?category=").await;
        assert_eq!(hits.as_array().unwrap().len(), 3);
    }
}
