use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::AppError,
    extract::{AppJson, AppPath},
    itineraries::{
        dto::{Day, DayInput, GenerateRequest, ItineraryDetail, SaveItineraryRequest},
        generator,
        repo_types::Itinerary,
        shaper,
    },
    state::AppState,
};

/// Upper bound on generated days per request.
const MAX_GENERATED_DAYS: i64 = 30;

pub fn itinerary_routes() -> Router<AppState> {
    Router::new()
        .route("/itineraries", get(list_itineraries).post(create_itinerary))
        .route(
            "/itineraries/:id",
            get(get_itinerary)
                .put(update_itinerary)
                .delete(delete_itinerary),
        )
        .route("/itineraries/:id/days", put(replace_days))
}

pub fn generate_routes() -> Router<AppState> {
    Router::new().route("/generate-itinerary", post(generate_itinerary))
}

#[instrument(skip(state))]
pub async fn list_itineraries(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Itinerary>>, AppError> {
    let items = state.itineraries.list_for_user(user_id).await?;
    debug!(%user_id, count = items.len(), "itineraries listed");
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_itinerary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ItineraryDetail>, AppError> {
    let details = state
        .itineraries
        .find_for_user(user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Itinerary"))?;
    let activities = state.itineraries.activities_by_itinerary(id).await?;

    Ok(Json(ItineraryDetail {
        details,
        days: shaper::to_nested(&activities),
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_itinerary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<SaveItineraryRequest>,
) -> Result<(StatusCode, Json<Itinerary>), AppError> {
    payload.details.validate()?;

    let id = Uuid::new_v4();
    let records = shaper::to_flat(id, &payload.days)?;
    shaper::check_day_bounds(&records, payload.details.days)?;

    let itinerary = state
        .itineraries
        .create(id, user_id, &payload.details, &records)
        .await?;

    info!(%user_id, itinerary_id = %id, activities = records.len(), "itinerary created");
    Ok((StatusCode::CREATED, Json(itinerary)))
}

#[instrument(skip(state, payload))]
pub async fn update_itinerary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<SaveItineraryRequest>,
) -> Result<Json<Itinerary>, AppError> {
    payload.details.validate()?;

    let records = shaper::to_flat(id, &payload.days)?;
    shaper::check_day_bounds(&records, payload.details.days)?;

    let itinerary = state
        .itineraries
        .update(user_id, id, &payload.details, &records)
        .await?
        .ok_or_else(|| AppError::not_found("Itinerary"))?;

    info!(%user_id, itinerary_id = %id, activities = records.len(), "itinerary updated");
    Ok(Json(itinerary))
}

#[instrument(skip(state, days))]
pub async fn replace_days(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(days): AppJson<Vec<DayInput>>,
) -> Result<Json<ItineraryDetail>, AppError> {
    let current = state
        .itineraries
        .find_for_user(user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Itinerary"))?;

    let records = shaper::to_flat(id, &days)?;
    shaper::check_day_bounds(&records, current.days)?;

    let details = state
        .itineraries
        .replace_activities(user_id, id, &records)
        .await?
        .ok_or_else(|| AppError::not_found("Itinerary"))?;

    info!(%user_id, itinerary_id = %id, activities = records.len(), "itinerary days replaced");
    Ok(Json(ItineraryDetail {
        details,
        days: shaper::to_nested(&records),
    }))
}

#[instrument(skip(state))]
pub async fn delete_itinerary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.itineraries.delete(user_id, id).await? {
        warn!(%user_id, itinerary_id = %id, "delete of unknown itinerary");
        return Err(AppError::not_found("Itinerary"));
    }
    info!(%user_id, itinerary_id = %id, "itinerary deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn generate_itinerary(
    State(state): State<AppState>,
    AppJson(payload): AppJson<GenerateRequest>,
) -> Result<Json<Vec<Day>>, AppError> {
    if payload.days > MAX_GENERATED_DAYS {
        return Err(AppError::validation(format!(
            "days must be at most {MAX_GENERATED_DAYS}"
        )));
    }

    let template = state.catalog.load_template().await?;
    let days = generator::generate(payload.days, payload.pace, &template)?;

    debug!(
        days = payload.days,
        pace = payload.pace.as_str(),
        interests = ?payload.interests,
        "itinerary generated"
    );
    Ok(Json(days))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::FromRef,
        http::{header, Method, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::jwt::JwtKeys;

    fn app(state: &AppState) -> Router {
        Router::new()
            .merge(itinerary_routes())
            .merge(generate_routes())
            .with_state(state.clone())
    }

    fn bearer(state: &AppState, user_id: Uuid) -> String {
        let token = JwtKeys::from_ref(state).sign_access(user_id).unwrap();
        format!("Bearer {token}")
    }

    async fn call(
        app: Router,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            req = req.header(header::AUTHORIZATION, auth);
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn sample_body() -> Value {
        json!({
            "details": { "title": "Navi Mumbai weekend", "days": 2, "pace": "relaxed" },
            "days": [
                { "day": 2, "activities": [
                    { "time": "09:00 AM", "title": "Walk", "location": "Park" }
                ]},
                { "day": 1, "activities": [
                    { "time": "12:00 PM", "title": "Lunch", "location": "Coastal Cuisine", "category": "food" },
                    { "time": "10:00 AM", "title": "Museum", "location": "Centre" }
                ]}
            ]
        })
    }

    #[tokio::test]
    async fn requires_token() {
        let state = AppState::fake();
        let (status, _) = call(app(&state), Method::GET, "/itineraries", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_then_fetch_nested() {
        let state = AppState::fake();
        let user = Uuid::new_v4();
        let auth = bearer(&state, user);

        let (status, created) = call(
            app(&state),
            Method::POST,
            "/itineraries",
            Some(&auth),
            Some(sample_body()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["pace"], "relaxed");
        assert!(created.get("user_id").is_none());
        let id = created["id"].as_str().unwrap().to_string();

        let (status, detail) = call(
            app(&state),
            Method::GET,
            &format!("/itineraries/{id}"),
            Some(&auth),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["details"]["title"], "Navi Mumbai weekend");
        let days = detail["days"].as_array().unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0]["day"], 1);
        assert_eq!(days[0]["activities"][0]["title"], "Museum");
        assert_eq!(days[0]["activities"][1]["category"], "food");
        assert_eq!(days[0]["activities"][0]["description"], "");
        assert_eq!(days[1]["activities"][0]["title"], "Walk");

        let (status, list) = call(app(&state), Method::GET, "/itineraries", Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn other_users_cannot_see_itinerary() {
        let state = AppState::fake();
        let owner = bearer(&state, Uuid::new_v4());
        let stranger = bearer(&state, Uuid::new_v4());

        let (_, created) = call(
            app(&state),
            Method::POST,
            "/itineraries",
            Some(&owner),
            Some(sample_body()),
        )
        .await;
        let uri = format!("/itineraries/{}", created["id"].as_str().unwrap());

        let (status, _) = call(app(&state), Method::GET, &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(app(&state), Method::DELETE, &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_title_is_rejected_and_nothing_is_stored() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let mut body = sample_body();
        body["days"][0]["activities"][0]
            .as_object_mut()
            .unwrap()
            .remove("title");

        let (status, err) =
            call(app(&state), Method::POST, "/itineraries", Some(&auth), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["message"].as_str().unwrap().contains("title"));

        let (_, list) = call(app(&state), Method::GET, "/itineraries", Some(&auth), None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn activity_beyond_day_count_is_rejected() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let mut body = sample_body();
        body["details"]["days"] = json!(1);

        let (status, _) =
            call(app(&state), Method::POST, "/itineraries", Some(&auth), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_replaces_activities_and_delete_removes() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let (_, created) = call(
            app(&state),
            Method::POST,
            "/itineraries",
            Some(&auth),
            Some(sample_body()),
        )
        .await;
        let uri = format!("/itineraries/{}", created["id"].as_str().unwrap());

        let update = json!({
            "details": { "title": "Renamed", "days": 3, "pace": "intensive", "include_food": false },
            "days": [{ "day": 3, "activities": [
                { "time": "08:00 PM", "title": "Dinner", "location": "Food court" }
            ]}]
        });
        let (status, updated) =
            call(app(&state), Method::PUT, &uri, Some(&auth), Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Renamed");
        assert_eq!(updated["include_food"], false);

        let (_, detail) = call(app(&state), Method::GET, &uri, Some(&auth), None).await;
        let days = detail["days"].as_array().unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0]["day"], 3);

        let (status, _) = call(app(&state), Method::DELETE, &uri, Some(&auth), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(app(&state), Method::GET, &uri, Some(&auth), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn replace_days_only() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let (_, created) = call(
            app(&state),
            Method::POST,
            "/itineraries",
            Some(&auth),
            Some(sample_body()),
        )
        .await;
        let uri = format!("/itineraries/{}/days", created["id"].as_str().unwrap());

        let days = json!([{ "day": 1, "activities": [
            { "time": "07:00 AM", "title": "Yoga", "location": "Beach" }
        ]}]);
        let (status, detail) = call(app(&state), Method::PUT, &uri, Some(&auth), Some(days)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["details"]["title"], "Navi Mumbai weekend");
        assert_eq!(detail["days"][0]["activities"][0]["title"], "Yoga");
        assert_eq!(detail["days"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generate_uses_template_and_pace() {
        let state = AppState::fake();
        let (status, days) = call(
            app(&state),
            Method::POST,
            "/generate-itinerary",
            None,
            Some(json!({ "days": 3, "pace": "relaxed", "interests": ["food"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let days = days.as_array().unwrap();
        assert_eq!(days.len(), 3);
        for d in days {
            assert_eq!(d["activities"].as_array().unwrap().len(), 2);
            assert_eq!(d["activities"], days[0]["activities"]);
        }
    }

    #[tokio::test]
    async fn generate_rejects_bad_day_counts() {
        let state = AppState::fake();
        for n in [0, MAX_GENERATED_DAYS + 1] {
            let (status, _) = call(
                app(&state),
                Method::POST,
                "/generate-itinerary",
                None,
                Some(json!({ "days": n })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }
    #[tokio::test]
    async fn malformed_bodies_are_validation_errors() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());

        let mut no_day = sample_body();
        no_day["days"][0].as_object_mut().unwrap().remove("day");
        let mut no_title = sample_body();
        no_title["details"].as_object_mut().unwrap().remove("title");

        let cases = [
            ("/itineraries", Some(auth.as_str()), no_day),
            ("/itineraries", Some(auth.as_str()), no_title),
            ("/generate-itinerary", None, json!({ "days": "3" })),
        ];
        for (uri, auth, body) in cases {
            let (status, err) = call(app(&state), Method::POST, uri, auth, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(err["message"].is_string(), "{uri}");
        }

        let (_, list) = call(app(&state), Method::GET, "/itineraries", Some(&auth), None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_itinerary_id_is_a_validation_error() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let (status, err) =
            call(app(&state), Method::GET, "/itineraries/not-a-uuid", Some(&auth), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["message"].is_string());
    }

    #[tokio::test]
    async fn generate_accepts_null_interests() {
        let state = AppState::fake();
        let (status, days) = call(
            app(&state),
            Method::POST,
            "/generate-itinerary",
            None,
            Some(json!({ "days": 1, "interests": null })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(days[0]["activities"].as_array().unwrap().len(), 3);
    }
}
