use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};

use crate::{
    course,
    error::AppError,
    export,
    models::{Draft, Submission},
    query::{FilterState, PageKey},
    store::SubmissionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubmissionStore>,
    pub offset: FixedOffset,
}

/// Query string for the list endpoints. Empty values mean "no filter".
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ListParams {
    #[serde(default)]
    pub search: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl ListParams {
    pub fn from_filter(filter: &FilterState) -> Self {
        ListParams {
            search: filter.search.clone(),
            date_from: filter.date_from,
            date_to: filter.date_to,
            page: None,
        }
    }

    pub fn from_key(key: &PageKey) -> Self {
        ListParams {
            page: Some(key.page),
            ..Self::from_filter(&key.filter)
        }
    }

    fn filter(&self) -> FilterState {
        FilterState {
            search: self.search.clone(),
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }

    fn key(&self) -> PageKey {
        PageKey::new(self.filter(), self.page.unwrap_or(1))
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PageResponse {
    pub page: u32,
    pub rows: Vec<Submission>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CountResponse {
    pub count: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // course content
        .route("/api/course", get(course_overview))
        .route("/api/course/days/:day", get(course_day))
        // contact form + admin
        .route("/api/submissions", post(create_submission).get(list_submissions))
        .route("/api/submissions/count", get(count_submissions))
        .route("/api/submissions/all", get(all_submissions))
        .route("/api/submissions/export", get(export_submissions))
        .with_state(state)
}

async fn course_overview() -> Json<course::Overview> {
    Json(course::overview())
}

async fn course_day(Path(day): Path<u8>) -> Result<Json<course::CourseDay>, AppError> {
    course::day(day)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("day {day}")))
}

async fn create_submission(
    State(state): State<AppState>,
    Json(draft): Json<Draft>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    let new = draft.validate()?;
    let rec = state.store.insert(&new).await?;
    tracing::info!(id = %rec.id, "submission stored");
    Ok((StatusCode::CREATED, Json(rec)))
}

async fn list_submissions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PageResponse>, AppError> {
    let key = params.key();
    let rows = state.store.fetch_page(&key).await?;
    Ok(Json(PageResponse {
        page: key.page,
        rows,
    }))
}

async fn count_submissions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<CountResponse>, AppError> {
    let count = state.store.count(&params.filter()).await?;
    Ok(Json(CountResponse { count }))
}

async fn all_submissions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Submission>>, AppError> {
    Ok(Json(state.store.fetch_all(&params.filter()).await?))
}

async fn export_submissions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().with_timezone(&state.offset).date_naive();
    let file = export::export(state.store.as_ref(), &params.filter(), state.offset, today).await?;
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, export::XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{forty_five, offset};
    use crate::store::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(rows: Vec<Submission>) -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_rows(offset(), rows));
        let state = AppState {
            store: store.clone(),
            offset: offset(),
        };
        (router(state), store)
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn invalid_draft_is_422_and_not_stored() {
        let (app, store) = app(Vec::new());
        let draft = json!({
            "first_name": "Anna", "last_name": "Petrova", "email": "anna@example",
            "telegram": "@anna", "phone": "1"
        });
        let (status, body) = send(app, post_json("/api/submissions", draft)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let err: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["field"], "email");
        assert_eq!(store.count(&FilterState::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn valid_draft_is_created() {
        let (app, store) = app(Vec::new());
        let draft = json!({
            "first_name": " Anna ", "last_name": "Petrova", "email": "ANNA@example.com",
            "telegram": "@anna", "phone": "1", "feedback": ""
        });
        let (status, body) = send(app, post_json("/api/submissions", draft)).await;
        assert_eq!(status, StatusCode::CREATED);
        let rec: Submission = serde_json::from_slice(&body).unwrap();
        assert_eq!(rec.first_name, "Anna");
        assert_eq!(rec.email, "anna@example.com");
        assert_eq!(rec.feedback, None);
        assert_eq!(store.count(&FilterState::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_pages_with_empty_params() {
        let (app, _) = app(forty_five());
        let (status, body) =
            send(app, get("/api/submissions?search=&date_from=&date_to=&page=3")).await;
        assert_eq!(status, StatusCode::OK);
        let page: PageResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(page.page, 3);
        assert_eq!(page.rows.len(), 5);
    }

    #[tokio::test]
    async fn count_applies_filters() {
        let (app, _) = app(forty_five());
        let (_, body) = send(app.clone(), get("/api/submissions/count?search=first1")).await;
        let res: CountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(res.count, 11);

        let (_, body) = send(app, get("/api/submissions/count?date_from=2026-03-02")).await;
        let res: CountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(res.count, 0);
    }

    #[tokio::test]
    async fn export_is_an_attachment() {
        let (app, _) = app(forty_five());
        let res = app.oneshot(get("/api/submissions/export")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], export::XLSX_MIME);
        let disposition = res.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"submissions_"));
        assert!(disposition.ends_with(".xlsx\""));
    }

    #[tokio::test]
    async fn course_days_outside_range_are_404() {
        let (app, _) = app(Vec::new());
        let (status, _) = send(app.clone(), get("/api/course/days/6")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) = send(app, get("/api/course/days/2")).await;
        assert_eq!(status, StatusCode::OK);
        let day: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(day["prev_day"], 1);
        assert_eq!(day["next_day"], 3);
    }
}
