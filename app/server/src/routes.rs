use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use inspectra::dcf::{calculate_dcf, DcfInput};
use inspectra::{ReportFormat, SpecialistType};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/api/chat/enhanced-chat", post(enhanced_chat))
        .route(
            "/api/chat/generate-enhanced-report",
            post(generate_enhanced_report),
        )
        .route("/api/reports", get(list_reports))
        .route("/api/reports/:report_id", get(get_report))
        .route(
            "/api/reports/download/:format/:filename",
            get(download_report),
        )
        .route("/api/documents", post(add_document).get(document_stats))
        .route("/api/documents/analyze", post(analyze_document))
        .route("/api/documents/search", post(search_documents))
        .route("/api/documents/:id", axum::routing::delete(delete_document))
        .route(
            "/api/evaluations/:conversation_id",
            post(evaluate_conversation).get(get_evaluation),
        )
        .route("/api/dcf", post(dcf))
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "Inspectra chat backend is running"
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    specialist_type: String,
    user_message: String,
    user_email: String,
    user_name: Option<String>,
    conversation_id: Option<String>,
}

async fn enhanced_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.user_message.trim().is_empty() {
        return Err(ApiError::BadRequest("user_message must not be empty".into()));
    }
    if request.user_email.trim().is_empty() {
        return Err(ApiError::BadRequest("user_email must not be empty".into()));
    }

    let specialist = SpecialistType::from_wire(&request.specialist_type);
    let outcome = state
        .chat
        .process_message(
            specialist,
            &request.user_message,
            &request.user_email,
            request.user_name.as_deref(),
            request.conversation_id.as_deref(),
        )
        .await?;

    Ok(Json(json!({
        "conversation_id": outcome.conversation_id,
        "response": outcome.response,
        "report_generated": outcome.report_generated,
        "report_downloads": outcome.report_downloads,
        "timestamp": outcome.timestamp,
    })))
}

#[derive(Debug, Deserialize)]
struct GenerateReportRequest {
    conversation_id: String,
    customer_request: String,
    #[serde(default)]
    report_format: Vec<String>,
}

async fn generate_enhanced_report(
    State(state): State<AppState>,
    Json(request): Json<GenerateReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.chat.conversations().exists(&request.conversation_id) {
        return Err(ApiError::NotFound(format!(
            "Conversation {} not found",
            request.conversation_id
        )));
    }

    let formats: Vec<ReportFormat> = if request.report_format.is_empty() {
        ReportFormat::default_set()
    } else {
        let parsed: Vec<ReportFormat> = request
            .report_format
            .iter()
            .filter_map(|f| ReportFormat::from_wire(f))
            .collect();
        if parsed.is_empty() {
            return Err(ApiError::BadRequest(format!(
                "No valid report formats in {:?}",
                request.report_format
            )));
        }
        parsed
    };

    let outcome = state
        .chat
        .generate_report_for_conversation(
            &request.conversation_id,
            &request.customer_request,
            &formats,
        )
        .await?;

    Ok(Json(json!({
        "manifest": outcome.manifest,
        "errors": outcome.errors,
    })))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(state.list_limit);
    let manifests = state.chat.reports().list_recent(limit)?;
    Ok(Json(json!({ "reports": manifests })))
}

async fn get_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.chat.reports().manifest(&report_id)? {
        Some(manifest) => Ok(Json(manifest)),
        None => Err(ApiError::NotFound(format!("Report {} not found", report_id))),
    }
}

async fn download_report(
    State(state): State<AppState>,
    Path((format, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let format = ReportFormat::from_wire(&format)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown report format '{}'", format)))?;
    let path = state
        .chat
        .reports()
        .artifact_path(format, &filename)
        .ok_or_else(|| ApiError::BadRequest("Invalid filename".into()))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::NotFound(format!("Report file {} not found", filename)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}

#[derive(Debug, Deserialize)]
struct AddDocumentRequest {
    text: String,
    embedding: Vec<f32>,
    source: Option<String>,
}

async fn add_document(
    State(state): State<AppState>,
    Json(request): Json<AddDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".into()));
    }
    if request.embedding.is_empty() {
        return Err(ApiError::BadRequest("embedding must not be empty".into()));
    }
    let id = state
        .vectors
        .add(request.text, request.embedding, request.source);
    Ok(Json(json!({ "id": id })))
}

async fn document_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "count": state.vectors.count() }))
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    embedding: Vec<f32>,
    top_k: Option<usize>,
}

async fn search_documents(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.embedding.is_empty() {
        return Err(ApiError::BadRequest("embedding must not be empty".into()));
    }
    let hits = state
        .vectors
        .search(&request.embedding, request.top_k.unwrap_or(5));
    Ok(Json(json!({ "results": hits })))
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    specialist_type: String,
    text: String,
}

async fn analyze_document(
    Json(request): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".into()));
    }
    let specialist = SpecialistType::from_wire(&request.specialist_type);
    let analysis = inspectra::specialist::analyze_document(specialist, &request.text);
    Ok(Json(analysis))
}

async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.vectors.delete(&id) {
        Ok(Json(json!({ "deleted": id })))
    } else {
        Err(ApiError::NotFound(format!("Document {} not found", id)))
    }
}

#[derive(Debug, Deserialize)]
struct EvaluateRequest {
    user_satisfaction: Option<f64>,
}

async fn evaluate_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    request: Option<Json<EvaluateRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = state
        .chat
        .conversations()
        .load(&conversation_id)
        .map_err(|_| ApiError::NotFound(format!("Conversation {} not found", conversation_id)))?;

    let satisfaction = request.and_then(|Json(r)| r.user_satisfaction);
    if let Some(value) = satisfaction {
        if !(0.0..=1.0).contains(&value) {
            return Err(ApiError::BadRequest(
                "user_satisfaction must be between 0.0 and 1.0".into(),
            ));
        }
    }

    let evaluation = state.evaluations.evaluate(&conversation, satisfaction)?;
    Ok(Json(evaluation))
}

async fn get_evaluation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.evaluations.load(&conversation_id)? {
        Some(evaluation) => Ok(Json(evaluation)),
        None => Err(ApiError::NotFound(format!(
            "No evaluation for conversation {}",
            conversation_id
        ))),
    }
}

async fn dcf(Json(input): Json<DcfInput>) -> Result<impl IntoResponse, ApiError> {
    calculate_dcf(input)
        .map(Json)
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use inspectra::AppConfig;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_router(tmp: &TempDir) -> Router {
        let mut config = AppConfig::default();
        config.data_dir = tmp.path().to_path_buf();
        router(AppState::from_config(&config).unwrap())
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let tmp = TempDir::new().unwrap();
        let response = test_router(&tmp)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_report_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let response = test_router(&tmp)
            .oneshot(
                Request::builder()
                    .uri("/api/reports/nope_report_20250101_000000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn dcf_rejects_bad_economics() {
        let tmp = TempDir::new().unwrap();
        let body = serde_json::json!({
            "current_fcf": 100.0,
            "growth_rate": 0.1,
            "discount_rate": 0.02,
            "terminal_growth": 0.03,
        });
        let response = test_router(&tmp)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/dcf")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn evaluating_unknown_conversation_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let response = test_router(&tmp)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/evaluations/no-such-conversation")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn download_rejects_traversal_filenames() {
        let tmp = TempDir::new().unwrap();
        let response = test_router(&tmp)
            .oneshot(
                Request::builder()
                    .uri("/api/reports/download/pdf/..%2Fsecrets.pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
