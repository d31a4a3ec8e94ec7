//! HTTP handler functions for the health report API.

use actix_web::{HttpResponse, web};
use health_report::ReportError;
use health_report_server_models::{
    AnswerResponse, ApiErrorDetail, ApiHealth, QuestionRequest, ResearchRequest,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /research`
///
/// Returns the report for the requested area, generating it unless
/// cached. Provider failures still answer 200 with an `Error: ...`
/// report.
pub async fn research(
    state: web::Data<AppState>,
    body: web::Json<ResearchRequest>,
) -> HttpResponse {
    log::info!("Received report request for area: {}", body.area.trim());

    match state.reports.generate_report(&body.area).await {
        Ok(record) => HttpResponse::Ok().json(record.as_ref()),
        Err(e) => rejected(&e),
    }
}

/// `POST /ask`
///
/// Answers a follow-up question from the supplied context or the cached
/// report.
pub async fn ask(state: web::Data<AppState>, body: web::Json<QuestionRequest>) -> HttpResponse {
    let QuestionRequest {
        report_id,
        question,
        report_context,
    } = body.into_inner();

    match state
        .reports
        .answer_follow_up(&report_id, &question, report_context.as_deref())
        .await
    {
        Ok(answer) => HttpResponse::Ok().json(AnswerResponse { answer }),
        Err(e) => rejected(&e),
    }
}

fn rejected(e: &ReportError) -> HttpResponse {
    log::warn!("Rejected request: {e}");
    HttpResponse::BadRequest().json(ApiErrorDetail {
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use health_report::{MemoryReportCache, ReportConfig, ReportService};
    use health_report_ai::providers::CompletionProvider;
    use health_report_ai::{AiError, CompletionClient, CompletionRequest};
    use health_report_models::ReportRecord;

    use crate::{AppState, configure_api};

    struct FixedProvider(Result<&'static str, AiError>);

    #[async_trait::async_trait]
    impl CompletionProvider for FixedProvider {
        async fn complete(
            &self,
            _system_prompt: &str,
            _request: &CompletionRequest,
        ) -> Result<String, AiError> {
            self.0.clone().map(str::to_string)
        }
    }

    fn state(response: Result<&'static str, AiError>) -> actix_web::web::Data<AppState> {
        actix_web::web::Data::new(AppState {
            reports: ReportService::new(
                CompletionClient::new(Arc::new(FixedProvider(response))),
                Arc::new(MemoryReportCache::default()),
                ReportConfig::default(),
            ),
        })
    }

    const REPORT: &str = "Comprehensive Report on Healthcare in Lagos\n\
        CHART_DATA: TYPE=bar TITLE=\"Beds\" LABELS=[\"A\",\"B\"] DATA=[1,2]";

    #[actix_web::test]
    async fn research_returns_report_record() {
        let app =
            test::init_service(App::new().app_data(state(Ok(REPORT))).configure(configure_api))
                .await;

        let req = test::TestRequest::post()
            .uri("/research")
            .set_json(serde_json::json!({ "area": " Lagos " }))
            .to_request();
        let record: ReportRecord = test::call_and_read_body_json(&app, req).await;

        assert_eq!(record.area_name, "Lagos");
        assert_eq!(record.charts.len(), 1);
        assert_eq!(record.report_id.len(), 12);
    }

    #[actix_web::test]
    async fn provider_failure_is_still_a_report() {
        let app = test::init_service(
            App::new()
                .app_data(state(Err(AiError::MissingCredential)))
                .configure(configure_api),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/research")
            .set_json(serde_json::json!({ "area": "Springfield" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let record: ReportRecord = test::read_body_json(resp).await;
        assert!(record.full_report_markdown.starts_with("Error:"));
        assert!(record.charts.is_empty());
    }

    #[actix_web::test]
    async fn blank_area_is_bad_request() {
        let app =
            test::init_service(App::new().app_data(state(Ok(REPORT))).configure(configure_api))
                .await;

        let req = test::TestRequest::post()
            .uri("/research")
            .set_json(serde_json::json!({ "area": "  " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!({ "detail": "Area cannot be empty." }));
    }

    #[actix_web::test]
    async fn ask_without_context_or_cache_is_bad_request() {
        let app =
            test::init_service(App::new().app_data(state(Ok(REPORT))).configure(configure_api))
                .await;

        let req = test::TestRequest::post()
            .uri("/ask")
            .set_json(serde_json::json!({ "report_id": "0123456789ab", "question": "Why?" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(
            body["detail"],
            "Report context is missing and not found in cache."
        );
    }

    #[actix_web::test]
    async fn ask_answers_from_supplied_context() {
        let app = test::init_service(
            App::new()
                .app_data(state(Ok("The report does not mention this.")))
                .configure(configure_api),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/ask")
            .set_json(serde_json::json!({
                "report_id": "0123456789ab",
                "question": "Any clinics?",
                "report_context": "Short report."
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["answer"], "The report does not mention this.");
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = test::init_service(App::new().configure(configure_api)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
    }
}
