use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::{FIELDS, FieldBounds, FieldKey, InputForm};
use crate::core::{AnnualRecord, ProjectionSeries, SimulationParameters, project, terminal_year};
use crate::error::{AppError, AppResult};
use crate::report::{DEFAULT_EXPORT_FILE, render_svg, to_csv};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// Web form field names. Rates are percentages, as in the form controls.
/// Years and ages arrive as plain numbers so whole-number checks go through
/// the field bounds like every other value.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    start_year: Option<f64>,
    start_age: Option<f64>,
    initial_assets: Option<f64>,
    annual_return: Option<f64>,
    monthly_investment: Option<f64>,
    end_investment_year: Option<f64>,
    start_withdrawal_year: Option<f64>,
    withdrawal_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldsResponse {
    fields: &'static [FieldBounds],
    defaults: InputForm,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionSummary {
    terminal_year: i32,
    final_balance: f64,
    peak_balance: f64,
    peak_age: i32,
    depletion_age: Option<i32>,
    depletion_year: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    parameters: InputForm,
    summary: ProjectionSummary,
    records: Vec<AnnualRecord>,
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "asset projection form listening");
    tracing::info!("local access: http://127.0.0.1:{port}/");

    axum::serve(listener, router()).await
}

fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/fields", get(fields_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/project.csv", get(csv_handler))
        .route("/api/chart.svg", get(chart_handler))
        .fallback(not_found_handler)
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn fields_handler() -> Response {
    json_response(
        StatusCode::OK,
        FieldsResponse {
            fields: &FIELDS,
            defaults: InputForm::default(),
        },
    )
}

async fn project_get_handler(query: Result<Query<ProjectPayload>, QueryRejection>) -> Response {
    project_handler_impl(query_payload(query))
}

async fn project_post_handler(body: Result<Json<ProjectPayload>, JsonRejection>) -> Response {
    let payload = body
        .map(|Json(payload)| payload)
        .map_err(|rejection| AppError::Request(rejection.body_text()));
    project_handler_impl(payload)
}

fn query_payload(query: Result<Query<ProjectPayload>, QueryRejection>) -> AppResult<ProjectPayload> {
    query
        .map(|Query(payload)| payload)
        .map_err(|rejection| AppError::Request(rejection.body_text()))
}

fn project_handler_impl(payload: AppResult<ProjectPayload>) -> Response {
    match payload.and_then(run_payload) {
        Ok((params, series)) => {
            json_response(StatusCode::OK, build_project_response(&params, &series))
        }
        Err(err) => err.into_response(),
    }
}

async fn csv_handler(query: Result<Query<ProjectPayload>, QueryRejection>) -> Response {
    match query_payload(query).and_then(run_payload) {
        Ok((_, series)) => {
            let mut body = String::from("\u{feff}");
            body.push_str(&to_csv(&series));
            with_cache_control((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{DEFAULT_EXPORT_FILE}\""),
                    ),
                ],
                body,
            ))
        }
        Err(err) => err.into_response(),
    }
}

async fn chart_handler(query: Result<Query<ProjectPayload>, QueryRejection>) -> Response {
    match query_payload(query).and_then(run_payload) {
        Ok((_, series)) => with_cache_control((
            [(header::CONTENT_TYPE, "image/svg+xml")],
            render_svg(&series),
        )),
        Err(err) => err.into_response(),
    }
}

fn run_payload(payload: ProjectPayload) -> AppResult<(SimulationParameters, ProjectionSeries)> {
    let params = params_from_payload(payload)?;
    let series = project(&params);
    tracing::debug!(
        start_year = params.start_year,
        start_age = params.start_age,
        years = series.len(),
        "projection served"
    );
    Ok((params, series))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn params_from_json(json: &str) -> AppResult<SimulationParameters> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| AppError::Request(e.to_string()))?;
    params_from_payload(payload)
}

fn params_from_payload(payload: ProjectPayload) -> AppResult<SimulationParameters> {
    let mut form = InputForm::default();
    form.apply_overrides([
        (FieldKey::StartYear, payload.start_year),
        (FieldKey::StartAge, payload.start_age),
        (FieldKey::InitialAssets, payload.initial_assets),
        (FieldKey::AnnualReturn, payload.annual_return),
        (FieldKey::MonthlyInvestment, payload.monthly_investment),
        (FieldKey::EndInvestmentYear, payload.end_investment_year),
        (FieldKey::StartWithdrawalYear, payload.start_withdrawal_year),
        (FieldKey::WithdrawalRate, payload.withdrawal_rate),
    ])?;
    form.into_parameters()
}

fn build_project_response(
    params: &SimulationParameters,
    series: &ProjectionSeries,
) -> ProjectResponse {
    let peak = series.peak();
    let depletion = series.depletion();
    ProjectResponse {
        parameters: InputForm::from_parameters(params),
        summary: ProjectionSummary {
            terminal_year: terminal_year(params),
            final_balance: series.final_balance(),
            peak_balance: peak.map_or(0.0, |r| r.balance),
            peak_age: peak.map_or(params.start_age, |r| r.age),
            depletion_age: depletion.map(|r| r.age),
            depletion_year: depletion.map(|r| r.year),
        },
        records: series.records().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    async fn get(uri: &str) -> (StatusCode, Vec<(String, String)>, String) {
        let response = router()
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, headers, String::from_utf8(body.to_vec()).expect("utf-8"))
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn params_from_json_parses_web_keys_and_converts_percentages() {
        let json = r#"{
          "startYear": 2025,
          "startAge": 60,
          "initialAssets": 10000000,
          "annualReturn": 4,
          "monthlyInvestment": 0,
          "endInvestmentYear": 2024,
          "startWithdrawalYear": 2025,
          "withdrawalRate": 4
        }"#;
        let params = params_from_json(json).expect("json should parse");
        assert_eq!(params.start_year, 2025);
        assert_eq!(params.start_age, 60);
        assert_approx(params.initial_assets, 10_000_000.0);
        assert_approx(params.annual_return, 0.04);
        assert_approx(params.monthly_investment, 0.0);
        assert_eq!(params.end_investment_year, 2024);
        assert_eq!(params.start_withdrawal_year, 2025);
        assert_approx(params.withdrawal_rate, 0.04);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let params = params_from_json(r#"{ "startAge": 50 }"#).expect("partial payload");
        let defaults = InputForm::default()
            .into_parameters()
            .expect("defaults valid");
        assert_eq!(params.start_age, 50);
        assert_eq!(params.start_year, defaults.start_year);
        assert_approx(params.annual_return, defaults.annual_return);
    }

    #[test]
    fn out_of_range_payload_is_rejected() {
        let err = params_from_json(r#"{ "withdrawalRate": 150 }"#).expect_err("too high");
        assert!(err.to_string().contains("withdrawalRate"));
    }

    #[test]
    fn project_response_serialization_contains_expected_fields() {
        let params = params_from_json(r#"{ "startAge": 90 }"#).expect("valid");
        let series = project(&params);
        let response = build_project_response(&params, &series);
        assert_eq!(response.records.len(), 11);
        assert_eq!(response.summary.terminal_year, params.start_year + 10);

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"parameters\""));
        assert!(json.contains("\"annualReturnPct\""));
        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"finalBalance\""));
        assert!(json.contains("\"depletionAge\":null"));
        assert!(json.contains("\"records\""));
        assert!(json.contains("\"monthlyWithdrawal\""));
    }

    #[test]
    fn summary_reports_depletion() {
        let params = params_from_json(
            r#"{ "startAge": 80, "initialAssets": 1200000, "annualReturn": 0, "monthlyInvestment": 0,
                 "endInvestmentYear": 2000, "startWithdrawalYear": 2026, "withdrawalRate": 100 }"#,
        )
        .expect("valid");
        let series = project(&params);
        let response = build_project_response(&params, &series);
        // A full-balance withdrawal empties the account in its first year.
        assert_eq!(response.summary.depletion_year, Some(2026));
        assert_eq!(response.summary.depletion_age, Some(81));
        assert_eq!(response.summary.peak_age, 80);
    }

    #[tokio::test]
    async fn project_endpoint_returns_json_series() {
        let (status, headers, body) = get("/api/project?startAge=95&annualReturn=-2.5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(header(&headers, "cache-control"), Some("no-store"));
        let value: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(value["records"].as_array().map(Vec::len), Some(6));
        assert_eq!(value["parameters"]["startAge"], 95);
    }

    #[tokio::test]
    async fn project_endpoint_rejects_invalid_input() {
        let (status, _, body) = get("/api/project?startAge=120").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("startAge"));
    }

    #[tokio::test]
    async fn non_numeric_query_value_returns_json_error() {
        let (status, headers, body) = get("/api/project?startAge=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(header(&headers, "cache-control"), Some("no-store"));
        assert!(header(&headers, "content-type").is_some_and(|v| v.starts_with("application/json")));
        let value: serde_json::Value = serde_json::from_str(&body).expect("json error body");
        assert!(value["error"].as_str().is_some_and(|e| e.starts_with("Malformed request")));
    }

    #[tokio::test]
    async fn fractional_year_is_rejected_by_field_bounds() {
        let (status, headers, body) = get("/api/project?startYear=2025.5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(header(&headers, "cache-control"), Some("no-store"));
        let value: serde_json::Value = serde_json::from_str(&body).expect("json error body");
        let message = value["error"].as_str().expect("error message");
        assert!(message.contains("startYear"));
        assert!(message.contains("whole number"));
    }

    #[tokio::test]
    async fn chart_and_csv_reject_malformed_queries_as_json() {
        for uri in ["/api/chart.svg?withdrawalRate=lots", "/api/project.csv?startAge=x"] {
            let (status, headers, body) = get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(header(&headers, "cache-control"), Some("no-store"));
            let value: serde_json::Value = serde_json::from_str(&body).expect("json error body");
            assert!(value["error"].is_string());
        }
    }

    #[tokio::test]
    async fn malformed_post_body_returns_json_error() {
        let response = router()
            .oneshot(
                Request::post("/api/project")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{ \"startAge\": "))
                    .expect("request"),
            )
            .await
            .expect("router is infallible");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value: serde_json::Value = serde_json::from_slice(&body).expect("json error body");
        assert!(value["error"].is_string());
    }

    #[tokio::test]
    async fn csv_endpoint_serves_attachment_with_bom() {
        let (status, headers, body) = get("/api/project.csv?startAge=98").await;
        assert_eq!(status, StatusCode::OK);
        assert!(
            header(&headers, "content-disposition")
                .is_some_and(|v| v.contains(DEFAULT_EXPORT_FILE))
        );
        assert!(body.starts_with('\u{feff}'));
        assert_eq!(body.lines().count(), 4);
    }

    #[tokio::test]
    async fn chart_endpoint_serves_svg() {
        let (status, headers, body) = get("/api/chart.svg").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(header(&headers, "content-type"), Some("image/svg+xml"));
        assert!(body.starts_with("<svg"));
    }

    #[tokio::test]
    async fn fields_endpoint_lists_bounds_and_defaults() {
        let (status, _, body) = get("/api/fields").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(value["fields"].as_array().map(Vec::len), Some(FIELDS.len()));
        assert_eq!(value["fields"][0]["key"], "startYear");
        assert_eq!(value["defaults"]["startYear"], 2025);
    }

    #[tokio::test]
    async fn index_and_unknown_routes() {
        let (status, _, body) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<form"));

        let (status, _, body) = get("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Not found"));
    }
}
