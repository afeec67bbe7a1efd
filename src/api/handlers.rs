use crate::models::ReconciliationReport;
use crate::service::{DeliveryAuditor, MessageSource, SalesSource};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;

/// 失败响应体
#[derive(Debug, Serialize)]
pub struct AuditErrorResponse {
    pub success: bool,
    pub message: String,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 触发一次对账，返回完整报告
pub async fn run_audit<S, M>(State(auditor): State<Arc<DeliveryAuditor<S, M>>>) -> Response
where
    S: SalesSource + 'static,
    M: MessageSource + 'static,
{
    match auditor.run().await {
        Ok(report) => {
            tracing::info!(
                "Audit triggered over HTTP: {} sales, {} problems",
                report.summary.total_sales,
                problem_count(&report)
            );
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => {
            tracing::error!("Audit triggered over HTTP failed: {}", e);
            let response = AuditErrorResponse {
                success: false,
                message: format!("Error: {}", e),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

fn problem_count(report: &ReconciliationReport) -> usize {
    report.summary.wa_sent_but_unconfirmed
        + report.summary.firestore_confirmed_but_unverified
        + report.summary.anomalous
}

/// 路由: GET /health, POST /api/audit
pub fn router<S, M>(auditor: Arc<DeliveryAuditor<S, M>>) -> Router
where
    S: SalesSource + 'static,
    M: MessageSource + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/api/audit", post(run_audit::<S, M>))
        .with_state(auditor)
}
