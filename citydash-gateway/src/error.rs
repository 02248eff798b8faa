use axum::response::IntoResponse;
use citydash_shard::shaping::PeriodFilterError;
use citydash_shard::ShardError;
use http::StatusCode;
use tracing::warn;

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Shard(#[from] ShardError),
    #[error("Invalid period: {0}")]
    InvalidPeriod(#[from] PeriodFilterError),
    #[error("Missing query parameter '{0}'")]
    MissingParam(&'static str),
    #[error("{0} not found")]
    NotFound(String),
}

impl GatewayError {
    fn status(&self) -> (StatusCode, &'static str) {
        use GatewayError::*;
        match self {
            Shard(e) => match e {
                ShardError::UnknownShard(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_SHARD"),
                ShardError::ShardUnreachable { .. } => {
                    (StatusCode::BAD_GATEWAY, "SHARD_UNREACHABLE")
                }
                ShardError::QueryExecutionFailed { .. } => {
                    (StatusCode::BAD_GATEWAY, "QUERY_FAILED")
                }
                ShardError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "SHARD_TIMEOUT"),
                ShardError::MalformedResult(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                ShardError::PoolError(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "POOL_ERROR")
                }
            },
            InvalidPeriod(_) => (StatusCode::BAD_REQUEST, "INVALID_PERIOD"),
            MissingParam(_) => (StatusCode::BAD_REQUEST, "MISSING_PARAMETER"),
            NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let (code, code_str) = self.status();
        let msg = self.to_string();
        if code.is_server_error() {
            warn!(status = %code, error = %msg, "request failed");
        }
        let body = serde_json::json!({
            "error": { "code": code_str, "message": msg }
        });
        let mut resp = (code, body.to_string()).into_response();
        resp.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        resp
    }
}
