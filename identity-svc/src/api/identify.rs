//! Identify endpoint
//!
//! POST /identify with `{"email"?: string, "phoneNumber"?: string}` returns
//! the consolidated identity for whatever the caller knows. The same fields
//! are accepted as an `application/x-www-form-urlencoded` body.

use axum::{
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    routing::post,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::identity::{IdentityQuery, IdentityView};
use crate::{ApiError, ApiResult, AppState};

/// Request payload
///
/// Fields stay loosely typed until normalization so that numeric phone
/// numbers and explicit nulls are accepted.
#[derive(Debug, Default, Deserialize)]
pub struct IdentifyRequest {
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default, rename = "phoneNumber")]
    pub phone_number: Option<Value>,
}

/// Form-encoded request payload
#[derive(Debug, Default, Deserialize)]
pub struct IdentifyForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "phoneNumber")]
    pub phone_number: Option<String>,
}

/// Response payload
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentifyResponse {
    pub contact: IdentityView,
}

/// POST /identify handler
///
/// **Errors:**
/// - 400 Bad Request: body does not parse, or neither field has a value
/// - 500 Internal Server Error: store failure (the transaction is rolled back)
pub async fn identify(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<Json<IdentifyResponse>> {
    let query = parse_query(request, &state).await?;
    debug!(
        has_email = query.email().is_some(),
        has_phone = query.phone_number().is_some(),
        "Identify request"
    );

    let contact = state.identity.identify(&query).await?;

    Ok(Json(IdentifyResponse { contact }))
}

/// Decode the body by content type; anything not form-encoded goes
/// through the JSON extractor so its rejection becomes the 400 message.
async fn parse_query(request: Request, state: &AppState) -> ApiResult<IdentityQuery> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    if is_form {
        let Form(form) = Form::<IdentifyForm>::from_request(request, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        return Ok(IdentityQuery::new(
            form.email.as_deref(),
            form.phone_number.as_deref(),
        )?);
    }

    let Json(payload) = Json::<IdentifyRequest>::from_request(request, state)
        .await
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    Ok(IdentityQuery::from_json(
        payload.email.as_ref(),
        payload.phone_number.as_ref(),
    )?)
}

/// Build identify routes
pub fn identify_routes() -> Router<AppState> {
    Router::new().route("/identify", post(identify).fallback(super::not_found))
}
