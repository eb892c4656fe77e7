//! Checkout sessions for paid plans.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::payments::CheckoutSession;
use crate::server::error::ApiError;
use crate::server::extract::ApiJson;
use crate::server::state::AppState;
use crate::Error;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Lemon Squeezy variant id.
    pub product_id: String,
    pub email: String,
}

pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Json<CheckoutSession>, ApiError> {
    let product_id = request.product_id.trim();
    if product_id.is_empty() {
        return Err(Error::validation("Product id cannot be empty", "product_id").into());
    }
    let email = request.email.trim();
    if !email.contains('@') {
        return Err(Error::validation_with_value("Invalid email address", "email", email).into());
    }

    let session = state.checkout.create_checkout(product_id, email).await?;
    Ok(Json(session))
}
