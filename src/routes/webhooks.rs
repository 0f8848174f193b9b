/// Payment provider webhooks
///
/// Mounted behind `RequireApiKey`; the sender is trusted as a system.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::storage::{Store, UserStore};

pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

#[derive(Deserialize)]
pub struct WebhookData {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct WebhookRequest {
    pub event: String,
    pub data: WebhookData,
}

/// POST /api/polka/webhooks
///
/// Only `user.upgraded` does anything; other events are acknowledged so the
/// provider stops retrying them.
///
/// # Errors
/// - 401: bad or missing API key (handled by middleware)
/// - 404: upgraded user does not exist
pub async fn polka_webhook(
    body: web::Json<WebhookRequest>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    if body.event != USER_UPGRADED_EVENT {
        tracing::debug!(event = %body.event, "Ignoring webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = body.data.user_id;
    if !store.upgrade_user(user_id).await? {
        return Err(AppError::NotFound(format!("user {}", user_id)));
    }

    tracing::info!(user_id = %user_id, "User upgraded");
    Ok(HttpResponse::NoContent().finish())
}
