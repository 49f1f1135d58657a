//! HTTP surface for the admin catalog and the payment redirect.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::catalog::{NewProduct, ProductEdit};
use crate::domain::aggregates::{CommittedImage, PendingImage, ProductAggregate};
use crate::domain::events::CatalogEvent;
use crate::media::{upload_pending, PRODUCT_IMAGES_FOLDER};
use crate::payments::{self, CallbackOutcome, PaymentError, PaymentOrder, VnPayConfig};
use crate::{Catalog, CatalogError, ProductDeletion, SavedProduct, VariantDeletion};

type ApiResult<T> = Result<T, (StatusCode, String)>;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub nats: Option<async_nats::Client>,
    pub vnpay: Option<VnPayConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront-catalog"})) }))
        .route("/api/v1/admin/images", post(upload_images))
        .route("/api/v1/admin/products", post(create_product))
        .route("/api/v1/admin/products/:id", get(get_product).put(edit_product).delete(delete_product))
        .route("/api/v1/admin/products/:id/variants/:variant_id", delete(delete_variant))
        .route("/api/v1/payments/vnpay/url", post(payment_url))
        .route("/api/v1/payments/vnpay/return", get(payment_return))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

fn error_response(e: CatalogError) -> (StatusCode, String) {
    let status = match &e {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CatalogError::Upload(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

/// Publishes to `catalog.<event>` when NATS is configured. Failures are logged.
async fn publish(s: &AppState, event: CatalogEvent) {
    let Some(nats) = &s.nats else { return };
    let payload = match serde_json::to_vec(&event) {
        Ok(p) => p,
        Err(e) => { warn!(error = %e, "Failed to encode event"); return; }
    };
    if let Err(e) = nats.publish(format!("catalog.{}", event.name()), Bytes::from(payload)).await {
        warn!(event = event.name(), product_id = event.product_id(), error = %e, "Failed to publish event");
    }
}

/// Multipart upload. Every part with a filename is a pending image; an
/// optional `current` part carries the JSON list of already committed images.
async fn upload_images(State(s): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<Vec<CommittedImage>>> {
    let bad_request = |e: String| (StatusCode::BAD_REQUEST, e);
    let mut current: Vec<CommittedImage> = Vec::new();
    let mut pending = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| bad_request(format!("Invalid multipart request: {e}")))? {
        if field.name() == Some("current") {
            let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
            current = serde_json::from_str(&text).map_err(|e| bad_request(format!("Invalid current images: {e}")))?;
            continue;
        }
        let Some(name) = field.file_name().map(str::to_string) else { continue };
        let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
        let data = field.bytes().await.map_err(|e| bad_request(format!("Multipart error: {e}")))?;
        pending.push(PendingImage::new(name, content_type, data));
    }

    let images = upload_pending(s.catalog.images().as_ref(), PRODUCT_IMAGES_FOLDER, current, pending).await.map_err(error_response)?;
    Ok(Json(images))
}

async fn create_product(State(s): State<AppState>, Json(r): Json<NewProduct>) -> ApiResult<(StatusCode, Json<SavedProduct>)> {
    let saved = s.catalog.create_product(r).await.map_err(error_response)?;
    publish(&s, saved.created_event()).await;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ProductAggregate>> {
    s.catalog.fetch_product(&id).await.map(Json).map_err(error_response)
}

async fn edit_product(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<ProductEdit>) -> ApiResult<Json<SavedProduct>> {
    let saved = s.catalog.edit_product(&id, r).await.map_err(error_response)?;
    publish(&s, saved.updated_event()).await;
    Ok(Json(saved))
}

async fn delete_product(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ProductDeletion>> {
    let deletion = s.catalog.delete_product(&id).await.map_err(error_response)?;
    publish(&s, CatalogEvent::from(&deletion)).await;
    Ok(Json(deletion))
}

async fn delete_variant(State(s): State<AppState>, Path((id, variant_id)): Path<(String, String)>) -> ApiResult<Json<VariantDeletion>> {
    let outcome = s.catalog.delete_variant(&id, &variant_id).await.map_err(error_response)?;
    publish(&s, CatalogEvent::from(&outcome)).await;
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUrlResponse { pub payment_url: String }

fn vnpay(s: &AppState) -> ApiResult<&VnPayConfig> {
    s.vnpay.as_ref().ok_or((StatusCode::SERVICE_UNAVAILABLE, "Payments are not configured".to_string()))
}

async fn payment_url(State(s): State<AppState>, Json(order): Json<PaymentOrder>) -> ApiResult<Json<PaymentUrlResponse>> {
    let config = vnpay(&s)?;
    if order.amount == 0 {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "amount must be positive".to_string()));
    }
    let payment_url = payments::build_payment_url(config, &order, Utc::now()).map_err(|e| match e {
        PaymentError::AmountOutOfRange(_) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        PaymentError::InvalidKey => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    })?;
    Ok(Json(PaymentUrlResponse { payment_url }))
}

async fn payment_return(State(s): State<AppState>, Query(params): Query<BTreeMap<String, String>>) -> ApiResult<(StatusCode, Json<CallbackOutcome>)> {
    let config = vnpay(&s)?;
    let outcome = payments::verify_callback(config, &params).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let status = match outcome {
        CallbackOutcome::InvalidSignature => {
            warn!(order_id = params.get("vnp_TxnRef").map(String::as_str).unwrap_or_default(), "Payment callback with a bad signature");
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}
