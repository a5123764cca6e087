//! HTTP API server with observability for the bucket service.
//!
//! Provides REST endpoints for buckets and their items, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use domain::{Bucket, BucketRepository, BucketService, Entity, Item};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::buckets::{self, AppState};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R: BucketRepository + 'static>(
    state: Arc<AppState<R>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/buckets",
            get(buckets::list::<R>).post(buckets::create::<R>),
        )
        .route(
            "/buckets/{id}",
            get(buckets::get::<R>)
                .put(buckets::update::<R>)
                .delete(buckets::delete::<R>),
        )
        .route(
            "/buckets/{id}/items",
            get(buckets::list_items::<R>).post(buckets::add_item::<R>),
        )
        .route(
            "/buckets/{id}/items/{item_id}",
            get(buckets::get_item::<R>)
                .put(buckets::update_item::<R>)
                .delete(buckets::remove_item::<R>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a bucket repository.
///
/// Property tables for runtime sort and filter names are built here, once.
pub fn create_default_state<R: BucketRepository>(repository: R) -> Arc<AppState<R>> {
    Arc::new(AppState {
        bucket_service: BucketService::new(repository),
        bucket_properties: Bucket::property_table(),
        item_properties: Item::property_table(),
    })
}
