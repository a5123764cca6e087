//! Bucket and item CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{BucketId, ItemId};
use domain::{
    AddItem, Bucket, BucketQuery, BucketRepository, BucketService, CreateBucket, Item,
    PropertyTable, RemoveItem, Specification, UpdateBucket, UpdateItem, specs,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<R: BucketRepository> {
    pub bucket_service: BucketService<R>,
    pub bucket_properties: PropertyTable<Bucket>,
    pub item_properties: PropertyTable<Item>,
}

// -- Request types --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BucketRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Query string for `GET /buckets`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListBucketsParams {
    /// Comma-separated property names, `-` prefix for descending.
    pub sort: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub full: Option<bool>,
    pub empty: Option<bool>,
    pub min_size: Option<u32>,
    pub max_size: Option<u32>,
    pub min_available: Option<u32>,
    pub max_available: Option<u32>,
    pub min_items: Option<u32>,
    pub max_items: Option<u32>,
}

impl ListBucketsParams {
    /// Builds the filter; no filter parameters means every bucket.
    pub fn specification(&self) -> Specification<Bucket> {
        let flag = |set: Option<bool>, spec: fn() -> Specification<Bucket>| {
            set.map(|wanted| if wanted { spec() } else { spec().not() })
        };
        let bound = |n: Option<u32>, spec: fn(u32) -> Specification<Bucket>| n.map(spec);

        let parts: Vec<_> = [
            flag(self.full, specs::is_full),
            flag(self.empty, specs::is_empty),
            bound(self.min_size, specs::size_at_least),
            bound(self.max_size, specs::size_at_most),
            bound(self.min_available, specs::available_at_least),
            bound(self.max_available, specs::available_at_most),
            bound(self.min_items, specs::occupied_at_least),
            bound(self.max_items, specs::occupied_at_most),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            specs::matches_all()
        } else {
            Specification::all(parts)
        }
    }
}

/// Query string for `GET /buckets/{id}/items`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListItemsParams {
    pub sort: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct BucketResponse {
    pub id: String,
    pub version: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub size: u32,
    pub item_count: usize,
    pub available: u32,
    pub is_full: bool,
    pub items: Vec<ItemResponse>,
}

impl From<&Bucket> for BucketResponse {
    fn from(bucket: &Bucket) -> Self {
        Self {
            id: bucket.id().map(|id| id.to_string()).unwrap_or_default(),
            version: bucket.version().as_i64(),
            name: bucket.name().map(String::from),
            description: bucket.description().map(String::from),
            size: bucket.size(),
            item_count: bucket.item_count(),
            available: bucket.available(),
            is_full: bucket.is_full(),
            items: bucket.items().iter().map(ItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<&Item> for ItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id().to_string(),
            name: item.name().map(String::from),
            description: item.description().map(String::from),
        }
    }
}

// -- Bucket handlers --

/// POST /buckets: create a bucket, with the default size unless one is given.
#[tracing::instrument(skip(state))]
pub async fn create<R: BucketRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<BucketRequest>,
) -> Result<(StatusCode, Json<BucketResponse>), ApiError> {
    let mut cmd = CreateBucket::new(req.name, req.description);
    cmd.size = req.size;

    let bucket = state.bucket_service.create_bucket(cmd).await?;
    Ok((StatusCode::CREATED, Json(BucketResponse::from(&bucket))))
}

/// GET /buckets: filter, sort and page through buckets.
#[tracing::instrument(skip(state))]
pub async fn list<R: BucketRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Query(params): Query<ListBucketsParams>,
) -> Result<Json<Vec<BucketResponse>>, ApiError> {
    let mut query = BucketQuery::new(params.specification());
    if let Some(sort) = &params.sort {
        query = query.sort(state.bucket_properties.parse_sort(sort)?);
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }
    if let Some(offset) = params.offset {
        query = query.offset(offset);
    }

    let buckets = state.bucket_service.list_buckets(&query).await?;
    Ok(Json(buckets.iter().map(BucketResponse::from).collect()))
}

/// GET /buckets/{id}: load a bucket with its items.
#[tracing::instrument(skip(state))]
pub async fn get<R: BucketRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<Json<BucketResponse>, ApiError> {
    let bucket_id = parse_bucket_id(&id)?;
    let bucket = state
        .bucket_service
        .get_bucket(bucket_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Bucket {id} not found")))?;

    Ok(Json(BucketResponse::from(&bucket)))
}

/// PUT /buckets/{id}: replace name and description, resizing if a size is given.
#[tracing::instrument(skip(state))]
pub async fn update<R: BucketRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    Json(req): Json<BucketRequest>,
) -> Result<Json<BucketResponse>, ApiError> {
    let mut cmd = UpdateBucket::new(parse_bucket_id(&id)?, req.name, req.description);
    cmd.size = req.size;

    let bucket = state.bucket_service.update_bucket(cmd).await?;
    Ok(Json(BucketResponse::from(&bucket)))
}

/// DELETE /buckets/{id}: delete a bucket and its items.
#[tracing::instrument(skip(state))]
pub async fn delete<R: BucketRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .bucket_service
        .delete_bucket(parse_bucket_id(&id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Item handlers --

/// POST /buckets/{id}/items: create an item in a bucket with spare capacity.
#[tracing::instrument(skip(state))]
pub async fn add_item<R: BucketRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    Json(req): Json<ItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let cmd = AddItem::new(parse_bucket_id(&id)?, req.name, req.description);
    let item = state.bucket_service.add_item(cmd).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse::from(&item))))
}

/// GET /buckets/{id}/items: list a bucket's items.
#[tracing::instrument(skip(state))]
pub async fn list_items<R: BucketRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    Query(params): Query<ListItemsParams>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let sort = params
        .sort
        .as_deref()
        .map(|expr| state.item_properties.parse_sort(expr))
        .transpose()?;

    let items = state
        .bucket_service
        .list_items(parse_bucket_id(&id)?, sort.as_ref())
        .await?;
    Ok(Json(items.iter().map(ItemResponse::from).collect()))
}

/// GET /buckets/{id}/items/{item_id}: load one item.
#[tracing::instrument(skip(state))]
pub async fn get_item<R: BucketRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = state
        .bucket_service
        .get_item(parse_bucket_id(&id)?, parse_item_id(&item_id)?)
        .await?;
    Ok(Json(ItemResponse::from(&item)))
}

/// PUT /buckets/{id}/items/{item_id}: replace an item's name and description.
#[tracing::instrument(skip(state))]
pub async fn update_item<R: BucketRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path((id, item_id)): Path<(String, String)>,
    Json(req): Json<ItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    let cmd = UpdateItem::new(
        parse_bucket_id(&id)?,
        parse_item_id(&item_id)?,
        req.name,
        req.description,
    );
    let item = state.bucket_service.update_item(cmd).await?;
    Ok(Json(ItemResponse::from(&item)))
}

/// DELETE /buckets/{id}/items/{item_id}: take an item out of its bucket.
#[tracing::instrument(skip(state))]
pub async fn remove_item<R: BucketRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let cmd = RemoveItem::new(parse_bucket_id(&id)?, parse_item_id(&item_id)?);
    state.bucket_service.remove_item(cmd).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_uuid(kind: &str, id: &str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(id).map_err(|e| ApiError::BadRequest(format!("Invalid {kind} ID: {e}")))
}

fn parse_bucket_id(id: &str) -> Result<BucketId, ApiError> {
    parse_uuid("bucket", id).map(BucketId::from)
}

fn parse_item_id(id: &str) -> Result<ItemId, ApiError> {
    parse_uuid("item", id).map(ItemId::from)
}
