// ABOUTME: Shopping list CRUD route handlers, all JWT-authenticated
// ABOUTME: Lists, embedded items, and complementary-item suggestions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! Shopping list routes
//!
//! All handlers require a bearer token and operate only on lists owned by
//! the authenticated user.

use super::ServerResources;
use crate::errors::AppError;
use crate::models::{ItemStatus, ListItem, ShoppingList, DEFAULT_LIST_TITLE};
use crate::suggestions::get_suggestions;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Request to create a list
#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    /// List title, defaults to "Shopping List"
    #[serde(default)]
    pub title: Option<String>,
}

/// Request to add an item to a list
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Item name
    pub name: String,
    /// Quantity, defaults to 1
    #[serde(default)]
    pub qty: Option<f64>,
    /// Unit, defaults to "unit"
    #[serde(default)]
    pub unit: Option<String>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Category hint
    #[serde(default)]
    pub category: Option<String>,
    /// Preferred store
    #[serde(default)]
    pub store_hint: Option<String>,
    /// Expected price
    #[serde(default)]
    pub price: Option<f64>,
}

/// Partial update for a list item
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New quantity
    #[serde(default)]
    pub qty: Option<f64>,
    /// New unit
    #[serde(default)]
    pub unit: Option<String>,
    /// New notes
    #[serde(default)]
    pub notes: Option<String>,
    /// New status
    #[serde(default)]
    pub status: Option<ItemStatus>,
    /// New category
    #[serde(default)]
    pub category: Option<String>,
    /// New store hint
    #[serde(default)]
    pub store_hint: Option<String>,
    /// New price
    #[serde(default)]
    pub price: Option<f64>,
}

/// Suggestions for a list
#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestResponse {
    /// Suggested complementary items
    pub suggestions: Vec<String>,
}

/// List routes implementation
pub struct ListRoutes;

impl ListRoutes {
    /// Create all list routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/lists", get(Self::list_lists))
            .route("/lists", post(Self::create_list))
            .route("/lists/:list_id", get(Self::get_list))
            .route("/lists/:list_id/items", post(Self::add_item))
            .route("/lists/:list_id/items/:item_id", patch(Self::update_item))
            .route("/lists/:list_id/items/:item_id", delete(Self::delete_item))
            .route("/lists/:list_id/suggest", get(Self::suggest))
            .with_state(resources)
    }

    /// GET /lists
    async fn list_lists(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<ShoppingList>>, AppError> {
        let user = resources.auth_manager.authenticate_headers(&headers)?;
        let lists = resources
            .database
            .get_lists(user.user_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;
        Ok(Json(lists))
    }

    /// POST /lists
    async fn create_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreateListRequest>,
    ) -> Result<Response, AppError> {
        let user = resources.auth_manager.authenticate_headers(&headers)?;

        let title = body
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_LIST_TITLE.to_owned());

        let list = resources
            .database
            .create_list(user.user_id, title)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        Ok((StatusCode::CREATED, Json(list)).into_response())
    }

    /// GET /lists/:list_id
    async fn get_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(list_id): Path<Uuid>,
    ) -> Result<Json<ShoppingList>, AppError> {
        let user = resources.auth_manager.authenticate_headers(&headers)?;
        let list = Self::fetch_owned_list(&resources, user.user_id, list_id).await?;
        Ok(Json(list))
    }

    /// POST /lists/:list_id/items
    async fn add_item(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(list_id): Path<Uuid>,
        Json(body): Json<AddItemRequest>,
    ) -> Result<Response, AppError> {
        let user = resources.auth_manager.authenticate_headers(&headers)?;

        if body.name.is_empty() {
            return Err(AppError::invalid_input("name is required"));
        }
        let qty = body.qty.unwrap_or(1.0);
        if qty <= 0.0 {
            return Err(AppError::invalid_input("qty must be positive"));
        }

        let mut list = Self::fetch_owned_list(&resources, user.user_id, list_id).await?;

        list.items.push(ListItem {
            id: Uuid::new_v4(),
            name: body.name,
            qty,
            unit: body.unit.unwrap_or_else(|| "unit".to_owned()),
            notes: body.notes,
            status: ItemStatus::Pending,
            category: body.category,
            store_hint: body.store_hint,
            price: body.price,
        });

        Self::save_items(&resources, &mut list).await?;
        Ok((StatusCode::CREATED, Json(list)).into_response())
    }

    /// PATCH /lists/:list_id/items/:item_id
    async fn update_item(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((list_id, item_id)): Path<(Uuid, Uuid)>,
        Json(body): Json<UpdateItemRequest>,
    ) -> Result<Json<ShoppingList>, AppError> {
        let user = resources.auth_manager.authenticate_headers(&headers)?;

        if let Some(qty) = body.qty {
            if qty <= 0.0 {
                return Err(AppError::invalid_input("qty must be positive"));
            }
        }

        let mut list = Self::fetch_owned_list(&resources, user.user_id, list_id).await?;

        let item = list
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| AppError::not_found("Item"))?;

        if let Some(name) = body.name {
            item.name = name;
        }
        if let Some(qty) = body.qty {
            item.qty = qty;
        }
        if let Some(unit) = body.unit {
            item.unit = unit;
        }
        if let Some(notes) = body.notes {
            item.notes = Some(notes);
        }
        if let Some(status) = body.status {
            item.status = status;
        }
        if let Some(category) = body.category {
            item.category = Some(category);
        }
        if let Some(store_hint) = body.store_hint {
            item.store_hint = Some(store_hint);
        }
        if let Some(price) = body.price {
            item.price = Some(price);
        }

        Self::save_items(&resources, &mut list).await?;
        Ok(Json(list))
    }

    /// DELETE /lists/:list_id/items/:item_id
    async fn delete_item(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((list_id, item_id)): Path<(Uuid, Uuid)>,
    ) -> Result<Json<ShoppingList>, AppError> {
        let user = resources.auth_manager.authenticate_headers(&headers)?;
        let mut list = Self::fetch_owned_list(&resources, user.user_id, list_id).await?;

        let position = list
            .items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| AppError::not_found("Item"))?;
        list.items.remove(position);

        Self::save_items(&resources, &mut list).await?;
        Ok(Json(list))
    }

    /// GET /lists/:list_id/suggest
    async fn suggest(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(list_id): Path<Uuid>,
    ) -> Result<Json<SuggestResponse>, AppError> {
        let user = resources.auth_manager.authenticate_headers(&headers)?;
        let list = Self::fetch_owned_list(&resources, user.user_id, list_id).await?;

        let names: Vec<String> = list.items.iter().map(|i| i.name.clone()).collect();
        Ok(Json(SuggestResponse {
            suggestions: get_suggestions(&names),
        }))
    }

    /// Fetch a list, scoped to the authenticated owner; 404 for anything else
    async fn fetch_owned_list(
        resources: &Arc<ServerResources>,
        user_id: Uuid,
        list_id: Uuid,
    ) -> Result<ShoppingList, AppError> {
        resources
            .database
            .get_list(user_id, list_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .ok_or_else(|| AppError::not_found("List"))
    }

    /// Persist mutated items and keep the in-memory timestamp in step
    async fn save_items(
        resources: &Arc<ServerResources>,
        list: &mut ShoppingList,
    ) -> Result<(), AppError> {
        resources
            .database
            .update_list_items(list.id, &list.items)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;
        list.updated_at = chrono::Utc::now();
        Ok(())
    }
}
