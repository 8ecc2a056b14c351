// ABOUTME: Core data models for the Mercado shopping list API
// ABOUTME: Defines User, ShoppingList, ListItem, StoreItem and related enums
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! # Data Models
//!
//! Core data structures shared by storage, route handlers, and price
//! providers.
//!
//! ## Design Principles
//!
//! - **Serializable**: All models support JSON serialization for the REST API
//! - **Type Safe**: Status and availability values are enums, not free strings

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// A registered user, keyed internally by UUID and externally by the
/// Google-issued `sub` identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable local identifier
    pub id: Uuid,
    /// Google-issued subject identifier (the upsert key)
    pub google_sub: String,
    /// Email address from the Google profile
    pub email: Option<String>,
    /// Display name from the Google profile
    pub name: Option<String>,
    /// Avatar URL from the Google profile
    pub picture: Option<String>,
    /// Assigned roles, defaults to `["user"]`
    pub roles: Vec<String>,
    /// When this user was first created
    pub created_at: DateTime<Utc>,
    /// When this user's profile was last refreshed
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user from a Google profile
    #[must_use]
    pub fn new(
        google_sub: String,
        email: Option<String>,
        name: Option<String>,
        picture: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            google_sub,
            email,
            name,
            picture,
            roles: vec!["user".to_owned()],
            created_at: now,
            updated_at: now,
        }
    }
}

/// Purchase status of a single list item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Not yet bought
    Pending,
    /// Bought
    Bought,
    /// Deliberately skipped
    Skipped,
}

impl Default for ItemStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Bought => write!(f, "bought"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

impl FromStr for ItemStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "bought" => Ok(Self::Bought),
            "skipped" => Ok(Self::Skipped),
            other => Err(AppError::invalid_input(format!(
                "unknown item status: {other}"
            ))),
        }
    }
}

/// A single entry on a shopping list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItem {
    /// Item identifier, unique within the list
    pub id: Uuid,
    /// Item name
    pub name: String,
    /// Quantity, must be positive
    pub qty: f64,
    /// Unit of measure
    pub unit: String,
    /// Free-form notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Purchase status
    pub status: ItemStatus,
    /// Category hint for grouping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Preferred store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_hint: Option<String>,
    /// Expected price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// A user-owned shopping list with embedded items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingList {
    /// List identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// List title
    pub title: String,
    /// Items on the list
    pub items: Vec<ListItem>,
    /// When this list was created
    pub created_at: DateTime<Utc>,
    /// When this list or its items last changed
    pub updated_at: DateTime<Utc>,
}

/// Default title for new lists
pub const DEFAULT_LIST_TITLE: &str = "Shopping List";

/// Stock availability reported by a price provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// In stock
    InStock,
    /// Out of stock
    OutOfStock,
    /// Limited availability
    Limited,
}

/// A priced item at a specific store, as returned by a price provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreItem {
    /// Product name
    pub name: String,
    /// Price in local currency
    pub price: f64,
    /// Unit the price applies to
    pub unit: String,
    /// Store name
    pub store: String,
    /// Stock availability
    pub availability: Availability,
}
