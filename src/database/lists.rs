// ABOUTME: Shopping list persistence with items embedded as a JSON column
// ABOUTME: All operations are scoped to the owning user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

use super::Database;
use crate::models::{ListItem, ShoppingList};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the lists table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_lists(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS lists (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                items TEXT NOT NULL DEFAULT '[]',
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_lists_user_id ON lists(user_id)")
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Create an empty list for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create_list(&self, user_id: Uuid, title: String) -> Result<ShoppingList> {
        let now = Utc::now();
        let list = ShoppingList {
            id: Uuid::new_v4(),
            user_id,
            title,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO lists (id, user_id, title, items, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(list.id.to_string())
        .bind(list.user_id.to_string())
        .bind(&list.title)
        .bind(serde_json::to_string(&list.items)?)
        .bind(list.created_at)
        .bind(list.updated_at)
        .execute(self.pool())
        .await?;

        Ok(list)
    }

    /// Fetch all lists owned by a user, most recently updated first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_lists(&self, user_id: Uuid) -> Result<Vec<ShoppingList>> {
        let rows = sqlx::query("SELECT * FROM lists WHERE user_id = $1 ORDER BY updated_at DESC")
            .bind(user_id.to_string())
            .fetch_all(self.pool())
            .await?;

        rows.iter().map(Self::row_to_list).collect()
    }

    /// Fetch one list by id, scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_list(&self, user_id: Uuid, list_id: Uuid) -> Result<Option<ShoppingList>> {
        let row = sqlx::query("SELECT * FROM lists WHERE id = $1 AND user_id = $2")
            .bind(list_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(self.pool())
            .await?;

        row.as_ref().map(Self::row_to_list).transpose()
    }

    /// Replace a list's items and bump its update timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn update_list_items(&self, list_id: Uuid, items: &[ListItem]) -> Result<()> {
        sqlx::query("UPDATE lists SET items = $2, updated_at = $3 WHERE id = $1")
            .bind(list_id.to_string())
            .bind(serde_json::to_string(items)?)
            .bind(Utc::now())
            .execute(self.pool())
            .await?;

        Ok(())
    }

    fn row_to_list(row: &sqlx::sqlite::SqliteRow) -> Result<ShoppingList> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let title: String = row.get("title");
        let items_json: String = row.get("items");
        let created_at: DateTime<Utc> = row.get("created_at");
        let updated_at: DateTime<Utc> = row.get("updated_at");

        Ok(ShoppingList {
            id: Uuid::parse_str(&id).context("Invalid list id in database")?,
            user_id: Uuid::parse_str(&user_id).context("Invalid user id in database")?,
            title,
            items: serde_json::from_str(&items_json).context("Invalid items in database")?,
            created_at,
            updated_at,
        })
    }
}
