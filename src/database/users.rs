// ABOUTME: User record persistence and Google identity upsert
// ABOUTME: Idempotent find-or-create keyed by the Google-issued subject identifier
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

use super::Database;
use crate::google::GoogleProfile;
use crate::models::User;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the users table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                google_sub TEXT UNIQUE NOT NULL,
                email TEXT,
                name TEXT,
                picture TEXT,
                roles TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_google_sub ON users(google_sub)")
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Idempotent identity upsert keyed by the Google `sub`: creates the
    /// user on first sign-in, refreshes profile fields on every later one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn find_or_create_google_user(&self, profile: &GoogleProfile) -> Result<User> {
        let candidate = User::new(
            profile.sub.clone(),
            profile.email.clone(),
            profile.name.clone(),
            profile.picture.clone(),
        );
        let roles_json = serde_json::to_string(&candidate.roles)?;

        // Single atomic upsert so concurrent sign-ins for the same subject
        // cannot race a check-then-insert
        sqlx::query(
            r"
            INSERT INTO users (id, google_sub, email, name, picture, roles, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT(google_sub) DO UPDATE SET
                email = excluded.email,
                name = excluded.name,
                picture = excluded.picture,
                updated_at = excluded.updated_at
            ",
        )
        .bind(candidate.id.to_string())
        .bind(&candidate.google_sub)
        .bind(&candidate.email)
        .bind(&candidate.name)
        .bind(&candidate.picture)
        .bind(&roles_json)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .execute(self.pool())
        .await?;

        self.get_user_by_google_sub(&profile.sub)
            .await?
            .ok_or_else(|| anyhow!("User upsert did not persist for subject"))
    }

    /// Look up a user by internal id
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(user_id.to_string())
            .fetch_optional(self.pool())
            .await?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    /// Look up a user by Google subject identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_user_by_google_sub(&self, google_sub: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE google_sub = $1")
            .bind(google_sub)
            .fetch_optional(self.pool())
            .await?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id: String = row.get("id");
        let google_sub: String = row.get("google_sub");
        let email: Option<String> = row.get("email");
        let name: Option<String> = row.get("name");
        let picture: Option<String> = row.get("picture");
        let roles_json: String = row.get("roles");
        let created_at: DateTime<Utc> = row.get("created_at");
        let updated_at: DateTime<Utc> = row.get("updated_at");

        Ok(User {
            id: Uuid::parse_str(&id).context("Invalid user id in database")?,
            google_sub,
            email,
            name,
            picture,
            roles: serde_json::from_str(&roles_json).context("Invalid roles in database")?,
            created_at,
            updated_at,
        })
    }
}
