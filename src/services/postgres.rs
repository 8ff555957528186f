use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::config::DatabaseSettings;
use crate::core::Decision;
use crate::models::{
    CandidateQuery, Dialog, DialogId, Gender, Message, ProfileChanges, ProfileId, User,
    UserChanges, UserId, UserProfile,
};
use crate::services::store::{ChatStore, ProfileStore, StoreError};

/// Profile columns plus both decision sets aggregated into arrays
const PROFILE_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.age, p.location, p.gender, p.gender_pref,
           p.from_age, p.to_age, p.about_me, p.avatar,
           COALESCE(
               (SELECT array_agg(s.target_id ORDER BY s.target_id)
                FROM profile_skips s WHERE s.profile_id = p.id),
               '{}'::BIGINT[]
           ) AS skip_ids,
           COALESCE(
               (SELECT array_agg(l.target_id ORDER BY l.target_id)
                FROM profile_likes l WHERE l.profile_id = p.id),
               '{}'::BIGINT[]
           ) AS like_ids
    FROM user_profiles p
"#;

/// Same predicate as `core::filters::matches_candidate_query`
const CANDIDATE_FILTER: &str = r#"
    WHERE p.age BETWEEN $1 AND $2
      AND p.gender = $3
      AND p.id <> $4
      AND NOT (p.id = ANY($5))
"#;

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, date_joined";

/// PostgreSQL-backed store for profiles, decisions and chat history
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run the embedded migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!(
            "Connecting to PostgreSQL (max: {}, min: {} connections)",
            settings.max_connections,
            settings.min_connections
        );

        Self::new(
            &settings.url,
            settings.max_connections,
            settings.min_connections,
            Duration::from_secs(settings.acquire_timeout_secs),
            Duration::from_secs(settings.idle_timeout_secs),
        )
        .await
    }
}

fn age_column(row: &PgRow, column: &str) -> Result<u8, StoreError> {
    let raw: i16 = row.try_get(column)?;
    u8::try_from(raw).map_err(|_| StoreError::Corrupt(format!("{} out of range: {}", column, raw)))
}

fn gender_column(row: &PgRow, column: &str) -> Result<Gender, StoreError> {
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e: crate::models::domain::UnknownGender| StoreError::Corrupt(e.to_string()))
}

fn profile_from_row(row: &PgRow) -> Result<UserProfile, StoreError> {
    let skip_ids: Vec<i64> = row.try_get("skip_ids")?;
    let like_ids: Vec<i64> = row.try_get("like_ids")?;

    Ok(UserProfile {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        age: age_column(row, "age")?,
        location: row.try_get("location")?,
        gender: gender_column(row, "gender")?,
        gender_pref: gender_column(row, "gender_pref")?,
        from_age: age_column(row, "from_age")?,
        to_age: age_column(row, "to_age")?,
        about_me: row.try_get("about_me")?,
        avatar: row.try_get("avatar")?,
        skip_ids: skip_ids.into_iter().collect(),
        like_ids: like_ids.into_iter().collect(),
    })
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        password_hash: row.try_get("password_hash")?,
        date_joined: row.try_get("date_joined")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;

        user_from_row(&row)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);

        let row = sqlx::query(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user '{}'", username)))?;

        user_from_row(&row)
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<User, StoreError> {
        let query = format!(
            r#"
            UPDATE users
            SET username = $2, email = $3, first_name = $4, last_name = $5, password_hash = $6
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let result = sqlx::query(&query)
            .bind(id)
            .bind(&changes.username)
            .bind(&changes.email)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(&changes.password_hash)
            .fetch_optional(&self.pool)
            .await;

        let row = match result {
            Ok(Some(row)) => row,
            Ok(None) => return Err(StoreError::NotFound(format!("user {}", id))),
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::Conflict(format!(
                    "username '{}' is taken",
                    changes.username
                )))
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("Updated user {}", id);
        user_from_row(&row)
    }

    async fn get_profile(&self, id: ProfileId) -> Result<UserProfile, StoreError> {
        let query = format!("{} WHERE p.id = $1", PROFILE_SELECT);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))?;

        profile_from_row(&row)
    }

    async fn get_profile_for_user(&self, user_id: UserId) -> Result<UserProfile, StoreError> {
        let query = format!("{} WHERE p.user_id = $1", PROFILE_SELECT);

        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("profile of user {}", user_id)))?;

        profile_from_row(&row)
    }

    async fn get_profiles(&self, ids: &[ProfileId]) -> Result<Vec<UserProfile>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("{} WHERE p.id = ANY($1) ORDER BY p.id", PROFILE_SELECT);

        let rows = sqlx::query(&query)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(profile_from_row).collect()
    }

    async fn update_profile(
        &self,
        id: ProfileId,
        changes: ProfileChanges,
    ) -> Result<UserProfile, StoreError> {
        let query = r#"
            UPDATE user_profiles
            SET age = $2, location = $3, gender = $4, gender_pref = $5,
                from_age = $6, to_age = $7, about_me = $8, avatar = $9
            WHERE id = $1
        "#;

        let result = sqlx::query(query)
            .bind(id)
            .bind(i16::from(changes.age))
            .bind(&changes.location)
            .bind(changes.gender.as_str())
            .bind(changes.gender_pref.as_str())
            .bind(i16::from(changes.from_age))
            .bind(i16::from(changes.to_age))
            .bind(&changes.about_me)
            .bind(&changes.avatar)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("profile {}", id)));
        }

        tracing::debug!("Updated profile {}", id);
        self.get_profile(id).await
    }

    async fn count_candidates(&self, query: &CandidateQuery) -> Result<u64, StoreError> {
        let sql = format!(
            "SELECT COUNT(*) AS total FROM user_profiles p {}",
            CANDIDATE_FILTER
        );

        let row = sqlx::query(&sql)
            .bind(i16::from(query.min_age))
            .bind(i16::from(query.max_age))
            .bind(query.gender.as_str())
            .bind(query.viewer_id)
            .bind(query.exclude_ids_vec())
            .fetch_one(&self.pool)
            .await?;

        let total: i64 = row.try_get("total")?;
        Ok(total.max(0) as u64)
    }

    async fn fetch_candidates(
        &self,
        query: &CandidateQuery,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<UserProfile>, StoreError> {
        let sql = format!(
            "{} {} ORDER BY p.id LIMIT $6 OFFSET $7",
            PROFILE_SELECT, CANDIDATE_FILTER
        );

        let rows = sqlx::query(&sql)
            .bind(i16::from(query.min_age))
            .bind(i16::from(query.max_age))
            .bind(query.gender.as_str())
            .bind(query.viewer_id)
            .bind(query.exclude_ids_vec())
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(profile_from_row).collect()
    }

    async fn record_decision(
        &self,
        profile_id: ProfileId,
        target_id: ProfileId,
        decision: Decision,
    ) -> Result<(), StoreError> {
        let table = match decision {
            Decision::Like => "profile_likes",
            Decision::Skip => "profile_skips",
        };
        let query = format!(
            r#"
            INSERT INTO {} (profile_id, target_id, decided_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (profile_id, target_id) DO NOTHING
            "#,
            table
        );

        let result = sqlx::query(&query)
            .bind(profile_id)
            .bind(target_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                tracing::debug!(
                    "Recorded {}: {} -> {} ({} new)",
                    decision,
                    profile_id,
                    target_id,
                    done.rows_affected()
                );
                Ok(())
            }
            Err(e) if is_foreign_key_violation(&e) => Err(StoreError::NotFound(format!(
                "profile {} or {}",
                profile_id, target_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn liked_profiles(&self, profile_id: ProfileId) -> Result<Vec<UserProfile>, StoreError> {
        let query = format!(
            r#"
            {}
            JOIN profile_likes mine ON mine.target_id = p.id
            WHERE mine.profile_id = $1
            ORDER BY p.id
            "#,
            PROFILE_SELECT
        );

        let rows = sqlx::query(&query)
            .bind(profile_id)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Profile {} has liked {} profiles", profile_id, rows.len());

        rows.iter().map(profile_from_row).collect()
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl ChatStore for PostgresStore {
    async fn get_dialog(&self, id: DialogId) -> Result<Dialog, StoreError> {
        let row = sqlx::query("SELECT id, name, created_at FROM dialogs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("dialog {}", id)))?;

        Ok(Dialog {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn recent_messages(
        &self,
        dialog_id: DialogId,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        // Distinguish an unknown dialog from an empty one
        self.get_dialog(dialog_id).await?;

        let query = r#"
            SELECT m.id, m.dialog_id, m.sender_id, u.username AS sender_username,
                   m.text, m.sent_at
            FROM messages m
            JOIN users u ON u.id = m.sender_id
            WHERE m.dialog_id = $1
            ORDER BY m.sent_at DESC, m.id DESC
            LIMIT $2
        "#;

        let rows = sqlx::query(query)
            .bind(dialog_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<Message, StoreError> {
                Ok(Message {
                    id: row.try_get("id")?,
                    dialog_id: row.try_get("dialog_id")?,
                    sender_id: row.try_get("sender_id")?,
                    sender_username: row.try_get("sender_username")?,
                    text: row.try_get("text")?,
                    timestamp: row.try_get("sent_at")?,
                })
            })
            .collect()
    }
}
