//! User management service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use shared::{validate_email, validate_password, validate_username, Role, User};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::auth::hash_password;

/// User service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

/// Input for creating a user
#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
    pub role: Option<Role>,
}

/// Input for updating a user. Absent fields are left unchanged;
/// `"role": null` clears the role.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub role: Option<Option<Role>>,
    pub is_active: Option<bool>,
}

// Distinguishes an explicit null from an absent field
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    phone_number: String,
    role: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()
            .map_err(AppError::Internal)?;

        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number: row.phone_number,
            role,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, phone_number, role, is_active, created_at, updated_at";

impl UserService {
    /// Create a new UserService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?
            .try_into()
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?
        .map(User::try_from)
        .transpose()
    }

    /// List all users ordered by username
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY username",
            USER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Create a new user with a hashed password
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<User> {
        validate_username(&input.username).map_err(|m| AppError::validation("username", m))?;
        validate_email(&input.email).map_err(|m| AppError::validation("email", m))?;
        validate_password(&input.password).map_err(|m| AppError::validation("password", m))?;

        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE username = $1 OR email = $2",
        )
        .bind(&input.username)
        .bind(&input.email)
        .fetch_one(&self.db)
        .await?;

        if taken > 0 {
            return Err(AppError::Conflict {
                resource: "user".to_string(),
                message: "Username or email already in use".to_string(),
            });
        }

        let password_hash = hash_password(&input.password)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, email, first_name, last_name, phone_number, role, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.phone_number)
        .bind(input.role.map(|r| r.as_str()))
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(user_id = %row.id, username = %row.username, role = ?row.role, "User created");

        row.try_into()
    }

    /// Update a user's profile, role or active flag
    pub async fn update_user(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        input: UpdateUserInput,
    ) -> AppResult<User> {
        if actor_id == user_id && input.is_active == Some(false) {
            return Err(AppError::ValidationError(
                "You cannot deactivate your own account".to_string(),
            ));
        }
        if let Some(email) = &input.email {
            validate_email(email).map_err(|m| AppError::validation("email", m))?;
        }

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($1, email),
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone_number = COALESCE($4, phone_number),
                role = CASE WHEN $5 THEN $6 ELSE role END,
                is_active = COALESCE($7, is_active)
            WHERE id = $8
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&input.email)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.phone_number)
        .bind(input.role.is_some())
        .bind(input.role.flatten().map(|r| r.as_str()))
        .bind(input.is_active)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        tracing::info!(%user_id, %actor_id, role = ?row.role, "User updated");

        row.try_into()
    }

    /// Deactivate a user. Accounts cannot deactivate themselves.
    pub async fn deactivate_user(&self, actor_id: Uuid, user_id: Uuid) -> AppResult<User> {
        if actor_id == user_id {
            return Err(AppError::ValidationError(
                "You cannot deactivate your own account".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET is_active = false WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        tracing::info!(%user_id, %actor_id, "User deactivated");

        row.try_into()
    }

    /// Insert an account with a pre-hashed password unless the username
    /// already exists. Returns whether a row was inserted.
    pub(crate) async fn insert_if_absent(
        &self,
        username: &str,
        email: &str,
        role: Role,
        password_hash: &str,
    ) -> AppResult<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO users (username, email, role, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(role.as_str())
        .bind(password_hash)
        .execute(&self.db)
        .await?
        .rows_affected();

        Ok(inserted > 0)
    }
}
