//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};

use crate::entities::users;

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Username already taken.
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    /// Email already registered.
    #[error("email '{0}' is already registered")]
    DuplicateEmail(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new user.
    ///
    /// `hashed_password` must already be an argon2 PHC string; this layer
    /// never sees plaintext passwords.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateUsername` or `DuplicateEmail` when a unique
    /// constraint is violated, `Database` for any other failure.
    pub async fn create(
        &self,
        username: &str,
        hashed_password: &str,
        full_name: &str,
        email: &str,
    ) -> Result<users::Model, UserError> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            username: Set(username.to_string()),
            hashed_password: Set(hashed_password.to_string()),
            full_name: Set(full_name.to_string()),
            email: Set(email.to_string()),
            password_changed_at: Set(now),
            created_at: Set(now),
        };

        user.insert(&self.db).await.map_err(|e| {
            match e.sql_err() {
                // Map the constraint back to a typed duplicate error instead
                // of a bare 500 (the unique index on email is named, the
                // primary key covers username).
                Some(SqlErr::UniqueConstraintViolation(constraint)) => {
                    if constraint.contains("email") {
                        UserError::DuplicateEmail(email.to_string())
                    } else {
                        UserError::DuplicateUsername(username.to_string())
                    }
                }
                _ => UserError::Database(e),
            }
        })
    }

    /// Finds a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(username).one(&self.db).await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}
