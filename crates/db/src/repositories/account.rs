//! Account repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use crate::entities::accounts;
use ferrobank_core::currency::is_supported_currency;
use ferrobank_shared::types::PageRequest;

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account not found.
    #[error("account not found: {0}")]
    NotFound(Uuid),

    /// Owner username does not exist.
    #[error("owner '{0}' not found")]
    OwnerNotFound(String),

    /// Currency is outside the supported set.
    #[error("currency '{0}' is not supported")]
    UnsupportedCurrency(String),

    /// Owner already has an account in this currency.
    #[error("owner '{0}' already has a {1} account")]
    DuplicateAccount(String, String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Account repository for CRUD operations.
///
/// Balances are only ever *mutated* by the transfer coordinator inside its
/// unit of work; this repository creates accounts and serves reads.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The currency is not in the supported set
    /// - The owner already has an account in this currency
    /// - The owner username does not exist
    pub async fn create_account(
        &self,
        owner: &str,
        currency: &str,
    ) -> Result<accounts::Model, AccountError> {
        if !is_supported_currency(currency) {
            return Err(AccountError::UnsupportedCurrency(currency.to_string()));
        }

        let account = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner: Set(owner.to_string()),
            balance: Set(0),
            currency: Set(currency.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        account.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AccountError::DuplicateAccount(owner.to_string(), currency.to_string())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                AccountError::OwnerNotFound(owner.to_string())
            }
            _ => AccountError::Database(e),
        })
    }

    /// Gets an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    pub async fn get_account(&self, id: Uuid) -> Result<accounts::Model, AccountError> {
        accounts::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    /// Reads an account's current balance.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    pub async fn balance(&self, id: Uuid) -> Result<i64, AccountError> {
        self.get_account(id).await.map(|account| account.balance)
    }

    /// Lists accounts belonging to an owner, oldest first.
    ///
    /// Returns the page of accounts and the owner's total account count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_owner(
        &self,
        owner: &str,
        page: &PageRequest,
    ) -> Result<(Vec<accounts::Model>, u64), DbErr> {
        let query = accounts::Entity::find().filter(accounts::Column::Owner.eq(owner));

        let total = query.clone().count(&self.db).await?;

        let accounts = query
            .order_by_asc(accounts::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((accounts, total))
    }
}
