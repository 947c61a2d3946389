//! Entry repository for ledger history reads.
//!
//! Entries are append-only and are only ever written by the transfer
//! coordinator; this repository serves the read side.

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::entities::entries;
use ferrobank_shared::types::PageRequest;

/// Entry repository for history queries.
#[derive(Debug, Clone)]
pub struct EntryRepository {
    db: DatabaseConnection,
}

impl EntryRepository {
    /// Creates a new entry repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists ledger entries for an account, newest first.
    ///
    /// Returns the page of entries and the account's total entry count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_account(
        &self,
        account_id: Uuid,
        page: &PageRequest,
    ) -> Result<(Vec<entries::Model>, u64), DbErr> {
        let query = entries::Entity::find().filter(entries::Column::AccountId.eq(account_id));

        let total = query.clone().count(&self.db).await?;

        let entries = query
            .order_by_desc(entries::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((entries, total))
    }
}
