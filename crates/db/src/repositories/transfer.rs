//! Transfer transaction coordinator.
//!
//! Moves funds between two accounts as one atomic unit of work: a debit
//! entry, a credit entry, both balance updates, and the transfer record
//! either all commit or none do.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::entities::{accounts, entries, transfers};

/// Error types for transfer operations.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Source and destination are the same account.
    #[error("cannot transfer from an account to itself")]
    SameAccount,

    /// Transfer amount must be strictly positive.
    #[error("transfer amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    /// Account not found.
    #[error("account not found: {0}")]
    AccountNotFound(Uuid),

    /// Source account balance is below the requested amount.
    #[error("insufficient funds in account {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// The underfunded source account.
        account_id: Uuid,
        /// Balance observed inside the transaction.
        balance: i64,
        /// Requested transfer amount.
        requested: i64,
    },

    /// Database error. Retrying is the caller's decision, never made here.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input parameters for a transfer.
#[derive(Debug, Clone, Copy)]
pub struct TransferInput {
    /// Source account.
    pub from_account_id: Uuid,
    /// Destination account.
    pub to_account_id: Uuid,
    /// Amount in minor currency units (strictly positive).
    pub amount: i64,
}

/// Everything a completed transfer produced.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// The transfer record.
    pub transfer: transfers::Model,
    /// Debit entry against the source account.
    pub from_entry: entries::Model,
    /// Credit entry against the destination account.
    pub to_entry: entries::Model,
    /// Source account after the transfer.
    pub from_account: accounts::Model,
    /// Destination account after the transfer.
    pub to_account: accounts::Model,
}

/// Transfer transaction coordinator.
///
/// Holds a connection and composes the store operations explicitly; the
/// store's transaction mechanism is the only concurrency-control primitive
/// used. Dropping the returned future mid-flight drops the uncommitted
/// transaction, which rolls it back, so cancellation can never leave a
/// half-applied transfer.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    db: DatabaseConnection,
}

impl TransferRepository {
    /// Creates a new transfer coordinator.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Executes a transfer as a single database transaction.
    ///
    /// Inside the transaction:
    /// 1. both accounts are loaded (existence check),
    /// 2. the source balance is prechecked,
    /// 3. the debit and credit entries are inserted,
    /// 4. balance deltas are applied in ascending account-id order, the
    ///    debit guarded by `balance >= amount`,
    /// 5. the transfer record is inserted, then everything commits.
    ///
    /// Any error path returns before the commit and rolls the whole unit
    /// back; callers observe either "fully applied" or "not applied at all".
    ///
    /// # Errors
    ///
    /// Returns `SameAccount` and `NonPositiveAmount` before any write,
    /// `AccountNotFound` when either endpoint is missing,
    /// `InsufficientFunds` when the source cannot cover the amount, and
    /// `Database` for transaction-layer failures.
    pub async fn transfer(&self, input: TransferInput) -> Result<TransferOutcome, TransferError> {
        if input.from_account_id == input.to_account_id {
            return Err(TransferError::SameAccount);
        }
        if input.amount <= 0 {
            return Err(TransferError::NonPositiveAmount(input.amount));
        }

        let txn = self.db.begin().await?;

        let from = Self::load_account(&txn, input.from_account_id).await?;
        Self::load_account(&txn, input.to_account_id).await?;

        if from.balance < input.amount {
            return Err(TransferError::InsufficientFunds {
                account_id: from.id,
                balance: from.balance,
                requested: input.amount,
            });
        }

        let from_entry = Self::insert_entry(&txn, input.from_account_id, -input.amount).await?;
        let to_entry = Self::insert_entry(&txn, input.to_account_id, input.amount).await?;

        // Lock acquisition points: always in ascending account-id order,
        // regardless of transfer direction, so two opposing transfers over
        // the same pair cannot deadlock on each other's row locks.
        for (account_id, delta) in
            ordered_deltas(input.from_account_id, input.to_account_id, input.amount)
        {
            Self::apply_delta(&txn, account_id, delta, input.amount).await?;
        }

        let transfer = Self::insert_transfer(&txn, &input).await?;

        let from_account = Self::load_account(&txn, input.from_account_id).await?;
        let to_account = Self::load_account(&txn, input.to_account_id).await?;

        txn.commit().await?;

        tracing::debug!(
            transfer_id = %transfer.id,
            from = %input.from_account_id,
            to = %input.to_account_id,
            amount = input.amount,
            "transfer committed"
        );

        Ok(TransferOutcome {
            transfer,
            from_entry,
            to_entry,
            from_account,
            to_account,
        })
    }

    /// Loads an account inside the transaction.
    async fn load_account(
        txn: &DatabaseTransaction,
        account_id: Uuid,
    ) -> Result<accounts::Model, TransferError> {
        accounts::Entity::find_by_id(account_id)
            .one(txn)
            .await?
            .ok_or(TransferError::AccountNotFound(account_id))
    }

    /// Inserts a signed ledger entry.
    async fn insert_entry(
        txn: &DatabaseTransaction,
        account_id: Uuid,
        amount: i64,
    ) -> Result<entries::Model, TransferError> {
        let entry = entries::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(account_id),
            amount: Set(amount),
            created_at: Set(chrono::Utc::now().into()),
        };

        Ok(entry.insert(txn).await?)
    }

    /// Applies a balance delta to one account.
    ///
    /// The debit is a conditional update (`balance >= requested`) so that
    /// the window between the balance precheck and this write is closed:
    /// if a concurrent transfer drained the account first, zero rows match
    /// and the transfer aborts instead of going negative.
    async fn apply_delta(
        txn: &DatabaseTransaction,
        account_id: Uuid,
        delta: i64,
        requested: i64,
    ) -> Result<(), TransferError> {
        let mut update = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(delta),
            )
            .filter(accounts::Column::Id.eq(account_id));

        if delta < 0 {
            update = update.filter(accounts::Column::Balance.gte(requested));
        }

        let result = update.exec(txn).await?;

        if result.rows_affected == 0 {
            if delta < 0 {
                let account = Self::load_account(txn, account_id).await?;
                return Err(TransferError::InsufficientFunds {
                    account_id,
                    balance: account.balance,
                    requested,
                });
            }
            return Err(TransferError::AccountNotFound(account_id));
        }

        Ok(())
    }

    /// Inserts the transfer record.
    async fn insert_transfer(
        txn: &DatabaseTransaction,
        input: &TransferInput,
    ) -> Result<transfers::Model, TransferError> {
        let transfer = transfers::ActiveModel {
            id: Set(Uuid::new_v4()),
            from_account_id: Set(input.from_account_id),
            to_account_id: Set(input.to_account_id),
            amount: Set(input.amount),
            created_at: Set(chrono::Utc::now().into()),
        };

        Ok(transfer.insert(txn).await?)
    }
}

/// Returns the balance deltas of a transfer in ascending account-id order.
///
/// The debit (`-amount`) lands on `from`, the credit (`+amount`) on `to`;
/// the ordering is what makes concurrent A→B and B→A transfers acquire
/// their row locks in the same sequence.
#[must_use]
pub fn ordered_deltas(from: Uuid, to: Uuid, amount: i64) -> [(Uuid, i64); 2] {
    if from < to {
        [(from, -amount), (to, amount)]
    } else {
        [(to, amount), (from, -amount)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ordered_deltas_ascending_both_directions() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);

        assert_eq!(ordered_deltas(a, b, 30), [(a, -30), (b, 30)]);
        assert_eq!(ordered_deltas(b, a, 30), [(a, 30), (b, -30)]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// For any distinct pair and positive amount, the plan is ordered by
        /// ascending account ID, the deltas cancel out, and the source is
        /// the one debited.
        #[test]
        fn prop_ordered_deltas(
            from_bits in any::<u128>(),
            to_bits in any::<u128>(),
            amount in 1i64..=i64::MAX,
        ) {
            prop_assume!(from_bits != to_bits);
            let from = Uuid::from_u128(from_bits);
            let to = Uuid::from_u128(to_bits);

            let [(first_id, first_delta), (second_id, second_delta)] =
                ordered_deltas(from, to, amount);

            prop_assert!(first_id < second_id, "plan must be id-ordered");
            prop_assert_eq!(first_delta + second_delta, 0, "deltas must cancel");

            let debit = if first_id == from { first_delta } else { second_delta };
            prop_assert_eq!(debit, -amount, "source account takes the debit");
        }
    }
}
