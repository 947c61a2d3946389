//! Integration tests for the transfer transaction coordinator.
//!
//! These tests verify that:
//! - A valid transfer moves funds and records exactly one transfer and two
//!   mirrored entries, all committed together
//! - Failed transfers roll back completely (no partial state observable)
//! - Concurrent transfers over the same account pair never deadlock and
//!   never lose a balance update
//!
//! They run against `DATABASE_URL` and are skipped when it is not set.

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::similar_names)]

use futures::future::join_all;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter,
};
use std::env;
use std::sync::Arc;
use tokio::sync::Barrier;
use uuid::Uuid;

use ferrobank_db::entities::{accounts, entries, transfers, users};
use ferrobank_db::repositories::account::AccountRepository;
use ferrobank_db::repositories::transfer::{TransferError, TransferInput, TransferRepository};

async fn connect() -> Option<DatabaseConnection> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("skipping: DATABASE_URL not set");
        return None;
    };

    Some(
        Database::connect(&url)
            .await
            .expect("Failed to connect to database"),
    )
}

/// Test fixture: two owners with one account each.
struct TransferTestData {
    from_owner: String,
    to_owner: String,
    from_account_id: Uuid,
    to_account_id: Uuid,
}

async fn create_owner_with_account(
    db: &DatabaseConnection,
    balance: i64,
) -> Result<(String, Uuid), sea_orm::DbErr> {
    let username = format!("transfer-test-{}", Uuid::new_v4());
    let account_id = Uuid::new_v4();
    let now = chrono::Utc::now().into();

    users::ActiveModel {
        username: Set(username.clone()),
        hashed_password: Set("hash".to_string()),
        full_name: Set("Transfer Test User".to_string()),
        email: Set(format!("{}@example.com", username)),
        password_changed_at: Set(now),
        created_at: Set(now),
    }
    .insert(db)
    .await?;

    accounts::ActiveModel {
        id: Set(account_id),
        owner: Set(username.clone()),
        balance: Set(balance),
        currency: Set("USD".to_string()),
        created_at: Set(now),
    }
    .insert(db)
    .await?;

    Ok((username, account_id))
}

async fn setup_transfer_test_data(
    db: &DatabaseConnection,
    from_balance: i64,
    to_balance: i64,
) -> Result<TransferTestData, sea_orm::DbErr> {
    let (from_owner, from_account_id) = create_owner_with_account(db, from_balance).await?;
    let (to_owner, to_account_id) = create_owner_with_account(db, to_balance).await?;

    Ok(TransferTestData {
        from_owner,
        to_owner,
        from_account_id,
        to_account_id,
    })
}

async fn cleanup_transfer_test_data(
    db: &DatabaseConnection,
    data: &TransferTestData,
) -> Result<(), sea_orm::DbErr> {
    let account_ids = [data.from_account_id, data.to_account_id];

    // Delete in reverse order of dependencies
    transfers::Entity::delete_many()
        .filter(transfers::Column::FromAccountId.is_in(account_ids))
        .exec(db)
        .await?;

    entries::Entity::delete_many()
        .filter(entries::Column::AccountId.is_in(account_ids))
        .exec(db)
        .await?;

    accounts::Entity::delete_many()
        .filter(accounts::Column::Id.is_in(account_ids))
        .exec(db)
        .await?;

    users::Entity::delete_many()
        .filter(users::Column::Username.is_in([data.from_owner.clone(), data.to_owner.clone()]))
        .exec(db)
        .await?;

    Ok(())
}

async fn balance_of(db: &DatabaseConnection, account_id: Uuid) -> i64 {
    AccountRepository::new(db.clone())
        .balance(account_id)
        .await
        .expect("balance query failed")
}

async fn entry_count(db: &DatabaseConnection, account_ids: [Uuid; 2]) -> u64 {
    entries::Entity::find()
        .filter(entries::Column::AccountId.is_in(account_ids))
        .count(db)
        .await
        .expect("entry count failed")
}

#[tokio::test]
async fn test_transfer_moves_funds_atomically() {
    let Some(db) = connect().await else { return };
    let data = setup_transfer_test_data(&db, 100, 50)
        .await
        .expect("setup failed");

    let repo = TransferRepository::new(db.clone());
    let outcome = repo
        .transfer(TransferInput {
            from_account_id: data.from_account_id,
            to_account_id: data.to_account_id,
            amount: 30,
        })
        .await
        .expect("transfer failed");

    // Outcome reflects the post-transfer state
    assert_eq!(outcome.from_account.balance, 70);
    assert_eq!(outcome.to_account.balance, 80);

    // Two mirrored entries against the right accounts
    assert_eq!(outcome.from_entry.account_id, data.from_account_id);
    assert_eq!(outcome.from_entry.amount, -30);
    assert_eq!(outcome.to_entry.account_id, data.to_account_id);
    assert_eq!(outcome.to_entry.amount, 30);

    // Transfer record ties the endpoints together
    assert_eq!(outcome.transfer.from_account_id, data.from_account_id);
    assert_eq!(outcome.transfer.to_account_id, data.to_account_id);
    assert_eq!(outcome.transfer.amount, 30);

    // Committed state matches; total funds conserved
    assert_eq!(balance_of(&db, data.from_account_id).await, 70);
    assert_eq!(balance_of(&db, data.to_account_id).await, 80);

    cleanup_transfer_test_data(&db, &data)
        .await
        .expect("cleanup failed");
}

#[tokio::test]
async fn test_insufficient_funds_rolls_back_everything() {
    let Some(db) = connect().await else { return };
    let data = setup_transfer_test_data(&db, 20, 0)
        .await
        .expect("setup failed");

    let repo = TransferRepository::new(db.clone());
    let result = repo
        .transfer(TransferInput {
            from_account_id: data.from_account_id,
            to_account_id: data.to_account_id,
            amount: 50,
        })
        .await;

    match result {
        Err(TransferError::InsufficientFunds {
            balance, requested, ..
        }) => {
            assert_eq!(balance, 20);
            assert_eq!(requested, 50);
        }
        other => panic!("expected InsufficientFunds, got {:?}", other.map(|_| ())),
    }

    // No observable side effects at all
    assert_eq!(balance_of(&db, data.from_account_id).await, 20);
    assert_eq!(balance_of(&db, data.to_account_id).await, 0);
    assert_eq!(
        entry_count(&db, [data.from_account_id, data.to_account_id]).await,
        0
    );
    assert_eq!(
        transfers::Entity::find()
            .filter(transfers::Column::FromAccountId.eq(data.from_account_id))
            .count(&db)
            .await
            .expect("transfer count failed"),
        0
    );

    cleanup_transfer_test_data(&db, &data)
        .await
        .expect("cleanup failed");
}

#[tokio::test]
async fn test_same_account_rejected_before_any_write() {
    let Some(db) = connect().await else { return };
    let data = setup_transfer_test_data(&db, 100, 0)
        .await
        .expect("setup failed");

    let repo = TransferRepository::new(db.clone());
    let result = repo
        .transfer(TransferInput {
            from_account_id: data.from_account_id,
            to_account_id: data.from_account_id,
            amount: 10,
        })
        .await;

    assert!(matches!(result, Err(TransferError::SameAccount)));
    assert_eq!(balance_of(&db, data.from_account_id).await, 100);
    assert_eq!(
        entry_count(&db, [data.from_account_id, data.to_account_id]).await,
        0
    );

    cleanup_transfer_test_data(&db, &data)
        .await
        .expect("cleanup failed");
}

#[tokio::test]
async fn test_nonpositive_amount_rejected() {
    let Some(db) = connect().await else { return };
    let data = setup_transfer_test_data(&db, 100, 0)
        .await
        .expect("setup failed");

    let repo = TransferRepository::new(db.clone());

    for amount in [0, -5] {
        let result = repo
            .transfer(TransferInput {
                from_account_id: data.from_account_id,
                to_account_id: data.to_account_id,
                amount,
            })
            .await;
        assert!(matches!(
            result,
            Err(TransferError::NonPositiveAmount(a)) if a == amount
        ));
    }

    cleanup_transfer_test_data(&db, &data)
        .await
        .expect("cleanup failed");
}

#[tokio::test]
async fn test_missing_account_rejected() {
    let Some(db) = connect().await else { return };
    let data = setup_transfer_test_data(&db, 100, 0)
        .await
        .expect("setup failed");

    let repo = TransferRepository::new(db.clone());
    let ghost = Uuid::new_v4();
    let result = repo
        .transfer(TransferInput {
            from_account_id: data.from_account_id,
            to_account_id: ghost,
            amount: 10,
        })
        .await;

    assert!(matches!(
        result,
        Err(TransferError::AccountNotFound(id)) if id == ghost
    ));
    assert_eq!(balance_of(&db, data.from_account_id).await, 100);

    cleanup_transfer_test_data(&db, &data)
        .await
        .expect("cleanup failed");
}

#[tokio::test]
async fn test_opposing_transfers_do_not_deadlock() {
    let Some(db) = connect().await else { return };
    let data = setup_transfer_test_data(&db, 500, 500)
        .await
        .expect("setup failed");

    // Four transfers in each direction, all released at once. Without the
    // fixed lock order this pattern deadlocks under row-level locking.
    let task_count = 8;
    let barrier = Arc::new(Barrier::new(task_count));
    let mut handles = Vec::with_capacity(task_count);

    for i in 0..task_count {
        let repo = TransferRepository::new(db.clone());
        let barrier = Arc::clone(&barrier);
        let (from, to) = if i % 2 == 0 {
            (data.from_account_id, data.to_account_id)
        } else {
            (data.to_account_id, data.from_account_id)
        };

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            repo.transfer(TransferInput {
                from_account_id: from,
                to_account_id: to,
                amount: 10,
            })
            .await
        }));
    }

    let results = join_all(handles).await;
    for result in results {
        result
            .expect("task panicked")
            .expect("opposing transfer failed");
    }

    // Equal traffic both ways: balances end where they started.
    assert_eq!(balance_of(&db, data.from_account_id).await, 500);
    assert_eq!(balance_of(&db, data.to_account_id).await, 500);
    assert_eq!(
        entry_count(&db, [data.from_account_id, data.to_account_id]).await,
        2 * task_count as u64
    );

    cleanup_transfer_test_data(&db, &data)
        .await
        .expect("cleanup failed");
}

#[tokio::test]
async fn test_concurrent_drain_never_overdraws() {
    let Some(db) = connect().await else { return };
    let data = setup_transfer_test_data(&db, 100, 0)
        .await
        .expect("setup failed");

    // Twelve concurrent withdrawals of 10 against a balance of 100: exactly
    // ten can succeed; the conditional update must stop the other two.
    let task_count = 12;
    let barrier = Arc::new(Barrier::new(task_count));
    let mut handles = Vec::with_capacity(task_count);

    for _ in 0..task_count {
        let repo = TransferRepository::new(db.clone());
        let barrier = Arc::clone(&barrier);
        let input = TransferInput {
            from_account_id: data.from_account_id,
            to_account_id: data.to_account_id,
            amount: 10,
        };

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            repo.transfer(input).await
        }));
    }

    let results = join_all(handles).await;
    let mut succeeded = 0;
    let mut insufficient = 0;
    for result in results {
        match result.expect("task panicked") {
            Ok(_) => succeeded += 1,
            Err(TransferError::InsufficientFunds { .. }) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(insufficient, 2);
    assert_eq!(balance_of(&db, data.from_account_id).await, 0);
    assert_eq!(balance_of(&db, data.to_account_id).await, 100);

    cleanup_transfer_test_data(&db, &data)
        .await
        .expect("cleanup failed");
}
