//! Initial database migration.
//!
//! Creates the users, accounts, entries, and transfers tables with their
//! indexes and constraints.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(ENTRIES_SQL).await?;
        db.execute_unprepared(TRANSFERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const USERS_SQL: &str = r"
CREATE TABLE users (
    username            varchar PRIMARY KEY,
    hashed_password     varchar NOT NULL,
    full_name           varchar NOT NULL,
    email               varchar UNIQUE NOT NULL,
    password_changed_at timestamptz NOT NULL DEFAULT '0001-01-01 00:00:00Z',
    created_at          timestamptz NOT NULL DEFAULT now()
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id         uuid PRIMARY KEY,
    owner      varchar NOT NULL REFERENCES users (username),
    balance    bigint NOT NULL DEFAULT 0,
    currency   varchar NOT NULL,
    created_at timestamptz NOT NULL DEFAULT now(),

    -- one account per currency per owner
    CONSTRAINT accounts_owner_currency_key UNIQUE (owner, currency)
);

CREATE INDEX accounts_owner_idx ON accounts (owner);
";

const ENTRIES_SQL: &str = r"
CREATE TABLE entries (
    id         uuid PRIMARY KEY,
    account_id uuid NOT NULL REFERENCES accounts (id),
    -- positive = credit, negative = debit
    amount     bigint NOT NULL,
    created_at timestamptz NOT NULL DEFAULT now()
);

CREATE INDEX entries_account_id_idx ON entries (account_id);
";

const TRANSFERS_SQL: &str = r"
CREATE TABLE transfers (
    id              uuid PRIMARY KEY,
    from_account_id uuid NOT NULL REFERENCES accounts (id),
    to_account_id   uuid NOT NULL REFERENCES accounts (id),
    amount          bigint NOT NULL,
    created_at      timestamptz NOT NULL DEFAULT now(),

    CONSTRAINT transfers_amount_positive CHECK (amount > 0),
    CONSTRAINT transfers_distinct_accounts CHECK (from_account_id <> to_account_id)
);

CREATE INDEX transfers_from_account_id_idx ON transfers (from_account_id);
CREATE INDEX transfers_to_account_id_idx ON transfers (to_account_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS transfers;
DROP TABLE IF EXISTS entries;
DROP TABLE IF EXISTS accounts;
DROP TABLE IF EXISTS users;
";
