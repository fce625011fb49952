//! Initial database migration.
//!
//! Creates the users, account types, accounts, tags, and operations tables
//! together with the operation/tag join table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: USERS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 2: CLASSIFICATION
        // ============================================================
        db.execute_unprepared(ACCOUNT_TYPES_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(TAGS_SQL).await?;

        // ============================================================
        // PART 3: OPERATIONS
        // ============================================================
        db.execute_unprepared(OPERATIONS_SQL).await?;
        db.execute_unprepared(OPERATION_TAGS_SQL).await?;

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
    id BIGSERIAL PRIMARY KEY,
    email VARCHAR(255) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    is_staff BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const ACCOUNT_TYPES_SQL: &str = r"
CREATE TABLE account_types (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    description VARCHAR(255) NOT NULL DEFAULT '',
    calculate BOOLEAN NOT NULL DEFAULT true
);

CREATE INDEX idx_account_types_user ON account_types(user_id, name);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    active BOOLEAN NOT NULL DEFAULT true,
    account_type_id BIGINT REFERENCES account_types(id) ON DELETE SET NULL
);

CREATE INDEX idx_accounts_user ON accounts(user_id, name);
CREATE INDEX idx_accounts_type ON accounts(account_type_id);
";

const TAGS_SQL: &str = r"
CREATE TABLE tags (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    description VARCHAR(255) NOT NULL DEFAULT ''
);

CREATE INDEX idx_tags_user ON tags(user_id, name);
";

const OPERATIONS_SQL: &str = r"
CREATE TABLE operations (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    account_id BIGINT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    description VARCHAR(255) NOT NULL DEFAULT '',
    value NUMERIC(6, 2) NOT NULL,
    date DATE
);

-- Balance lookups filter by owner + account, optionally by date
CREATE INDEX idx_operations_user_account_date ON operations(user_id, account_id, date);
CREATE INDEX idx_operations_user_date ON operations(user_id, date);
";

const OPERATION_TAGS_SQL: &str = r"
CREATE TABLE operation_tags (
    operation_id BIGINT NOT NULL REFERENCES operations(id) ON DELETE CASCADE,
    tag_id BIGINT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (operation_id, tag_id)
);

CREATE INDEX idx_operation_tags_tag ON operation_tags(tag_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS operation_tags CASCADE;
DROP TABLE IF EXISTS operations CASCADE;
DROP TABLE IF EXISTS tags CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS account_types CASCADE;
DROP TABLE IF EXISTS users CASCADE;
";
