//! Initial database migration.
//!
//! Creates the ledger, budget, staging and mailbox tables with their enums, constraints and
//! `updated_at` triggers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: ACCOUNTS & CATEGORIES
        // ============================================================
        db.execute_unprepared(ASSETS_SQL).await?;
        db.execute_unprepared(LIABILITIES_SQL).await?;
        db.execute_unprepared(CATEGORIES_SQL).await?;

        // ============================================================
        // PART 3: LEDGER
        // ============================================================
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 4: BUDGETS
        // ============================================================
        db.execute_unprepared(BUDGETS_SQL).await?;
        db.execute_unprepared(BUDGET_ALERTS_SQL).await?;

        // ============================================================
        // PART 5: MAILBOX INGESTION
        // ============================================================
        db.execute_unprepared(PENDING_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(MAILBOX_CONNECTIONS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

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

const ENUMS_SQL: &str = r"
CREATE TYPE transaction_kind AS ENUM ('income', 'expense');

CREATE TYPE pending_status AS ENUM ('pending', 'approved', 'rejected');

CREATE TYPE budget_period AS ENUM ('daily', 'weekly', 'monthly', 'yearly');

CREATE TYPE alert_level AS ENUM ('near_limit', 'exceeded');
";

const ASSETS_SQL: &str = r"
CREATE TABLE assets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL,
    asset_type VARCHAR(50) NOT NULL,
    current_value NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_assets_owner ON assets(owner_id);
";

const LIABILITIES_SQL: &str = r"
CREATE TABLE liabilities (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL,
    liability_type VARCHAR(50) NOT NULL,
    current_value NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_liabilities_owner ON liabilities(owner_id);
";

const CATEGORIES_SQL: &str = r"
CREATE TABLE categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL,
    name VARCHAR(100) NOT NULL,
    kind transaction_kind NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (owner_id, name, kind)
);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL,
    kind transaction_kind NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
    -- No foreign key on account links: a missing account is a ledger warning.
    asset_id UUID,
    liability_id UUID,
    occurred_at TIMESTAMPTZ NOT NULL,
    description TEXT NOT NULL,
    origin_method VARCHAR(30) NOT NULL DEFAULT 'manual',
    source_message_id VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_single_account CHECK (asset_id IS NULL OR liability_id IS NULL)
);

CREATE INDEX idx_txn_owner_date ON transactions(owner_id, occurred_at DESC);
CREATE INDEX idx_txn_owner_expense ON transactions(owner_id, category_id, occurred_at)
    WHERE kind = 'expense';
";

const BUDGETS_SQL: &str = r"
CREATE TABLE budgets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL,
    category_id UUID REFERENCES categories(id) ON DELETE CASCADE,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount >= 0),
    period_type budget_period NOT NULL DEFAULT 'monthly',
    alert_at_percentage NUMERIC(5, 2) NOT NULL DEFAULT 80
        CHECK (alert_at_percentage > 0 AND alert_at_percentage <= 100),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_budgets_owner ON budgets(owner_id);
";

const BUDGET_ALERTS_SQL: &str = r"
CREATE TABLE budget_alerts (
    budget_id UUID NOT NULL REFERENCES budgets(id) ON DELETE CASCADE,
    period_start DATE NOT NULL,
    level alert_level NOT NULL,
    sent_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (budget_id, period_start, level)
);
";

const PENDING_TRANSACTIONS_SQL: &str = r"
CREATE TABLE pending_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL,
    kind transaction_kind NOT NULL DEFAULT 'expense',
    amount NUMERIC(19, 4) NOT NULL,
    category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
    asset_id UUID,
    liability_id UUID,
    occurred_at TIMESTAMPTZ NOT NULL,
    description TEXT NOT NULL,
    source_message_id VARCHAR(255) NOT NULL,
    status pending_status NOT NULL DEFAULT 'pending',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (owner_id, source_message_id),
    CONSTRAINT chk_pending_single_account CHECK (asset_id IS NULL OR liability_id IS NULL)
);

CREATE INDEX idx_pending_owner_open ON pending_transactions(owner_id, occurred_at DESC, created_at DESC)
    WHERE status = 'pending';
";

const MAILBOX_CONNECTIONS_SQL: &str = r"
CREATE TABLE mailbox_connections (
    owner_id UUID PRIMARY KEY,
    access_token TEXT NOT NULL,
    refresh_token TEXT,
    expires_at TIMESTAMPTZ,
    last_sync_at TIMESTAMPTZ,
    sync_interval_hours INTEGER NOT NULL DEFAULT 24 CHECK (sync_interval_hours IN (1, 6, 12, 24)),
    preferred_hour SMALLINT CHECK (preferred_hour BETWEEN 0 AND 23),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at() RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_assets_updated_at BEFORE UPDATE ON assets
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_liabilities_updated_at BEFORE UPDATE ON liabilities
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_transactions_updated_at BEFORE UPDATE ON transactions
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_mailbox_connections_updated_at BEFORE UPDATE ON mailbox_connections
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS mailbox_connections CASCADE;
DROP TABLE IF EXISTS pending_transactions CASCADE;
DROP TABLE IF EXISTS budget_alerts CASCADE;
DROP TABLE IF EXISTS budgets CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS categories CASCADE;
DROP TABLE IF EXISTS liabilities CASCADE;
DROP TABLE IF EXISTS assets CASCADE;
DROP FUNCTION IF EXISTS set_updated_at();
DROP TYPE IF EXISTS alert_level;
DROP TYPE IF EXISTS budget_period;
DROP TYPE IF EXISTS pending_status;
DROP TYPE IF EXISTS transaction_kind;
";
