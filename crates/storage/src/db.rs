use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kharcha_core::{
    Category, CategoryStore, Money, StoreError, Transaction, TransactionStore, TransactionType,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::collections::BTreeSet;
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            amount_paise INTEGER NOT NULL CHECK (amount_paise > 0),
            kind TEXT NOT NULL CHECK (kind IN ('debit', 'credit')),
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            date TEXT NOT NULL,
            account TEXT NOT NULL,
            balance_paise INTEGER,
            merchant TEXT,
            upi_id TEXT,
            is_upi INTEGER NOT NULL DEFAULT 0,
            source_message_id TEXT NOT NULL UNIQUE,
            bank_name TEXT NOT NULL,
            confidence REAL NOT NULL CHECK (confidence >= 0 AND confidence <= 1),
            is_edited INTEGER NOT NULL DEFAULT 0,
            raw_text TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions (date DESC)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            keywords TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn paise(money: Money) -> Result<i64, StoreError> {
    money
        .to_paise()
        .ok_or_else(|| StoreError::Backend(format!("amount {money} does not fit in storage")))
}

fn row_to_transaction(row: &SqliteRow) -> Result<Transaction, StoreError> {
    let kind: String = row.try_get("kind").map_err(backend)?;
    let kind = kind
        .parse::<TransactionType>()
        .map_err(StoreError::Backend)?;
    let balance: Option<i64> = row.try_get("balance_paise").map_err(backend)?;
    let confidence: f64 = row.try_get("confidence").map_err(backend)?;
    let date: DateTime<Utc> = row.try_get("date").map_err(backend)?;

    Ok(Transaction {
        id: row.try_get("id").map_err(backend)?,
        amount: Money::from_paise(row.try_get("amount_paise").map_err(backend)?),
        kind,
        description: row.try_get("description").map_err(backend)?,
        category: row.try_get("category").map_err(backend)?,
        date,
        account: row.try_get("account").map_err(backend)?,
        balance: balance.map(Money::from_paise),
        merchant: row.try_get("merchant").map_err(backend)?,
        upi_id: row.try_get("upi_id").map_err(backend)?,
        is_upi: row.try_get::<i64, _>("is_upi").map_err(backend)? != 0,
        source_message_id: row.try_get("source_message_id").map_err(backend)?,
        bank_name: row.try_get("bank_name").map_err(backend)?,
        confidence: confidence as f32,
        is_edited: row.try_get::<i64, _>("is_edited").map_err(backend)? != 0,
        raw_text: row.try_get("raw_text").map_err(backend)?,
    })
}

/// sqlite-backed transaction and category store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn open(path: &Path) -> Result<Self, sqlx::Error> {
        Ok(Self::new(create_db(path).await?))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

const UPSERT_TRANSACTION: &str = r#"
    INSERT INTO transactions (
        id, amount_paise, kind, description, category, date, account, balance_paise,
        merchant, upi_id, is_upi, source_message_id, bank_name, confidence, is_edited, raw_text
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        amount_paise = excluded.amount_paise,
        kind = excluded.kind,
        description = excluded.description,
        category = excluded.category,
        date = excluded.date,
        account = excluded.account,
        balance_paise = excluded.balance_paise,
        merchant = excluded.merchant,
        upi_id = excluded.upi_id,
        is_upi = excluded.is_upi,
        bank_name = excluded.bank_name,
        confidence = excluded.confidence,
        is_edited = excluded.is_edited,
        raw_text = excluded.raw_text
"#;

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn get_all(&self) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query("SELECT * FROM transactions ORDER BY date DESC, rowid ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.iter()
            .map(|row| {
                row_to_transaction(row).inspect_err(|e| {
                    tracing::warn!("unreadable transaction row: {e}");
                })
            })
            .collect()
    }

    async fn save_batch(&self, history: &[Transaction]) -> Result<(), StoreError> {
        let mut db_tx = self.pool.begin().await.map_err(backend)?;

        for tx in history {
            tx.validate()?;
            sqlx::query(UPSERT_TRANSACTION)
                .bind(&tx.id)
                .bind(paise(tx.amount)?)
                .bind(tx.kind.to_string())
                .bind(&tx.description)
                .bind(&tx.category)
                .bind(tx.date)
                .bind(&tx.account)
                .bind(tx.balance.map(paise).transpose()?)
                .bind(&tx.merchant)
                .bind(&tx.upi_id)
                .bind(tx.is_upi as i64)
                .bind(&tx.source_message_id)
                .bind(&tx.bank_name)
                .bind(tx.confidence as f64)
                .bind(tx.is_edited as i64)
                .bind(&tx.raw_text)
                .execute(&mut *db_tx)
                .await
                .map_err(backend)?;
        }

        db_tx.commit().await.map_err(backend)?;
        tracing::debug!(count = history.len(), "saved transaction history");
        Ok(())
    }

    async fn update_one(&self, tx: &Transaction) -> Result<(), StoreError> {
        tx.validate()?;
        let result = sqlx::query(
            r#"
            UPDATE transactions SET
                amount_paise = ?, kind = ?, description = ?, category = ?, date = ?,
                account = ?, balance_paise = ?, merchant = ?, upi_id = ?, is_upi = ?,
                bank_name = ?, confidence = ?, is_edited = ?, raw_text = ?
            WHERE id = ?
            "#,
        )
        .bind(paise(tx.amount)?)
        .bind(tx.kind.to_string())
        .bind(&tx.description)
        .bind(&tx.category)
        .bind(tx.date)
        .bind(&tx.account)
        .bind(tx.balance.map(paise).transpose()?)
        .bind(&tx.merchant)
        .bind(&tx.upi_id)
        .bind(tx.is_upi as i64)
        .bind(&tx.bank_name)
        .bind(tx.confidence as f64)
        .bind(tx.is_edited as i64)
        .bind(&tx.raw_text)
        .bind(&tx.id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(tx.id.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for SqliteStore {
    async fn get_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, String)>(
            "SELECT id, name, keywords FROM categories ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter()
            .map(|(id, name, keywords)| {
                let keywords: BTreeSet<String> = serde_json::from_str(&keywords)?;
                Ok(Category { id, name, keywords })
            })
            .collect()
    }

    async fn save_categories(&self, categories: &[Category]) -> Result<(), StoreError> {
        let mut db_tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query("DELETE FROM categories")
            .execute(&mut *db_tx)
            .await
            .map_err(backend)?;

        for (position, category) in categories.iter().enumerate() {
            sqlx::query("INSERT INTO categories (id, position, name, keywords) VALUES (?, ?, ?, ?)")
                .bind(&category.id)
                .bind(position as i64)
                .bind(&category.name)
                .bind(serde_json::to_string(&category.keywords)?)
                .execute(&mut *db_tx)
                .await
                .map_err(backend)?;
        }

        db_tx.commit().await.map_err(backend)?;
        Ok(())
    }
}
