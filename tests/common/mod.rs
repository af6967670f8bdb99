//! Common test utilities

#![allow(dead_code)]

use std::time::Duration;

use rand::Rng;
use simple_bank::domain::CreateAccountParams;
use simple_bank::{db, Account, Config, Store};
use sqlx::PgPool;
use tokio::sync::OnceCell;

/// Owner whose accounts cannot receive ledger entries
pub const REJECT_ENTRIES_OWNER: &str = "reject-entries";

/// Owner whose outgoing transfers fail when the transaction commits
pub const REJECT_COMMIT_OWNER: &str = "reject-commit";

static SCHEMA_APPLIED: OnceCell<()> = OnceCell::const_new();

/// Connect to the test database and make sure the ledger schema exists.
///
/// Tests never truncate tables; each one works on accounts it creates itself.
pub async fn setup_test_store() -> Store {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");
    let config = Config::with_database_url(database_url)
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(30));

    let pool = db::connect(&config)
        .await
        .expect("Failed to connect to DB");
    let store = Store::new(pool);

    SCHEMA_APPLIED
        .get_or_init(|| async {
            db::migrate(store.pool()).await.expect("Failed to run migrations");
            install_failure_triggers(store.pool())
                .await
                .expect("Failed to install failure triggers");
        })
        .await;

    assert!(db::check_schema(store.pool()).await.unwrap());

    store
}

/// Triggers that make writes fail for accounts with a reserved owner.
///
/// Entries for a `REJECT_ENTRIES_OWNER` account fail on insert. A transfer
/// sent from a `REJECT_COMMIT_OWNER` account fails in a deferred constraint
/// trigger, so only the COMMIT sees the error.
async fn install_failure_triggers(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION test_reject_entry() RETURNS trigger AS $$
        BEGIN
            IF EXISTS (SELECT 1 FROM accounts WHERE id = NEW.account_id AND owner = 'reject-entries') THEN
                RAISE EXCEPTION 'entry rejected for account %', NEW.account_id;
            END IF;
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION test_reject_commit() RETURNS trigger AS $$
        BEGIN
            IF EXISTS (SELECT 1 FROM accounts WHERE id = NEW.from_account_id AND owner = 'reject-commit') THEN
                RAISE EXCEPTION 'transfer % rejected at commit', NEW.id;
            END IF;
            RETURN NULL;
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("DROP TRIGGER IF EXISTS test_reject_entry ON entries")
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        r#"
        CREATE TRIGGER test_reject_entry
        BEFORE INSERT ON entries
        FOR EACH ROW EXECUTE FUNCTION test_reject_entry()
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("DROP TRIGGER IF EXISTS test_reject_commit ON transfers")
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        r#"
        CREATE CONSTRAINT TRIGGER test_reject_commit
        AFTER INSERT ON transfers
        DEFERRABLE INITIALLY DEFERRED
        FOR EACH ROW EXECUTE FUNCTION test_reject_commit()
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// Create an account with a random owner and the given opening balance
pub async fn create_account(store: &Store, balance: i64) -> Account {
    let owner = format!("owner-{}", rand::thread_rng().gen::<u32>());
    create_account_owned_by(store, &owner, balance).await
}

pub async fn create_account_owned_by(store: &Store, owner: &str, balance: i64) -> Account {
    store
        .create_account(&CreateAccountParams::new(owner, balance, "USD"))
        .await
        .expect("Failed to create account")
}
