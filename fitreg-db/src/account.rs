use async_trait::async_trait;
use fitreg_model::account::{Account, AccountId};
use log::debug;

use crate::{connection::Connection, Error, Result};

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    email: String,
    username: String,
    password_hash: String,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
        }
    }
}

#[mockall::automock]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Stores a new account and returns its id. Fails with
    /// [`Error::Conflict`] if the email is already registered.
    async fn create_account(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<AccountId>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
}

#[derive(Clone)]
pub struct AccountRepositoryImpl {
    connection: Connection,
}

impl AccountRepositoryImpl {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl AccountRepository for AccountRepositoryImpl {
    async fn create_account(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<AccountId> {
        let mut conn = self.connection.lock().await;
        debug!("Storing account {}", email);
        let result =
            sqlx::query("INSERT INTO accounts (email, username, password_hash) VALUES (?, ?, ?)")
                .bind(email)
                .bind(username)
                .bind(password_hash)
                .execute(&mut *conn)
                .await
                .map_err(|e| match Error::from(e) {
                    Error::Conflict(_) => Error::Conflict("email"),
                    e => e,
                })?;

        Ok(result.last_insert_rowid())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let mut conn = self.connection.lock().await;
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, email, username, password_hash FROM accounts WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repository() -> AccountRepositoryImpl {
        AccountRepositoryImpl::new(Connection::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn creates_and_finds_account() {
        let repository = repository().await;

        let id = repository
            .create_account("ana@example.com", "ana", "$argon2id$hash")
            .await
            .unwrap();
        let account = repository
            .find_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            account,
            Account {
                id,
                email: "ana@example.com".to_owned(),
                username: "ana".to_owned(),
                password_hash: "$argon2id$hash".to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn unknown_email_is_none() {
        let repository = repository().await;
        assert!(repository
            .find_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let repository = repository().await;
        repository
            .create_account("ana@example.com", "ana", "h1")
            .await
            .unwrap();

        let result = repository
            .create_account("ana@example.com", "other", "h2")
            .await;
        assert!(matches!(result, Err(Error::Conflict("email"))));
    }
}
