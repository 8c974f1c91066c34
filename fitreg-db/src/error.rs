#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error("corrupted row: {0}")]
    Corrupted(String),
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => Error::Conflict("record"),
            e => Error::Sqlx(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
