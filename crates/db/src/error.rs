use placement_core::error::CoreError;

/// Error returned by repository operations that enforce business rules.
///
/// Plain data access keeps returning `sqlx::Error`; methods that also
/// authorize or validate state return this so callers see both kinds.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type DbResult<T> = Result<T, DbError>;
