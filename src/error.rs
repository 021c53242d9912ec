use std::fmt;

use thiserror::Error;

/// Client columns that carry a length limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Firstname,
    Lastname,
    Phone,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Firstname => "firstname",
            Field::Lastname => "lastname",
            Field::Phone => "phone",
        };
        f.write_str(name)
    }
}

/// Raised when a supplied field violates its declared length constraint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is too long: {actual} characters (max {max})")]
    TooLong {
        field: Field,
        max: usize,
        actual: usize,
    },
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::TooLong { field, .. } => *field,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("client {0} not found")]
    NotFound(i32),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
