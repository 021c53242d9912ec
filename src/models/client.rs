use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{Field, ValidationError};

pub const FIRSTNAME_MAX_LEN: usize = 100;
pub const LASTNAME_MAX_LEN: usize = 100;
pub const PHONE_MAX_LEN: usize = 30;

/// A stored client.
///
/// Only a store hands these out. `created_at` is stamped when the store
/// creates the row and there is no way to change it afterwards.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Client {
    id: i32,
    firstname: String,
    lastname: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl Client {
    pub(crate) fn stamp(id: i32, new: NewClient, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            firstname: new.firstname,
            lastname: new.lastname,
            phone: new.phone,
            created_at,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn firstname(&self) -> &str {
        &self.firstname
    }

    pub fn lastname(&self) -> &str {
        &self.lastname
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Replace the editable fields. `id` and `created_at` are left alone.
    pub fn apply(&mut self, changes: NewClient) {
        self.firstname = changes.firstname;
        self.lastname = changes.lastname;
        self.phone = changes.phone;
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.firstname, self.lastname)
    }
}

/// Validated input for creating or updating a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    firstname: String,
    lastname: String,
    phone: Option<String>,
}

impl NewClient {
    pub fn new(
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        phone: Option<String>,
    ) -> Result<Self, ValidationError> {
        let firstname = firstname.into();
        let lastname = lastname.into();

        check_len(Field::Firstname, &firstname, FIRSTNAME_MAX_LEN)?;
        check_len(Field::Lastname, &lastname, LASTNAME_MAX_LEN)?;
        if let Some(phone) = &phone {
            check_len(Field::Phone, phone, PHONE_MAX_LEN)?;
        }

        Ok(Self {
            firstname,
            lastname,
            phone,
        })
    }

    pub fn firstname(&self) -> &str {
        &self.firstname
    }

    pub fn lastname(&self) -> &str {
        &self.lastname
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

impl fmt::Display for NewClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.firstname, self.lastname)
    }
}

// Limits count characters, not bytes.
fn check_len(field: Field, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}
