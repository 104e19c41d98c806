use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use super::{claims::Role, password::Password};
use crate::db::StoreError;

/// User record as read from the `users` table.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    #[serde(skip)]
    pub password: Password,
    pub role: Role,
    #[serde(with = "crate::display_time")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            name: r.name,
            phone_number: r.phone_number,
            password: Password::from_hash(r.password_hash),
            role: r.role.parse().map_err(StoreError::Decode)?,
            created_at: r.created_at,
        })
    }
}
