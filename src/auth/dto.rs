use serde::{Deserialize, Serialize};

use super::claims::Role;

/// Request body for user registration. No `Debug`: it carries the plaintext.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(rename = "userID")]
    pub user_id: i64,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct AdminProfileResponse {
    #[serde(rename = "AdminID")]
    pub admin_id: i64,
    pub role: Role,
}
