use tracing::{info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest},
    jwt::{JwtKeys, Token},
    password::Password,
    repo::UserStore,
    repo_types::User,
};
use crate::{
    db::StoreError,
    error::AppError,
    validator::{char_len, matches, Validator, PHONE_NUMBER_RE},
};

pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 72;

pub fn validate_registration(v: &mut Validator, input: &RegisterRequest) {
    v.check(!input.name.is_empty(), "name", "must be provided");
    v.check(char_len(&input.name) > 5, "name", "must be more than 5 characters long");
    v.check(char_len(&input.name) <= 100, "name", "must not be more than 100 characters long");

    v.check(
        matches(&input.phone_number, &PHONE_NUMBER_RE),
        "phone_number",
        "must be a valid 10 digit phone number",
    );

    v.check(!input.password.is_empty(), "password", "must be provided");
    v.check(
        char_len(&input.password) >= PASSWORD_MIN_CHARS,
        "password",
        "must be at least 8 characters long",
    );
    v.check(
        char_len(&input.password) <= PASSWORD_MAX_CHARS,
        "password",
        "must not be more than 72 characters long",
    );
}

pub fn validate_login(v: &mut Validator, input: &LoginRequest) {
    v.check(
        matches(&input.phone_number, &PHONE_NUMBER_RE),
        "phone_number",
        "must be a valid 10 digit phone number",
    );
    v.check(!input.password.is_empty(), "password", "must be provided");
    v.check(
        char_len(&input.password) <= PASSWORD_MAX_CHARS,
        "password",
        "must not be more than 72 characters long",
    );
}

/// Validates, hashes and stores a new user. New accounts always get the `user` role.
pub async fn register_user(users: &dyn UserStore, input: RegisterRequest) -> Result<User, AppError> {
    let mut v = Validator::new();
    validate_registration(&mut v, &input);
    v.into_result()?;

    let password = Password::set(&input.password)?;

    match users.insert(&input.name, &input.phone_number, &password).await {
        Ok(user) => {
            info!(user_id = user.id, "user registered");
            Ok(user)
        }
        Err(StoreError::DuplicatePhoneNumber) => {
            warn!("phone number already registered");
            Err(AppError::field(
                "phone_number",
                "a user with this phone number already exists",
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// Checks credentials and issues an authentication token.
pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    input: LoginRequest,
) -> Result<Token, AppError> {
    let mut v = Validator::new();
    validate_login(&mut v, &input);
    v.into_result()?;

    let user = match users.get_by_phone(&input.phone_number).await {
        Ok(u) => u,
        Err(StoreError::NotFound) => {
            warn!("login for unknown phone number");
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    if !user.password.matches(&input.password)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.issue_authentication(user.id, user.role)?;
    info!(user_id = user.id, role = %user.role, issued_at = %token.issued_at, "user logged in");
    Ok(token)
}
