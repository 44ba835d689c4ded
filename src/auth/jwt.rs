use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::user::{Department, User};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// Login email
    pub sub: String,
    pub role: u8, // role id
    pub department: Department,
    pub exp: usize,
    pub jti: String,
    pub token_type: TokenType,
}

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn issue(user: &User, token_type: TokenType, secret: &str, ttl: usize) -> Result<(String, Claims), Error> {
    let claims = Claims {
        user_id: user.id,
        sub: user.email.clone(),
        role: user.role.id(),
        department: user.department,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, claims))
}

pub fn generate_access_token(user: &User, secret: &str, ttl: usize) -> Result<String, Error> {
    issue(user, TokenType::Access, secret, ttl).map(|(token, _)| token)
}

pub fn generate_refresh_token(user: &User, secret: &str, ttl: usize) -> Result<(String, Claims), Error> {
    issue(user, TokenType::Refresh, secret, ttl)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::role::Role;
    use crate::model::user::UserStatus;

    fn user() -> User {
        let now = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        User {
            id: 42,
            employee_id: "EMP-042".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            phone: None,
            role: Role::Manager,
            department: Department::Engineering,
            status: UserStatus::Active,
            manager_id: None,
            position: None,
            base_salary: 0.0,
            hire_date: now.date(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn tokens_round_trip_with_type() {
        let access = generate_access_token(&user(), "secret", 60).unwrap();
        let claims = verify_token(&access, "secret").unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.role, Role::Manager.id());
        assert_eq!(claims.token_type, TokenType::Access);

        let (refresh, issued) = generate_refresh_token(&user(), "secret", 60).unwrap();
        let claims = verify_token(&refresh, "secret").unwrap();
        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_eq!(claims.jti, issued.jti);
    }

    #[test]
    fn wrong_secret_fails() {
        let token = generate_access_token(&user(), "secret", 60).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }
}
