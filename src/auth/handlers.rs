use actix_web::{HttpRequest, HttpResponse, Responder, error::ErrorUnauthorized, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::{
        auth::{AuthUser, bearer_token},
        jwt::{TokenType, generate_access_token, generate_refresh_token, verify_token},
    },
    config::Config,
    error::ServiceError,
    model::user::User,
    service::Services,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    #[schema(example = "john@company.com")]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: usize,
}

fn issue_pair(user: &User, config: &Config) -> Result<TokenResponse, ServiceError> {
    let internal = |e: jsonwebtoken::errors::Error| ServiceError::Internal(e.to_string());

    let access_token = generate_access_token(user, &config.jwt_secret, config.access_token_ttl).map_err(internal)?;
    let (refresh_token, claims) =
        generate_refresh_token(user, &config.jwt_secret, config.refresh_token_ttl).map_err(internal)?;
    debug!(user_id = user.id, jti = %claims.jti, "Issued token pair");

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
    })
}

/// Exchange email and password for a token pair
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(payload, services, config), fields(email = %payload.email))]
pub async fn login(
    payload: web::Json<LoginRequest>,
    services: web::Data<Services>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    payload.validate().map_err(ServiceError::from)?;

    let user = services.users.authenticate(&payload.email, &payload.password).await?;
    let tokens = issue_pair(&user, &config)?;

    info!(user_id = user.id, "Login successful");
    Ok(HttpResponse::Ok().json(tokens))
}

/// Trade a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Tokens reissued", body = TokenResponse),
        (status = 401, description = "Missing, invalid or non-refresh token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    services: web::Data<Services>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let token = bearer_token(&req).ok_or_else(|| ErrorUnauthorized("No token"))?;
    let claims = verify_token(token, &config.jwt_secret).map_err(|_| ErrorUnauthorized("Invalid token"))?;
    if claims.token_type != TokenType::Refresh {
        return Err(ErrorUnauthorized("Refresh token required"));
    }

    // role, department or status may have changed since the token was issued
    let user = services.users.get_user(claims.user_id).await?;
    if !user.is_active() {
        return Err(ServiceError::InvalidCredentials.into());
    }

    Ok(HttpResponse::Ok().json(issue_pair(&user, &config)?))
}

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser, services: web::Data<Services>) -> actix_web::Result<impl Responder> {
    let user = services.users.get_user(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}
