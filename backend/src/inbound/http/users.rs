//! Users API handlers.
//!
//! ```text
//! POST /api/login   {"username":"admin","password":"admin"}
//! POST /api/logout  {"token":"…"}
//! POST /api/verify  {"token":"…"}
//! POST /api/refresh {"token":"…"}
//! GET  /api/users   Authorization: Bearer …
//! ```
//!
//! Token-bearing endpoints accept the token as a bearer header or in the
//! JSON body; `/api/users` also takes a `token` query parameter.

use actix_web::{HttpRequest, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    Error, IssuedToken, LoginCredentials, LoginValidationError, SessionToken, User, UserProfile,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::presented_token;
use crate::inbound::http::state::UsersState;

/// Login request body for `POST /api/login`.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl TryFrom<&LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: &LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

/// Issued token with its owner.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
    #[schema(value_type = String)]
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            success: true,
            token: issued.token.expose().to_owned(),
            expires_at: issued.expires_at,
            user: issued.user,
        }
    }
}

/// Body carrying a token.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TokenRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// Logout acknowledgement.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// Successful verification.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: UserProfile,
}

/// User listing for administrators.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => {
            Error::invalid_request("Username and password are required")
                .with_details(json!({ "field": "username", "code": "empty_username" }))
        }
        LoginValidationError::EmptyPassword => {
            Error::invalid_request("Username and password are required")
                .with_details(json!({ "field": "password", "code": "empty_password" }))
        }
    }
}

fn body_token(body: Option<&web::Json<TokenRequest>>) -> Option<&str> {
    body.and_then(|body| body.token.as_deref())
}

fn require_token(token: Option<SessionToken>) -> Result<SessionToken, Error> {
    token.ok_or_else(|| Error::invalid_request("Token is required"))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = TokenResponse),
        (status = 400, description = "Missing credentials", body = Error),
        (status = 401, description = "Invalid credentials", body = Error)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/api/login")]
pub async fn login(
    state: web::Data<UsersState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    let credentials =
        LoginCredentials::try_from(&payload.into_inner()).map_err(map_login_validation_error)?;
    let issued = state.auth.login(&credentials).await?;
    Ok(web::Json(issued.into()))
}

/// Revoke a token. Unknown tokens are not an error.
#[utoipa::path(
    post,
    path = "/api/logout",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse),
        (status = 400, description = "Token missing", body = Error)
    ),
    tags = ["users"],
    operation_id = "logout"
)]
#[post("/api/logout")]
pub async fn logout(
    state: web::Data<UsersState>,
    req: HttpRequest,
    body: Option<web::Json<TokenRequest>>,
) -> ApiResult<web::Json<LogoutResponse>> {
    let token = require_token(presented_token(req.headers(), [body_token(body.as_ref())]))?;
    state.auth.logout(&token).await?;
    Ok(web::Json(LogoutResponse {
        success: true,
        message: "Logged out successfully".to_owned(),
    }))
}

/// Resolve a token to its owner.
#[utoipa::path(
    post,
    path = "/api/verify",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token valid", body = VerifyResponse),
        (status = 400, description = "Token missing", body = Error),
        (status = 401, description = "Invalid or expired token", body = Error)
    ),
    tags = ["users"],
    operation_id = "verify"
)]
#[post("/api/verify")]
pub async fn verify(
    state: web::Data<UsersState>,
    req: HttpRequest,
    body: Option<web::Json<TokenRequest>>,
) -> ApiResult<web::Json<VerifyResponse>> {
    let token = require_token(presented_token(req.headers(), [body_token(body.as_ref())]))?;
    let user = state.auth.verify(&token).await?;
    Ok(web::Json(VerifyResponse { valid: true, user }))
}

/// Swap a live token for a new one; the old token stops working.
#[utoipa::path(
    post,
    path = "/api/refresh",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token rotated", body = TokenResponse),
        (status = 400, description = "Token missing", body = Error),
        (status = 401, description = "Invalid or expired token", body = Error)
    ),
    tags = ["users"],
    operation_id = "refresh"
)]
#[post("/api/refresh")]
pub async fn refresh(
    state: web::Data<UsersState>,
    req: HttpRequest,
    body: Option<web::Json<TokenRequest>>,
) -> ApiResult<web::Json<TokenResponse>> {
    let token = require_token(presented_token(req.headers(), [body_token(body.as_ref())]))?;
    let issued = state.auth.refresh(&token).await?;
    Ok(web::Json(issued.into()))
}

/// List every user. Administrators only.
#[utoipa::path(
    get,
    path = "/api/users",
    params(("token" = Option<String>, Query, description = "Token when no bearer header is sent")),
    responses(
        (status = 200, description = "Users", body = UsersResponse),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 403, description = "Admin access required", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/api/users")]
pub async fn list_users(
    state: web::Data<UsersState>,
    req: HttpRequest,
    query: web::Query<TokenRequest>,
    body: Option<web::Json<TokenRequest>>,
) -> ApiResult<web::Json<UsersResponse>> {
    let token = presented_token(
        req.headers(),
        [body_token(body.as_ref()), query.token.as_deref()],
    )
    .ok_or_else(|| Error::unauthorized("Token is required"))?;
    let users = state.auth.list_users(&token).await?;
    Ok(web::Json(UsersResponse { users }))
}

/// Register the users routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login)
        .service(logout)
        .service(verify)
        .service(refresh)
        .service(list_users);
}

#[cfg(test)]
mod tests;
