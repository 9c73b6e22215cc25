use crate::config::{user_key, USERS_LIST_KEY};
use crate::core::db::DbExt;
use crate::core::errors::ApiError;
use crate::core::helpers::{
    bearer_token, hash_password, json_response, message_response, verify_password,
};
use crate::core::token::TokenError;
use crate::models::models::User;
use crate::users::find_user_by_email;
use crate::{App, ApiRequest, ApiResponse};
use serde_json::json;

pub fn signup(app: &App, req: &ApiRequest) -> anyhow::Result<ApiResponse> {
    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or(json!({}));
    let name = body["name"].as_str().unwrap_or("");
    let email = body["email"].as_str().unwrap_or("");
    let password = body["password"].as_str().unwrap_or("");

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Ok(ApiError::Validation("Name, email and password are required".into()).into());
    }

    if find_user_by_email(app.db.as_ref(), email)?.is_some() {
        return Ok(ApiError::Conflict("Email already registered".into()).into());
    }

    let user = User::new(name, email, hash_password(password)?);
    app.db.set_json(&user_key(&user.id), &user)?;

    let mut users: Vec<String> = app.db.get_json(USERS_LIST_KEY)?.unwrap_or_default();
    users.push(user.id.clone());
    app.db.set_json(USERS_LIST_KEY, &users)?;

    // No token on signup; the client logs in separately.
    Ok(message_response(201, "New user created successfully!"))
}

pub fn login(app: &App, req: &ApiRequest) -> anyhow::Result<ApiResponse> {
    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or(json!({}));
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    // Unknown email and wrong password produce the same response so the
    // endpoint cannot be used to enumerate accounts.
    let Some(user) = find_user_by_email(app.db.as_ref(), email)? else {
        tracing::debug!("login rejected: unknown email");
        return Ok(ApiError::Unauthorized("Incorrect email or password".into()).into());
    };
    if !verify_password(password, &user.password_hashed) {
        tracing::debug!("login rejected: bad password");
        return Ok(ApiError::Unauthorized("Incorrect email or password".into()).into());
    }

    let token = app.tokens.issue(&user.id, &user.email)?;

    Ok(json_response(
        200,
        &json!({
            "message": "Logged in successfully!",
            "token": token,
            "user": {
                "id": user.id,
                "name": user.name,
                "email": user.email,
                "pfp": user.pfp,
                "bio": user.bio,
                "followers": user.followers,
                "following": user.following,
            },
        }),
    ))
}

pub fn verify(app: &App, req: &ApiRequest) -> anyhow::Result<ApiResponse> {
    let user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    Ok(json_response(
        200,
        &json!({
            "message": "Token is valid",
            "user": {
                "id": user.id,
                "name": user.name,
                "email": user.email,
            },
        }),
    ))
}

/// Session middleware equivalent: runs before every bearer route.
/// Missing, invalid or expired token → 401; a valid token whose user no
/// longer exists → 404; otherwise the resolved user is handed back.
pub fn authenticate(app: &App, req: &ApiRequest) -> Result<User, ApiError> {
    let token =
        bearer_token(req).ok_or_else(|| ApiError::Unauthorized("No token provided".into()))?;

    let claims = app.tokens.verify(token).map_err(|e| match e {
        TokenError::Expired => ApiError::Unauthorized("Token expired".into()),
        TokenError::Invalid => ApiError::Unauthorized("Invalid token".into()),
    })?;

    let user: Option<User> = app
        .db
        .get_json(&user_key(&claims.sub))
        .map_err(ApiError::from)?;
    user.ok_or_else(|| ApiError::NotFound("User not found".into()))
}
