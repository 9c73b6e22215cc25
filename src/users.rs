use crate::auth::authenticate;
use crate::config::{user_key, USERS_LIST_KEY};
use crate::core::db::{Db, DbExt};
use crate::core::errors::ApiError;
use crate::core::helpers::{json_response, message_response};
use crate::core::media::MediaStore as _;
use crate::core::multipart;
use crate::models::models::User;
use crate::{App, ApiRequest, ApiResponse};
use serde_json::json;

pub(crate) fn find_user_by_email(db: &dyn Db, email: &str) -> anyhow::Result<Option<User>> {
    let users: Vec<String> = db.get_json(USERS_LIST_KEY)?.unwrap_or_default();
    for id in users {
        if let Some(u) = db.get_json::<User>(&user_key(&id))? {
            if u.email == email {
                return Ok(Some(u));
            }
        }
    }
    Ok(None)
}

pub fn get_me(app: &App, req: &ApiRequest) -> anyhow::Result<ApiResponse> {
    let user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };
    Ok(json_response(200, &user.public_json()))
}

/// Partial profile update: JSON `{name, bio}` or a multipart form whose
/// `pfp` file replaces the profile image through the media store.
pub fn update_me(app: &App, req: &ApiRequest) -> anyhow::Result<ApiResponse> {
    let mut user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    let content_type = req
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if let Some(boundary) = multipart::boundary_from_content_type(content_type) {
        let form = match multipart::parse(boundary, req.body()) {
            Ok(form) => form,
            Err(e) => return Ok(ApiError::Validation(e.to_string()).into()),
        };
        if let Some(name) = form.field("name").filter(|s| !s.is_empty()) {
            user.name = name.to_string();
        }
        if let Some(bio) = form.field("bio") {
            user.bio = Some(bio.to_string());
        }
        if let Some(file) = form.files_named("pfp").next() {
            let path = app.media.save("pfp", &file.filename, &file.data)?;
            user.pfp = Some(path);
        };
    } else {
        let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or(json!({}));
        if let Some(name) = body["name"].as_str().filter(|s| !s.is_empty()) {
            user.name = name.to_string();
        }
        if let Some(bio) = body["bio"].as_str() {
            user.bio = Some(bio.to_string());
        }
    }

    app.db.set_json(&user_key(&user.id), &user)?;
    Ok(json_response(200, &json!({ "user": user.public_json() })))
}

/// Deletes the account document only. Posts, comments and messages the
/// user created stay behind; there is no cascade.
pub fn delete_me(app: &App, req: &ApiRequest) -> anyhow::Result<ApiResponse> {
    let user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    app.db.delete(&user_key(&user.id))?;

    let mut users: Vec<String> = app.db.get_json(USERS_LIST_KEY)?.unwrap_or_default();
    users.retain(|id| id != &user.id);
    app.db.set_json(USERS_LIST_KEY, &users)?;

    Ok(message_response(200, "User deleted successfully!"))
}

pub fn get_by_name(app: &App, name: &str) -> anyhow::Result<ApiResponse> {
    let name = urlencoding::decode(name)
        .unwrap_or(std::borrow::Cow::Borrowed(name))
        .to_string();

    let users: Vec<String> = app.db.get_json(USERS_LIST_KEY)?.unwrap_or_default();
    let mut found = Vec::new();
    for id in users {
        if let Some(u) = app.db.get_json::<User>(&user_key(&id))? {
            if u.name == name {
                found.push(u.listing_json());
            }
        }
    }
    Ok(json_response(200, &serde_json::Value::Array(found)))
}

/// Follow toggle: actor present in the target's followers removes both
/// edges, otherwise both are added. The two documents are written
/// separately, so there is no cross-document atomicity.
pub fn follow_toggle(app: &App, req: &ApiRequest, target_id: &str) -> anyhow::Result<ApiResponse> {
    let mut me = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    if target_id == me.id {
        return Ok(ApiError::Validation("Can not follow yourself".into()).into());
    }

    let Some(mut target) = app.db.get_json::<User>(&user_key(target_id))? else {
        return Ok(ApiError::NotFound("User not found".into()).into());
    };

    if target.followers.contains(&me.id) {
        target.followers.retain(|id| id != &me.id);
        app.db.set_json(&user_key(&target.id), &target)?;
        me.following.retain(|id| id != &target.id);
        app.db.set_json(&user_key(&me.id), &me)?;
        Ok(message_response(200, "User unfollowed successfully!"))
    } else {
        target.followers.push(me.id.clone());
        app.db.set_json(&user_key(&target.id), &target)?;
        me.following.push(target.id.clone());
        app.db.set_json(&user_key(&me.id), &me)?;
        Ok(message_response(200, "User followed successfully!"))
    }
}
