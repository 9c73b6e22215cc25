use crate::auth::authenticate;
use crate::config::{comment_key, post_key};
use crate::core::db::DbExt;
use crate::core::errors::ApiError;
use crate::core::helpers::{json_response, message_response};
use crate::models::models::{Comment, Post};
use crate::{App, ApiRequest, ApiResponse};
use serde_json::json;

/// GET /post/:postId/comments — public, in the order they were added.
pub fn get_comments(app: &App, post_id: &str) -> anyhow::Result<ApiResponse> {
    let Some(post) = app.db.get_json::<Post>(&post_key(post_id))? else {
        return Ok(ApiError::NotFound("Post not found".into()).into());
    };

    let mut comments = Vec::with_capacity(post.comments.len());
    for id in &post.comments {
        if let Some(comment) = app.db.get_json::<Comment>(&comment_key(id))? {
            comments.push(serde_json::to_value(&comment)?);
        }
    }
    Ok(json_response(200, &serde_json::Value::Array(comments)))
}

/// POST /post/:postId/comments — create and append to the post.
pub fn post_comment(app: &App, req: &ApiRequest, post_id: &str) -> anyhow::Result<ApiResponse> {
    let user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    let Some(mut post) = app.db.get_json::<Post>(&post_key(post_id))? else {
        return Ok(ApiError::NotFound("Post not found".into()).into());
    };

    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or(json!({}));
    let text = body["text"].as_str().unwrap_or_default();
    if text.is_empty() {
        return Ok(ApiError::Validation("Comment text is required".into()).into());
    }

    let comment = Comment::new(&post.id, &user.id, text);
    app.db.set_json(&comment_key(&comment.id), &comment)?;

    post.comments.push(comment.id.clone());
    app.db.set_json(&post_key(&post.id), &post)?;

    Ok(json_response(201, &serde_json::to_value(&comment)?))
}

/// PUT /comment/:id — author-only text update.
pub fn update_comment(app: &App, req: &ApiRequest, comment_id: &str) -> anyhow::Result<ApiResponse> {
    let user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    let Some(mut comment) = app.db.get_json::<Comment>(&comment_key(comment_id))? else {
        return Ok(ApiError::NotFound("Comment not found".into()).into());
    };
    if comment.user != user.id {
        return Ok(ApiError::Forbidden("User not allowed to update this comment".into()).into());
    }

    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or(json!({}));
    if let Some(text) = body["text"].as_str().filter(|t| !t.is_empty()) {
        comment.text = text.to_string();
    }

    app.db.set_json(&comment_key(&comment.id), &comment)?;
    Ok(json_response(200, &serde_json::to_value(&comment)?))
}

/// DELETE /comment/:id — author-only; also detached from its post.
pub fn delete_comment(app: &App, req: &ApiRequest, comment_id: &str) -> anyhow::Result<ApiResponse> {
    let user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    let Some(comment) = app.db.get_json::<Comment>(&comment_key(comment_id))? else {
        return Ok(ApiError::NotFound("Comment not found".into()).into());
    };
    if comment.user != user.id {
        return Ok(ApiError::Forbidden("User not allowed to delete this comment".into()).into());
    }

    app.db.delete(&comment_key(comment_id))?;

    if let Some(mut post) = app.db.get_json::<Post>(&post_key(&comment.post))? {
        post.comments.retain(|id| id != comment_id);
        app.db.set_json(&post_key(&post.id), &post)?;
    }

    Ok(message_response(200, "Comment deleted successfully"))
}
