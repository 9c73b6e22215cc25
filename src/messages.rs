use crate::auth::authenticate;
use crate::config::{message_key, CONVERSATION_LIMIT, MESSAGES_LIST_KEY};
use crate::core::db::DbExt;
use crate::core::errors::ApiError;
use crate::core::helpers::{json_response, message_response};
use crate::models::models::Message;
use crate::{App, ApiRequest, ApiResponse};
use serde_json::json;

/// GET /message/:otherUserId — the conversation is derived from the
/// unordered sender/receiver pair, newest first, capped at 50. There is
/// no stored conversation entity.
pub fn get_conversation(
    app: &App,
    req: &ApiRequest,
    other_user_id: &str,
) -> anyhow::Result<ApiResponse> {
    let user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    let ids: Vec<String> = app.db.get_json(MESSAGES_LIST_KEY)?.unwrap_or_default();
    let mut conversation = Vec::new();
    // The list is maintained newest-first
    for id in ids {
        if conversation.len() == CONVERSATION_LIMIT {
            break;
        }
        if let Some(message) = app.db.get_json::<Message>(&message_key(&id))? {
            if message.between(&user.id, other_user_id) {
                conversation.push(serde_json::to_value(&message)?);
            }
        }
    }

    Ok(json_response(200, &serde_json::Value::Array(conversation)))
}

/// POST /message/:otherUserId — send a message.
pub fn send_message(
    app: &App,
    req: &ApiRequest,
    other_user_id: &str,
) -> anyhow::Result<ApiResponse> {
    let user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or(json!({}));
    let text = body["text"].as_str().unwrap_or_default();
    if text.is_empty() {
        return Ok(ApiError::Validation("Message text is required".into()).into());
    }

    let message = Message::new(&user.id, other_user_id, text);
    app.db.set_json(&message_key(&message.id), &message)?;

    let mut ids: Vec<String> = app.db.get_json(MESSAGES_LIST_KEY)?.unwrap_or_default();
    ids.insert(0, message.id.clone());
    app.db.set_json(MESSAGES_LIST_KEY, &ids)?;

    Ok(json_response(201, &serde_json::to_value(&message)?))
}

/// DELETE /message/:id — only the sender may delete.
pub fn delete_message(app: &App, req: &ApiRequest, message_id: &str) -> anyhow::Result<ApiResponse> {
    let user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    let Some(message) = app.db.get_json::<Message>(&message_key(message_id))? else {
        return Ok(ApiError::NotFound("Message not found".into()).into());
    };
    if message.sender != user.id {
        return Ok(ApiError::Forbidden("User not allowed to delete this message".into()).into());
    }

    app.db.delete(&message_key(message_id))?;

    let mut ids: Vec<String> = app.db.get_json(MESSAGES_LIST_KEY)?.unwrap_or_default();
    ids.retain(|id| id != message_id);
    app.db.set_json(MESSAGES_LIST_KEY, &ids)?;

    Ok(message_response(200, "Message deleted successfully"))
}
