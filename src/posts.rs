use crate::auth::authenticate;
use crate::config::{post_key, user_key, FEED_KEY};
use crate::core::db::{Db, DbExt};
use crate::core::errors::ApiError;
use crate::core::helpers::{json_response, message_response, now_iso};
use crate::core::media::MediaStore as _;
use crate::core::multipart;
use crate::core::query_params::Pagination;
use crate::models::models::{Post, User};
use crate::{App, ApiRequest, ApiResponse};
use serde_json::json;

/// Post as listed to clients: the owner id is replaced by an embedded
/// author view, mirroring what the feed renders.
fn post_view(db: &dyn Db, post: &Post) -> anyhow::Result<serde_json::Value> {
    let mut value = serde_json::to_value(post)?;
    if let Some(author) = db.get_json::<User>(&user_key(&post.user))? {
        value["user"] = author.author_json();
    }
    Ok(value)
}

fn load_feed_posts(db: &dyn Db) -> anyhow::Result<Vec<Post>> {
    let feed: Vec<String> = db.get_json(FEED_KEY)?.unwrap_or_default();
    let mut posts = Vec::with_capacity(feed.len());
    // The feed list is maintained newest-first
    for id in feed {
        if let Some(post) = db.get_json::<Post>(&post_key(&id))? {
            posts.push(post);
        }
    }
    Ok(posts)
}

/// GET /post — public paginated global feed, newest first.
pub fn get_feed(app: &App, req: &ApiRequest) -> anyhow::Result<ApiResponse> {
    let pagination = Pagination::from_uri(&req.uri().to_string());
    let posts = load_feed_posts(app.db.as_ref())?;
    let total = posts.len();

    let mut page = Vec::new();
    for post in posts.iter().skip(pagination.skip()).take(pagination.limit) {
        page.push(post_view(app.db.as_ref(), post)?);
    }

    Ok(json_response(
        200,
        &json!({
            "posts": page,
            "currentPage": pagination.page,
            "totalPages": pagination.total_pages(total),
            "totalPosts": total,
        }),
    ))
}

/// GET /user/:userId/posts — public paginated posts of one user.
pub fn get_user_posts(app: &App, req: &ApiRequest, user_id: &str) -> anyhow::Result<ApiResponse> {
    let pagination = Pagination::from_uri(&req.uri().to_string());
    let posts: Vec<Post> = load_feed_posts(app.db.as_ref())?
        .into_iter()
        .filter(|p| p.user == user_id)
        .collect();
    let total = posts.len();

    let page: Vec<&Post> = posts
        .iter()
        .skip(pagination.skip())
        .take(pagination.limit)
        .collect();

    Ok(json_response(
        200,
        &json!({
            "posts": page,
            "total": total,
            "page": pagination.page,
            "totalPages": pagination.total_pages(total),
        }),
    ))
}

/// POST /post/post — create from a multipart form (`caption` field plus
/// any number of `media` files) or a plain JSON `{caption}` body.
pub fn create_post(app: &App, req: &ApiRequest) -> anyhow::Result<ApiResponse> {
    let user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    let content_type = req
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let (caption, media_paths) =
        if let Some(boundary) = multipart::boundary_from_content_type(content_type) {
            let form = match multipart::parse(boundary, req.body()) {
                Ok(form) => form,
                Err(e) => return Ok(ApiError::Validation(e.to_string()).into()),
            };
            let mut paths = Vec::new();
            for file in form.files_named("media") {
                paths.push(app.media.save("posts", &file.filename, &file.data)?);
            }
            (form.field("caption").unwrap_or_default().to_string(), paths)
        } else {
            let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or(json!({}));
            let caption = body["caption"].as_str().unwrap_or_default().to_string();
            (caption, Vec::new())
        };

    let post = Post::new(&user.id, &caption, media_paths);
    app.db.set_json(&post_key(&post.id), &post)?;

    let mut feed: Vec<String> = app.db.get_json(FEED_KEY)?.unwrap_or_default();
    feed.insert(0, post.id.clone()); // prepend newest
    app.db.set_json(FEED_KEY, &feed)?;

    Ok(json_response(
        201,
        &json!({ "post": post_view(app.db.as_ref(), &post)? }),
    ))
}

/// PUT /post/:id — owner-only caption/media update; the post type is
/// re-derived from the media paths.
pub fn update_post(app: &App, req: &ApiRequest, post_id: &str) -> anyhow::Result<ApiResponse> {
    let user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    let Some(mut post) = app.db.get_json::<Post>(&post_key(post_id))? else {
        return Ok(ApiError::NotFound("Post not found".into()).into());
    };
    if post.user != user.id {
        return Ok(ApiError::Forbidden("Not authorized to update this post".into()).into());
    }

    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap_or(json!({}));
    if let Some(caption) = body["caption"].as_str() {
        post.caption = caption.to_string();
    }
    if let Some(paths) = body["mediaPaths"].as_array() {
        post.media_paths = paths
            .iter()
            .filter_map(|p| p.as_str().map(str::to_string))
            .collect();
    }
    post.refresh_kind();
    post.updated_at = Some(now_iso());

    app.db.set_json(&post_key(&post.id), &post)?;
    Ok(json_response(200, &serde_json::to_value(&post)?))
}

/// DELETE /post/:id — owner-only; also detaches the post from the feed.
pub fn delete_post(app: &App, req: &ApiRequest, post_id: &str) -> anyhow::Result<ApiResponse> {
    let user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    let Some(post) = app.db.get_json::<Post>(&post_key(post_id))? else {
        return Ok(ApiError::NotFound("Post not found".into()).into());
    };
    if post.user != user.id {
        return Ok(ApiError::Forbidden("Not authorized to delete this post".into()).into());
    }

    app.db.delete(&post_key(post_id))?;

    let mut feed: Vec<String> = app.db.get_json(FEED_KEY)?.unwrap_or_default();
    feed.retain(|id| id != post_id);
    app.db.set_json(FEED_KEY, &feed)?;

    Ok(message_response(200, "Post deleted successfully!"))
}

/// PUT /post/:id/like — membership toggle of the actor in the likes set.
/// Read-then-write: two concurrent toggles by the same actor can race.
pub fn like_toggle(app: &App, req: &ApiRequest, post_id: &str) -> anyhow::Result<ApiResponse> {
    let user = match authenticate(app, req) {
        Ok(user) => user,
        Err(e) => return Ok(e.into()),
    };

    let Some(mut post) = app.db.get_json::<Post>(&post_key(post_id))? else {
        return Ok(ApiError::NotFound("Post not found".into()).into());
    };

    if post.likes.contains(&user.id) {
        post.likes.retain(|id| id != &user.id);
        app.db.set_json(&post_key(&post.id), &post)?;
        Ok(message_response(200, "Post unliked successfully"))
    } else {
        post.likes.push(user.id.clone());
        app.db.set_json(&post_key(&post.id), &post)?;
        Ok(message_response(200, "Post liked successfully"))
    }
}
