pub mod auth;
pub mod comments;
pub mod config;
pub mod core;
pub mod messages;
pub mod models;
pub mod posts;
pub mod users;

#[cfg(not(target_arch = "wasm32"))]
pub mod client;

#[cfg(target_arch = "wasm32")]
mod spin;

use crate::core::db::{Db, MemoryDb};
use crate::core::errors::ApiError;
use crate::core::media::{MediaStore, MemoryMedia};
use crate::core::token::TokenService;

pub type ApiRequest = http::Request<Vec<u8>>;
pub type ApiResponse = http::Response<Vec<u8>>;

/// Everything a request handler needs: the document store, the object
/// store for uploads and the token service. Both deployment front-ends
/// (the Spin component and the actix binary) build one of these and feed
/// it requests.
pub struct App {
    pub db: Box<dyn Db>,
    pub media: Box<dyn MediaStore>,
    pub tokens: TokenService,
}

impl App {
    pub fn new(db: Box<dyn Db>, media: Box<dyn MediaStore>) -> Self {
        Self {
            db,
            media,
            tokens: TokenService::default(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryDb::new()), Box::new(MemoryMedia::new()))
    }

    pub fn handle(&self, req: &ApiRequest) -> ApiResponse {
        let method = req.method().as_str().to_string();
        let path = req.uri().path().to_string();
        match self.route(&method, &path, req) {
            Ok(resp) => {
                tracing::debug!(%method, %path, status = resp.status().as_u16(), "handled");
                resp
            }
            Err(err) => {
                tracing::error!(%method, %path, error = %err, "handler failed");
                ApiError::Internal("Internal server error".into()).into()
            }
        }
    }

    fn route(&self, method: &str, path: &str, req: &ApiRequest) -> anyhow::Result<ApiResponse> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match (method, segments.as_slice()) {
            ("POST", ["auth", "signup"]) => auth::signup(self, req),
            ("POST", ["auth", "login"]) => auth::login(self, req),
            ("GET", ["auth", "verify"]) => auth::verify(self, req),

            ("GET", ["user", "me"]) => users::get_me(self, req),
            ("PUT", ["user", "me"]) => users::update_me(self, req),
            ("DELETE", ["user", "me"]) => users::delete_me(self, req),
            ("PUT", ["user", id, "follow"]) => users::follow_toggle(self, req, id),
            ("GET", ["user", user_id, "posts"]) => posts::get_user_posts(self, req, user_id),
            ("GET", ["user", name]) => users::get_by_name(self, name),

            ("GET", ["post"]) => posts::get_feed(self, req),
            ("POST", ["post", "post"]) => posts::create_post(self, req),
            ("PUT", ["post", id, "like"]) => posts::like_toggle(self, req, id),
            ("GET", ["post", post_id, "comments"]) => comments::get_comments(self, post_id),
            ("POST", ["post", post_id, "comments"]) => comments::post_comment(self, req, post_id),
            ("PUT", ["post", id]) => posts::update_post(self, req, id),
            ("DELETE", ["post", id]) => posts::delete_post(self, req, id),

            ("PUT", ["comment", id]) => comments::update_comment(self, req, id),
            ("DELETE", ["comment", id]) => comments::delete_comment(self, req, id),

            ("GET", ["message", other_user_id]) => {
                messages::get_conversation(self, req, other_user_id)
            }
            ("POST", ["message", other_user_id]) => messages::send_message(self, req, other_user_id),
            ("DELETE", ["message", id]) => messages::delete_message(self, req, id),

            _ => Ok(ApiError::NotFound("No route found".into()).into()),
        }
    }
}
