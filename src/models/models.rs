use crate::config::BOLT_EXTENSIONS;
use crate::core::helpers::now_iso;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hashed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pfp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub followers: Vec<String>,
    #[serde(default)]
    pub following: Vec<String>,
    #[serde(default)]
    pub saved_posts: Vec<String>,
    pub created_at: String,
}

impl User {
    pub fn new(name: &str, email: &str, password_hashed: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hashed,
            pfp: None,
            bio: None,
            followers: Vec::new(),
            following: Vec::new(),
            saved_posts: Vec::new(),
            created_at: now_iso(),
        }
    }

    /// Own-profile view: everything but the password hash.
    pub fn public_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "pfp": self.pfp,
            "bio": self.bio,
            "followers": self.followers,
            "following": self.following,
            "savedPosts": self.saved_posts,
            "createdAt": self.created_at,
        })
    }

    /// Lookup-by-name view: additionally hides the email.
    pub fn listing_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "name": self.name,
            "pfp": self.pfp,
            "bio": self.bio,
            "followers": self.followers,
            "following": self.following,
            "createdAt": self.created_at,
        })
    }

    /// Embedded author view on listed posts.
    pub fn author_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "name": self.name,
            "pfp": self.pfp,
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Post,
    Bolt,
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    /// Owner user id; only this user may update or delete the post.
    pub user: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub media_paths: Vec<String>,
    #[serde(rename = "type")]
    pub kind: PostKind,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub comments: Vec<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Post {
    pub fn new(user: &str, caption: &str, media_paths: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user: user.to_string(),
            caption: caption.to_string(),
            kind: Self::derive_kind(&media_paths),
            media_paths,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now_iso(),
            updated_at: None,
        }
    }

    /// A video extension on the last media file makes the post a "bolt".
    pub fn derive_kind(media_paths: &[String]) -> PostKind {
        let Some(last) = media_paths.last() else {
            return PostKind::Post;
        };
        let ext = last.rsplit('.').next().unwrap_or_default().to_lowercase();
        if BOLT_EXTENSIONS.contains(&ext.as_str()) {
            PostKind::Bolt
        } else {
            PostKind::Post
        }
    }

    pub fn refresh_kind(&mut self) {
        self.kind = Self::derive_kind(&self.media_paths);
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post: String,
    /// Author user id.
    pub user: String,
    pub text: String,
    pub created_at: String,
}

impl Comment {
    pub fn new(post: &str, user: &str, text: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            post: post.to_string(),
            user: user.to_string(),
            text: text.to_string(),
            created_at: now_iso(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub receiver: String,
    pub text: String,
    pub created_at: String,
}

impl Message {
    pub fn new(sender: &str, receiver: &str, text: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            text: text.to_string(),
            created_at: now_iso(),
        }
    }

    /// A conversation is the unordered sender/receiver pair.
    pub fn between(&self, a: &str, b: &str) -> bool {
        (self.sender == a && self.receiver == b) || (self.sender == b && self.receiver == a)
    }
}
