//! Typed API client mirroring the frontend's auth context: one piece of
//! state holding the session token and the current profile, hydrated from
//! persisted storage on startup and torn down on any 401.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

pub const TOKEN_KEY: &str = "bolt-token";
pub const THEME_KEY: &str = "bolt-theme";

/// Persisted client state: the session token and a theme preference,
/// each under a fixed key.
pub trait ClientStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryStorage {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self
            .map
            .write()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self
            .map
            .write()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        map.remove(key);
        Ok(())
    }
}

/// Single JSON file keyed like browser local storage.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> HashMap<String, String> {
        std::fs::read(&self.path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }

    fn store(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(map)?)?;
        Ok(())
    }
}

impl ClientStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.load().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.load();
        map.insert(key.to_string(), value.to_string());
        self.store(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.load();
        map.remove(key);
        self.store(&map)
    }
}

/// Own-profile view as served by GET /user/me.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub pfp: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub followers: Vec<String>,
    #[serde(default)]
    pub following: Vec<String>,
    #[serde(default)]
    pub saved_posts: Vec<String>,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AuthState {
    Uninitialized,
    Loading,
    Authenticated(UserProfile),
    Anonymous,
}

pub struct BoltClient {
    base_url: String,
    http: reqwest::Client,
    storage: Box<dyn ClientStorage>,
    state: AuthState,
}

impl BoltClient {
    pub fn new(base_url: impl Into<String>, storage: Box<dyn ClientStorage>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            storage,
            state: AuthState::Uninitialized,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY)
    }

    pub fn theme(&self) -> Option<String> {
        self.storage.get(THEME_KEY)
    }

    pub fn set_theme(&self, theme: &str) -> Result<()> {
        self.storage.set(THEME_KEY, theme)
    }

    /// Startup hydration: a persisted token is validated by fetching the
    /// own profile; on failure the token is cleared and the client
    /// settles on Anonymous.
    pub async fn init(&mut self) -> Result<()> {
        if self.token().is_none() {
            self.state = AuthState::Anonymous;
            return Ok(());
        }
        self.state = AuthState::Loading;
        match self.fetch_profile().await {
            Ok(user) => self.state = AuthState::Authenticated(user),
            Err(_) => {
                self.storage.remove(TOKEN_KEY)?;
                self.state = AuthState::Anonymous;
            }
        }
        Ok(())
    }

    /// Ok(true) on success, Ok(false) when the server rejects the
    /// credentials, Err on transport failure.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<bool> {
        let resp = self
            .http
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Ok(false);
        }
        let body: serde_json::Value = resp.json().await?;
        let Some(token) = body["token"].as_str() else {
            bail!("login response carried no token");
        };
        self.storage.set(TOKEN_KEY, token)?;

        let user = self.fetch_profile().await?;
        self.state = AuthState::Authenticated(user);
        Ok(true)
    }

    /// Signup issues no token, so a successful signup logs in separately.
    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> Result<bool> {
        let resp = self
            .http
            .post(self.url("/auth/signup"))
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Ok(false);
        }
        self.login(email, password).await
    }

    /// Local only: clears the persisted token and resets state. No
    /// server call, since tokens are stateless.
    pub fn logout(&mut self) {
        let _ = self.storage.remove(TOKEN_KEY);
        self.state = AuthState::Anonymous;
    }

    /// Authenticated GET returning the response body. Any 401, whatever
    /// the request, forces sign-out first.
    pub async fn get_json(&mut self, path: &str) -> Result<serde_json::Value> {
        let resp = self.send(self.http.get(self.url(path))).await?;
        if !resp.status().is_success() {
            bail!("request failed: {}", resp.status());
        }
        Ok(resp.json().await?)
    }

    async fn fetch_profile(&mut self) -> Result<UserProfile> {
        let resp = self.send(self.http.get(self.url("/user/me"))).await?;
        if !resp.status().is_success() {
            bail!("profile fetch failed: {}", resp.status());
        }
        Ok(resp.json().await?)
    }

    async fn send(&mut self, req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let req = match self.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let resp = req.send().await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.force_sign_out();
        }
        Ok(resp)
    }

    fn force_sign_out(&mut self) {
        let _ = self.storage.remove(TOKEN_KEY);
        self.state = AuthState::Anonymous;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "t0k3n").unwrap();
        assert_eq!(storage.get(TOKEN_KEY), Some("t0k3n".to_string()));
        storage.remove(TOKEN_KEY).unwrap();
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        FileStorage::new(&path).set(THEME_KEY, "dark").unwrap();
        assert_eq!(FileStorage::new(&path).get(THEME_KEY), Some("dark".to_string()));
    }

    #[tokio::test]
    async fn init_without_token_settles_on_anonymous() {
        let mut client = BoltClient::new("http://unused", Box::new(MemoryStorage::new()));
        assert_eq!(*client.state(), AuthState::Uninitialized);
        client.init().await.unwrap();
        assert_eq!(*client.state(), AuthState::Anonymous);
    }

    #[test]
    fn forced_sign_out_clears_token_and_state() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "stale").unwrap();
        let mut client = BoltClient::new("http://unused", Box::new(storage));
        client.force_sign_out();
        assert_eq!(client.token(), None);
        assert_eq!(*client.state(), AuthState::Anonymous);
    }

    #[test]
    fn logout_is_local_only() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "t").unwrap();
        storage.set(THEME_KEY, "dark").unwrap();
        let mut client = BoltClient::new("http://unused", Box::new(storage));
        client.logout();
        assert_eq!(client.token(), None);
        // Theme preference survives sign-out
        assert_eq!(client.theme(), Some("dark".to_string()));
    }
}
