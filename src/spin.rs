//! Spin deployment front-end: adapts component requests onto the shared
//! router and backs the store seams with Spin's key-value store.

use crate::core::db::Db;
use crate::core::media::{storage_path, MediaStore};
use crate::{App, ApiRequest, ApiResponse};
use anyhow::Result;
use spin_sdk::http::{IntoResponse, Request, Response};
use spin_sdk::http_component;
use spin_sdk::key_value::Store;

/// Opens the default store per operation; the handle is not kept across
/// calls so the type stays thread-marker free.
struct SpinDb;

impl Db for SpinDb {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let store = Store::open_default()?;
        Ok(store.get(key)?)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let store = Store::open_default()?;
        Ok(store.set(key, value)?)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let store = Store::open_default()?;
        Ok(store.delete(key)?)
    }
}

/// Media blobs live in the same store under a `media:` prefix.
struct KvMedia;

impl MediaStore for KvMedia {
    fn save(&self, folder: &str, filename: &str, data: &[u8]) -> Result<String> {
        let path = storage_path(folder, filename);
        let store = Store::open_default()?;
        store.set(&format!("media:{}", path), data)?;
        Ok(path)
    }
}

fn to_api_request(req: &Request) -> Result<ApiRequest> {
    let mut builder = http::Request::builder()
        .method(req.method().to_string().as_str())
        .uri(req.uri());
    for (name, value) in req.headers() {
        if let Some(v) = value.as_str() {
            builder = builder.header(name, v);
        }
    }
    Ok(builder.body(req.body().to_vec())?)
}

fn to_spin_response(resp: ApiResponse) -> Response {
    let status = resp.status().as_u16();
    let mut builder = Response::builder();
    builder.status(status);
    for (name, value) in resp.headers() {
        if let Ok(v) = value.to_str() {
            builder.header(name.as_str(), v);
        }
    }
    builder.body(resp.into_body()).build()
}

#[http_component]
fn handle(req: Request) -> Result<impl IntoResponse> {
    let app = App::new(Box::new(SpinDb), Box::new(KvMedia));
    let api_req = to_api_request(&req)?;
    Ok(to_spin_response(app.handle(&api_req)))
}
