//! End-to-end flows through the shared router over an in-memory store.

use bolt::core::token::TokenService;
use bolt::{ApiRequest, ApiResponse, App};
use serde_json::{json, Value};

const BOUNDARY: &str = "TESTBOUNDARY";

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&Value>) -> ApiRequest {
    let mut builder = http::Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let bytes = match body {
        Some(value) => {
            builder = builder.header("Content-Type", "application/json");
            serde_json::to_vec(value).unwrap()
        }
        None => Vec::new(),
    };
    builder.body(bytes).unwrap()
}

fn multipart_request(
    method: &str,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> ApiRequest {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (name, filename, data) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\r\n",
                BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    http::Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(body)
        .unwrap()
}

fn body_json(resp: &ApiResponse) -> Value {
    serde_json::from_slice(resp.body()).unwrap()
}

fn signup(app: &App, name: &str, email: &str, password: &str) -> ApiResponse {
    app.handle(&request(
        "POST",
        "/auth/signup",
        None,
        Some(&json!({ "name": name, "email": email, "password": password })),
    ))
}

fn login_token(app: &App, email: &str, password: &str) -> String {
    let resp = app.handle(&request(
        "POST",
        "/auth/login",
        None,
        Some(&json!({ "email": email, "password": password })),
    ));
    assert_eq!(resp.status(), 200);
    body_json(&resp)["token"].as_str().unwrap().to_string()
}

fn register(app: &App, name: &str, email: &str) -> String {
    assert_eq!(signup(app, name, email, "secret1").status(), 201);
    login_token(app, email, "secret1")
}

fn create_post(app: &App, token: &str, caption: &str) -> Value {
    let resp = app.handle(&request(
        "POST",
        "/post/post",
        Some(token),
        Some(&json!({ "caption": caption })),
    ));
    assert_eq!(resp.status(), 201);
    body_json(&resp)["post"].clone()
}

#[test]
fn signup_login_and_own_profile() {
    let app = App::in_memory();

    let resp = signup(&app, "alice", "a@x.com", "secret1");
    assert_eq!(resp.status(), 201);
    // Signup hands back no token; a separate login is required
    assert!(body_json(&resp).get("token").is_none());

    let token = login_token(&app, "a@x.com", "secret1");

    let resp = app.handle(&request("GET", "/user/me", Some(&token), None));
    assert_eq!(resp.status(), 200);
    let me = body_json(&resp);
    assert_eq!(me["name"], "alice");
    assert_eq!(me["email"], "a@x.com");
    assert!(me.get("passwordHashed").is_none());
}

#[test]
fn duplicate_email_conflicts_regardless_of_other_fields() {
    let app = App::in_memory();
    assert_eq!(signup(&app, "alice", "a@x.com", "secret1").status(), 201);

    let resp = signup(&app, "someone else", "a@x.com", "other-password");
    assert_eq!(resp.status(), 409);
    assert_eq!(body_json(&resp)["message"], "Email already registered");
}

#[test]
fn login_failures_are_enumeration_safe() {
    let app = App::in_memory();
    assert_eq!(signup(&app, "alice", "a@x.com", "secret1").status(), 201);

    let wrong_password = app.handle(&request(
        "POST",
        "/auth/login",
        None,
        Some(&json!({ "email": "a@x.com", "password": "nope" })),
    ));
    let unknown_email = app.handle(&request(
        "POST",
        "/auth/login",
        None,
        Some(&json!({ "email": "ghost@x.com", "password": "secret1" })),
    ));

    assert_eq!(wrong_password.status(), 401);
    assert_eq!(unknown_email.status(), 401);
    assert_eq!(
        body_json(&wrong_password)["message"],
        body_json(&unknown_email)["message"]
    );
    assert_eq!(
        body_json(&wrong_password)["message"],
        "Incorrect email or password"
    );
}

#[test]
fn verify_confirms_a_fresh_token_and_rejects_garbage() {
    let app = App::in_memory();
    let token = register(&app, "alice", "a@x.com");

    let resp = app.handle(&request("GET", "/auth/verify", Some(&token), None));
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(&resp)["user"]["name"], "alice");

    let resp = app.handle(&request("GET", "/auth/verify", Some("not.a.token"), None));
    assert_eq!(resp.status(), 401);
}

#[test]
fn expired_tokens_are_rejected() {
    let mut app = App::in_memory();
    app.tokens = TokenService::new(b"test-secret".to_vec(), 0);

    let token = register(&app, "alice", "a@x.com");
    let resp = app.handle(&request("GET", "/user/me", Some(&token), None));
    assert_eq!(resp.status(), 401);
    assert_eq!(body_json(&resp)["message"], "Token expired");
}

#[test]
fn valid_token_for_a_deleted_user_is_404() {
    let app = App::in_memory();
    let token = register(&app, "alice", "a@x.com");

    let resp = app.handle(&request("DELETE", "/user/me", Some(&token), None));
    assert_eq!(resp.status(), 200);

    let resp = app.handle(&request("GET", "/user/me", Some(&token), None));
    assert_eq!(resp.status(), 404);
}

#[test]
fn profile_update_is_partial() {
    let app = App::in_memory();
    let token = register(&app, "alice", "a@x.com");

    let resp = app.handle(&request(
        "PUT",
        "/user/me",
        Some(&token),
        Some(&json!({ "bio": "hello" })),
    ));
    assert_eq!(resp.status(), 200);
    let user = &body_json(&resp)["user"];
    assert_eq!(user["bio"], "hello");
    assert_eq!(user["name"], "alice");
}

#[test]
fn profile_image_upload_via_multipart() {
    let app = App::in_memory();
    let token = register(&app, "alice", "a@x.com");

    let resp = app.handle(&multipart_request(
        "PUT",
        "/user/me",
        &token,
        &[("bio", "new bio")],
        &[("pfp", "face.png", b"pngbytes")],
    ));
    assert_eq!(resp.status(), 200);
    let user = &body_json(&resp)["user"];
    assert_eq!(user["bio"], "new bio");
    let pfp = user["pfp"].as_str().unwrap();
    assert!(pfp.starts_with("pfp/"), "unexpected pfp path {}", pfp);
}

#[test]
fn public_profile_lookup_hides_email() {
    let app = App::in_memory();
    register(&app, "alice", "a@x.com");

    let resp = app.handle(&request("GET", "/user/alice", None, None));
    assert_eq!(resp.status(), 200);
    let users = body_json(&resp);
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert!(users[0].get("email").is_none());
    assert!(users[0].get("passwordHashed").is_none());
}

#[test]
fn follow_toggle_twice_restores_both_sides() {
    let app = App::in_memory();
    let token_a = register(&app, "alice", "a@x.com");
    let token_b = register(&app, "bob", "b@x.com");

    let me_b = body_json(&app.handle(&request("GET", "/user/me", Some(&token_b), None)));
    let bob_id = me_b["id"].as_str().unwrap().to_string();

    let resp = app.handle(&request(
        "PUT",
        &format!("/user/{}/follow", bob_id),
        Some(&token_a),
        None,
    ));
    assert_eq!(resp.status(), 200);

    let me_a = body_json(&app.handle(&request("GET", "/user/me", Some(&token_a), None)));
    let alice_id = me_a["id"].as_str().unwrap().to_string();
    assert_eq!(me_a["following"], json!([bob_id]));
    let me_b = body_json(&app.handle(&request("GET", "/user/me", Some(&token_b), None)));
    assert_eq!(me_b["followers"], json!([alice_id]));

    // Second toggle restores the original state on both documents
    let resp = app.handle(&request(
        "PUT",
        &format!("/user/{}/follow", bob_id),
        Some(&token_a),
        None,
    ));
    assert_eq!(resp.status(), 200);

    let me_a = body_json(&app.handle(&request("GET", "/user/me", Some(&token_a), None)));
    assert_eq!(me_a["following"], json!([]));
    let me_b = body_json(&app.handle(&request("GET", "/user/me", Some(&token_b), None)));
    assert_eq!(me_b["followers"], json!([]));
}

#[test]
fn follow_rejects_self_and_unknown_targets() {
    let app = App::in_memory();
    let token = register(&app, "alice", "a@x.com");
    let me = body_json(&app.handle(&request("GET", "/user/me", Some(&token), None)));
    let my_id = me["id"].as_str().unwrap();

    let resp = app.handle(&request(
        "PUT",
        &format!("/user/{}/follow", my_id),
        Some(&token),
        None,
    ));
    assert_eq!(resp.status(), 400);

    let resp = app.handle(&request(
        "PUT",
        "/user/no-such-user/follow",
        Some(&token),
        None,
    ));
    assert_eq!(resp.status(), 404);
}

#[test]
fn post_creation_via_multipart_derives_bolt_type() {
    let app = App::in_memory();
    let token = register(&app, "alice", "a@x.com");

    let resp = app.handle(&multipart_request(
        "POST",
        "/post/post",
        &token,
        &[("caption", "my picture")],
        &[("media", "sunset.png", b"pngbytes")],
    ));
    assert_eq!(resp.status(), 201);
    let post = &body_json(&resp)["post"];
    assert_eq!(post["type"], "post");
    assert_eq!(post["caption"], "my picture");
    assert_eq!(post["user"]["name"], "alice");

    let resp = app.handle(&multipart_request(
        "POST",
        "/post/post",
        &token,
        &[("caption", "my clip")],
        &[("media", "clip.mp4", b"mp4bytes")],
    ));
    assert_eq!(resp.status(), 201);
    let bolt = &body_json(&resp)["post"];
    assert_eq!(bolt["type"], "bolt");
    assert!(bolt["mediaPaths"][0]
        .as_str()
        .unwrap()
        .starts_with("posts/"));
}

#[test]
fn only_the_owner_may_update_or_delete_a_post() {
    let app = App::in_memory();
    let token_a = register(&app, "alice", "a@x.com");
    let token_b = register(&app, "bob", "b@x.com");

    let post = create_post(&app, &token_a, "mine");
    let post_id = post["id"].as_str().unwrap();

    let update = json!({ "caption": "stolen" });
    let resp = app.handle(&request(
        "PUT",
        &format!("/post/{}", post_id),
        Some(&token_b),
        Some(&update),
    ));
    assert_eq!(resp.status(), 403);

    let resp = app.handle(&request(
        "DELETE",
        &format!("/post/{}", post_id),
        Some(&token_b),
        None,
    ));
    assert_eq!(resp.status(), 403);

    let resp = app.handle(&request(
        "PUT",
        &format!("/post/{}", post_id),
        Some(&token_a),
        Some(&update),
    ));
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(&resp)["caption"], "stolen");

    let resp = app.handle(&request(
        "DELETE",
        &format!("/post/{}", post_id),
        Some(&token_a),
        None,
    ));
    assert_eq!(resp.status(), 200);

    let feed = body_json(&app.handle(&request("GET", "/post", None, None)));
    assert_eq!(feed["totalPosts"], 0);
}

#[test]
fn mutating_a_missing_post_is_404() {
    let app = App::in_memory();
    let token = register(&app, "alice", "a@x.com");

    for (method, path) in [
        ("PUT", "/post/missing"),
        ("DELETE", "/post/missing"),
        ("PUT", "/post/missing/like"),
    ] {
        let resp = app.handle(&request(method, path, Some(&token), Some(&json!({}))));
        assert_eq!(resp.status(), 404, "{} {}", method, path);
    }
}

#[test]
fn like_toggle_twice_restores_the_likes_set() {
    let app = App::in_memory();
    let token = register(&app, "alice", "a@x.com");
    let post = create_post(&app, &token, "likeable");
    let post_id = post["id"].as_str().unwrap();
    let like_uri = format!("/post/{}/like", post_id);

    let resp = app.handle(&request("PUT", &like_uri, Some(&token), None));
    assert_eq!(resp.status(), 200);
    let feed = body_json(&app.handle(&request("GET", "/post", None, None)));
    assert_eq!(feed["posts"][0]["likes"].as_array().unwrap().len(), 1);

    let resp = app.handle(&request("PUT", &like_uri, Some(&token), None));
    assert_eq!(resp.status(), 200);
    let feed = body_json(&app.handle(&request("GET", "/post", None, None)));
    assert_eq!(feed["posts"][0]["likes"], json!([]));
}

#[test]
fn feed_paginates_fifteen_items_as_ten_plus_five() {
    let app = App::in_memory();
    let token = register(&app, "alice", "a@x.com");
    for i in 0..15 {
        create_post(&app, &token, &format!("post {}", i));
    }

    let page1 = body_json(&app.handle(&request("GET", "/post?page=1&limit=10", None, None)));
    assert_eq!(page1["posts"].as_array().unwrap().len(), 10);
    assert_eq!(page1["currentPage"], 1);
    assert_eq!(page1["totalPages"], 2);
    assert_eq!(page1["totalPosts"], 15);
    // Newest first
    assert_eq!(page1["posts"][0]["caption"], "post 14");

    let page2 = body_json(&app.handle(&request("GET", "/post?page=2&limit=10", None, None)));
    assert_eq!(page2["posts"].as_array().unwrap().len(), 5);
    assert_eq!(page2["posts"][4]["caption"], "post 0");
}

#[test]
fn user_posts_listing_filters_by_owner() {
    let app = App::in_memory();
    let token_a = register(&app, "alice", "a@x.com");
    let token_b = register(&app, "bob", "b@x.com");
    create_post(&app, &token_a, "from alice");
    create_post(&app, &token_b, "from bob");

    let me_a = body_json(&app.handle(&request("GET", "/user/me", Some(&token_a), None)));
    let alice_id = me_a["id"].as_str().unwrap();

    let resp = app.handle(&request(
        "GET",
        &format!("/user/{}/posts", alice_id),
        None,
        None,
    ));
    assert_eq!(resp.status(), 200);
    let listing = body_json(&resp);
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["page"], 1);
    assert_eq!(listing["totalPages"], 1);
    assert_eq!(listing["posts"][0]["caption"], "from alice");
}

#[test]
fn comment_lifecycle_with_ownership_checks() {
    let app = App::in_memory();
    let token_a = register(&app, "alice", "a@x.com");
    let token_b = register(&app, "bob", "b@x.com");
    let post = create_post(&app, &token_a, "discuss");
    let post_id = post["id"].as_str().unwrap();
    let comments_uri = format!("/post/{}/comments", post_id);

    let resp = app.handle(&request(
        "POST",
        &comments_uri,
        Some(&token_b),
        Some(&json!({ "text": "nice one" })),
    ));
    assert_eq!(resp.status(), 201);
    let comment_id = body_json(&resp)["id"].as_str().unwrap().to_string();

    // Listing is public
    let resp = app.handle(&request("GET", &comments_uri, None, None));
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(&resp).as_array().unwrap().len(), 1);

    // Only the author may edit or delete
    let resp = app.handle(&request(
        "PUT",
        &format!("/comment/{}", comment_id),
        Some(&token_a),
        Some(&json!({ "text": "edited" })),
    ));
    assert_eq!(resp.status(), 403);

    let resp = app.handle(&request(
        "PUT",
        &format!("/comment/{}", comment_id),
        Some(&token_b),
        Some(&json!({ "text": "edited" })),
    ));
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(&resp)["text"], "edited");

    let resp = app.handle(&request(
        "DELETE",
        &format!("/comment/{}", comment_id),
        Some(&token_b),
        None,
    ));
    assert_eq!(resp.status(), 200);

    let resp = app.handle(&request("GET", &comments_uri, None, None));
    assert_eq!(body_json(&resp).as_array().unwrap().len(), 0);
}

#[test]
fn commenting_on_a_missing_post_is_404() {
    let app = App::in_memory();
    let token = register(&app, "alice", "a@x.com");
    let resp = app.handle(&request(
        "POST",
        "/post/missing/comments",
        Some(&token),
        Some(&json!({ "text": "hello?" })),
    ));
    assert_eq!(resp.status(), 404);
}

#[test]
fn conversation_is_the_unordered_pair_newest_first() {
    let app = App::in_memory();
    let token_a = register(&app, "alice", "a@x.com");
    let token_b = register(&app, "bob", "b@x.com");
    register(&app, "carol", "c@x.com");

    let ids: Vec<String> = [&token_a, &token_b]
        .iter()
        .map(|t| {
            body_json(&app.handle(&request("GET", "/user/me", Some(t), None)))["id"]
                .as_str()
                .unwrap()
                .to_string()
        })
        .collect();
    let (alice_id, bob_id) = (&ids[0], &ids[1]);

    for text in ["hi bob", "hi alice", "how are you?"] {
        let (token, to) = if text == "hi alice" {
            (&token_b, alice_id)
        } else {
            (&token_a, bob_id)
        };
        let resp = app.handle(&request(
            "POST",
            &format!("/message/{}", to),
            Some(token),
            Some(&json!({ "text": text })),
        ));
        assert_eq!(resp.status(), 201);
    }

    // Both participants see the same conversation, newest first
    for token in [&token_a, &token_b] {
        let other = if token == &token_a { bob_id } else { alice_id };
        let resp = app.handle(&request(
            "GET",
            &format!("/message/{}", other),
            Some(token),
            None,
        ));
        assert_eq!(resp.status(), 200);
        let msgs = body_json(&resp);
        let texts: Vec<&str> = msgs
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["text"].as_str().unwrap())
            .collect();
        assert_eq!(texts, vec!["how are you?", "hi alice", "hi bob"]);
    }
}

#[test]
fn conversation_is_capped_at_fifty_messages() {
    let app = App::in_memory();
    let token_a = register(&app, "alice", "a@x.com");
    let token_b = register(&app, "bob", "b@x.com");
    let bob_id = body_json(&app.handle(&request("GET", "/user/me", Some(&token_b), None)))["id"]
        .as_str()
        .unwrap()
        .to_string();

    for i in 0..55 {
        let resp = app.handle(&request(
            "POST",
            &format!("/message/{}", bob_id),
            Some(&token_a),
            Some(&json!({ "text": format!("m{}", i) })),
        ));
        assert_eq!(resp.status(), 201);
    }

    let resp = app.handle(&request(
        "GET",
        &format!("/message/{}", bob_id),
        Some(&token_a),
        None,
    ));
    let msgs = body_json(&resp);
    assert_eq!(msgs.as_array().unwrap().len(), 50);
    assert_eq!(msgs[0]["text"], "m54");
}

#[test]
fn only_the_sender_may_delete_a_message() {
    let app = App::in_memory();
    let token_a = register(&app, "alice", "a@x.com");
    let token_b = register(&app, "bob", "b@x.com");
    let bob_id = body_json(&app.handle(&request("GET", "/user/me", Some(&token_b), None)))["id"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = app.handle(&request(
        "POST",
        &format!("/message/{}", bob_id),
        Some(&token_a),
        Some(&json!({ "text": "secret" })),
    ));
    let message_id = body_json(&resp)["id"].as_str().unwrap().to_string();

    let resp = app.handle(&request(
        "DELETE",
        &format!("/message/{}", message_id),
        Some(&token_b),
        None,
    ));
    assert_eq!(resp.status(), 403);

    let resp = app.handle(&request(
        "DELETE",
        &format!("/message/{}", message_id),
        Some(&token_a),
        None,
    ));
    assert_eq!(resp.status(), 200);
}

#[test]
fn public_routes_need_no_token() {
    let app = App::in_memory();
    let token = register(&app, "alice", "a@x.com");
    let post = create_post(&app, &token, "open");
    let post_id = post["id"].as_str().unwrap();
    let me = body_json(&app.handle(&request("GET", "/user/me", Some(&token), None)));
    let alice_id = me["id"].as_str().unwrap();

    for path in [
        "/post".to_string(),
        "/user/alice".to_string(),
        format!("/user/{}/posts", alice_id),
        format!("/post/{}/comments", post_id),
    ] {
        let resp = app.handle(&request("GET", &path, None, None));
        assert_eq!(resp.status(), 200, "GET {}", path);
    }
}
