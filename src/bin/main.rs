#[cfg(not(target_arch = "wasm32"))]
mod native {
    use actix_web::{web, App as ActixApp, HttpRequest, HttpResponse, HttpServer};
    use bolt::core::db::MemoryDb;
    use bolt::core::media::DiskMedia;

    mod adapter {
        use actix_web::{web, HttpRequest, HttpResponse};

        pub fn to_api_request(
            req: &HttpRequest,
            body: web::Bytes,
        ) -> anyhow::Result<bolt::ApiRequest> {
            let mut builder = http::Request::builder()
                .method(req.method().as_str())
                .uri(req.uri().to_string());

            for (name, value) in req.headers() {
                if let Ok(v) = value.to_str() {
                    builder = builder.header(name.as_str(), v);
                }
            }

            Ok(builder.body(body.to_vec())?)
        }

        pub fn to_actix_response(resp: bolt::ApiResponse) -> HttpResponse {
            let status = actix_web::http::StatusCode::from_u16(resp.status().as_u16())
                .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
            let mut builder = HttpResponse::build(status);
            for (name, value) in resp.headers() {
                if let Ok(v) = value.to_str() {
                    builder.insert_header((name.as_str(), v));
                }
            }
            // The browser client runs on another origin
            builder.insert_header(("Access-Control-Allow-Origin", "*"));
            builder.body(resp.into_body())
        }
    }

    async fn handle_all(
        app: web::Data<bolt::App>,
        req: HttpRequest,
        body: web::Bytes,
    ) -> HttpResponse {
        if req.method() == actix_web::http::Method::OPTIONS {
            return HttpResponse::NoContent()
                .insert_header(("Access-Control-Allow-Origin", "*"))
                .insert_header(("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE"))
                .insert_header(("Access-Control-Allow-Headers", "Authorization, Content-Type"))
                .finish();
        }

        let api_req = match adapter::to_api_request(&req, body) {
            Ok(r) => r,
            Err(_) => {
                return HttpResponse::BadRequest()
                    .json(serde_json::json!({"message": "Invalid request"}))
            }
        };

        adapter::to_actix_response(app.handle(&api_req))
    }

    pub async fn run() -> std::io::Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();

        let port = std::env::var("BOLT_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(5000);
        let media_root =
            std::env::var("BOLT_MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());

        let app = web::Data::new(bolt::App::new(
            Box::new(MemoryDb::new()),
            Box::new(DiskMedia::new(media_root)),
        ));

        tracing::info!(port, "server listening");

        HttpServer::new(move || {
            ActixApp::new()
                .app_data(app.clone())
                .default_service(web::route().to(handle_all))
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    native::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
