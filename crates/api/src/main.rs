use std::sync::Arc;

#[tokio::main]
async fn main() {
    tillpoint_observability::init();

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let (services, auth_state) = match std::env::var("DATABASE_URL") {
        Ok(url) => tillpoint_api::app::services::build_pg_services(&url, jwt_secret.as_bytes())
            .await
            .expect("failed to connect to the database"),
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store");
            let (services, auth_state, _store) =
                tillpoint_api::app::services::build_memory_services(jwt_secret.as_bytes());
            (services, auth_state)
        }
    };

    let app = tillpoint_api::app::build_app(Arc::clone(&services), auth_state);

    let bind = std::env::var("TILLPOINT_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
