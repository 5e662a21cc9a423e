//! Operator API, served on its own listener behind a bearer key.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/responders", get(get_responders))
        .route("/admin/alerts", get(get_alerts))
        .route("/admin/authority/bootstrap", post(bootstrap_authority))
        .route("/admin/snapshot", post(save_snapshot))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin router until shutdown.
pub async fn serve_admin(
    listener: TcpListener,
    state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Admin API starting");
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterConfig;
    use crate::lifecycle::build_core;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state(initial: Option<&str>) -> AppState {
        let mut config = RouterConfig::default();
        config.authority.initial = initial.map(String::from);
        AppState {
            core: build_core(&config).unwrap(),
            admin_api_key: Arc::new("secret".into()),
        }
    }

    #[tokio::test]
    async fn test_admin_requires_bearer_key() {
        let router = setup_admin_router(state(None));

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/admin/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/admin/status")
                    .header("authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bootstrap_only_once() {
        let state = state(None);
        let router = setup_admin_router(state.clone());

        let bootstrap = |who: &str| {
            Request::builder()
                .method("POST")
                .uri("/admin/authority/bootstrap")
                .header("authorization", "Bearer secret")
                .header("content-type", "application/json")
                .body(Body::from(format!(r#"{{"authority":"{who}"}}"#)))
                .unwrap()
        };

        let response = router.clone().oneshot(bootstrap("root")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.core.authority.is_authority(&"root".into()));

        let response = router.oneshot(bootstrap("intruder")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(state.core.authority.is_authority(&"root".into()));
    }
}
