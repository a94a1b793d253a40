use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use super::types::SessionClaims;
use crate::shared::{AppError, AppState};

/// Validates a token and makes sure its player is known to the directory.
/// Shared by the HTTP middleware and the websocket handshake.
pub async fn authenticate(state: &AppState, token: &str) -> Result<SessionClaims, AppError> {
    let claims = state.token_config.validate_token(token).map_err(|e| {
        warn!("JWT authentication failed: {}", e);
        e
    })?;

    state
        .player_directory
        .ensure_player(claims.profile())
        .await
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    Ok(claims)
}

/// JWT authentication middleware - validates Authorization Bearer header and adds SessionClaims to request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), session::jwt_auth))
/// Handlers can then extract Extension(claims): Extension<SessionClaims>.
#[instrument(skip(state, req, next))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let claims = authenticate(&state, token).await?;

    debug!(
        player_id = %claims.player_id,
        uri = %req.uri(),
        "Authentication successful, adding claims to request"
    );

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::{profile, AppStateBuilder};
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt; // for `oneshot`

    async fn whoami(Extension(claims): Extension<SessionClaims>) -> String {
        claims.player_id
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(from_fn_with_state(state.clone(), jwt_auth))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let state = AppStateBuilder::new().build().await;

        let response = app(state)
            .oneshot(HttpRequest::get("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_registers_player() {
        let state = AppStateBuilder::new().build().await;
        let token = state.token_config.create_token(&profile("newcomer")).unwrap();

        let response = app(state.clone())
            .oneshot(
                HttpRequest::get("/whoami")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"newcomer");
        assert!(state.player_directory.get_player("newcomer").await.is_some());
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let state = AppStateBuilder::new().build().await;

        let response = app(state)
            .oneshot(
                HttpRequest::get("/whoami")
                    .header("Authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
