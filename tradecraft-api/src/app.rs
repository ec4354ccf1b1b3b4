/// Application state and router assembly
///
/// Public routes (health, login, token refresh, self-registration and
/// business registration) are mounted bare; everything else sits behind
/// the bearer-token auth layer, which inserts the freshly loaded
/// [`CurrentUser`] into request extensions.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use tradecraft_shared::auth::middleware::{authenticate, CurrentUser};

use crate::config::Config;
use crate::error::ApiError;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &[u8] {
        self.config.jwt.secret.as_bytes()
    }
}

/// Bearer-token authentication layer for the protected routes.
async fn auth_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let current: CurrentUser = authenticate(&state.db, state.jwt_secret(), auth_header).await?;

    request.extensions_mut().insert(current);
    Ok(next.run(request).await)
}

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(routes::health::health_check_handler))
        .route("/core/login/", post(routes::auth::login))
        .route("/core/token/", get(routes::auth::refresh_access_token))
        .route("/account/create/", post(routes::accounts::create_account))
        .route(
            "/account/business/create/",
            post(routes::business::create_business),
        );

    let protected = Router::new()
        .route(
            "/account/:id/",
            get(routes::accounts::get_user)
                .put(routes::accounts::update_user)
                .delete(routes::accounts::delete_user),
        )
        .route(
            "/account/profile/:id/",
            get(routes::accounts::get_profile).put(routes::accounts::update_profile),
        )
        .route(
            "/account/business/:id/",
            get(routes::business::get_business).put(routes::business::update_business),
        )
        .route(
            "/account/business/staff/",
            get(routes::business::list_staff).post(routes::business::create_staff),
        )
        .route(
            "/account/business/staff/:id/",
            get(routes::business::get_staff)
                .put(routes::business::update_staff)
                .delete(routes::business::delete_staff),
        )
        .route(
            "/account/business/staff/:id/profile/",
            get(routes::business::get_customer_profile)
                .put(routes::business::update_customer_profile),
        )
        .route(
            "/account/business/relations/",
            get(routes::relations::list_relations).post(routes::relations::create_relation),
        )
        .route(
            "/account/business/relations/:id/",
            put(routes::relations::update_relation).delete(routes::relations::delete_relation),
        )
        .route(
            "/orders/",
            get(routes::orders::list_orders).post(routes::orders::create_order),
        )
        .route(
            "/orders/:id/",
            get(routes::orders::get_order)
                .put(routes::orders::update_order)
                .delete(routes::orders::delete_order),
        )
        .route(
            "/orders/:id/items/",
            get(routes::orders::list_order_items).post(routes::orders::create_order_item),
        )
        .route(
            "/payments/",
            get(routes::payments::list_payments).post(routes::payments::create_payment),
        )
        .route(
            "/payments/:id/",
            get(routes::payments::get_payment)
                .put(routes::payments::update_payment)
                .delete(routes::payments::delete_payment),
        )
        .route(
            "/products/",
            get(routes::products::list_products).post(routes::products::create_product),
        )
        .route(
            "/products/:id/",
            get(routes::products::get_product)
                .put(routes::products::update_product)
                .delete(routes::products::delete_product),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_layer));

    let cors = build_cors(&state.config);

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors(config: &Config) -> CorsLayer {
    let allow_any = config.api.cors_origins.iter().any(|o| o == "*");
    if allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .api
            .cors_origins
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
