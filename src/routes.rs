use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config;
use crate::error::ApiError;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{optional_auth, require_admin, require_auth};

/// Full application router
pub fn app() -> Router {
    let api = Router::new()
        .route("/health", get(public::health::health))
        .merge(user_public_routes())
        .merge(protected_routes())
        .merge(elevated_routes())
        .merge(trip_routes())
        .merge(site_routes());

    let app = Router::new()
        .route("/", get(public::health::root))
        .nest("/api", api)
        .fallback(|| async { ApiError::not_found("Route not found") })
        .layer(DefaultBodyLimit::max(config::config().api.max_request_size_bytes))
        .layer(cors_layer());

    if config::config().api.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

fn user_public_routes() -> Router {
    use public::users;

    Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/password/forgot", post(users::password_forgot))
        .route("/users/password/reset", post(users::password_reset))
}

fn protected_routes() -> Router {
    use protected::{me, passengers};

    Router::new()
        .route("/users/me", get(me::me_get).put(me::me_put))
        .route("/users/logout", post(me::logout))
        .route("/users/logout-all", post(me::logout_all))
        .route("/passengers", get(passengers::list))
        .route("/passengers/:id", get(passengers::get))
        .route_layer(from_fn(require_auth))
}

fn elevated_routes() -> Router {
    use elevated::{passengers, users};

    // Layers run outermost-last: authentication before the admin check
    Router::new()
        .route("/users", get(users::list))
        .route("/users/:id", get(users::get).put(users::update).delete(users::delete))
        .route("/passengers", post(passengers::create))
        .route("/passengers/:id", put(passengers::update).delete(passengers::delete))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn(require_auth))
}

fn trip_routes() -> Router {
    use public::trips;

    Router::new()
        .route("/trips", get(trips::list).post(trips::create))
        .route(
            "/trips/:id",
            get(trips::get)
                .put(trips::replace)
                .patch(trips::patch)
                .delete(trips::delete),
        )
        .route("/trips/date/:date", get(trips::by_date))
        .route("/trips/passenger/:passenger_id", get(trips::by_passenger))
        .route("/trips/:id/count/increment", patch(trips::count_increment))
        .route("/trips/:id/count/decrement", patch(trips::count_decrement))
        .route("/trips/:id/count", put(trips::count_set))
        .route_layer(from_fn(optional_auth))
}

fn site_routes() -> Router {
    use public::sites;

    Router::new()
        .route("/sites", get(sites::list))
        .route("/sites/initialize", post(sites::initialize))
        .route("/sites/:site_name", get(sites::get).put(sites::update))
        .route("/sites/:site_name/pob", put(sites::update_pob))
        .route_layer(from_fn(optional_auth))
}

/// Any origin in development; otherwise only the configured list
fn cors_layer() -> CorsLayer {
    if crate::is_development!() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config::config()
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
