//! Per-service API routers with OpenAPI documents
//!
//! Every service shares `/health`, `/metrics` and `/api-docs/openapi.json`
//! plus the tracing, request-id and metrics layers. Reservation endpoints sit
//! behind the `X-Auth` middleware; the auth service's endpoints are public.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::middleware::{auth_middleware, AuthState};
use super::modules::health::{self, HealthState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::request_id::request_id_middleware;
use super::modules::{auth, reservations};
use crate::application::{ReservationManager, UserService};
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::database::repositories::UserRepository;

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "x_auth",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-Auth",
                    "Token from the auth service's /auth_user, optionally prefixed with `Bearer `",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health::health_check, auth::create_user, auth::auth_user),
    components(schemas(
        health::HealthResponse,
        health::ComponentHealth,
        auth::UserCredentials,
        auth::CreateUserResponse,
        auth::AuthUserResponse,
    )),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Authentication", description = "User registration and token issuance"),
    ),
    info(title = "Car Rental Auth Service", version = "1.0.0")
)]
pub struct AuthApiDoc;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        reservations::create_booking,
        reservations::check_car,
        reservations::car_bookings,
    ),
    components(schemas(
        health::HealthResponse,
        health::ComponentHealth,
        reservations::CarDaysRequest,
        reservations::CarRequest,
        reservations::BookingResponse,
        reservations::CheckCarResponse,
        reservations::CarBookingsResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Bookings", description = "Time-bounded car bookings"),
    ),
    info(title = "Car Rental Booking Service", version = "1.0.0")
)]
pub struct BookingApiDoc;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        reservations::create_lease,
        reservations::car_leases,
    ),
    components(schemas(
        health::HealthResponse,
        health::ComponentHealth,
        reservations::CarDaysRequest,
        reservations::CarRequest,
        reservations::LeaseResponse,
        reservations::CarLeasesResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Leases", description = "Car leases"),
    ),
    info(title = "Car Rental Lease Service", version = "1.0.0")
)]
pub struct LeaseApiDoc;

/// Pieces every service router carries.
#[derive(Clone)]
pub struct CommonRoutes {
    /// Service name used in `/health` and metric labels.
    pub service: &'static str,
    pub db: DatabaseConnection,
    /// Installed Prometheus recorder; `/metrics` is omitted without one.
    pub metrics: Option<PrometheusHandle>,
}

impl CommonRoutes {
    fn finish(self, routes: Router, openapi: utoipa::openapi::OpenApi) -> Router {
        let health_state = HealthState {
            db: self.db,
            service: self.service,
            started_at: Arc::new(Instant::now()),
        };

        let mut router = routes
            .merge(
                Router::new()
                    .route("/health", get(health::health_check))
                    .with_state(health_state),
            )
            .route(
                "/api-docs/openapi.json",
                get(move || {
                    let doc = openapi.clone();
                    async move { Json(doc) }
                }),
            );

        if let Some(handle) = self.metrics {
            router = router.merge(
                Router::new()
                    .route("/metrics", get(prometheus_metrics))
                    .with_state(MetricsState { handle }),
            );
        }

        router
            .layer(middleware::from_fn_with_state(
                self.service,
                http_metrics_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                self.service,
                request_id_middleware,
            ))
            .layer(TraceLayer::new_for_http())
    }
}

/// Router of the auth service: `/create_user`, `/auth_user`.
pub fn create_auth_router(users: Arc<UserService<UserRepository>>, common: CommonRoutes) -> Router {
    let routes = Router::new()
        .route("/create_user", post(auth::create_user))
        .route("/auth_user", post(auth::auth_user))
        .with_state(auth::AuthHandlerState { users });

    common.finish(routes, AuthApiDoc::openapi())
}

/// Router of the booking service: `/create_booking`, `/check_car`, `/car_bookings`.
pub fn create_booking_router(
    manager: Arc<ReservationManager>,
    jwt_config: JwtConfig,
    common: CommonRoutes,
) -> Router {
    let routes = Router::new()
        .route("/create_booking", post(reservations::create_booking))
        .route("/check_car", post(reservations::check_car))
        .route("/car_bookings", post(reservations::car_bookings))
        .layer(middleware::from_fn_with_state(
            AuthState { jwt_config },
            auth_middleware,
        ))
        .with_state(reservations::ReservationAppState { manager });

    common.finish(routes, BookingApiDoc::openapi())
}

/// Router of the lease service: `/create_lease`, `/car_leases`.
pub fn create_lease_router(
    manager: Arc<ReservationManager>,
    jwt_config: JwtConfig,
    common: CommonRoutes,
) -> Router {
    let routes = Router::new()
        .route("/create_lease", post(reservations::create_lease))
        .route("/car_leases", post(reservations::car_leases))
        .layer(middleware::from_fn_with_state(
            AuthState { jwt_config },
            auth_middleware,
        ))
        .with_state(reservations::ReservationAppState { manager });

    common.finish(routes, LeaseApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReservationKind;
    use crate::infrastructure::crypto::jwt::create_token;
    use crate::infrastructure::database::repositories::{
        SeaOrmReservationRepository, SeaOrmSequenceAllocator,
    };
    use crate::infrastructure::database::testing::migrated_db;
    use crate::shared::utills::RetryConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn jwt() -> JwtConfig {
        JwtConfig::new(b"router-secret".to_vec(), 1)
    }

    async fn reservation_router(kind: ReservationKind) -> Router {
        let db = migrated_db().await;
        let ids = SeaOrmSequenceAllocator::open(db.clone(), kind.sequence_name(), 100)
            .await
            .unwrap();
        let manager = Arc::new(ReservationManager::new(
            Arc::new(SeaOrmReservationRepository::new(db.clone(), kind)),
            Arc::new(ids),
            RetryConfig::default(),
        ));
        let common = CommonRoutes {
            service: kind.as_str(),
            db,
            metrics: None,
        };
        match kind {
            ReservationKind::Booking => create_booking_router(manager, jwt(), common),
            ReservationKind::Lease => create_lease_router(manager, jwt(), common),
        }
    }

    async fn auth_router() -> Router {
        let db = migrated_db().await;
        let ids = SeaOrmSequenceAllocator::open(db.clone(), "user_id_sequence", 100)
            .await
            .unwrap();
        let users = Arc::new(UserService::new(
            Arc::new(UserRepository::new(db.clone())),
            Arc::new(ids),
            jwt(),
            4,
        ));
        create_auth_router(
            users,
            CommonRoutes {
                service: "auth",
                db,
                metrics: None,
            },
        )
    }

    async fn post_raw(app: &Router, path: &str, token: Option<&str>, body: &str) -> (StatusCode, String) {
        let mut req = Request::builder().method("POST").uri(path);
        if let Some(token) = token {
            req = req.header("X-Auth", token);
        }
        let resp = app
            .clone()
            .oneshot(req.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn post(app: &Router, path: &str, token: Option<&str>, body: Value) -> (StatusCode, String) {
        post_raw(app, path, token, &body.to_string()).await
    }

    fn token() -> String {
        create_token(42, "alice", &jwt()).unwrap()
    }

    #[tokio::test]
    async fn test_create_booking_flow() {
        let app = reservation_router(ReservationKind::Booking).await;
        let token = token();

        let (status, body) = post(
            &app,
            "/create_booking",
            Some(&token),
            json!({"car_id": 7, "from_day": 1, "to_day": 3}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let created: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            created,
            json!({"user_id": 42, "car_id": 7, "booking_id": 1, "from_day": 1, "to_day": 3})
        );

        let (status, body) = post(
            &app,
            "/create_booking",
            Some(&token),
            json!({"car_id": 7, "from_day": 3, "to_day": 4}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "booking already exists");

        let (status, body) = post(
            &app,
            "/check_car",
            Some(&token),
            json!({"car_id": 7, "from_day": 4, "to_day": 5}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"is_free": true}));

        let (status, body) = post(&app, "/car_bookings", Some(&token), json!({"car_id": 7})).await;
        assert_eq!(status, StatusCode::OK);
        let listed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(listed["bookings"].as_array().unwrap().len(), 1);
        assert_eq!(listed["bookings"][0]["booking_id"], 1);
    }

    #[tokio::test]
    async fn test_booking_client_errors() {
        let app = reservation_router(ReservationKind::Booking).await;
        let token = token();

        let (status, _) = post(
            &app,
            "/create_booking",
            Some(&token),
            json!({"car_id": 7, "from_day": 10, "to_day": 5}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_raw(&app, "/create_booking", Some(&token), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post(&app, "/create_booking", Some(&token), json!({"car_id": 7})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = post(&app, "/car_bookings", Some(&token), json!({"car_id": 7})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"bookings": []}));
    }

    #[tokio::test]
    async fn test_reservation_routes_require_token() {
        let app = reservation_router(ReservationKind::Lease).await;
        let body = json!({"car_id": 1, "from_day": 1, "to_day": 1});

        let (status, _) = post(&app, "/create_lease", None, body.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = post(&app, "/create_lease", Some("nope"), body.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let bearer = format!("Bearer {}", token());
        let (status, body) = post(&app, "/create_lease", Some(&bearer), body).await;
        assert_eq!(status, StatusCode::OK);
        let lease: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(lease["lease_id"], 1);
        assert_eq!(lease["user_id"], 42);
    }

    #[tokio::test]
    async fn test_lease_conflict_message() {
        let app = reservation_router(ReservationKind::Lease).await;
        let token = token();
        let body = json!({"car_id": 8, "from_day": 1, "to_day": 10});

        assert_eq!(post(&app, "/create_lease", Some(&token), body.clone()).await.0, StatusCode::OK);
        let (status, text) = post(&app, "/create_lease", Some(&token), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "lease already exists");

        let (_, listed) = post(&app, "/car_leases", Some(&token), json!({"car_id": 8})).await;
        let listed: Value = serde_json::from_str(&listed).unwrap();
        assert_eq!(listed["leases"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_auth_service_flow() {
        let app = auth_router().await;
        let creds = json!({"username": "alice", "password": "pw"});

        let (status, body) = post(&app, "/create_user", None, creds.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"user_id": 1, "username": "alice"})
        );

        let (status, body) = post(&app, "/create_user", None, creds.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "user already exists");

        let (status, body) = post(&app, "/auth_user", None, creds).await;
        assert_eq!(status, StatusCode::OK);
        let token = serde_json::from_str::<Value>(&body).unwrap()["token"]
            .as_str()
            .unwrap()
            .to_string();
        let claims = crate::infrastructure::crypto::jwt::verify_token(&token, &jwt()).unwrap();
        assert_eq!(claims.user_id, 1);

        let (status, body) = post(
            &app,
            "/auth_user",
            None,
            json!({"username": "alice", "password": "wrong"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "wrong password");

        let (status, _) = post(&app, "/create_user", None, json!({"username": "", "password": "x"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_and_openapi() {
        let app = reservation_router(ReservationKind::Booking).await;

        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let health: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["service"], "booking");

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["paths"]["/create_booking"].is_object());
        assert!(doc["paths"]["/create_lease"].is_null());
    }
}
