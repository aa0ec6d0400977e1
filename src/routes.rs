use crate::{
    api::{attendance, attendance_admin, department},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::AttendanceError,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpRequest, error::JsonPayloadError, middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(|| {
            tracing::warn!(requests_per_min, "Invalid rate limit, using governor defaults");
            GovernorConfig::default()
        });
    Governor::new(&cfg)
}

// Malformed bodies get the same `{success, message}` envelope as other errors
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AttendanceError::validation(format!("Invalid request body: {err}")).into()
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error));

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let mark_limiter = Arc::new(build_limiter(config.rate_mark_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter)
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // self-service
                    .service(
                        web::resource("/mark")
                            .wrap(mark_limiter.clone())
                            .route(web::post().to(attendance::mark)),
                    )
                    .service(
                        web::resource("/mark-manual")
                            .wrap(mark_limiter)
                            .route(web::post().to(attendance::mark_manual)),
                    )
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(web::resource("/me").route(web::get().to(attendance::my_attendance)))
                    .service(web::resource("/stats").route(web::get().to(attendance::my_stats)))
                    // admin; literal paths before /{id}
                    .service(
                        web::resource("/admin/stats")
                            .route(web::get().to(attendance_admin::admin_stats)),
                    )
                    .service(
                        web::resource("/admin/create")
                            .route(web::post().to(attendance_admin::create_attendance)),
                    )
                    .service(
                        web::resource("/bulk-verify")
                            .route(web::patch().to(attendance_admin::bulk_verify)),
                    )
                    .service(
                        web::resource("/export")
                            .route(web::get().to(attendance_admin::export_attendance)),
                    )
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance_admin::list_attendance)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(attendance_admin::update_attendance))
                            .route(web::delete().to(attendance_admin::delete_attendance)),
                    )
                    .service(
                        web::resource("/{id}/verify")
                            .route(web::patch().to(attendance_admin::verify_attendance)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::patch().to(attendance_admin::reject_attendance)),
                    ),
            )
            .service(
                web::scope("/departments")
                    .service(web::resource("").route(web::get().to(department::list_departments)))
                    .service(
                        web::resource("/{id}/schedule")
                            .route(web::put().to(department::update_schedule)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use crate::model::role::Role;
    use crate::utils::image_upload::ImageUploader;
    use actix_web::{App, http::StatusCode, test, web::Data};
    use rstest::rstest;
    use serde_json::{Value, json};
    use sqlx::MySqlPool;
    use std::net::SocketAddr;
    use std::time::Duration;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn token(role: Role) -> String {
        let config = Config::for_tests();
        generate_access_token(5, "tester".into(), role as u8, &config.jwt_secret, 60).unwrap()
    }

    // The pool never connects: every request here must be settled before
    // the database is touched.
    macro_rules! test_app {
        () => {{
            let config = Config::for_tests();
            let pool = MySqlPool::connect_lazy(&config.database_url).unwrap();
            let uploader = ImageUploader::new(None, None, Duration::from_secs(1)).unwrap();
            let routes_config = config.clone();
            test::init_service(
                App::new()
                    .app_data(Data::new(pool))
                    .app_data(Data::new(config))
                    .app_data(Data::new(uploader))
                    .configure(move |cfg| configure(cfg, routes_config.clone())),
            )
            .await
        }};
    }

    #[rstest]
    #[case("/api/attendance/today")]
    #[case("/api/attendance/me")]
    #[case("/api/attendance")]
    #[case("/api/departments")]
    #[actix_web::test]
    async fn protected_routes_require_a_token(#[case] uri: &str) {
        let app = test_app!();
        let req = test::TestRequest::get().uri(uri).peer_addr(peer()).to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn garbage_token_is_unauthorized() {
        let app = test_app!();
        let req = test::TestRequest::get()
            .uri("/api/attendance/today")
            .insert_header(("Authorization", "Bearer not.a.jwt"))
            .peer_addr(peer())
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case(Role::Student, "/api/attendance")]
    #[case(Role::Faculty, "/api/attendance/export")]
    #[case(Role::Student, "/api/attendance/admin/stats")]
    #[actix_web::test]
    async fn admin_reads_are_forbidden_for_others(#[case] role: Role, #[case] uri: &str) {
        let app = test_app!();
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(("Authorization", format!("Bearer {}", token(role))))
            .peer_addr(peer())
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn delete_is_admin_only() {
        let app = test_app!();
        let req = test::TestRequest::delete()
            .uri("/api/attendance/17")
            .insert_header(("Authorization", format!("Bearer {}", token(Role::Faculty))))
            .peer_addr(peer())
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn out_of_range_confidence_is_rejected_before_any_lookup() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .uri("/api/attendance/mark")
            .insert_header(("Authorization", format!("Bearer {}", token(Role::Student))))
            .peer_addr(peer())
            .set_json(json!({"type": "check-in", "confidence": 0.95e3}))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
    }

    #[actix_web::test]
    async fn malformed_body_uses_the_error_envelope() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .uri("/api/attendance/mark")
            .insert_header(("Authorization", format!("Bearer {}", token(Role::Student))))
            .peer_addr(peer())
            .set_json(json!({"type": "checkIn"}))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["message"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[actix_web::test]
    async fn bulk_verify_needs_ids() {
        let app = test_app!();
        let req = test::TestRequest::patch()
            .uri("/api/attendance/bulk-verify")
            .insert_header(("Authorization", format!("Bearer {}", token(Role::Admin))))
            .peer_addr(peer())
            .set_json(json!({"ids": [], "type": "checkIn"}))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn invalid_department_schedule_is_rejected() {
        let app = test_app!();
        let req = test::TestRequest::put()
            .uri("/api/departments/3/schedule")
            .insert_header(("Authorization", format!("Bearer {}", token(Role::Admin))))
            .peer_addr(peer())
            .set_json(json!({"startHour": 17, "startMinute": 0, "endHour": 9, "endMinute": 0}))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
