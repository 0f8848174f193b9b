/// Middleware module
///
/// Authorization gates and request logging. Each gate is an actix
/// `Transform`: it wraps any service and yields a service, so gates stack
/// with `.wrap()` like any other middleware. Both fail closed.

mod request_logger;
mod require_api_key;
mod require_user;

pub use request_logger::RequestLogger;
pub use require_api_key::RequireApiKey;
pub use require_user::{AuthenticatedUser, RequireUser};

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::Service;
    use actix_web::http::{header::AUTHORIZATION, StatusCode};
    use actix_web::{test, web, App, HttpResponse};
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    use crate::auth::issue_access_token;
    use crate::configuration::AuthSettings;

    fn settings() -> Arc<AuthSettings> {
        Arc::new(AuthSettings {
            token_secret: "middleware-test-secret".to_string(),
            polka_key: "polka-test-key".to_string(),
            refresh_token_expiry: 3600,
            max_concurrent_hashes: 1,
        })
    }

    async fn whoami(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
        HttpResponse::Ok().body(user.user_id.to_string())
    }

    async fn counted(hits: web::Data<AtomicUsize>) -> HttpResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        HttpResponse::NoContent().finish()
    }

    #[actix_web::test]
    async fn test_user_gate_resolves_identity() {
        let settings = settings();
        let app = test::init_service(
            App::new().service(
                web::scope("/api")
                    .wrap(RequireUser::new(settings.clone()))
                    .route("/me", web::get().to(whoami)),
            ),
        )
        .await;

        let user_id = Uuid::new_v4();
        let token = issue_access_token(user_id, &settings.token_secret, Duration::hours(1))
            .expect("Failed to issue token");

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;

        assert_eq!(body, user_id.to_string().into_bytes());
    }

    #[actix_web::test]
    async fn test_user_gate_fails_closed() {
        let settings = settings();
        let hits = web::Data::new(AtomicUsize::new(0));
        let app = test::init_service(
            App::new().app_data(hits.clone()).service(
                web::scope("/api")
                    .wrap(RequireUser::new(settings.clone()))
                    .route("/guarded", web::get().to(counted)),
            ),
        )
        .await;

        let expired = issue_access_token(Uuid::new_v4(), &settings.token_secret, Duration::minutes(-5))
            .expect("Failed to issue token");
        let foreign = issue_access_token(Uuid::new_v4(), "another-secret", Duration::hours(1))
            .expect("Failed to issue token");

        let headers = vec![
            None,
            Some("Bearer".to_string()),
            Some("Basic abc123".to_string()),
            Some(format!("Bearer {}", expired)),
            Some(format!("Bearer {}", foreign)),
            Some(format!("ApiKey {}", settings.polka_key)),
        ];

        for header in headers {
            let mut req = test::TestRequest::get().uri("/api/guarded");
            if let Some(value) = header.clone() {
                req = req.insert_header((AUTHORIZATION, value));
            }

            let status = match app.call(req.to_request()).await {
                Ok(res) => res.status(),
                Err(e) => e.as_response_error().status_code(),
            };
            assert_eq!(status, StatusCode::UNAUTHORIZED, "header: {:?}", header);
        }

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_api_key_gate() {
        let settings = settings();
        let hits = web::Data::new(AtomicUsize::new(0));
        let app = test::init_service(
            App::new().app_data(hits.clone()).service(
                web::scope("/hooks")
                    .wrap(RequireApiKey::new(settings.clone()))
                    .route("", web::post().to(counted)),
            ),
        )
        .await;

        let rejected = vec![
            None,
            Some("ApiKey wrong-key".to_string()),
            Some(format!("Bearer {}", settings.polka_key)),
        ];
        for header in rejected {
            let mut req = test::TestRequest::post().uri("/hooks");
            if let Some(value) = header.clone() {
                req = req.insert_header((AUTHORIZATION, value));
            }

            let status = match app.call(req.to_request()).await {
                Ok(res) => res.status(),
                Err(e) => e.as_response_error().status_code(),
            };
            assert_eq!(status, StatusCode::UNAUTHORIZED, "header: {:?}", header);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let req = test::TestRequest::post()
            .uri("/hooks")
            .insert_header((AUTHORIZATION, format!("ApiKey {}", settings.polka_key)))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn test_gate_rejection_is_logged_once() {
        let settings = settings();
        let hits = web::Data::new(AtomicUsize::new(0));
        let app = test::init_service(
            App::new()
                .app_data(hits.clone())
                .service(
                    web::scope("/hooks")
                        .wrap(RequireApiKey::new(settings.clone()))
                        .route("", web::post().to(counted)),
                )
                .service(
                    web::scope("/api")
                        .wrap(RequireUser::new(settings.clone()))
                        .route("/guarded", web::get().to(counted)),
                ),
        )
        .await;

        let requests = vec![
            test::TestRequest::post()
                .uri("/hooks")
                .insert_header((AUTHORIZATION, "ApiKey wrong-key")),
            test::TestRequest::get()
                .uri("/api/guarded")
                .insert_header((AUTHORIZATION, "Bearer not-a-token")),
        ];

        for req in requests {
            let (logs, _guard) = crate::telemetry::capture_logs();

            // render the error the way the server does before replying
            let status = match app.call(req.to_request()).await {
                Ok(res) => res.status(),
                Err(e) => e.error_response().status(),
            };
            assert_eq!(status, StatusCode::UNAUTHORIZED);

            let output = logs.contents();
            assert_eq!(output.matches("WARN").count(), 1, "logs: {}", output);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
