use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::CredentialHasher;
use crate::configuration::AuthSettings;
use crate::middleware::{RequestLogger, RequireApiKey, RequireUser};
use crate::routes::{get_current_user, health_check, login, polka_webhook, refresh, revoke};
use crate::storage::Store;

pub fn run(
    listener: TcpListener,
    store: Arc<dyn Store>,
    auth_settings: AuthSettings,
) -> Result<Server, std::io::Error> {
    let auth_settings = Arc::new(auth_settings);
    let hasher = web::Data::new(CredentialHasher::new(auth_settings.max_concurrent_hashes));
    let store: web::Data<dyn Store> = web::Data::from(store);
    let settings_data: web::Data<AuthSettings> = web::Data::from(auth_settings.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)

            // Shared state
            .app_data(store.clone())
            .app_data(hasher.clone())
            .app_data(settings_data.clone())

            // Public routes; refresh and revoke authenticate with the refresh token itself
            .route("/api/healthz", web::get().to(health_check))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))

            // Trusted system callers
            .service(
                web::scope("/api/polka")
                    .wrap(RequireApiKey::new(auth_settings.clone()))
                    .route("/webhooks", web::post().to(polka_webhook)),
            )

            // Routes that require a valid access token
            .service(
                web::scope("/api")
                    .wrap(RequireUser::new(auth_settings.clone()))
                    .route("/me", web::get().to(get_current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
