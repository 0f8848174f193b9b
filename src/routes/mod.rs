mod auth;
mod health_check;
mod webhooks;

pub use auth::{get_current_user, login, refresh, revoke};
pub use health_check::health_check;
pub use webhooks::polka_webhook;
