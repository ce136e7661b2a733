use actix_web::web;

use crate::handlers::{home::home, system::health_check};

mod ai;
mod changes;
mod events;
mod json_error;
mod media;
mod session;

pub use json_error::json_config;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home));
    cfg.route("/health", web::get().to(health_check));

    cfg.service(
        web::scope("/api/v1")
            .configure(session::config_routes)
            .configure(events::config_routes)
            .configure(ai::config_routes)
            .configure(changes::config_routes)
    );

    cfg.configure(media::config_routes);
}
