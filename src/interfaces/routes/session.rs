use actix_web::web;

use crate::handlers::session;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/session")
            .route(web::post().to(session::create_session))
    );
}
