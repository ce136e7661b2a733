use actix_web::web;

use crate::handlers::ai;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/ai/title")
            .route(web::post().to(ai::suggest_title))
    );
}
