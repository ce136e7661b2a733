use actix_web::web;

use crate::handlers::changes;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/changes")
            .route(web::get().to(changes::stream_changes))
    );
}
