use actix_web::web;

use crate::handlers::{ai, content, events};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/events")
            .service(
                web::resource("")
                    .route(web::get().to(events::list_events))
                    .route(web::post().to(events::create_event))
            )
            .service(
                web::resource("/{event_id}")
                    .route(web::get().to(events::get_event_page))
                    .route(web::delete().to(events::delete_event))
            )
            .service(
                web::resource("/{event_id}/content")
                    .route(web::get().to(content::list_content))
            )
            .service(
                web::resource("/{event_id}/content/text")
                    .route(web::post().to(content::add_text))
            )
            .service(
                web::resource("/{event_id}/content/image")
                    .route(web::post().to(content::add_image))
            )
            .service(
                web::resource("/{event_id}/content/gallery")
                    .route(web::post().to(content::add_gallery))
            )
            .service(
                web::resource("/{event_id}/content/image-text")
                    .route(web::post().to(content::add_image_text))
            )
            .service(
                web::resource("/{event_id}/content/{content_id}")
                    .route(web::delete().to(content::delete_content))
            )
            .service(
                web::resource("/{event_id}/video")
                    .route(web::post().to(ai::generate_video))
            )
    );
}
