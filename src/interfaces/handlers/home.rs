use actix_web::{HttpResponse, Responder};
use std::env;

pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Welcome to the Memory Diary API!",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "session": "/api/v1/session",
    }))
}
