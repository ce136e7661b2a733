use actix_web::{http::header, web, HttpResponse, Responder};
use futures::stream;
use tokio::sync::mpsc;
use tracing::instrument;

use crate::{
    feed::{ChangeEvent, Subscription},
    use_cases::extractors::SessionContext,
    AppState,
};

fn sse_frame(change: &ChangeEvent) -> Option<web::Bytes> {
    match serde_json::to_string(change) {
        Ok(json) => Some(web::Bytes::from(format!("data: {}\n\n", json))),
        Err(e) => {
            tracing::error!("Failed to encode change event: {}", e);
            None
        }
    }
}

/// Server-sent events stream of committed changes.
/// The feed subscription lives as long as the response body, so a
/// disconnecting client unsubscribes.
#[instrument(skip(_session, state))]
pub async fn stream_changes(_session: SessionContext, state: web::Data<AppState>) -> impl Responder {
    let (tx, rx) = mpsc::unbounded_channel::<ChangeEvent>();
    let subscription = state.change_feed.subscribe(move |change| {
        // The receiver is gone once the client disconnects.
        let _ = tx.send(change);
    });

    let body = stream::unfold(
        (rx, subscription),
        |(mut rx, subscription): (mpsc::UnboundedReceiver<ChangeEvent>, Subscription)| async move {
            loop {
                let change = rx.recv().await?;
                if let Some(frame) = sse_frame(&change) {
                    return Some((Ok::<_, actix_web::Error>(frame), (rx, subscription)));
                }
            }
        },
    );

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(body)
}
