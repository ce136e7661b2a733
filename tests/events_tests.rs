
use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};
use test_utils::{new_event_body, png_data_uri, TestContext};

#[actix_web::test]
async fn create_event_stores_cover_and_lists_it() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .insert_header(ctx.bearer())
        .set_json(new_event_body("Picnic en el parque", "2024-05-01T00:00:00Z"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let event: Value = test::read_body_json(resp).await;
    let image_path = event["imagePath"].as_str().unwrap().to_string();
    assert!(image_path.starts_with("events/"));
    assert!(image_path.ends_with("_picnic-en-el-parque.jpg"));
    assert_eq!(event["imageUrl"], format!("http://diary.test/media/{}", image_path));
    assert_eq!(event["width"], 64);
    assert_eq!(event["height"], 48);
    assert!(ctx.storage.contains(&image_path));

    let req = test::TestRequest::get()
        .uri("/api/v1/events")
        .insert_header(ctx.bearer())
        .to_request();
    let listing: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);
    assert_eq!(listing[0]["title"], "Picnic en el parque");
}

#[actix_web::test]
async fn listing_is_newest_first_and_refreshed_after_create() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    for (title, date) in [("Roma", "2023-06-01T00:00:00Z"), ("Lisboa", "2024-02-14T00:00:00Z")] {
        let req = test::TestRequest::post()
            .uri("/api/v1/events")
            .insert_header(ctx.bearer())
            .set_json(new_event_body(title, date))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        // Prime the cached listing between creations.
        let req = test::TestRequest::get()
            .uri("/api/v1/events")
            .insert_header(ctx.bearer())
            .to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/events")
        .insert_header(ctx.bearer())
        .to_request();
    let listing: Value = test::call_and_read_body_json(&app, req).await;
    let titles: Vec<&str> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Lisboa", "Roma"]);
}

#[actix_web::test]
async fn invalid_event_form_reports_fields_and_stores_nothing() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .insert_header(ctx.bearer())
        .set_json(json!({
            "title": "Viaje",
            "description": "corta",
            "image": png_data_uri(8, 8),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"date"));
    assert!(fields.contains(&"description"));
    assert!(ctx.storage.keys().is_empty());
    assert_eq!(ctx.repo.event_count(), 0);
}

#[actix_web::test]
async fn non_image_payload_is_rejected() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let mut body = new_event_body("Roma", "2024-05-01T00:00:00Z");
    body["image"] = json!("data:image/png;base64,aGVsbG8gd29ybGQ=");

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .insert_header(ctx.bearer())
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
    assert!(ctx.storage.keys().is_empty());
}

#[actix_web::test]
async fn event_page_and_media_are_served() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .insert_header(ctx.bearer())
        .set_json(new_event_body("Roma", "2024-05-01T00:00:00Z"))
        .to_request();
    let event: Value = test::call_and_read_body_json(&app, req).await;
    let id = event["id"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/events/{}", id))
        .insert_header(ctx.bearer())
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["event"]["id"], id);
    assert_eq!(page["content"], json!([]));

    // Media is public, no session needed.
    let req = test::TestRequest::get()
        .uri(&format!("/media/{}", event["imagePath"].as_str().unwrap()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("content-type").unwrap(), "image/jpeg");
    let bytes = test::read_body(resp).await;
    assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
}

#[actix_web::test]
async fn unknown_and_malformed_ids() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/events/{}", uuid::Uuid::new_v4()))
        .insert_header(ctx.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri("/api/v1/events/not-a-uuid")
        .insert_header(ctx.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/media/events/missing.jpg").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delete_event_removes_content_images_and_records() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .insert_header(ctx.bearer())
        .set_json(new_event_body("Roma", "2024-05-01T00:00:00Z"))
        .to_request();
    let event: Value = test::call_and_read_body_json(&app, req).await;
    let id = event["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/events/{}/content/gallery", id))
        .insert_header(ctx.bearer())
        .set_json(json!({"images": [
            {"image": png_data_uri(10, 10)},
            {"image": png_data_uri(12, 10)},
            {"image": png_data_uri(10, 12)},
        ]}))
        .to_request();
    let gallery: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/events/{}/content/text", id))
        .insert_header(ctx.bearer())
        .set_json(json!({"text": "Comimos helado junto al río"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    assert_eq!(ctx.storage.keys().len(), 4);

    // One gallery image already gone: deletion still completes.
    ctx.storage.remove(gallery["images"][1]["imagePath"].as_str().unwrap());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/events/{}", id))
        .insert_header(ctx.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    assert!(ctx.storage.keys().is_empty());
    assert_eq!(ctx.repo.event_count(), 0);
    assert_eq!(ctx.repo.content_count(), 0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/events/{}", id))
        .insert_header(ctx.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}
