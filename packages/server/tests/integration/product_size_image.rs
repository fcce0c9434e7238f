use reqwest::multipart::Form;

use crate::common::{TestApp, png_part, routes};

async fn setup_product(app: &TestApp, token: &str) -> i32 {
    let category_id = app.create_category(token, "Chairs").await;
    app.create_product(token, "Oslo", "CHR-1", category_id, &[])
        .await
}

#[tokio::test]
async fn get_without_a_size_image_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;
    let product_id = setup_product(&app, &token).await;

    let res = app.get_with_token(&routes::size_image(product_id), &token).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn store_then_get_round_trip() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;
    let product_id = setup_product(&app, &token).await;

    let created = app.upload_size_image(&token, product_id).await;
    assert_eq!(created.body["product_id"], product_id);
    let url = created.body["image_url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/product-size-image/"));

    let res = app.get_with_token(&routes::size_image(product_id), &token).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["image_url"], url.as_str());
    assert_eq!(app.get_without_token(&url).await.status, 200);
}

#[tokio::test]
async fn second_store_conflicts_and_preserves_the_original() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;
    let product_id = setup_product(&app, &token).await;

    let first = app.upload_size_image(&token, product_id).await;
    let original_url = first.body["image_url"].as_str().unwrap().to_string();

    let form = Form::new()
        .text("product_id", product_id.to_string())
        .part("image", png_part("second-attempt.png"));
    let res = app
        .post_multipart_with_token(routes::SIZE_IMAGE_STORE, form, &token)
        .await;

    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "CONFLICT");

    // The original row and blob are untouched.
    let res = app.get_with_token(&routes::size_image(product_id), &token).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["image_url"], original_url.as_str());
    assert_eq!(app.get_without_token(&original_url).await.status, 200);
}

#[tokio::test]
async fn store_for_unknown_product_is_a_validation_error() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;

    let form = Form::new()
        .text("product_id", "4096")
        .part("image", png_part("chart.png"));
    let res = app
        .post_multipart_with_token(routes::SIZE_IMAGE_STORE, form, &token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn store_without_image_is_a_validation_error() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;
    let product_id = setup_product(&app, &token).await;

    let form = Form::new().text("product_id", product_id.to_string());
    let res = app
        .post_multipart_with_token(routes::SIZE_IMAGE_STORE, form, &token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn update_replaces_the_blob() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;
    let product_id = setup_product(&app, &token).await;

    let created = app.upload_size_image(&token, product_id).await;
    let old_url = created.body["image_url"].as_str().unwrap().to_string();

    let form = Form::new().part("image", png_part("replacement.png"));
    let res = app
        .patch_multipart_with_token(&routes::size_image(product_id), form, &token)
        .await;

    assert_eq!(res.status, 200);
    let new_url = res.body["image_url"].as_str().unwrap().to_string();
    assert_ne!(new_url, old_url);
    assert_eq!(app.get_without_token(&old_url).await.status, 404);
    assert_eq!(app.get_without_token(&new_url).await.status, 200);
}

#[tokio::test]
async fn update_without_an_existing_row_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;
    let product_id = setup_product(&app, &token).await;

    let form = Form::new().part("image", png_part("chart.png"));
    let res = app
        .patch_multipart_with_token(&routes::size_image(product_id), form, &token)
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn update_without_image_is_a_validation_error() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;
    let product_id = setup_product(&app, &token).await;
    app.upload_size_image(&token, product_id).await;

    let form = Form::new().text("note", "no file here");
    let res = app
        .patch_multipart_with_token(&routes::size_image(product_id), form, &token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn delete_removes_row_and_blob() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;
    let product_id = setup_product(&app, &token).await;

    let created = app.upload_size_image(&token, product_id).await;
    let url = created.body["image_url"].as_str().unwrap().to_string();

    let res = app
        .delete_with_token(&routes::size_image_delete(product_id), &token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["success"], true);

    assert_eq!(app.get_without_token(&url).await.status, 404);
    let res = app.get_with_token(&routes::size_image(product_id), &token).await;
    assert_eq!(res.status, 404);

    // A fresh store succeeds again after deletion.
    app.upload_size_image(&token, product_id).await;
}

#[tokio::test]
async fn delete_without_an_existing_row_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;
    let product_id = setup_product(&app, &token).await;

    let res = app
        .delete_with_token(&routes::size_image_delete(product_id), &token)
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}
