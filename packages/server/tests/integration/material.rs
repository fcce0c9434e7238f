use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn empty_list_is_an_informational_not_found() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;

    let res = app.get_with_token(routes::MATERIALS, &token).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["message"], "Materials not found");
}

#[tokio::test]
async fn create_and_list_with_product_counts() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;

    let teak = app.create_material(&token, "Teak").await;
    let rattan = app.create_material(&token, "Rattan").await;

    let category_id = app.create_category(&token, "Chairs").await;
    app.create_product(&token, "Oslo", "CHR-1", category_id, &[teak])
        .await;
    app.create_product(&token, "Bergen", "CHR-2", category_id, &[teak, rattan])
        .await;

    let res = app.get_with_token(routes::MATERIALS, &token).await;
    assert_eq!(res.status, 200);

    let data = res.body["data"].as_array().unwrap();
    let count_of = |id: i32| {
        data.iter()
            .find(|m| m["id"] == id)
            .map(|m| m["product_count"].as_i64().unwrap())
            .unwrap()
    };
    assert_eq!(count_of(teak), 2);
    assert_eq!(count_of(rattan), 1);
}

#[tokio::test]
async fn create_with_empty_name_fails() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;

    let res = app
        .post_with_token(routes::MATERIALS_STORE, &json!({ "name": "  " }), &token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn create_with_overlong_name_fails() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;

    let res = app
        .post_with_token(
            routes::MATERIALS_STORE,
            &json!({ "name": "x".repeat(256) }),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn update_changes_the_name() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;

    let id = app.create_material(&token, "Oak").await;

    let res = app
        .patch_with_token(&routes::material(id), &json!({ "name": "White Oak" }), &token)
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["name"], "White Oak");
}

#[tokio::test]
async fn update_of_missing_material_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;

    let res = app
        .patch_with_token(&routes::material(4096), &json!({ "name": "Ghost" }), &token)
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn detail_view_lists_the_products_using_it() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;

    let material_id = app.create_material(&token, "Walnut").await;
    let category_id = app.create_category(&token, "Tables").await;
    let product_id = app
        .create_product(&token, "Dining Table", "TBL-1", category_id, &[material_id])
        .await;

    let res = app.get_with_token(&routes::material(material_id), &token).await;
    assert_eq!(res.status, 200);

    let products = res.body["data"]["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], product_id);
}

#[tokio::test]
async fn delete_detaches_the_material_from_its_products() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;

    let material_id = app.create_material(&token, "Bamboo").await;
    let category_id = app.create_category(&token, "Shelves").await;
    let mut product_ids = Vec::new();
    for i in 0..3 {
        let id = app
            .create_product(
                &token,
                &format!("Shelf {i}"),
                &format!("SHL-{i}"),
                category_id,
                &[material_id],
            )
            .await;
        product_ids.push(id);
    }

    let res = app
        .delete_with_token(&routes::material_delete(material_id), &token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["success"], true);

    // None of the products still list the material.
    let res = app.get_with_token(routes::PRODUCTS, &token).await;
    assert_eq!(res.status, 200);
    for product in res.body["data"].as_array().unwrap() {
        assert!(product["materials"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn delete_of_missing_material_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.login_admin().await;

    let res = app
        .delete_with_token(&routes::material_delete(4096), &token)
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}
