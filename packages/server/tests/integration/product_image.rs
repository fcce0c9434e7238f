use reqwest::multipart::Form;
use serde_json::json;

use crate::common::{TestApp, png_part, routes};

async fn setup_product(app: &TestApp, token: &str) -> i32 {
    let category_id = app.create_category(token, "Chairs").await;
    app.create_product(token, "Oslo", "CHR-1", category_id, &[])
        .await
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn first_image_defaults_to_sort_order_zero() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let product_id = setup_product(&app, &token).await;

        let res = app.upload_product_image(&token, product_id, None).await;

        assert_eq!(res.body["sort_order"], 0);
        assert_eq!(res.body["product_id"], product_id);
        assert!(
            res.body["image_url"]
                .as_str()
                .unwrap()
                .starts_with("/uploads/products/images/")
        );
    }

    #[tokio::test]
    async fn default_sort_order_is_current_max_plus_one() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let product_id = setup_product(&app, &token).await;

        app.upload_product_image(&token, product_id, Some(3)).await;
        let res = app.upload_product_image(&token, product_id, None).await;

        assert_eq!(res.body["sort_order"], 4);
    }

    #[tokio::test]
    async fn default_sort_order_is_scoped_per_product() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let category_id = app.create_category(&token, "Chairs").await;
        let first = app
            .create_product(&token, "Oslo", "CHR-1", category_id, &[])
            .await;
        let second = app
            .create_product(&token, "Bergen", "CHR-2", category_id, &[])
            .await;

        app.upload_product_image(&token, first, Some(7)).await;
        let res = app.upload_product_image(&token, second, None).await;

        // The other product's max doesn't leak over.
        assert_eq!(res.body["sort_order"], 0);
    }

    #[tokio::test]
    async fn unknown_product_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let form = Form::new()
            .text("product_id", "4096")
            .part("image", png_part("x.png"));
        let res = app
            .post_multipart_with_token(routes::PRODUCT_IMAGES_STORE, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_image_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let product_id = setup_product(&app, &token).await;

        let form = Form::new().text("product_id", product_id.to_string());
        let res = app
            .post_multipart_with_token(routes::PRODUCT_IMAGES_STORE, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn negative_sort_order_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let product_id = setup_product(&app, &token).await;

        let form = Form::new()
            .text("product_id", product_id.to_string())
            .text("sort_order", "-1")
            .part("image", png_part("x.png"));
        let res = app
            .post_multipart_with_token(routes::PRODUCT_IMAGES_STORE, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn empty_result_is_an_informational_not_found() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let res = app.get_with_token(routes::PRODUCT_IMAGES, &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["message"], "Images not found");
    }

    #[tokio::test]
    async fn list_is_sorted_and_filterable_by_product() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let category_id = app.create_category(&token, "Chairs").await;
        let product_a = app
            .create_product(&token, "Oslo", "CHR-1", category_id, &[])
            .await;
        let product_b = app
            .create_product(&token, "Bergen", "CHR-2", category_id, &[])
            .await;

        app.upload_product_image(&token, product_a, Some(5)).await;
        app.upload_product_image(&token, product_a, Some(1)).await;
        app.upload_product_image(&token, product_a, Some(3)).await;
        app.upload_product_image(&token, product_b, Some(0)).await;

        let res = app
            .get_with_token(
                &format!("{}?product_id={product_a}", routes::PRODUCT_IMAGES),
                &token,
            )
            .await;

        assert_eq!(res.status, 200);
        let orders: Vec<i64> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["sort_order"].as_i64().unwrap())
            .collect();
        assert_eq!(orders, vec![1, 3, 5]);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn changing_sort_order_preserves_the_file() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let product_id = setup_product(&app, &token).await;

        let created = app.upload_product_image(&token, product_id, None).await;
        let id = created.id();
        let url = created.body["image_url"].as_str().unwrap().to_string();

        let form = Form::new().text("sort_order", "9");
        let res = app
            .patch_multipart_with_token(&routes::product_image(id), form, &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["sort_order"], 9);
        assert_eq!(res.body["image_url"], url.as_str());
        assert_eq!(app.get_without_token(&url).await.status, 200);
    }

    #[tokio::test]
    async fn replacing_the_file_deletes_the_old_blob() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let product_id = setup_product(&app, &token).await;

        let created = app.upload_product_image(&token, product_id, None).await;
        let id = created.id();
        let old_url = created.body["image_url"].as_str().unwrap().to_string();

        let form = Form::new().part("image", png_part("replacement.png"));
        let res = app
            .patch_multipart_with_token(&routes::product_image(id), form, &token)
            .await;

        assert_eq!(res.status, 200);
        let new_url = res.body["image_url"].as_str().unwrap().to_string();
        assert_ne!(new_url, old_url);
        assert_eq!(app.get_without_token(&old_url).await.status, 404);
        assert_eq!(app.get_without_token(&new_url).await.status, 200);
    }

    #[tokio::test]
    async fn update_of_missing_image_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let form = Form::new().text("sort_order", "1");
        let res = app
            .patch_multipart_with_token(&routes::product_image(4096), form, &token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod reorder {
    use super::*;

    #[tokio::test]
    async fn reorder_changes_the_listing_order() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let product_id = setup_product(&app, &token).await;

        let first = app.upload_product_image(&token, product_id, None).await.id();
        let second = app.upload_product_image(&token, product_id, None).await.id();

        // Swap: first gets rank 2, second gets rank 1.
        let res = app
            .post_with_token(
                routes::PRODUCT_IMAGES_REORDER,
                &json!({ "images": [
                    { "id": first, "sort_order": 2 },
                    { "id": second, "sort_order": 1 },
                ]}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], true);

        let res = app
            .get_with_token(
                &format!("{}?product_id={product_id}", routes::PRODUCT_IMAGES),
                &token,
            )
            .await;
        let ids: Vec<i64> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![second as i64, first as i64]);
    }

    #[tokio::test]
    async fn unknown_id_fails_without_partial_application() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let product_id = setup_product(&app, &token).await;

        let real = app.upload_product_image(&token, product_id, Some(0)).await.id();

        let res = app
            .post_with_token(
                routes::PRODUCT_IMAGES_REORDER,
                &json!({ "images": [
                    { "id": real, "sort_order": 5 },
                    { "id": 4096, "sort_order": 0 },
                ]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        // The real image kept its original rank.
        let res = app
            .get_with_token(
                &format!("{}?product_id={product_id}", routes::PRODUCT_IMAGES),
                &token,
            )
            .await;
        assert_eq!(res.body["data"][0]["sort_order"], 0);
    }

    #[tokio::test]
    async fn duplicate_ids_are_a_validation_error() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let product_id = setup_product(&app, &token).await;

        let id = app.upload_product_image(&token, product_id, None).await.id();

        let res = app
            .post_with_token(
                routes::PRODUCT_IMAGES_REORDER,
                &json!({ "images": [
                    { "id": id, "sort_order": 0 },
                    { "id": id, "sort_order": 1 },
                ]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn empty_list_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let res = app
            .post_with_token(routes::PRODUCT_IMAGES_REORDER, &json!({ "images": [] }), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn delete_removes_row_and_blob() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;
        let product_id = setup_product(&app, &token).await;

        let created = app.upload_product_image(&token, product_id, None).await;
        let id = created.id();
        let url = created.body["image_url"].as_str().unwrap().to_string();

        let res = app
            .delete_with_token(&routes::product_image_delete(id), &token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], true);

        assert_eq!(app.get_without_token(&url).await.status, 404);
        let list = app
            .get_with_token(
                &format!("{}?product_id={product_id}", routes::PRODUCT_IMAGES),
                &token,
            )
            .await;
        assert_eq!(list.status, 404);
    }

    #[tokio::test]
    async fn delete_of_missing_image_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let res = app
            .delete_with_token(&routes::product_image_delete(4096), &token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}
