use reqwest::multipart::Form;

use crate::common::{TestApp, png_part, routes};

mod listing {
    use super::*;

    #[tokio::test]
    async fn empty_catalog_is_an_informational_not_found() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let res = app.get_with_token(routes::CATEGORIES, &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["message"], "Categories not found");
        // Informational envelope, not a structural error body.
        assert!(res.body.get("code").is_none());
    }

    #[tokio::test]
    async fn list_carries_product_counts() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let with_products = app.create_category(&token, "Chairs").await;
        let empty = app.create_category(&token, "Tables").await;
        app.create_product(&token, "Oslo", "CHR-1", with_products, &[])
            .await;
        app.create_product(&token, "Bergen", "CHR-2", with_products, &[])
            .await;

        let res = app.get_with_token(routes::CATEGORIES, &token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], true);

        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        let count_of = |id: i32| {
            data.iter()
                .find(|c| c["id"] == id)
                .map(|c| c["product_count"].as_i64().unwrap())
                .unwrap()
        };
        assert_eq!(count_of(with_products), 2);
        assert_eq!(count_of(empty), 0);
    }

    #[tokio::test]
    async fn detail_view_populates_products() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let category_id = app.create_category(&token, "Sofas").await;
        let material_id = app.create_material(&token, "Velvet").await;
        let product_id = app
            .create_product(&token, "Luna", "SOF-1", category_id, &[material_id])
            .await;
        app.upload_product_image(&token, product_id, None).await;

        let res = app
            .get_with_token(&routes::category(category_id), &token)
            .await;
        assert_eq!(res.status, 200);

        let products = res.body["data"]["products"].as_array().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["id"], product_id);
        assert_eq!(products[0]["materials"][0]["name"], "Velvet");
        assert_eq!(products[0]["images"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn detail_of_missing_category_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let res = app.get_with_token(&routes::category(4096), &token).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn create_with_image_stores_and_links_the_blob() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let form = Form::new()
            .text("name", "Wardrobes")
            .part("image", png_part("wardrobe.png"));
        let res = app
            .post_multipart_with_token(routes::CATEGORIES_STORE, form, &token)
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["name"], "Wardrobes");
        let image_url = res.body["image_url"].as_str().unwrap();
        assert!(image_url.starts_with("/uploads/categories/"));

        // The stored blob is resolvable through the upload route.
        let image = app.get_without_token(image_url).await;
        assert_eq!(image.status, 200);
    }

    #[tokio::test]
    async fn create_without_image_is_allowed() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let form = Form::new().text("name", "Desks");
        let res = app
            .post_multipart_with_token(routes::CATEGORIES_STORE, form, &token)
            .await;

        assert_eq!(res.status, 201);
        assert!(res.body["image_url"].is_null());
    }

    #[tokio::test]
    async fn create_without_name_fails() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let form = Form::new().part("image", png_part("x.png"));
        let res = app
            .post_multipart_with_token(routes::CATEGORIES_STORE, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn create_with_overlong_name_fails() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let form = Form::new().text("name", "x".repeat(256));
        let res = app
            .post_multipart_with_token(routes::CATEGORIES_STORE, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn create_rejects_non_image_uploads() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let part = reqwest::multipart::Part::bytes(b"%PDF-1.7".to_vec())
            .file_name("catalog.pdf")
            .mime_str("application/pdf")
            .unwrap();
        let form = Form::new().text("name", "Beds").part("image", part);
        let res = app
            .post_multipart_with_token(routes::CATEGORIES_STORE, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn replacing_the_image_deletes_the_old_blob() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let form = Form::new()
            .text("name", "Lamps")
            .part("image", png_part("old.png"));
        let created = app
            .post_multipart_with_token(routes::CATEGORIES_STORE, form, &token)
            .await;
        assert_eq!(created.status, 201);
        let id = created.id();
        let old_url = created.body["image_url"].as_str().unwrap().to_string();
        assert_eq!(app.get_without_token(&old_url).await.status, 200);

        let form = Form::new().part("image", png_part("new.png"));
        let updated = app
            .patch_multipart_with_token(&routes::category(id), form, &token)
            .await;
        assert_eq!(updated.status, 200);
        let new_url = updated.body["image_url"].as_str().unwrap().to_string();
        assert_ne!(new_url, old_url);

        // Old blob gone, new one resolvable.
        assert_eq!(app.get_without_token(&old_url).await.status, 404);
        assert_eq!(app.get_without_token(&new_url).await.status, 200);
    }

    #[tokio::test]
    async fn omitting_the_image_keeps_the_current_one() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let form = Form::new()
            .text("name", "Rugs")
            .part("image", png_part("rug.png"));
        let created = app
            .post_multipart_with_token(routes::CATEGORIES_STORE, form, &token)
            .await;
        let id = created.id();
        let old_url = created.body["image_url"].as_str().unwrap().to_string();

        let form = Form::new().text("name", "Carpets");
        let updated = app
            .patch_multipart_with_token(&routes::category(id), form, &token)
            .await;

        assert_eq!(updated.status, 200);
        assert_eq!(updated.body["name"], "Carpets");
        assert_eq!(updated.body["image_url"], old_url.as_str());
        assert_eq!(app.get_without_token(&old_url).await.status, 200);
    }

    #[tokio::test]
    async fn updating_a_missing_category_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let form = Form::new().text("name", "Ghost");
        let res = app
            .patch_multipart_with_token(&routes::category(4096), form, &token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn delete_removes_row_and_blob() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let form = Form::new()
            .text("name", "Mirrors")
            .part("image", png_part("mirror.png"));
        let created = app
            .post_multipart_with_token(routes::CATEGORIES_STORE, form, &token)
            .await;
        let id = created.id();
        let image_url = created.body["image_url"].as_str().unwrap().to_string();

        let res = app
            .delete_with_token(&routes::category_delete(id), &token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], true);

        assert_eq!(app.get_without_token(&image_url).await.status, 404);
        let list = app.get_with_token(routes::CATEGORIES, &token).await;
        assert_eq!(list.status, 404);
    }

    #[tokio::test]
    async fn deleting_a_missing_category_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let res = app
            .delete_with_token(&routes::category_delete(4096), &token)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn delete_leaves_referencing_products_in_place() {
        let app = TestApp::spawn().await;
        let token = app.login_admin().await;

        let category_id = app.create_category(&token, "Benches").await;
        let product_id = app
            .create_product(&token, "Park Bench", "BEN-1", category_id, &[])
            .await;

        let res = app
            .delete_with_token(&routes::category_delete(category_id), &token)
            .await;
        assert_eq!(res.status, 200);

        // The product survives with its category_id intact and a null
        // category object.
        let res = app.get_with_token(routes::PRODUCTS, &token).await;
        assert_eq!(res.status, 200);
        let data = res.body["data"].as_array().unwrap();
        let product = data.iter().find(|p| p["id"] == product_id).unwrap();
        assert_eq!(product["category_id"], category_id);
        assert!(product["category"].is_null());
    }
}
