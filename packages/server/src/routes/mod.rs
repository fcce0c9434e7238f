use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;
use crate::utils::image::image_upload_body_limit;

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/materials", material_routes())
        .nest("/product-images", product_image_routes())
        .nest("/product-size-image", product_size_image_routes())
}

fn category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::category::list_categories))
        .routes(routes!(handlers::category::create_category))
        .routes(routes!(
            handlers::category::get_category,
            handlers::category::update_category
        ))
        .routes(routes!(handlers::category::delete_category))
        .layer(image_upload_body_limit())
}

fn product_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::product::list_products))
        .routes(routes!(handlers::product::filter_products))
        .routes(routes!(handlers::product::search_products))
        .routes(routes!(handlers::product::recommended_products))
        .routes(routes!(handlers::product::create_product))
        .routes(routes!(handlers::product::update_product))
        .routes(routes!(handlers::product::delete_product))
}

fn material_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::material::list_materials))
        .routes(routes!(handlers::material::create_material))
        .routes(routes!(
            handlers::material::get_material,
            handlers::material::update_material
        ))
        .routes(routes!(handlers::material::delete_material))
}

fn product_image_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::product_image::list_product_images))
        .routes(routes!(handlers::product_image::create_product_image))
        .routes(routes!(handlers::product_image::reorder_product_images))
        .routes(routes!(handlers::product_image::update_product_image))
        .routes(routes!(handlers::product_image::delete_product_image))
        .layer(image_upload_body_limit())
}

fn product_size_image_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::product_size_image::create_size_image))
        .routes(routes!(
            handlers::product_size_image::get_size_image,
            handlers::product_size_image::update_size_image
        ))
        .routes(routes!(handlers::product_size_image::delete_size_image))
        .layer(image_upload_body_limit())
}
