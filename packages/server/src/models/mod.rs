pub mod auth;
pub mod category;
pub mod material;
pub mod product;
pub mod product_image;
pub mod product_size_image;
pub mod shared;
