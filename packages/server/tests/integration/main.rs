mod common;

mod category;
mod material;
mod product_image;
mod product_size_image;
