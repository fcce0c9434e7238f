mod error;
mod traits;

pub mod filesystem;

#[cfg(feature = "cloudinary")]
pub mod cloudinary;

pub use error::StorageError;
pub use traits::{ImageStore, StoredImage};
