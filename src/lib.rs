pub mod classify;
pub mod error;
pub mod evaluate;
pub mod image;
pub mod mnist;
pub mod profile;

pub use classify::{classify, classify_all, Prediction};
pub use error::{Error, Result};
pub use image::ImageRecord;
pub use profile::{ClassProfile, ClassProfiles};

// Images are IMAGE_SIZE x IMAGE_SIZE pixels
pub const IMAGE_SIZE: usize = 28;
pub const IMAGE_AREA: usize = IMAGE_SIZE * IMAGE_SIZE;
// Digits 0-9
pub const N_CLASSES: usize = 10;
