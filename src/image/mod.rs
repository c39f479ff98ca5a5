pub mod contrast;
pub mod f32;
pub mod filters;
pub mod hsv;
pub mod io;
pub mod traits;

pub use self::f32::ImageF32;
pub use self::hsv::{Hsv, HsvImage};
pub use self::traits::{ImageView, ImageViewMut, Rows};
