pub mod grad;

pub use grad::{sobel_gradients, Grad};
