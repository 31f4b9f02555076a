pub mod pivot;

pub use pivot::extract;
