pub mod geometry;
pub mod image;
pub mod normal;
pub mod point_cloud;
pub mod runtime;

pub use geometry::*;
pub use image::*;
pub use normal::*;
pub use point_cloud::*;
pub use runtime::{current_cpu_threads, init_global_thread_pool};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
