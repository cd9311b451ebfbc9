// error.rs - Error types for the life engine

#[derive(Debug, thiserror::Error)]
pub enum LifeError {
    #[error("no tokio runtime available to drive the life engine")]
    NoRuntime,

    #[error("failed to seed random source from the operating system: {0}")]
    Seed(#[from] rand::Error),

    #[error("grid {width}x{height} cannot hold {cells} cells")]
    InvalidGrid {
        width: usize,
        height: usize,
        cells: usize,
    },

    #[error("invalid value {value:?} for {key}")]
    Config { key: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, LifeError>;
