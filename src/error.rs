#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Degenerate shape: {0}")]
    DegenerateShape(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;

impl ScanError {
    pub(crate) fn empty_image(op: &str) -> Self {
        ScanError::InvalidImage(format!("{op}: image has zero width or height"))
    }
}
