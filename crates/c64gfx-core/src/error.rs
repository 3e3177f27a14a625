use thiserror::Error;

/// Errors raised by the conversion pipeline.
///
/// Quantization and constraint resolution never fail; every variant here is
/// detected before a stage produces output, so no partial asset is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GfxError {
    /// The grid cannot be split into whole cells, or does not have the
    /// resolution the requested mode needs.
    #[error("dimension error: {0}")]
    Dimension(String),

    /// An encoder buffer would not have the fixed length the hardware expects.
    #[error("size mismatch for {what}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Invalid mode configuration (budget, shared slots, tag or color index).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Strict mode only: a cell needed more colors than its budget allows.
    #[error("color conflict in cell ({cell_x},{cell_y}): {colors:?}")]
    Conflict {
        cell_x: usize,
        cell_y: usize,
        colors: Vec<u8>,
    },
}

pub type Result<T> = std::result::Result<T, GfxError>;
