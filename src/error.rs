use thiserror::Error;

/// Top-level error type for the alphamesh pipeline.
#[derive(Debug, Error)]
pub enum AlphameshError {
    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),
}

/// Errors related to pixel-grid construction.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("alpha buffer holds {actual} values, expected {expected} for {width}x{height}")]
    SizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
}

/// Errors related to boundary tracing.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("boundary edges do not close into loops ({remaining} edges left open)")]
    MalformedBoundary { remaining: usize },
}

/// Errors related to polygon clipping operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Errors related to triangulation and mesh assembly.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("mesh would hold {vertices} vertices, beyond the 16-bit index ceiling")]
    CapacityExceeded { vertices: usize },

    #[error("tessellation failed: {0}")]
    Failed(String),
}

impl AlphameshError {
    /// Returns `true` for the recoverable 16-bit capacity overflow, for
    /// which callers substitute a fallback mesh.
    #[must_use]
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(
            self,
            Self::Tessellation(TessellationError::CapacityExceeded { .. })
        )
    }
}

/// Convenience type alias for results using [`AlphameshError`].
pub type Result<T> = std::result::Result<T, AlphameshError>;
