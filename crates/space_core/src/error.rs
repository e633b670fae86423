//! Error type shared by the mesh builders, the well aggregator and scene loading.

use crate::wells::WellCategory;

/// Errors reported by space_core operations.
///
/// Every variant except `Io` and `Json` is an invalid-configuration error:
/// the request was rejected before any output was written.
#[derive(Debug)]
pub enum SgtError {
    /// `size_min` is larger than `size_max`.
    InvertedSizeRange { min: f32, max: f32 },
    /// A scalar parameter is outside its valid range.
    InvalidParameter { name: &'static str, value: f32 },
    /// The batch would need more vertices than a `u32` index buffer can address.
    TooManyQuads { requested: usize, max: usize },
    /// A category capacity is larger than the shader-side array.
    CapacityExceedsLimit {
        category: WellCategory,
        capacity: usize,
        limit: usize,
    },
    /// File system error while loading a scene
    Io(std::io::Error),
    /// JSON parse error while loading a scene
    Json(String),
}

impl SgtError {
    /// True for errors caused by a bad request rather than by I/O.
    pub fn is_invalid_configuration(&self) -> bool {
        !matches!(self, SgtError::Io(_) | SgtError::Json(_))
    }
}

impl std::fmt::Display for SgtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SgtError::InvertedSizeRange { min, max } => {
                write!(f, "Invalid size range: min {} is larger than max {}", min, max)
            }
            SgtError::InvalidParameter { name, value } => {
                write!(f, "Invalid value for {}: {}", name, value)
            }
            SgtError::TooManyQuads { requested, max } => {
                write!(f, "Too many quads: {} requested, at most {}", requested, max)
            }
            SgtError::CapacityExceedsLimit {
                category,
                capacity,
                limit,
            } => write!(
                f,
                "{:?} capacity {} exceeds shader limit {}",
                category, capacity, limit
            ),
            SgtError::Io(e) => write!(f, "IO error: {}", e),
            SgtError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for SgtError {}

impl From<std::io::Error> for SgtError {
    fn from(e: std::io::Error) -> Self {
        SgtError::Io(e)
    }
}

impl From<serde_json::Error> for SgtError {
    fn from(e: serde_json::Error) -> Self {
        SgtError::Json(e.to_string())
    }
}

/// Result type for space_core operations.
pub type SgtResult<T> = Result<T, SgtError>;

/// Reject NaN, infinities and negative values.
pub(crate) fn require_non_negative(name: &'static str, value: f32) -> SgtResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SgtError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_and_json_are_not_configuration_errors() {
        let io = SgtError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!io.is_invalid_configuration());
        assert!(!SgtError::Json("bad".into()).is_invalid_configuration());
        assert!(SgtError::InvertedSizeRange { min: 2.0, max: 1.0 }.is_invalid_configuration());
    }

    #[test]
    fn test_require_non_negative() {
        assert!(require_non_negative("radius", 0.0).is_ok());
        assert!(require_non_negative("radius", -1.0).is_err());
        assert!(require_non_negative("radius", f32::NAN).is_err());
        assert!(require_non_negative("radius", f32::INFINITY).is_err());
    }

    #[test]
    fn test_display_mentions_values() {
        let msg = SgtError::CapacityExceedsLimit {
            category: WellCategory::Ripple,
            capacity: 20,
            limit: 16,
        }
        .to_string();
        assert!(msg.contains("Ripple"));
        assert!(msg.contains("20"));
    }
}
