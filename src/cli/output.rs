//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Pattern(err) => format!("Error: {}", err),
        ApiError::SourceNotFound(name) => {
            format!("Error: no source image named {} in storage", name)
        }
        _ => format!("Error: {}", e),
    }
}
