//! Error type for glaze.
//!
//! The scattering core itself never fails: degenerate numeric cases collapse
//! to exact zeros. Errors only come from the layers surrounding it, i.e.
//! reading and validating configurations.

use std::path::PathBuf;

/// Errors raised while loading or validating glaze inputs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to read a file from disk.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A parameter holds a value the scattering models can't work with.
    #[error("Invalid parameter '{name}' = {value}: {reason}")]
    InvalidParameter {
        /// Name of the parameter.
        name: &'static str,
        /// The rejected value.
        value: f32,
        /// What the value should satisfy.
        reason: &'static str,
    },

    /// A closure tree was malformed.
    #[error("Invalid closure: {0}")]
    InvalidClosure(String),
}

impl Error {
    /// Creates an [`Error::Io`] for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Checks that `value` is finite and lies in `[lo, hi]`.
    pub fn check_range(name: &'static str, value: f32, lo: f32, hi: f32) -> Result<(), Self> {
        if !value.is_finite() {
            return Err(Self::InvalidParameter {
                name,
                value,
                reason: "must be finite",
            });
        }
        if value < lo || value > hi {
            return Err(Self::InvalidParameter {
                name,
                value,
                reason: "out of range",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_range_rejects_nan_and_out_of_range() {
        assert!(Error::check_range("roughness", 0.5, 0.0, 1.0).is_ok());
        assert!(matches!(
            Error::check_range("roughness", f32::NAN, 0.0, 1.0),
            Err(Error::InvalidParameter {
                reason: "must be finite",
                ..
            })
        ));
        let err = Error::check_range("anisotropy", 1.5, 0.0, 1.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'anisotropy' = 1.5: out of range"
        );
    }
}
