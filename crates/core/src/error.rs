/// Result alias that carries the custom [`VisualiserError`] type.
pub type Result<T> = std::result::Result<T, VisualiserError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum VisualiserError {
    /// The capture device could not be opened or the user refused access.
    #[error("audio source acquisition denied: {0}")]
    SourceAcquisitionDenied(String),
    /// The supplied bytes are not a playable audio file.
    #[error("failed to decode audio: {0}")]
    DecodeFailure(String),
    /// A frame was requested while no audio source is bound.
    #[error("no active audio source")]
    NoActiveSource,
    /// A render parameter write was rejected.
    #[error("invalid render parameter: {0}")]
    InvalidParameter(String),
    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("fft failed: {0}")]
    Fft(#[from] realfft::FftError),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Free-form message for failures that do not fit another variant.
    #[error("{0}")]
    Message(String),
}

impl VisualiserError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Returns true for failures that end a start attempt but leave the
    /// session usable for another one.
    pub fn is_acquisition_failure(&self) -> bool {
        matches!(
            self,
            Self::SourceAcquisitionDenied(_) | Self::DecodeFailure(_)
        )
    }
}

impl From<&str> for VisualiserError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for VisualiserError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_acquisition_failures() {
        assert!(VisualiserError::SourceAcquisitionDenied("denied".into()).is_acquisition_failure());
        assert!(VisualiserError::DecodeFailure("garbage".into()).is_acquisition_failure());
        assert!(!VisualiserError::NoActiveSource.is_acquisition_failure());
    }

    #[test]
    fn converts_plain_messages() {
        let err: VisualiserError = "something broke".into();
        assert_eq!(format!("{err}"), "something broke");
    }
}
