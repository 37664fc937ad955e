//! Device capability error types.
//!
//! Every platform call that touches device-global audio state can fail for
//! reasons outside the engine's control. These errors are always recovered
//! locally: the affected side effect is skipped and playback continues.

use thiserror::Error;

/// Errors reported by an [`AudioDevice`](super::AudioDevice) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The caller lacks the permission required for this operation.
    #[error("権限がありません: {0}")]
    PermissionDenied(String),

    /// The operation is not supported on this platform version.
    #[error("このプラットフォームではサポートされていません: {0}")]
    Unsupported(String),

    /// The underlying system service is not reachable.
    #[error("システムサービスが利用できません: {0}")]
    Unavailable(String),

    /// Any other platform failure.
    #[error("プラットフォームエラー: {0}")]
    Platform(String),
}

impl DeviceError {
    /// Returns true if this error is a permission denial.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    /// Returns true if the operation can never succeed on this device.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeviceError::PermissionDenied("set_interruption_filter".to_string());
        assert!(err.to_string().contains("set_interruption_filter"));
        assert!(err.to_string().contains("権限"));

        let err = DeviceError::Unsupported("zen_mode".to_string());
        assert!(err.to_string().contains("zen_mode"));

        let err = DeviceError::Unavailable("audio service".to_string());
        assert!(err.to_string().contains("audio service"));

        let err = DeviceError::Platform("boom".to_string());
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_classification() {
        assert!(DeviceError::PermissionDenied("x".into()).is_permission_denied());
        assert!(!DeviceError::Platform("x".into()).is_permission_denied());
        assert!(DeviceError::Unsupported("x".into()).is_unsupported());
        assert!(!DeviceError::Unavailable("x".into()).is_unsupported());
    }
}
