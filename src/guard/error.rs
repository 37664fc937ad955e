//! Audio state guard error types.
//!
//! A guard error means one override step was skipped. None of them stop an
//! alert from playing: the engine logs them and carries on.

use thiserror::Error;

use crate::device::DeviceError;

/// Reasons an override or restore step was skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// The legacy DND setting is "total silence"; the volume is left alone.
    #[error("おやすみモード（完全サイレント）が有効なため変更をスキップしました")]
    TotalSilence,

    /// Changing DND or the ringer needs notification policy access.
    #[error("通知ポリシーへのアクセス権がないため変更をスキップしました")]
    PolicyAccessDenied,

    /// The DND state could not be read.
    #[error("おやすみモードの状態を取得できません: {0}")]
    DndUnreadable(String),

    /// The device rejected a read or write.
    #[error("オーディオデバイスの操作に失敗しました: {0}")]
    Device(#[from] DeviceError),
}

impl GuardError {
    /// Returns true if the step was refused by Do-Not-Disturb policy rather
    /// than by a device failure.
    #[must_use]
    pub fn is_policy_refusal(&self) -> bool {
        matches!(self, Self::TotalSilence | Self::PolicyAccessDenied)
    }

    /// Returns true if the alert should continue.
    ///
    /// Guard errors only ever skip a side effect, so this is always true.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::TotalSilence => "おやすみモードを解除するとアラート音量が適用されます",
            Self::PolicyAccessDenied => "通知ポリシーへのアクセスを許可してください",
            Self::DndUnreadable(_) => "端末のおやすみモード設定を確認してください",
            Self::Device(_) => "端末のオーディオ設定を確認してください",
        }
    }
}
