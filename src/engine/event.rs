//! Engine state and transition events.

// ============================================================================
// EngineState
// ============================================================================

/// Observable state of an [`AlertEngine`](super::AlertEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Never started.
    Idle,
    /// An alert generation is audible or between loop iterations.
    Playing {
        /// Generation being played
        generation: u64,
    },
    /// Stopped, completed or started silently.
    Stopped,
}

impl EngineState {
    /// Returns true if an alert is playing.
    pub fn is_playing(&self) -> bool {
        matches!(self, EngineState::Playing { .. })
    }
}

// ============================================================================
// AlertEvent
// ============================================================================

/// Alert transitions reported on the engine's event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertEvent {
    /// Playback started
    Started {
        /// Generation that started
        generation: u64,
        /// Whether the alert loops
        looping: bool,
    },
    /// A start request produced no sound (disabled, zero volume or no player)
    Silent {
        /// Generation that stayed silent
        generation: u64,
    },
    /// A looping alert played another iteration
    Replayed {
        /// Generation being replayed
        generation: u64,
        /// 1-based iteration number (the first replay is 2)
        iteration: u32,
    },
    /// A non-looping alert played to the end
    Completed {
        /// Generation that completed
        generation: u64,
    },
    /// A newer start request replaced a playing generation
    Superseded {
        /// Generation that was replaced
        generation: u64,
    },
    /// The owner stopped a playing alert
    Stopped {
        /// Generation that was stopped
        generation: u64,
    },
}

impl AlertEvent {
    /// Generation the event refers to.
    pub fn generation(&self) -> u64 {
        match *self {
            AlertEvent::Started { generation, .. }
            | AlertEvent::Silent { generation }
            | AlertEvent::Replayed { generation, .. }
            | AlertEvent::Completed { generation }
            | AlertEvent::Superseded { generation }
            | AlertEvent::Stopped { generation } => generation,
        }
    }

    /// Returns true if the event ends audible playback of its generation.
    pub fn ends_playback(&self) -> bool {
        matches!(
            self,
            AlertEvent::Silent { .. }
                | AlertEvent::Completed { .. }
                | AlertEvent::Superseded { .. }
                | AlertEvent::Stopped { .. }
        )
    }
}
