use std::fmt;

/// Where the assistant is within an interaction cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Activated,
    Recording,
    Recognizing,
    Responding,
    Synthesizing,
    Playing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Activated => "activated",
            Phase::Recording => "recording",
            Phase::Recognizing => "recognizing",
            Phase::Responding => "responding",
            Phase::Synthesizing => "synthesizing",
            Phase::Playing => "playing",
        };
        f.write_str(name)
    }
}

/// How an interaction cycle ended. Every variant returns the assistant to
/// [`Phase::Idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The reply was synthesized and handed to the speaker.
    Completed,
    CaptureFailed,
    RecognitionFailed,
    /// Recognition succeeded but produced no usable text.
    NotRecognized,
    /// The language model answered with an empty string.
    NoReply,
    SynthesisFailed,
    /// The reply file was written but could not be played.
    PlaybackFailed,
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CycleOutcome::Completed => "completed",
            CycleOutcome::CaptureFailed => "audio capture failed",
            CycleOutcome::RecognitionFailed => "speech recognition failed",
            CycleOutcome::NotRecognized => "speech not recognized",
            CycleOutcome::NoReply => "language model returned no reply",
            CycleOutcome::SynthesisFailed => "speech synthesis failed",
            CycleOutcome::PlaybackFailed => "playback failed",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Idle.to_string(), "idle");
        assert_eq!(Phase::Recognizing.to_string(), "recognizing");
        assert_eq!(Phase::Playing.to_string(), "playing");
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            CycleOutcome::RecognitionFailed.to_string(),
            "speech recognition failed"
        );
        assert_eq!(CycleOutcome::Completed.to_string(), "completed");
    }
}
