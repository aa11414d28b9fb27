//! Hand landmark data model.
//!
//! One detector invocation yields a [`DetectionResult`]: zero or more hands, each an ordered set
//! of 21 [`HandLandmarks`] keypoints with normalized coordinates.

/// Names for the hand pose landmarks.
///
/// # Terminology
///
/// - **CMC**: [Carpometacarpal joint], the lowest joint of the thumb, located near the wrist.
/// - **MCP**: [Metacarpophalangeal joint], the lower joint forming the knuckles near the palm of
///   the hand.
/// - **PIP**: Proximal Interphalangeal joint, the joint between the MCP and DIP.
/// - **DIP**: Distal Interphalangeal joint, the highest joint of a finger.
/// - **Tip**: This landmark is just placed on the tip of the finger, above the DIP.
///
/// [Carpometacarpal joint]: https://en.wikipedia.org/wiki/Carpometacarpal_joint
/// [Metacarpophalangeal joint]: https://en.wikipedia.org/wiki/Metacarpophalangeal_joint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// The fixed skeleton topology: 21 landmark index pairs connected by overlay line segments.
pub const CONNECTIVITY: [(LandmarkIdx, LandmarkIdx); 21] = {
    use LandmarkIdx::*;
    [
        // Thumb:
        (Wrist, ThumbCmc),
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // Index:
        (Wrist, IndexFingerMcp),
        (IndexFingerMcp, IndexFingerPip),
        (IndexFingerPip, IndexFingerDip),
        (IndexFingerDip, IndexFingerTip),
        // Middle:
        (IndexFingerMcp, MiddleFingerMcp),
        (MiddleFingerMcp, MiddleFingerPip),
        (MiddleFingerPip, MiddleFingerDip),
        (MiddleFingerDip, MiddleFingerTip),
        // Ring:
        (MiddleFingerMcp, RingFingerMcp),
        (RingFingerMcp, RingFingerPip),
        (RingFingerPip, RingFingerDip),
        (RingFingerDip, RingFingerTip),
        // Pinky:
        (RingFingerMcp, PinkyMcp),
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
        // Palm edge:
        (Wrist, PinkyMcp),
    ]
};

/// One tracked hand: 21 landmarks with normalized x/y coordinates in `[0, 1]` and a
/// detector-defined depth.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    positions: [[f32; 3]; Self::NUM_LANDMARKS],
}

impl HandLandmarks {
    pub const NUM_LANDMARKS: usize = 21;

    pub fn from_positions(positions: [[f32; 3]; Self::NUM_LANDMARKS]) -> Self {
        Self { positions }
    }

    /// Returns a landmark's normalized position.
    pub fn position(&self, index: LandmarkIdx) -> [f32; 3] {
        self.positions[index as usize]
    }

    pub fn positions(&self) -> &[[f32; 3]; Self::NUM_LANDMARKS] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [[f32; 3]; Self::NUM_LANDMARKS] {
        &mut self.positions
    }
}

impl Default for HandLandmarks {
    fn default() -> Self {
        Self {
            positions: [[0.0; 3]; Self::NUM_LANDMARKS],
        }
    }
}

/// The full output of one detector invocation.
///
/// Produced once per processed frame and consumed once by the renderer; never retained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    hands: Vec<HandLandmarks>,
}

impl DetectionResult {
    /// A result with no detected hands.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(hands: Vec<HandLandmarks>) -> Self {
        Self { hands }
    }

    pub fn hands(&self) -> &[HandLandmarks] {
        &self.hands
    }

    pub fn num_hands(&self) -> usize {
        self.hands.len()
    }

    /// One-line human-readable status summary.
    pub fn summary(&self) -> String {
        if self.hands.is_empty() {
            "No hands detected".to_string()
        } else {
            format!("Hand detected: {} hand(s)", self.hands.len())
        }
    }
}
