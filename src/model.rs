use serde::{Deserialize, Serialize};

use crate::config::TypewriterConfig;
use crate::emitter::StepAction;

pub const RECORDING_VERSION: u32 = 1;

/// Surface contents as of one point on the typewriter's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub at_ms: u64,
    pub contents: String,
    /// The step that produced this frame, if one did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<StepAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub version: u32,
    pub config: TypewriterConfig,
    pub frames: Vec<Frame>,
}
