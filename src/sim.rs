use std::cell::RefCell;
use std::sync::atomic::AtomicBool;

use anyhow::{anyhow, Result};

use crate::emitter::StepAction;
use crate::model::{Frame, Recording, RECORDING_VERSION};
use crate::playback::drive_with;
use crate::surface::Surface;
use crate::timer::ManualTimer;
use crate::typewriter::Typewriter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordingStats {
    pub frames: usize,
    pub duration_ms: u64,
    pub corrections: usize,
    pub final_chars: usize,
}

pub fn stats(recording: &Recording) -> RecordingStats {
    let mut out = RecordingStats {
        frames: recording.frames.len(),
        ..Default::default()
    };

    for frame in &recording.frames {
        if frame.action == Some(StepAction::Backspaced) {
            out.corrections += 1;
        }
        out.duration_ms = frame.at_ms;
    }
    out.final_chars = recording
        .frames
        .last()
        .map_or(0, |f| f.contents.chars().count());

    out
}

/// Run `tw` on a virtual timeline, capturing `surface` after every wake-up
/// that changed it.
///
/// Requests must already be submitted. A looping config needs `until_ms`.
pub fn record<S: Surface>(
    tw: &mut Typewriter,
    surface: &RefCell<S>,
    until_ms: Option<u64>,
) -> Result<Recording> {
    if tw.config().infinite && until_ms.is_none() {
        return Err(anyhow!("recording a looping typewriter needs a time limit"));
    }

    let mut frames = vec![Frame {
        at_ms: tw.now(),
        contents: surface.borrow().contents(),
        action: tw.last_action(),
    }];

    let stop = AtomicBool::new(false);
    let mut timer = ManualTimer::new();
    timer.advance(tw.now());

    drive_with(tw, &mut timer, &stop, until_ms, |tw, now| {
        let contents = surface.borrow().contents();
        if frames.last().map(|f| &f.contents) != Some(&contents) {
            frames.push(Frame {
                at_ms: now,
                contents,
                action: tw.last_action(),
            });
        }
    })?;

    Ok(Recording {
        version: RECORDING_VERSION,
        config: tw.config().clone(),
        frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(at_ms: u64, contents: &str, action: StepAction) -> Frame {
        Frame {
            at_ms,
            contents: contents.to_string(),
            action: Some(action),
        }
    }

    #[test]
    fn stats_count_backspace_frames() {
        let rec = Recording {
            version: 1,
            config: crate::config::TypewriterConfig::with_interval(10),
            frames: vec![
                frame(0, "a", StepAction::Typed('a')),
                frame(10, "ax", StepAction::Mistyped('x')),
                frame(20, "a", StepAction::Backspaced),
                frame(30, "ab", StepAction::Typed('b')),
                // Restart of a looping write: cleared and retyped in one step.
                frame(40, "a", StepAction::Typed('a')),
                Frame {
                    at_ms: 50,
                    contents: String::new(),
                    action: None,
                },
            ],
        };
        let s = stats(&rec);
        assert_eq!(s.frames, 6);
        assert_eq!(s.duration_ms, 50);
        assert_eq!(s.corrections, 1);
        assert_eq!(s.final_chars, 0);
    }
}
