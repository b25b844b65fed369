use rand::{Rng, RngCore};
use rand_distr::{Bernoulli, Distribution};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::TypewriterConfig;
use crate::error::{Result, TypewriterError};
use crate::keyboard::decoy_char;
use crate::surface::{delete_trailing, SharedSurface};
use crate::typewriter::Typewriter;

/// Invoked with the owning typewriter each time a job finishes a full pass.
pub type Callback = Box<dyn FnMut(&mut Typewriter)>;

pub struct EmissionJob {
    pub(crate) target: SharedSurface,
    pub(crate) text: Vec<char>,
    pub(crate) index: usize,
    pub(crate) clear_before_start: bool,
    pub(crate) callback: Option<Callback>,
    pub(crate) start_delay: Option<u64>,
    pub(crate) mistype_pending: bool,
    /// The next step begins a pass (first run or loop restart).
    pub(crate) restart_pending: bool,
    pub(crate) wake_at: u64,
}

impl EmissionJob {
    pub fn new(target: SharedSurface, text: &str, clear_before_start: bool) -> Self {
        Self {
            target,
            text: text.chars().collect(),
            index: 0,
            clear_before_start,
            callback: None,
            start_delay: None,
            mistype_pending: false,
            restart_pending: true,
            wake_at: 0,
        }
    }

    pub fn wake_at(&self) -> u64 {
        self.wake_at
    }
}

/// What a single step did to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Typed(char),
    Mistyped(char),
    Backspaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The job wants another wake-up after `delay_ms`.
    Scheduled { action: StepAction, delay_ms: u64 },
    /// Every character has been emitted.
    Finished,
}

pub struct ScheduledEmitter {
    config: TypewriterConfig,
    backtrack: Option<Bernoulli>,
    rng: Box<dyn RngCore>,
}

impl ScheduledEmitter {
    pub fn new(config: TypewriterConfig, rng: Box<dyn RngCore>) -> Result<Self> {
        config.validate()?;
        let backtrack = if config.backtrack_probability > 0.0 {
            let dist = Bernoulli::new(config.backtrack_probability)
                .map_err(|e| TypewriterError::InvalidConfig(format!("backtrackProbability: {e}")))?;
            Some(dist)
        } else {
            None
        };
        Ok(Self {
            config,
            backtrack,
            rng,
        })
    }

    pub fn config(&self) -> &TypewriterConfig {
        &self.config
    }

    /// Run one wake-up of `job` at time `now`. Cancellation is the caller's
    /// concern and must be checked before calling this.
    pub fn step(&mut self, job: &mut EmissionJob, now: u64) -> StepOutcome {
        if job.restart_pending {
            job.restart_pending = false;
            if job.clear_before_start {
                job.target.borrow_mut().replace_contents("");
            }
        }

        let Some(&intended) = job.text.get(job.index) else {
            return StepOutcome::Finished;
        };

        let (handled, action) = if !job.mistype_pending && self.roll_backtrack() {
            let decoy = decoy_char(intended, self.config.smart_backtracking, &mut self.rng);
            append_char(job, decoy);
            job.mistype_pending = true;
            (decoy, StepAction::Mistyped(decoy))
        } else if job.mistype_pending {
            delete_trailing(&mut *job.target.borrow_mut(), 1);
            job.mistype_pending = false;
            (intended, StepAction::Backspaced)
        } else {
            append_char(job, intended);
            job.index += 1;
            (intended, StepAction::Typed(intended))
        };

        let delay_ms = self.next_delay(handled, matches!(action, StepAction::Mistyped(_)));
        job.wake_at = now.saturating_add(delay_ms);
        trace!(?action, delay_ms, index = job.index, "step");
        StepOutcome::Scheduled { action, delay_ms }
    }

    /// Rewind a finished looping job so it starts over after the loop wait.
    pub fn schedule_restart(&self, job: &mut EmissionJob, now: u64) {
        job.index = 0;
        job.mistype_pending = false;
        job.restart_pending = true;
        job.wake_at = now.saturating_add(self.config.loop_wait_ms);
    }

    /// Delay before the step following one that handled `handled`.
    pub fn next_delay(&mut self, handled: char, decoy_step: bool) -> u64 {
        let pause = self.config.pause_between_words_ms;
        if pause > 0 && (handled == ' ' || handled == '\n') {
            return pause;
        }

        let mut delay = self.config.interval_ms;
        if self.config.flexibility_ms > 0 {
            delay = match self.jitter() {
                (true, magnitude) => delay.saturating_add(magnitude),
                (false, magnitude) => delay.saturating_sub(magnitude),
            };
        }
        if decoy_step {
            delay = delay.saturating_add(self.config.backtrack_delay_ms);
        }
        delay
    }

    /// Direction (`true` adds) and magnitude `ceil(random * flexibility)`.
    ///
    /// Zero only comes out when the uniform draw is exactly zero, so the
    /// distribution leans away from the base interval.
    fn jitter(&mut self) -> (bool, u64) {
        let positive = self.rng.gen::<f64>() < 0.5;
        let magnitude = (self.rng.gen::<f64>() * self.config.flexibility_ms as f64).ceil() as u64;
        (positive, magnitude)
    }

    fn roll_backtrack(&mut self) -> bool {
        match &self.backtrack {
            Some(dist) => dist.sample(&mut self.rng),
            None => false,
        }
    }
}

fn append_char(job: &EmissionJob, c: char) {
    let mut buf = [0u8; 4];
    job.target
        .borrow_mut()
        .append_contents(c.encode_utf8(&mut buf));
}
