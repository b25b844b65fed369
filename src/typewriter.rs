use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::debug;

use crate::config::TypewriterConfig;
use crate::emitter::{Callback, EmissionJob, ScheduledEmitter, StepAction, StepOutcome};
use crate::error::{Result, TypewriterError};
use crate::surface::SharedSurface;

/// Per-request options for [`Typewriter::write`] and [`Typewriter::append`].
#[derive(Default)]
pub struct WriteOptions {
    pub callback: Option<Callback>,
    /// Milliseconds to wait before the first step. Must be finite and >= 0.
    pub delay: Option<f64>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(mut self, callback: impl FnMut(&mut Typewriter) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn delay(mut self, delay_ms: f64) -> Self {
        self.delay = Some(delay_ms);
        self
    }
}

/// Serializes write and append requests; one job types at a time.
pub struct Typewriter {
    emitter: ScheduledEmitter,
    queue: VecDeque<EmissionJob>,
    active: Option<EmissionJob>,
    cancel_requested: bool,
    in_callback: bool,
    now: u64,
    last_action: Option<StepAction>,
}

impl Typewriter {
    pub fn new(config: TypewriterConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Build an instance drawing jitter and mistakes from `rng`.
    pub fn with_rng(config: TypewriterConfig, rng: impl RngCore + 'static) -> Result<Self> {
        Ok(Self {
            emitter: ScheduledEmitter::new(config, Box::new(rng))?,
            queue: VecDeque::new(),
            active: None,
            cancel_requested: false,
            in_callback: false,
            now: 0,
            last_action: None,
        })
    }

    pub fn config(&self) -> &TypewriterConfig {
        self.emitter.config()
    }

    /// Clear `target` and type `text` into it.
    pub fn write(
        &mut self,
        target: SharedSurface,
        text: &str,
        options: WriteOptions,
    ) -> Result<()> {
        self.submit(target, text, options, true)
    }

    /// Type `text` after whatever `target` already shows.
    pub fn append(
        &mut self,
        target: SharedSurface,
        text: &str,
        options: WriteOptions,
    ) -> Result<()> {
        self.submit(target, text, options, false)
    }

    /// Drop every pending request. The active job keeps running.
    pub fn clear_queue(&mut self) {
        if !self.queue.is_empty() {
            debug!(dropped = self.queue.len(), "queue cleared");
        }
        self.queue.clear();
    }

    /// Cancel the active job at its next step and drop every pending request.
    ///
    /// The cancelled job's callback never fires. Whatever the step in flight
    /// already rendered stays on the surface.
    pub fn kill_activity(&mut self) {
        if self.active.is_some() {
            debug!("cancellation requested");
            self.cancel_requested = true;
        }
        self.clear_queue();
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Current position of this instance's timeline, in ms.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// What the step run by the latest wake-up (or admission) did to its
    /// surface. `None` when no step ran, e.g. a job only finished.
    pub fn last_action(&self) -> Option<StepAction> {
        self.last_action
    }

    /// When the active job wants its next step, or `None` when idle.
    pub fn next_wake(&self) -> Option<u64> {
        self.active.as_ref().map(EmissionJob::wake_at)
    }

    /// Move the timeline to `now` and run the active job's step if it is due.
    ///
    /// Runs at most one step of the active job; a job started because that
    /// step finished or cancelled the previous one also gets its first step.
    /// Calls made from inside a completion callback are ignored.
    pub fn wake(&mut self, now: u64) {
        if self.in_callback {
            return;
        }
        self.now = self.now.max(now);
        self.last_action = None;
        if self.next_wake().is_some_and(|at| at <= self.now) {
            self.run_active();
        }
    }

    fn submit(
        &mut self,
        target: SharedSurface,
        text: &str,
        options: WriteOptions,
        clear_before_start: bool,
    ) -> Result<()> {
        check_target(&target)?;
        let start_delay = options.delay.map(check_delay).transpose()?;

        let mut job = EmissionJob::new(target, text, clear_before_start);
        job.callback = options.callback;
        job.start_delay = start_delay;

        if self.active.is_some() {
            self.queue.push_back(job);
            debug!(
                chars = text.chars().count(),
                queued = self.queue.len(),
                "request queued"
            );
            return Ok(());
        }

        debug!(chars = text.chars().count(), clear_before_start, "request started");
        self.last_action = None;
        if self.activate(job) {
            self.run_active();
        }
        Ok(())
    }

    /// Make `job` the active one. Returns whether its first step runs now.
    fn activate(&mut self, mut job: EmissionJob) -> bool {
        job.restart_pending = true;
        let immediate = job.start_delay.is_none();
        job.wake_at = self.now.saturating_add(job.start_delay.unwrap_or(0));
        self.active = Some(job);
        immediate
    }

    fn run_active(&mut self) {
        loop {
            let Some(job) = self.active.as_mut() else {
                return;
            };

            if self.cancel_requested {
                self.cancel_requested = false;
                self.active = None;
                debug!("active job cancelled");
            } else {
                match self.emitter.step(job, self.now) {
                    StepOutcome::Scheduled { action, .. } => {
                        self.last_action = Some(action);
                        return;
                    }
                    StepOutcome::Finished => {
                        if !self.finish_active() {
                            return;
                        }
                    }
                }
            }

            match self.queue.pop_front() {
                Some(next) => {
                    debug!(queued = self.queue.len(), "dequeued next request");
                    if !self.activate(next) {
                        return;
                    }
                }
                None => {
                    debug!("idle");
                    return;
                }
            }
        }
    }

    /// Fire the finished job's callback, then either schedule its next pass
    /// or retire it. Returns whether the queue should advance.
    fn finish_active(&mut self) -> bool {
        let mut callback = self.active.as_mut().and_then(|job| job.callback.take());
        if let Some(cb) = callback.as_mut() {
            self.in_callback = true;
            cb(self);
            self.in_callback = false;
        }

        let now = self.now;
        let Some(job) = self.active.as_mut() else {
            return true;
        };
        job.callback = callback;

        if self.cancel_requested {
            self.cancel_requested = false;
            self.active = None;
            debug!("job finished; cancelled from its callback");
            return true;
        }

        if self.emitter.config().infinite {
            self.emitter.schedule_restart(job, now);
            debug!(restart_at = job.wake_at(), "job finished a pass; looping");
            return false;
        }

        self.active = None;
        debug!("job finished");
        true
    }
}

fn check_target(target: &SharedSurface) -> Result<()> {
    let surface = target.try_borrow().map_err(|_| {
        TypewriterError::InvalidArgument("target surface is already borrowed".to_string())
    })?;
    if !surface.is_attached() {
        return Err(TypewriterError::InvalidArgument(
            "target surface is not attached".to_string(),
        ));
    }
    Ok(())
}

fn check_delay(delay: f64) -> Result<u64> {
    if !delay.is_finite() || delay < 0.0 {
        return Err(TypewriterError::InvalidArgument(format!(
            "delay must be a number >= 0, got {delay}"
        )));
    }
    Ok(delay.ceil() as u64)
}
