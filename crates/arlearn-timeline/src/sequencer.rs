//! Timeline sequencer
//!
//! Pause step lifecycle:
//! 1. The step is lowered to a short marker on `#pauseTrigger`
//! 2. When the marker begins, the engine is paused
//! 3. With `seconds > 0` an auto-resume timer and a 1 s countdown start;
//!    with `seconds == 0` only the advance control resumes
//! 4. `advance`, `resume`, `seek` and `reset` cancel both timers
//!
//! A hold placed by [`TimelineSequencer::hold_until_advance`] keeps the
//! timeline paused through pause-step timers until `advance` or `resume`.

use std::time::Duration;

use arlearn_content::{AnimateStep, Selector, StepSpec};
use arlearn_core::{ArError, ArResult, TimerId, TopicId};
use arlearn_time::{Fired, TimerQueue};

use crate::action::{apply_action, ActionError, StepTarget};
use crate::engine::{AnimationEngine, EngineEvent, EngineStep};

/// Marker element pause steps are lowered onto
pub const PAUSE_TRIGGER: &str = "pauseTrigger";
pub const PROMPT_CONTINUE: &str = "Continue";
pub const PROMPT_CONTINUING: &str = "Continuing...";

/// Sequencer configuration
#[derive(Clone, Debug)]
pub struct SequencerConfig {
    /// Length of the marker step a pause is lowered to
    pub pause_marker: Duration,
    /// Countdown label refresh interval
    pub countdown_interval: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        SequencerConfig {
            pause_marker: Duration::from_millis(100),
            countdown_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PauseTimer {
    AutoResume,
    Countdown,
}

/// Pause step currently holding the timeline
#[derive(Clone, Copy, Debug)]
struct ActivePause {
    step: usize,
    seconds: u32,
    elapsed: u32,
    resume: Option<TimerId>,
    countdown: Option<TimerId>,
}

/// What the advance control did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// A paused timeline was resumed
    Resumed,
    /// Nothing to resume
    Ignored,
}

/// What happened during one tick
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The timeline finished during this tick; reported once per start
    pub completed: bool,
    pub began: Vec<usize>,
    pub finished: Vec<usize>,
    /// A pause timer released the timeline
    pub auto_resumed: bool,
    pub action_failures: usize,
}

/// Data-driven timeline interpreter
pub struct TimelineSequencer {
    config: SequencerConfig,
    engine: Box<dyn AnimationEngine>,
    timers: TimerQueue<PauseTimer>,
    topic: Option<TopicId>,
    steps: Option<Vec<StepSpec>>,
    started: bool,
    completed: bool,
    /// Requested playback rate; 0 holds the timeline
    rate: f64,
    /// Last positive rate, restored when a zero-rate hold is released
    resume_rate: f64,
    pause: Option<ActivePause>,
    /// Paused until the advance control; auto-resume does not release it
    held: bool,
    prompt: String,
    current_step: Option<usize>,
}

impl TimelineSequencer {
    pub fn new(engine: Box<dyn AnimationEngine>) -> Self {
        Self::with_config(engine, SequencerConfig::default())
    }

    pub fn with_config(engine: Box<dyn AnimationEngine>, config: SequencerConfig) -> Self {
        TimelineSequencer {
            config,
            engine,
            timers: TimerQueue::new(),
            topic: None,
            steps: None,
            started: false,
            completed: false,
            rate: 1.0,
            resume_rate: 1.0,
            pause: None,
            held: false,
            prompt: PROMPT_CONTINUE.to_string(),
            current_step: None,
        }
    }

    /// Store the step list for a topic, replacing any previous one
    pub fn load(&mut self, topic: TopicId, steps: Vec<StepSpec>) {
        if self.steps.is_some() {
            tracing::debug!(previous = ?self.topic, "replacing loaded timeline");
            self.reset();
        }
        tracing::debug!(topic = %topic, steps = steps.len(), "timeline loaded");
        self.topic = Some(topic);
        self.steps = Some(steps);
    }

    /// Build the engine timeline and play from the first step
    pub fn start(&mut self) -> ArResult<()> {
        let Some(steps) = &self.steps else {
            tracing::error!("no topic timeline loaded");
            return Err(ArError::TimelineNotLoaded);
        };
        if self.started {
            return Err(ArError::TimelineAlreadyStarted);
        }

        let marker = self.config.pause_marker.as_millis() as u64;
        let lowered: Vec<EngineStep> = steps
            .iter()
            .map(|step| match step {
                StepSpec::Animate(step) => EngineStep::from_animate(step),
                StepSpec::Pause(_) => EngineStep::marker(Selector::id(PAUSE_TRIGGER), marker),
            })
            .collect();
        let count = lowered.len();

        self.engine.build(lowered);
        self.engine.set_timescale(self.resume_rate);
        self.started = true;
        self.completed = false;
        self.held = false;
        self.current_step = None;
        self.prompt = PROMPT_CONTINUE.to_string();

        if self.rate > 0.0 {
            self.engine.play();
        } else {
            tracing::info!("timeline built but held by zero playback rate");
        }
        tracing::info!(topic = ?self.topic, steps = count, "timeline started");
        Ok(())
    }

    pub fn pause(&mut self) {
        if !self.started {
            tracing::debug!("no timeline to pause");
            return;
        }
        self.engine.pause();
    }

    /// Play from wherever the timeline is held. Releases a pause step
    /// and its timers.
    pub fn resume(&mut self) {
        if !self.started {
            tracing::debug!("no timeline to resume");
            return;
        }
        if self.pause.is_some() {
            self.cancel_pause();
            self.prompt = PROMPT_CONTINUE.to_string();
        }
        self.held = false;
        self.release_rate_hold();
        self.engine.play();
    }

    /// Pause and stay paused until `advance` or `resume`, even when a pause
    /// step's timer elapses. Returns whether a new hold was placed.
    pub fn hold_until_advance(&mut self) -> bool {
        if !self.started || self.completed || self.held {
            return false;
        }
        self.engine.pause();
        self.held = true;
        tracing::info!(step = ?self.current_step, "timeline held until advance");
        true
    }

    fn release_rate_hold(&mut self) {
        if self.rate == 0.0 {
            self.rate = self.resume_rate;
        }
        self.engine.set_timescale(self.resume_rate);
    }

    /// Set the speed multiplier. Zero pauses; a positive rate releases a
    /// zero-rate hold.
    pub fn set_playback_rate(&mut self, rate: f64) -> ArResult<()> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(ArError::InvalidPlaybackRate(rate));
        }

        if rate == 0.0 {
            self.rate = 0.0;
            if self.started {
                self.engine.pause();
            }
            tracing::info!("playback rate 0 (paused)");
            return Ok(());
        }

        let was_held = self.rate == 0.0;
        self.rate = rate;
        self.resume_rate = rate;
        self.engine.set_timescale(rate);
        if self.started && was_held && self.pause.is_none() && !self.held {
            self.engine.play();
        }
        tracing::info!(rate, "playback rate set");
        Ok(())
    }

    /// Move to the start of a step and stay paused
    pub fn seek(&mut self, step: usize) -> ArResult<()> {
        if !self.started {
            return Err(ArError::TimelineNotLoaded);
        }
        let len = self.step_count();
        if step >= len {
            return Err(ArError::StepOutOfRange { index: step, len });
        }

        self.engine.pause();
        self.cancel_pause();
        let position = self.engine.step_begin_ms(step).unwrap_or(0);
        self.engine.seek(position);
        self.current_step = Some(step);
        self.prompt = PROMPT_CONTINUE.to_string();
        tracing::info!(step, position_ms = position, "timeline seeked");
        Ok(())
    }

    /// The advance control: resume a paused timeline immediately
    pub fn advance(&mut self) -> AdvanceOutcome {
        if !self.started || !self.engine.is_paused() {
            tracing::debug!(started = self.started, "timeline is currently running, advance ignored");
            return AdvanceOutcome::Ignored;
        }

        self.cancel_pause();
        self.held = false;
        self.release_rate_hold();
        self.engine.play();
        self.prompt = PROMPT_CONTINUE.to_string();
        tracing::info!(step = ?self.current_step, "timeline resumed by advance");
        AdvanceOutcome::Resumed
    }

    /// Drop the timeline, its steps and any pending pause timers
    pub fn reset(&mut self) {
        self.engine.pause();
        self.engine.clear();
        self.timers.clear();
        self.pause = None;
        self.held = false;
        self.steps = None;
        self.topic = None;
        self.started = false;
        self.completed = false;
        self.current_step = None;
        self.prompt = PROMPT_CONTINUE.to_string();
        tracing::debug!("timeline sequencer reset");
    }

    fn cancel_pause(&mut self) {
        if let Some(pause) = self.pause.take() {
            tracing::debug!(step = pause.step, seconds = pause.seconds, "pause timers cancelled");
        }
        self.timers.clear();
    }

    /// Advance by `dt`, interleaving pause timers with engine progress
    pub fn tick(&mut self, dt: Duration, target: &mut dyn StepTarget) -> TickReport {
        let mut report = TickReport::default();
        if !self.started {
            return report;
        }

        let mut remaining = dt;
        loop {
            let slice = match self.timers.time_until_next() {
                Some(until) => remaining.min(until),
                None => remaining,
            };

            let advance = self.engine.advance(slice);
            let fired = self.timers.advance(advance.used);
            let progressed = !advance.events.is_empty() || !fired.is_empty();

            for event in advance.events {
                self.handle_event(event, target, &mut report);
            }
            for timer in fired {
                self.handle_timer(timer, &mut report);
            }

            remaining = remaining.saturating_sub(advance.used);
            if !progressed && (remaining.is_zero() || advance.used.is_zero()) {
                break;
            }
        }
        report
    }

    fn handle_event(&mut self, event: EngineEvent, target: &mut dyn StepTarget, report: &mut TickReport) {
        match event {
            EngineEvent::StepBegan(index) => {
                report.began.push(index);
                self.current_step = Some(index);
                match self.step(index) {
                    Some(StepSpec::Animate(step)) => {
                        tracing::debug!(step = index, label = ?step.label, "step began");
                        report.action_failures += apply_begin(index, &step, target);
                    }
                    Some(StepSpec::Pause(pause)) => self.begin_pause(index, pause.seconds),
                    None => tracing::warn!(step = index, "engine reported unknown step"),
                }
            }
            EngineEvent::StepCompleted(index) => {
                report.finished.push(index);
                if let Some(StepSpec::Animate(step)) = self.step(index) {
                    report.action_failures += apply_complete(index, &step, target);
                }
            }
            EngineEvent::TimelineCompleted => {
                if !self.completed {
                    self.completed = true;
                    report.completed = true;
                    tracing::info!(topic = ?self.topic, "timeline completed");
                }
            }
        }
    }

    fn step(&self, index: usize) -> Option<StepSpec> {
        self.steps.as_ref().and_then(|s| s.get(index)).cloned()
    }

    fn begin_pause(&mut self, step: usize, seconds: u32) {
        self.engine.pause();
        self.cancel_pause();

        let mut pause = ActivePause {
            step,
            seconds,
            elapsed: 0,
            resume: None,
            countdown: None,
        };
        if seconds > 0 {
            self.prompt = format!("Continue ({}s)", seconds);
            pause.countdown = Some(
                self.timers
                    .schedule_repeating(self.config.countdown_interval, PauseTimer::Countdown),
            );
            pause.resume = Some(self.timers.schedule_once(
                Duration::from_secs(u64::from(seconds)),
                PauseTimer::AutoResume,
            ));
            tracing::info!(step, seconds, "pause started, waiting for advance or timer");
        } else {
            self.prompt = PROMPT_CONTINUE.to_string();
            tracing::info!(step, "pause started, waiting for advance only");
        }
        self.pause = Some(pause);
    }

    fn handle_timer(&mut self, timer: Fired<PauseTimer>, report: &mut TickReport) {
        let Some(mut pause) = self.pause else {
            tracing::debug!(timer = ?timer.id, "ignoring stale pause timer");
            return;
        };

        match timer.payload {
            PauseTimer::Countdown if pause.countdown == Some(timer.id) => {
                pause.elapsed += 1;
                let left = pause.seconds.saturating_sub(pause.elapsed);
                self.prompt = if left > 0 {
                    format!("Continue ({}s)", left)
                } else {
                    PROMPT_CONTINUING.to_string()
                };
                self.pause = Some(pause);
                tracing::trace!(step = pause.step, elapsed = pause.elapsed, "paused");
            }
            PauseTimer::AutoResume if pause.resume == Some(timer.id) => {
                self.cancel_pause();
                if !self.engine.is_paused() {
                    return;
                }
                self.prompt = PROMPT_CONTINUING.to_string();
                if self.rate == 0.0 {
                    tracing::info!(step = pause.step, "pause timer elapsed, timeline held by zero rate");
                    return;
                }
                if self.held {
                    tracing::info!(step = pause.step, "pause timer elapsed, timeline held until advance");
                    return;
                }
                self.engine.play();
                report.auto_resumed = true;
                tracing::info!(step = pause.step, seconds = pause.seconds, "pause resolved by timer");
            }
            _ => tracing::debug!(timer = ?timer.id, "ignoring stale pause timer"),
        }
    }

    pub fn topic(&self) -> Option<TopicId> {
        self.topic
    }

    pub fn is_loaded(&self) -> bool {
        self.steps.is_some()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_paused(&self) -> bool {
        self.started && self.engine.is_paused()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// A hold from [`Self::hold_until_advance`] is in place
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Requested playback rate
    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    /// Label for the advance control
    pub fn advance_prompt(&self) -> &str {
        &self.prompt
    }

    /// Most recently begun step
    pub fn current_step(&self) -> Option<usize> {
        self.current_step
    }

    /// Index and length of the pause step holding the timeline
    pub fn active_pause(&self) -> Option<(usize, u32)> {
        self.pause.map(|p| (p.step, p.seconds))
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn step_count(&self) -> usize {
        self.steps.as_ref().map_or(0, Vec::len)
    }

    pub fn engine(&self) -> &dyn AnimationEngine {
        self.engine.as_ref()
    }
}

fn apply_begin(index: usize, step: &AnimateStep, target: &mut dyn StepTarget) -> usize {
    let mut failures = 0;
    for range in &step.properties {
        for selector in &step.targets {
            failures += log_failure(index, step, target.set_property(selector, range.property, range.from));
        }
    }
    for action in &step.on_begin {
        failures += log_failure(index, step, apply_action(target, action));
    }
    failures
}

fn apply_complete(index: usize, step: &AnimateStep, target: &mut dyn StepTarget) -> usize {
    let mut failures = 0;
    for range in &step.properties {
        for selector in &step.targets {
            failures += log_failure(index, step, target.set_property(selector, range.property, range.to));
        }
    }
    for action in &step.on_complete {
        failures += log_failure(index, step, apply_action(target, action));
    }
    failures
}

fn log_failure(index: usize, step: &AnimateStep, result: Result<(), ActionError>) -> usize {
    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::warn!(step = index, label = ?step.label, error = %e, "step action failed");
            1
        }
    }
}

impl std::fmt::Debug for TimelineSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineSequencer")
            .field("topic", &self.topic)
            .field("steps", &self.step_count())
            .field("started", &self.started)
            .field("completed", &self.completed)
            .field("rate", &self.rate)
            .field("pause", &self.pause)
            .field("held", &self.held)
            .finish()
    }
}
