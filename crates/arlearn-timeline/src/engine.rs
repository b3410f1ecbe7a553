//! Animation engine seam
//!
//! The engine owns timeline position and step scheduling. Tweening and
//! rendering are the host's business; the sequencer only needs to know when
//! steps begin and complete. Instead of invoking callbacks, the engine
//! returns those moments as [`EngineEvent`]s from [`AnimationEngine::advance`],
//! which keeps control flow single-owner.

use std::time::Duration;

use arlearn_content::{AnimateStep, Easing, PropertyRange, Selector, StartOffset};

/// One step as submitted to the engine
#[derive(Clone, Debug, PartialEq)]
pub struct EngineStep {
    pub targets: Vec<Selector>,
    pub properties: Vec<PropertyRange>,
    pub duration_ms: u64,
    pub easing: Easing,
    pub delay_ms: u64,
    pub offset: Option<StartOffset>,
}

impl EngineStep {
    pub fn from_animate(step: &AnimateStep) -> Self {
        EngineStep {
            targets: step.targets.clone(),
            properties: step.properties.clone(),
            duration_ms: step.duration_ms,
            easing: step.easing,
            delay_ms: step.delay_ms,
            offset: step.offset,
        }
    }

    /// Invisible step whose only purpose is a begin event
    pub fn marker(target: Selector, duration_ms: u64) -> Self {
        EngineStep {
            targets: vec![target],
            properties: vec![PropertyRange::opacity(0.0, 0.0)],
            duration_ms,
            easing: Easing::Linear,
            delay_ms: 0,
            offset: None,
        }
    }
}

/// Something that happened on the timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineEvent {
    StepBegan(usize),
    StepCompleted(usize),
    TimelineCompleted,
}

/// Outcome of one `advance` call
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Advance {
    /// Events at the boundary the engine stopped on
    pub events: Vec<EngineEvent>,
    /// Wall time consumed from the budget
    pub used: Duration,
}

/// Timeline engine
pub trait AnimationEngine {
    /// Replace the timeline with `steps`, positioned at 0 and paused
    fn build(&mut self, steps: Vec<EngineStep>);

    fn play(&mut self);

    fn pause(&mut self);

    /// True when paused or when no timeline exists
    fn is_paused(&self) -> bool;

    /// Move to a timeline position without firing skipped events
    fn seek(&mut self, position_ms: u64);

    /// Speed multiplier; durations are divided by it
    fn set_timescale(&mut self, scale: f64);

    fn timescale(&self) -> f64;

    /// Progress by at most `budget` of wall time, stopping early at the
    /// first step boundary that produces events
    fn advance(&mut self, budget: Duration) -> Advance;

    /// Drop the timeline
    fn clear(&mut self);

    fn has_timeline(&self) -> bool;

    fn position_ms(&self) -> u64;

    /// Timeline position at which step `index` begins
    fn step_begin_ms(&self, index: usize) -> Option<u64>;

    /// Total timeline length
    fn duration_ms(&self) -> u64;
}

/// Begin and end of a scheduled step, microseconds from timeline start
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepWindow {
    pub begin: u64,
    pub end: u64,
}

/// Lay steps out on the timeline. A step without offset starts where
/// everything scheduled so far ends; relative offsets shift that point
/// (negative overlaps, clamped at 0); absolute offsets ignore it. Delay
/// shifts the begin inside the step's slot.
pub fn layout(steps: &[EngineStep]) -> (Vec<StepWindow>, u64) {
    let mut end_so_far: u64 = 0;
    let mut windows = Vec::with_capacity(steps.len());

    for step in steps {
        let start = match step.offset {
            None => end_so_far,
            Some(StartOffset::RelativeMs(ms)) => {
                let shifted = end_so_far as i64 + ms.saturating_mul(1000);
                shifted.max(0) as u64
            }
            Some(StartOffset::AbsoluteMs(ms)) => ms.saturating_mul(1000),
        };
        let begin = start + step.delay_ms.saturating_mul(1000);
        let end = begin + step.duration_ms.saturating_mul(1000);
        end_so_far = end_so_far.max(end);
        windows.push(StepWindow { begin, end });
    }

    (windows, end_so_far)
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    window: StepWindow,
    began: bool,
    completed: bool,
}

/// Deterministic in-process engine
#[derive(Debug)]
pub struct ScriptedEngine {
    steps: Vec<EngineStep>,
    slots: Vec<Slot>,
    /// Timeline length (µs)
    duration: u64,
    /// Current position (µs)
    position: u64,
    playing: bool,
    timescale: f64,
    built: bool,
    finished: bool,
    builds: usize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        ScriptedEngine {
            steps: Vec::new(),
            slots: Vec::new(),
            duration: 0,
            position: 0,
            playing: false,
            timescale: 1.0,
            built: false,
            finished: false,
            builds: 0,
        }
    }

    /// Steps of the current timeline
    pub fn steps(&self) -> &[EngineStep] {
        &self.steps
    }

    /// How many timelines were built over the engine's life
    pub fn build_count(&self) -> usize {
        self.builds
    }

    fn collect_due(&mut self) -> Vec<EngineEvent> {
        let pos = self.position;
        let mut events = Vec::new();

        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.began && !slot.completed && slot.window.end <= pos {
                slot.completed = true;
                events.push(EngineEvent::StepCompleted(i));
            }
        }
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if !slot.began && slot.window.begin <= pos {
                slot.began = true;
                events.push(EngineEvent::StepBegan(i));
                if slot.window.end <= pos {
                    slot.completed = true;
                    events.push(EngineEvent::StepCompleted(i));
                }
            }
        }

        if !self.finished && pos >= self.duration && self.slots.iter().all(|s| s.completed) {
            self.finished = true;
            events.push(EngineEvent::TimelineCompleted);
        }
        events
    }

    fn next_boundary(&self) -> Option<u64> {
        let pos = self.position;
        let steps = self.slots.iter().flat_map(|s| {
            let begin = (!s.began).then_some(s.window.begin);
            let end = (!s.completed).then_some(s.window.end);
            begin.into_iter().chain(end)
        });
        let end = (!self.finished).then_some(self.duration);
        steps.chain(end).filter(|&b| b > pos).min()
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationEngine for ScriptedEngine {
    fn build(&mut self, steps: Vec<EngineStep>) {
        let (windows, duration) = layout(&steps);
        self.slots = windows
            .into_iter()
            .map(|window| Slot {
                window,
                began: false,
                completed: false,
            })
            .collect();
        self.steps = steps;
        self.duration = duration;
        self.position = 0;
        self.playing = false;
        self.built = true;
        self.finished = false;
        self.builds += 1;
    }

    fn play(&mut self) {
        if self.built {
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_paused(&self) -> bool {
        !self.playing
    }

    fn seek(&mut self, position_ms: u64) {
        let pos = position_ms.saturating_mul(1000).min(self.duration);
        self.position = pos;
        for slot in &mut self.slots {
            slot.began = slot.window.begin < pos;
            slot.completed = slot.window.end < pos;
        }
        self.finished = false;
    }

    fn set_timescale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.timescale = scale;
        }
    }

    fn timescale(&self) -> f64 {
        self.timescale
    }

    fn advance(&mut self, budget: Duration) -> Advance {
        if !self.built || !self.playing {
            return Advance {
                events: Vec::new(),
                used: budget,
            };
        }

        let events = self.collect_due();
        if !events.is_empty() || self.finished {
            let used = if events.is_empty() { budget } else { Duration::ZERO };
            return Advance { events, used };
        }

        let span = (budget.as_micros() as f64 * self.timescale) as u64;
        match self.next_boundary() {
            Some(boundary) if boundary - self.position <= span => {
                let delta = boundary - self.position;
                self.position = boundary;
                let used_us = (delta as f64 / self.timescale).ceil() as u64;
                Advance {
                    events: self.collect_due(),
                    used: Duration::from_micros(used_us).min(budget),
                }
            }
            _ => {
                self.position = (self.position + span).min(self.duration);
                Advance {
                    events: Vec::new(),
                    used: budget,
                }
            }
        }
    }

    fn clear(&mut self) {
        self.steps.clear();
        self.slots.clear();
        self.duration = 0;
        self.position = 0;
        self.playing = false;
        self.built = false;
        self.finished = false;
    }

    fn has_timeline(&self) -> bool {
        self.built
    }

    fn position_ms(&self) -> u64 {
        self.position / 1000
    }

    fn step_begin_ms(&self, index: usize) -> Option<u64> {
        self.slots.get(index).map(|s| s.window.begin / 1000)
    }

    fn duration_ms(&self) -> u64 {
        self.duration / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(duration_ms: u64) -> EngineStep {
        EngineStep::marker(Selector::id("a"), duration_ms)
    }

    fn with_offset(mut s: EngineStep, offset: StartOffset) -> EngineStep {
        s.offset = Some(offset);
        s
    }

    /// Run until nothing is left, collecting events with their position
    fn drain(engine: &mut ScriptedEngine) -> Vec<(u64, EngineEvent)> {
        let mut out = Vec::new();
        for _ in 0..1000 {
            let adv = engine.advance(Duration::from_millis(50));
            for e in &adv.events {
                out.push((engine.position_ms(), *e));
            }
            if adv.events.contains(&EngineEvent::TimelineCompleted) {
                break;
            }
        }
        out
    }

    #[test]
    fn test_layout_sequential() {
        let (windows, duration) = layout(&[step(1000), step(500)]);

        assert_eq!(windows[0], StepWindow { begin: 0, end: 1_000_000 });
        assert_eq!(windows[1], StepWindow { begin: 1_000_000, end: 1_500_000 });
        assert_eq!(duration, 1_500_000);
    }

    #[test]
    fn test_layout_offsets_and_delay() {
        let mut delayed = step(500);
        delayed.delay_ms = 3000;
        let steps = [
            step(1000),
            with_offset(step(1000), StartOffset::RelativeMs(-1000)),
            with_offset(step(2000), StartOffset::RelativeMs(-250)),
            with_offset(step(100), StartOffset::AbsoluteMs(100)),
            with_offset(step(100), StartOffset::RelativeMs(-99_999)),
            delayed,
        ];

        let (windows, duration) = layout(&steps);

        assert_eq!(windows[1].begin, 0);
        assert_eq!(windows[2].begin, 750_000);
        assert_eq!(windows[3], StepWindow { begin: 100_000, end: 200_000 });
        assert_eq!(windows[4].begin, 0);
        assert_eq!(windows[5].begin, 2_750_000 + 3_000_000);
        assert_eq!(duration, 6_250_000);
    }

    #[test]
    fn test_events_in_order() {
        let mut engine = ScriptedEngine::new();
        engine.build(vec![step(1000), step(500)]);
        engine.play();

        let events = drain(&mut engine);

        assert_eq!(
            events,
            vec![
                (0, EngineEvent::StepBegan(0)),
                (1000, EngineEvent::StepCompleted(0)),
                (1000, EngineEvent::StepBegan(1)),
                (1500, EngineEvent::StepCompleted(1)),
                (1500, EngineEvent::TimelineCompleted),
            ]
        );
    }

    #[test]
    fn test_overlap_events() {
        let mut engine = ScriptedEngine::new();
        engine.build(vec![
            step(1000),
            with_offset(step(1000), StartOffset::RelativeMs(-1000)),
        ]);
        engine.play();

        let events = drain(&mut engine);

        assert_eq!(
            events,
            vec![
                (0, EngineEvent::StepBegan(0)),
                (0, EngineEvent::StepBegan(1)),
                (1000, EngineEvent::StepCompleted(0)),
                (1000, EngineEvent::StepCompleted(1)),
                (1000, EngineEvent::TimelineCompleted),
            ]
        );
    }

    #[test]
    fn test_advance_stops_at_boundary() {
        let mut engine = ScriptedEngine::new();
        engine.build(vec![step(300), step(300)]);
        engine.play();

        let first = engine.advance(Duration::from_secs(1));
        assert_eq!(first.events, vec![EngineEvent::StepBegan(0)]);
        assert_eq!(first.used, Duration::ZERO);

        let second = engine.advance(Duration::from_secs(1));
        assert_eq!(second.used, Duration::from_millis(300));
        assert_eq!(engine.position_ms(), 300);
    }

    #[test]
    fn test_timescale_speeds_up() {
        let mut engine = ScriptedEngine::new();
        engine.build(vec![step(1000)]);
        engine.set_timescale(2.0);
        engine.play();

        engine.advance(Duration::from_secs(1));
        let adv = engine.advance(Duration::from_secs(1));

        assert_eq!(adv.used, Duration::from_millis(500));
        assert_eq!(
            adv.events,
            vec![EngineEvent::StepCompleted(0), EngineEvent::TimelineCompleted]
        );
    }

    #[test]
    fn test_paused_engine_consumes_budget_only() {
        let mut engine = ScriptedEngine::new();
        engine.build(vec![step(1000)]);

        let adv = engine.advance(Duration::from_millis(400));

        assert!(engine.is_paused());
        assert!(adv.events.is_empty());
        assert_eq!(adv.used, Duration::from_millis(400));
        assert_eq!(engine.position_ms(), 0);
    }

    #[test]
    fn test_seek_resets_flags() {
        let mut engine = ScriptedEngine::new();
        engine.build(vec![step(1000), step(1000), step(1000)]);
        engine.play();
        drain(&mut engine);

        engine.seek(engine.step_begin_ms(1).unwrap());
        let events = drain(&mut engine);

        // the step ending exactly at the seek point completes again
        assert_eq!(events[0], (1000, EngineEvent::StepCompleted(0)));
        assert_eq!(events[1], (1000, EngineEvent::StepBegan(1)));
        assert_eq!(events.last(), Some(&(3000, EngineEvent::TimelineCompleted)));
    }

    #[test]
    fn test_empty_timeline_completes_immediately() {
        let mut engine = ScriptedEngine::new();
        engine.build(Vec::new());
        engine.play();

        let adv = engine.advance(Duration::from_millis(16));

        assert_eq!(adv.events, vec![EngineEvent::TimelineCompleted]);
        assert!(engine.advance(Duration::from_millis(16)).events.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut engine = ScriptedEngine::new();
        engine.build(vec![step(100)]);
        engine.play();
        engine.clear();

        assert!(!engine.has_timeline());
        assert!(engine.is_paused());
        engine.play();
        assert!(engine.is_paused());
    }
}
