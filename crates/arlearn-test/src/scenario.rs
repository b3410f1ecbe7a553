//! Scenario driver
//!
//! A scenario is a scripted user session: a list of steps run against a
//! fully wired [`App`] with a simulated camera and a recording view. The
//! runner checks the view after every step and tick and reports what
//! happened.

use std::time::Duration;

use arlearn_content::TopicRegistry;
use arlearn_core::{ArError, TopicId, TrackingEvent};
use arlearn_flow::{AppState, ADVANCE_BUTTON};
use arlearn_runtime::{App, AppBuilder, AppConfig, AppStatus};
use arlearn_scene::DispatchOutcome;

use crate::tracker::{SimulatedTracker, TrackerConfig};
use crate::view::RecordingView;

// ============================================================================
// SCENARIO DEFINITION
// ============================================================================

/// One user action or wait
#[derive(Clone, Debug, PartialEq)]
pub enum ScenarioStep {
    Initialize,
    SelectCampus(String),
    OpenMenu,
    StartScanning,
    /// Debug hook: simulate acquiring a target
    Detect(u32),
    /// Route an event as if the camera produced it
    Inject(TrackingEvent),
    StartExperience,
    Advance,
    Key(char),
    Rate(f64),
    /// Tick for a fixed time
    Run(Duration),
    /// Tick until the app reaches a state
    RunUntil { state: AppState, limit: Duration },
    FinishVideo,
    /// Submit exactly the correct answers of the active topic
    SubmitCorrect,
    SubmitAnswers(Vec<usize>),
    ContinueToSummary,
    FinishSummary,
}

/// Scenario settings
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub app: AppConfig,
    pub tracker: TrackerConfig,
    /// Tick length
    pub tick: Duration,
    /// Press advance whenever a tick leaves the timeline paused
    pub auto_advance: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            app: AppConfig::manual(),
            tracker: TrackerConfig::steady(),
            tick: Duration::from_millis(100),
            auto_advance: false,
        }
    }
}

impl ScenarioConfig {
    pub fn with_app(mut self, app: AppConfig) -> Self {
        self.app = app;
        self
    }

    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_auto_advance(mut self, enable: bool) -> Self {
        self.auto_advance = enable;
        self
    }
}

/// A named, scripted session
#[derive(Clone, Debug)]
pub struct Scenario {
    pub name: String,
    pub config: ScenarioConfig,
    pub steps: Vec<ScenarioStep>,
    /// Posters the simulated camera sees: target, start, hold
    pub sightings: Vec<(u32, Duration, Duration)>,
}

impl Scenario {
    pub fn new(name: &str) -> Self {
        Scenario {
            name: name.to_string(),
            config: ScenarioConfig::default(),
            steps: Vec::new(),
            sightings: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: ScenarioConfig) -> Self {
        self.config = config;
        self
    }

    pub fn step(mut self, step: ScenarioStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = ScenarioStep>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Camera sees `target` from `at` for `hold`
    pub fn show(mut self, target: u32, at: Duration, hold: Duration) -> Self {
        self.sightings.push((target, at, hold));
        self
    }

    /// Loading through to scanning
    pub fn to_scanning(self) -> Self {
        self.steps([
            ScenarioStep::Initialize,
            ScenarioStep::SelectCampus("Main Campus".to_string()),
            ScenarioStep::OpenMenu,
            ScenarioStep::StartScanning,
        ])
    }

    /// Complete one topic from detection back to the menu, advancing
    /// through any held pauses
    pub fn full_topic(target: u32) -> Self {
        Scenario::new(&format!("full-topic-{}", target))
            .with_config(ScenarioConfig::default().with_auto_advance(true))
            .to_scanning()
            .steps([
                ScenarioStep::Detect(target),
                ScenarioStep::StartExperience,
                ScenarioStep::RunUntil {
                    state: AppState::Video,
                    limit: Duration::from_secs(300),
                },
                ScenarioStep::FinishVideo,
                ScenarioStep::SubmitCorrect,
                ScenarioStep::ContinueToSummary,
                ScenarioStep::FinishSummary,
            ])
    }
}

// ============================================================================
// SCENARIO REPORT
// ============================================================================

/// What a scenario run observed
#[derive(Debug)]
pub struct ScenarioReport {
    pub name: String,
    /// Target state of every state change, in order
    pub states: Vec<AppState>,
    /// Steps that returned an error, by step index
    pub errors: Vec<(usize, ArError)>,
    /// `RunUntil` steps that hit their limit
    pub timeouts: Vec<usize>,
    /// Every dispatch outcome, from ticks and debug hooks
    pub dispatched: Vec<DispatchOutcome>,
    /// Ticks on which the timeline completed
    pub completions: usize,
    /// Step action failures reported by the timeline
    pub action_failures: usize,
    /// Labels shown on the advance control, in order
    pub prompts: Vec<String>,
    /// View checks that failed
    pub violations: Vec<String>,
    pub ticks: u64,
    pub status: AppStatus,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty() && self.timeouts.is_empty() && self.violations.is_empty()
    }

    pub fn final_state(&self) -> AppState {
        self.status.state
    }

    pub fn visited(&self, state: AppState) -> bool {
        self.states.contains(&state)
    }

    pub fn activations(&self) -> Vec<TopicId> {
        self.dispatched
            .iter()
            .filter_map(|o| match o {
                DispatchOutcome::Activated(topic) => Some(*topic),
                _ => None,
            })
            .collect()
    }
}

// ============================================================================
// RUNNER
// ============================================================================

/// Runs scenarios against a freshly built app
pub struct ScenarioRunner {
    app: App,
    view: RecordingView,
    config: ScenarioConfig,
    dispatched: Vec<DispatchOutcome>,
    completions: usize,
    action_failures: usize,
    violations: Vec<String>,
    ticks: u64,
}

impl ScenarioRunner {
    pub fn new(scenario: &Scenario) -> Result<Self, ArError> {
        Self::with_registry(scenario, TopicRegistry::builtin()?)
    }

    pub fn with_registry(scenario: &Scenario, registry: TopicRegistry) -> Result<Self, ArError> {
        let mut tracker = SimulatedTracker::new(scenario.config.tracker.clone());
        for &(target, at, hold) in &scenario.sightings {
            tracker = tracker.show(target, at, hold);
        }
        let view = RecordingView::new();
        let app = AppBuilder::new(scenario.config.app.clone())
            .registry(registry)
            .backend(tracker)
            .view(view.handle())
            .build()?;

        Ok(ScenarioRunner {
            app,
            view,
            config: scenario.config.clone(),
            dispatched: Vec::new(),
            completions: 0,
            action_failures: 0,
            violations: Vec::new(),
            ticks: 0,
        })
    }

    /// Build a runner and run every step of `scenario`
    pub fn run(scenario: &Scenario) -> Result<ScenarioReport, ArError> {
        let mut runner = Self::new(scenario)?;
        Ok(runner.run_steps(scenario))
    }

    pub fn run_steps(&mut self, scenario: &Scenario) -> ScenarioReport {
        let mut errors = Vec::new();
        let mut timeouts = Vec::new();

        for (index, step) in scenario.steps.iter().enumerate() {
            tracing::debug!(scenario = %scenario.name, index, ?step, "scenario step");
            match self.apply(step) {
                Ok(true) => {}
                Ok(false) => timeouts.push(index),
                Err(e) => {
                    tracing::debug!(index, error = %e, "scenario step failed");
                    errors.push((index, e));
                }
            }
            self.check_view(&format!("after step {}", index));
        }

        ScenarioReport {
            name: scenario.name.clone(),
            states: self.app.transition_history().iter().map(|t| t.to).collect(),
            errors,
            timeouts,
            dispatched: self.dispatched.clone(),
            completions: self.completions,
            action_failures: self.action_failures,
            prompts: dedup(self.view.text_history(ADVANCE_BUTTON)),
            violations: self.violations.clone(),
            ticks: self.ticks,
            status: self.app.status(),
        }
    }

    /// Returns false when a wait timed out
    fn apply(&mut self, step: &ScenarioStep) -> Result<bool, ArError> {
        match step {
            ScenarioStep::Initialize => self.app.initialize()?,
            ScenarioStep::SelectCampus(name) => self.app.select_campus(name)?,
            ScenarioStep::OpenMenu => self.app.open_menu()?,
            ScenarioStep::StartScanning => self.app.start_scanning()?,
            ScenarioStep::Detect(index) => {
                let outcome = self.app.manual_detect(*index);
                self.dispatched.push(outcome);
            }
            ScenarioStep::Inject(event) => {
                let outcome = self.app.inject_event(*event);
                self.dispatched.push(outcome);
            }
            ScenarioStep::StartExperience => self.app.start_experience()?,
            ScenarioStep::Advance => {
                self.app.advance();
            }
            ScenarioStep::Key(key) => self.app.handle_key(*key)?,
            ScenarioStep::Rate(rate) => self.app.set_playback_rate(*rate)?,
            ScenarioStep::Run(total) => {
                let mut elapsed = Duration::ZERO;
                while elapsed < *total {
                    let dt = self.config.tick.min(*total - elapsed);
                    self.tick(dt);
                    elapsed += dt;
                }
            }
            ScenarioStep::RunUntil { state, limit } => {
                let mut elapsed = Duration::ZERO;
                while self.app.state() != *state {
                    if elapsed >= *limit {
                        return Ok(false);
                    }
                    self.tick(self.config.tick);
                    elapsed += self.config.tick;
                }
            }
            ScenarioStep::FinishVideo => self.app.finish_video()?,
            ScenarioStep::SubmitCorrect => {
                let topic = self.app.active_topic().ok_or(ArError::NoActiveTopic)?;
                let correct = correct_answers(self.app.registry(), topic);
                self.app.submit_quiz(&correct)?;
            }
            ScenarioStep::SubmitAnswers(selected) => {
                self.app.submit_quiz(selected)?;
            }
            ScenarioStep::ContinueToSummary => self.app.continue_to_summary()?,
            ScenarioStep::FinishSummary => {
                self.app.finish_summary()?;
            }
        }
        Ok(true)
    }

    fn tick(&mut self, dt: Duration) {
        let frame = self.app.tick(dt);
        self.ticks += 1;
        if frame.timeline.completed {
            self.completions += 1;
        }
        self.action_failures += frame.timeline.action_failures;
        self.dispatched.extend(frame.dispatched);

        if self.config.auto_advance && self.app.sequencer().is_paused() {
            self.app.advance();
        }
        self.check_view(&format!("tick {}", self.ticks));
    }

    /// Exactly one primary region is visible, and it belongs to the
    /// current state
    fn check_view(&mut self, when: &str) {
        let expected = self.app.state().primary_region();
        let visible = self.view.visible_primary();
        if visible != [expected] {
            self.violations
                .push(format!("{}: expected only {} visible, found {:?}", when, expected, visible));
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn view(&self) -> &RecordingView {
        &self.view
    }
}

/// Indices of the correct answers of a topic's quiz
pub fn correct_answers(registry: &TopicRegistry, topic: TopicId) -> Vec<usize> {
    registry
        .answers(topic)
        .iter()
        .enumerate()
        .filter(|(_, a)| a.correct)
        .map(|(i, _)| i)
        .collect()
}

fn dedup(mut items: Vec<String>) -> Vec<String> {
    items.dedup();
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_topic_one() {
        let report = ScenarioRunner::run(&Scenario::full_topic(0)).unwrap();

        assert!(report.passed(), "{:?}", report);
        assert_eq!(report.final_state(), AppState::Menu);
        assert_eq!(report.completions, 1);
        assert_eq!(report.activations(), vec![TopicId::new(1)]);
        assert_eq!(report.status.progress.completion_count, 1);
        assert!(report.visited(AppState::Animating));
        assert!(report.visited(AppState::Summary));
    }

    #[test]
    fn test_timeout_reported() {
        let scenario = Scenario::new("never-detected").to_scanning().step(ScenarioStep::RunUntil {
            state: AppState::ArReady,
            limit: Duration::from_secs(1),
        });

        let report = ScenarioRunner::run(&scenario).unwrap();

        assert_eq!(report.timeouts, vec![4]);
        assert!(!report.passed());
        assert_eq!(report.final_state(), AppState::Scanning);
    }

    #[test]
    fn test_errors_reported_by_step() {
        let scenario = Scenario::new("early-quiz")
            .step(ScenarioStep::Initialize)
            .step(ScenarioStep::FinishVideo);

        let report = ScenarioRunner::run(&scenario).unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].0, 1);
        assert!(report.errors[0].1.is_precondition());
        assert!(report.violations.is_empty());
    }
}
