//! Application shell
//!
//! [`App`] owns every component and drives them from one cooperative tick.
//! Nothing here is global: a host constructs an `App`, calls
//! [`App::initialize`], feeds it ticks and user input, and calls
//! [`App::shutdown`] when done.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use arlearn_content::{QuizOutcome, TopicRegistry};
use arlearn_core::{AnchorId, ArError, ArResult, TargetIndex, TimerId, TopicId, TrackingEvent};
use arlearn_flow::{
    AppState, DisplayContent, HookKind, InMemoryView, ObserverId, StateMachine, Transition, ViewSurface,
    ADVANCE_BUTTON,
};
use arlearn_progress::{FileStorage, KeyValueStorage, MemoryStorage, ProgressStore, ProgressSummary};
use arlearn_scene::{
    DetectionDispatcher, DetectionSink, DispatchOutcome, LoopbackBackend, SceneBuilder, TrackingBackend,
};
use arlearn_time::{SimClock, TimerQueue};
use arlearn_timeline::{
    AdvanceOutcome, AnimationEngine, NullTarget, ScriptedEngine, TickReport, TimelineSequencer,
};

use crate::config::AppConfig;
use crate::status::{AppStatus, TimelineStatus};

pub const CAMPUS_NAME: &str = "campus-name";
pub const DETECTED_TOPIC: &str = "detected-topic";
pub const AR_STATUS: &str = "ar-status";
pub const VIDEO_TITLE: &str = "video-title";
pub const VIDEO_PLAYER: &str = "video-player";
pub const QUIZ_QUESTION: &str = "quiz-question";
pub const QUIZ_ANSWERS: &str = "quiz-answers";
pub const QUIZ_FEEDBACK: &str = "quiz-feedback";
pub const SUMMARY_LIST: &str = "summary-list";
pub const PROGRESS_COUNTER: &str = "progress-counter";
pub const COMPLETED_LIST: &str = "completed-topics-list";
pub const PROGRESS_BAR: &str = "progress-bar";

pub const AR_UNSUPPORTED: &str = "AR is not supported on this device";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AppTimer {
    ArReadyDwell,
}

/// What one tick did
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Effective advance after clamping
    pub dt: Duration,
    pub dispatched: Vec<DispatchOutcome>,
    pub timeline: TickReport,
    pub state: AppState,
}

/// The parts the detection dispatcher drives
struct Shell<'a> {
    registry: &'a TopicRegistry,
    machine: &'a mut StateMachine,
    builder: &'a mut SceneBuilder,
    sequencer: &'a mut TimelineSequencer,
    backend: &'a mut dyn TrackingBackend,
}

impl DetectionSink for Shell<'_> {
    fn activate(&mut self, topic: TopicId, _target: TargetIndex) -> ArResult<()> {
        self.builder
            .build(topic, self.registry, &mut *self.backend, &mut *self.sequencer)?;

        if let Err(e) = self.machine.transition_to(AppState::ArReady) {
            self.builder.dispose(&mut *self.backend, &mut *self.sequencer);
            return Err(e);
        }

        let label = format!("{} {}", self.registry.icon(topic), self.registry.title(topic));
        self.machine.update_display(|view| view.set_text(DETECTED_TOPIC, &label));
        Ok(())
    }

    fn pause_timeline(&mut self, topic: TopicId) -> bool {
        if self.sequencer.topic() != Some(topic) {
            return false;
        }
        self.sequencer.hold_until_advance()
    }

    fn deactivate(&mut self) {
        self.builder.dispose(&mut *self.backend, &mut *self.sequencer);
    }

    fn anchor_target(&self, anchor: AnchorId) -> Option<TargetIndex> {
        self.backend.anchor_target(anchor)
    }
}

fn render_menu_progress(view: &mut DisplayContent<'_>, store: &ProgressStore, registry: &TopicRegistry) {
    let menu = store.menu_view(registry);
    view.set_text(PROGRESS_COUNTER, &menu.counter_text);
    view.set_list(COMPLETED_LIST, &menu.items);
    view.set_element_visible(COMPLETED_LIST, menu.list_visible);
    view.set_text(PROGRESS_BAR, &format!("{}%", menu.bar_percent));
}

/// AR learning application
pub struct App {
    config: AppConfig,
    registry: Arc<TopicRegistry>,
    machine: StateMachine,
    dispatcher: DetectionDispatcher,
    builder: SceneBuilder,
    sequencer: TimelineSequencer,
    progress: Arc<Mutex<ProgressStore>>,
    backend: Box<dyn TrackingBackend>,
    clock: SimClock,
    timers: TimerQueue<AppTimer>,
    dwell: Option<TimerId>,
    history: Arc<Mutex<Vec<Transition>>>,
    /// Topic whose video/quiz/summary flow is running
    active_topic: Option<TopicId>,
    last_quiz: Option<QuizOutcome>,
    campus: Option<String>,
    ar_supported: bool,
    ticks: u64,
}

impl App {
    pub fn new(
        config: AppConfig,
        registry: TopicRegistry,
        backend: Box<dyn TrackingBackend>,
        engine: Box<dyn AnimationEngine>,
        view: Box<dyn ViewSurface>,
        storage: Box<dyn KeyValueStorage>,
    ) -> Self {
        let registry = Arc::new(registry);
        let total = u8::try_from(registry.len()).unwrap_or(u8::MAX);
        let progress = Arc::new(Mutex::new(ProgressStore::with_config(
            storage,
            config.progress_config(total),
        )));
        let history = Arc::new(Mutex::new(Vec::new()));

        let mut machine = StateMachine::new(view);
        let store = Arc::clone(&progress);
        let content = Arc::clone(&registry);
        let hooked = machine.add_state_hook(AppState::Menu, HookKind::Enter, move |ctx| {
            render_menu_progress(&mut DisplayContent::new(&mut *ctx.view), &store.lock(), &content);
            Ok(())
        });
        if let Err(e) = hooked {
            tracing::error!(error = %e, "menu progress hook not registered");
        }
        let log = Arc::clone(&history);
        machine.subscribe(move |t| log.lock().push(*t));

        App {
            dispatcher: DetectionDispatcher::new(registry.detection().clone()),
            sequencer: TimelineSequencer::with_config(engine, config.sequencer_config()),
            clock: SimClock::with_config(config.clock_config()),
            config,
            registry,
            machine,
            builder: SceneBuilder::new(),
            progress,
            backend,
            timers: TimerQueue::new(),
            dwell: None,
            history,
            active_topic: None,
            last_quiz: None,
            campus: None,
            ar_supported: false,
            ticks: 0,
        }
    }

    /// Dispatcher plus the shell it drives, borrowed apart
    fn split(&mut self) -> (&mut DetectionDispatcher, Shell<'_>) {
        (
            &mut self.dispatcher,
            Shell {
                registry: self.registry.as_ref(),
                machine: &mut self.machine,
                builder: &mut self.builder,
                sequencer: &mut self.sequencer,
                backend: self.backend.as_mut(),
            },
        )
    }

    fn require(&self, expected: AppState) -> ArResult<()> {
        let actual = self.machine.current_state();
        if actual == expected {
            return Ok(());
        }
        tracing::warn!(expected = %expected, actual = %actual, "operation not valid in this state");
        Err(ArError::WrongState {
            expected: expected.as_str().to_string(),
            actual: actual.as_str().to_string(),
        })
    }

    /// Transition, tearing the scene down when leaving the AR states
    fn go(&mut self, state: AppState) -> ArResult<Transition> {
        let transition = self.machine.transition_to(state)?;
        if transition.changed && state != AppState::Menu {
            self.machine.update_display(|view| {
                if view.is_visible(AR_STATUS) {
                    view.set_element_visible(AR_STATUS, false);
                }
            });
        }
        if transition.changed && !state.is_ar() {
            self.cancel_dwell();
            if self.builder.dispose(self.backend.as_mut(), &mut self.sequencer) {
                tracing::debug!(state = %state, "scene disposed on leaving AR");
            }
            if state != AppState::Scanning && self.backend.is_running() {
                self.backend.stop();
            }
        }
        Ok(transition)
    }

    fn cancel_dwell(&mut self) {
        if let Some(id) = self.dwell.take() {
            self.timers.cancel(id);
        }
    }

    // Flow

    /// Leave the loading screen
    pub fn initialize(&mut self) -> ArResult<()> {
        self.require(AppState::Loading)?;
        self.ar_supported = self.backend.is_available();
        if !self.ar_supported {
            tracing::warn!("tracking backend unavailable, AR disabled");
        }
        self.refresh_prompt();
        self.go(AppState::CampusSelection)?;
        tracing::info!(ar_supported = self.ar_supported, topics = self.registry.len(), "app initialized");
        Ok(())
    }

    pub fn select_campus(&mut self, name: &str) -> ArResult<()> {
        self.require(AppState::CampusSelection)?;
        self.campus = Some(name.to_string());
        self.machine.update_display(|view| view.set_text(CAMPUS_NAME, name));
        self.go(AppState::Topics)?;
        Ok(())
    }

    /// Back to the menu from anywhere; abandons any running topic
    pub fn open_menu(&mut self) -> ArResult<()> {
        self.reset_detection();
        self.active_topic = None;
        let transition = self.go(AppState::Menu)?;
        if !transition.changed {
            self.refresh_menu();
        }
        Ok(())
    }

    fn reset_detection(&mut self) {
        let (dispatcher, mut shell) = self.split();
        dispatcher.reset(&mut shell);
    }

    fn show_unsupported(&mut self) -> ArResult<()> {
        self.machine.update_display(|view| {
            view.set_text(AR_STATUS, AR_UNSUPPORTED);
            view.set_element_visible(AR_STATUS, true);
        });
        if !self.machine.is_in_state(AppState::Menu) {
            self.go(AppState::Menu)?;
        }
        Ok(())
    }

    /// Start the camera and wait for a poster
    pub fn start_scanning(&mut self) -> ArResult<()> {
        if !self.ar_supported {
            self.show_unsupported()?;
            return Err(ArError::TrackingUnavailable);
        }

        self.reset_detection();
        self.active_topic = None;
        if let Err(e) = self.backend.start() {
            tracing::error!(error = %e, "tracking backend failed to start");
            self.ar_supported = false;
            self.show_unsupported()?;
            return Err(e);
        }
        self.go(AppState::Scanning)?;
        Ok(())
    }

    /// Leave the AR-ready screen and play the topic's timeline
    pub fn start_experience(&mut self) -> ArResult<()> {
        self.require(AppState::ArReady)?;
        self.cancel_dwell();
        self.sequencer.start()?;
        self.go(AppState::Animating)?;
        self.refresh_prompt();
        Ok(())
    }

    pub fn finish_video(&mut self) -> ArResult<()> {
        self.require(AppState::Video)?;
        self.go(AppState::Quiz)?;
        self.render_quiz();
        Ok(())
    }

    /// Score the selected answers and show feedback; stays on the quiz
    pub fn submit_quiz(&mut self, selected: &[usize]) -> ArResult<QuizOutcome> {
        self.require(AppState::Quiz)?;
        let topic = self.active_topic.ok_or(ArError::NoActiveTopic)?;
        let entry = self.registry.require(topic)?;

        let outcome = entry.quiz.evaluate(selected);
        let feedback = outcome.feedback(&entry.feedback).to_string();
        self.machine.update_display(|view| view.set_text(QUIZ_FEEDBACK, &feedback));
        tracing::info!(topic = %topic, perfect = outcome.perfect, score = outcome.score(), "quiz submitted");

        self.last_quiz = Some(outcome.clone());
        Ok(outcome)
    }

    pub fn continue_to_summary(&mut self) -> ArResult<()> {
        self.require(AppState::Quiz)?;
        self.go(AppState::Summary)?;
        if let Some(topic) = self.active_topic {
            let items = self.registry.summary(topic).to_vec();
            self.machine.update_display(|view| view.set_list(SUMMARY_LIST, &items));
        }
        Ok(())
    }

    /// Record the topic as completed and return to the menu. Returns
    /// whether the topic was newly completed.
    pub fn finish_summary(&mut self) -> ArResult<bool> {
        self.require(AppState::Summary)?;
        let topic = self.active_topic.ok_or(ArError::NoActiveTopic)?;
        let newly = self.progress.lock().mark_topic_completed(topic)?;
        tracing::info!(topic = %topic, newly, "topic completed");
        self.open_menu()?;
        Ok(newly)
    }

    /// The advance control, for clicks and external gestures alike
    pub fn advance(&mut self) -> AdvanceOutcome {
        let outcome = self.sequencer.advance();
        self.refresh_prompt();
        outcome
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> ArResult<()> {
        self.sequencer.set_playback_rate(rate)?;
        self.refresh_prompt();
        Ok(())
    }

    /// Debug keyboard controls
    pub fn handle_key(&mut self, key: char) -> ArResult<()> {
        match key {
            '0' => self.sequencer.set_playback_rate(0.0)?,
            '1' | '2' | '5' => {
                let rate = key.to_digit(10).map_or(1.0, f64::from);
                self.sequencer.set_playback_rate(rate)?;
            }
            ' ' => {
                if !self.sequencer.is_started() {
                    if self.machine.is_in_state(AppState::ArReady) {
                        self.start_experience()?;
                    }
                } else if self.sequencer.is_paused() {
                    self.sequencer.resume();
                } else {
                    self.sequencer.pause();
                }
            }
            ']' => {
                self.sequencer.seek(self.config.seek_key_step)?;
                self.sequencer.resume();
            }
            other => tracing::debug!(key = %other, "unbound key"),
        }
        self.refresh_prompt();
        Ok(())
    }

    // Tick loop

    /// Run one cooperative tick:
    /// 1. Advance the clock
    /// 2. Fire app timers
    /// 3. Poll tracking events
    /// 4. Dispatch them
    /// 5. Tick the timeline against the live scene
    /// 6. Apply the completion policy
    pub fn tick(&mut self, dt: Duration) -> FrameReport {
        self.ticks += 1;

        // Stage 1
        let dt = self.clock.tick(dt);
        self.backend.advance(dt);

        // Stage 2
        for fired in self.timers.advance(dt) {
            match fired.payload {
                AppTimer::ArReadyDwell if self.dwell == Some(fired.id) => {
                    self.dwell = None;
                    if let Err(e) = self.start_experience() {
                        tracing::warn!(error = %e, "animation did not start after AR-ready dwell");
                    }
                }
                AppTimer::ArReadyDwell => {}
            }
        }

        // Stages 3 and 4
        let events = self.backend.poll_events();
        let mut dispatched = Vec::with_capacity(events.len());
        for event in events {
            let outcome = {
                let (dispatcher, mut shell) = self.split();
                dispatcher.handle(event, &mut shell)
            };
            self.after_dispatch(&outcome);
            dispatched.push(outcome);
        }

        // Stage 5
        let timeline = match self.builder.scene_mut() {
            Some(scene) => self.sequencer.tick(dt, scene),
            None => self.sequencer.tick(dt, &mut NullTarget),
        };
        self.refresh_prompt();

        // Stage 6
        if timeline.completed {
            self.on_timeline_completed();
        }

        FrameReport {
            dt,
            dispatched,
            timeline,
            state: self.machine.current_state(),
        }
    }

    /// Tick in `step` increments for `total`; returns the tick count
    pub fn run_for(&mut self, total: Duration, step: Duration) -> u64 {
        if step.is_zero() {
            return 0;
        }
        let mut elapsed = Duration::ZERO;
        let mut count = 0;
        while elapsed < total {
            let dt = step.min(total - elapsed);
            self.tick(dt);
            elapsed += dt;
            count += 1;
        }
        count
    }

    /// Tick until `done` holds or `limit` elapses. Returns whether `done`
    /// was reached.
    pub fn run_until(&mut self, limit: Duration, step: Duration, mut done: impl FnMut(&App) -> bool) -> bool {
        if step.is_zero() {
            return done(self);
        }
        let mut elapsed = Duration::ZERO;
        while !done(self) {
            if elapsed >= limit {
                return false;
            }
            self.tick(step);
            elapsed += step;
        }
        true
    }

    fn after_dispatch(&mut self, outcome: &DispatchOutcome) {
        if let DispatchOutcome::Activated(topic) = outcome {
            self.active_topic = Some(*topic);
            self.last_quiz = None;
            let dwell = self.config.ar_ready_dwell();
            if !dwell.is_zero() {
                self.cancel_dwell();
                self.dwell = Some(self.timers.schedule_once(dwell, AppTimer::ArReadyDwell));
            }
        }
    }

    fn on_timeline_completed(&mut self) {
        if !self.machine.is_in_state(AppState::Animating) {
            tracing::debug!(state = %self.machine.current_state(), "timeline completed outside animation");
            return;
        }
        match self.go(AppState::Video) {
            Ok(_) => self.render_video(),
            Err(e) => tracing::error!(error = %e, "could not enter video"),
        }
    }

    fn render_video(&mut self) {
        let Some(topic) = self.active_topic else {
            return;
        };
        let title = self.registry.title(topic).to_string();
        let url = self.registry.video_url(topic).unwrap_or_default().to_string();
        self.machine.update_display(|view| {
            view.set_text(VIDEO_TITLE, &title);
            view.set_text(VIDEO_PLAYER, &url);
        });
    }

    fn render_quiz(&mut self) {
        let Some(topic) = self.active_topic else {
            return;
        };
        let question = self.registry.question(topic).to_string();
        let answers: Vec<String> = self
            .registry
            .answers(topic)
            .iter()
            .map(|a| a.text.clone())
            .collect();
        self.machine.update_display(|view| {
            view.set_text(QUIZ_QUESTION, &question);
            view.set_list(QUIZ_ANSWERS, &answers);
            view.set_text(QUIZ_FEEDBACK, "");
        });
    }

    fn refresh_prompt(&mut self) {
        let prompt = self.sequencer.advance_prompt().to_string();
        self.machine.update_display(|view| view.set_text(ADVANCE_BUTTON, &prompt));
    }

    fn refresh_menu(&mut self) {
        if !self.machine.is_in_state(AppState::Menu) {
            return;
        }
        let store = self.progress.lock();
        let registry = self.registry.as_ref();
        self.machine
            .update_display(|view| render_menu_progress(view, &store, registry));
    }

    /// Tear everything down
    pub fn shutdown(&mut self) {
        self.reset_detection();
        self.backend.stop();
        self.timers.clear();
        self.dwell = None;
        tracing::info!(ticks = self.ticks, "app shut down");
    }

    // Debug hooks

    /// Simulate an acquisition of target `index`
    pub fn manual_detect(&mut self, index: u32) -> DispatchOutcome {
        let outcome = {
            let (dispatcher, mut shell) = self.split();
            dispatcher.manual_detect(index, &mut shell)
        };
        self.after_dispatch(&outcome);
        outcome
    }

    /// Route an event as if the backend had produced it
    pub fn inject_event(&mut self, event: TrackingEvent) -> DispatchOutcome {
        let outcome = {
            let (dispatcher, mut shell) = self.split();
            dispatcher.handle(event, &mut shell)
        };
        self.after_dispatch(&outcome);
        outcome
    }

    pub fn progress_summary(&self) -> ProgressSummary {
        self.progress.lock().summary(&self.registry)
    }

    pub fn reset_progress(&mut self) {
        self.progress.lock().clear_all();
        self.refresh_menu();
    }

    pub fn set_progress(&mut self, topics: &[TopicId]) {
        self.progress.lock().set_completed(topics);
        self.refresh_menu();
    }

    pub fn complete_all(&mut self) {
        self.progress.lock().complete_all();
        self.refresh_menu();
    }

    /// Every state change since construction
    pub fn transition_history(&self) -> Vec<Transition> {
        self.history.lock().clone()
    }

    /// Register a transition observer
    pub fn subscribe(&mut self, observer: impl FnMut(&Transition) + 'static) -> ObserverId {
        self.machine.subscribe(observer)
    }

    pub fn status(&self) -> AppStatus {
        let engine = self.sequencer.engine();
        AppStatus {
            state: self.machine.current_state(),
            campus: self.campus.clone(),
            ar_supported: self.ar_supported,
            active_topic: self.active_topic,
            detected_topic: self.dispatcher.current_topic(),
            scene_topic: self.builder.active_topic(),
            visible_nodes: self
                .builder
                .scene()
                .map(|s| s.visible_ids().into_iter().map(str::to_string).collect())
                .unwrap_or_default(),
            timeline: TimelineStatus {
                loaded: self.sequencer.is_loaded(),
                started: self.sequencer.is_started(),
                paused: self.sequencer.is_paused(),
                completed: self.sequencer.is_completed(),
                playback_rate: self.sequencer.playback_rate(),
                advance_prompt: self.sequencer.advance_prompt().to_string(),
                current_step: self.sequencer.current_step(),
                step_count: self.sequencer.step_count(),
                position_ms: engine.position_ms(),
            },
            progress: self.progress_summary(),
            transitions: self.machine.transition_count(),
            ticks: self.ticks,
            now_ms: self.clock.now().as_millis(),
        }
    }

    // Accessors

    pub fn state(&self) -> AppState {
        self.machine.current_state()
    }

    pub fn view(&self) -> &dyn ViewSurface {
        self.machine.view()
    }

    pub fn sequencer(&self) -> &TimelineSequencer {
        &self.sequencer
    }

    pub fn builder(&self) -> &SceneBuilder {
        &self.builder
    }

    pub fn dispatcher(&self) -> &DetectionDispatcher {
        &self.dispatcher
    }

    pub fn registry(&self) -> &TopicRegistry {
        &self.registry
    }

    /// Shared handle to the progress store
    pub fn progress(&self) -> Arc<Mutex<ProgressStore>> {
        Arc::clone(&self.progress)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn ar_supported(&self) -> bool {
        self.ar_supported
    }

    pub fn active_topic(&self) -> Option<TopicId> {
        self.active_topic
    }

    pub fn last_quiz(&self) -> Option<&QuizOutcome> {
        self.last_quiz.as_ref()
    }

    /// Simulated time since construction
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.clock.now().as_micros())
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("state", &self.machine.current_state())
            .field("active_topic", &self.active_topic)
            .field("sequencer", &self.sequencer)
            .field("ticks", &self.ticks)
            .finish()
    }
}

/// Assembles an [`App`], defaulting every collaborator it is not given
pub struct AppBuilder {
    config: AppConfig,
    registry: Option<TopicRegistry>,
    backend: Option<Box<dyn TrackingBackend>>,
    engine: Option<Box<dyn AnimationEngine>>,
    view: Option<Box<dyn ViewSurface>>,
    storage: Option<Box<dyn KeyValueStorage>>,
}

impl AppBuilder {
    pub fn new(config: AppConfig) -> Self {
        AppBuilder {
            config,
            registry: None,
            backend: None,
            engine: None,
            view: None,
            storage: None,
        }
    }

    pub fn registry(mut self, registry: TopicRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn backend(mut self, backend: impl TrackingBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    pub fn engine(mut self, engine: impl AnimationEngine + 'static) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    pub fn view(mut self, view: impl ViewSurface + 'static) -> Self {
        self.view = Some(Box::new(view));
        self
    }

    pub fn storage(mut self, storage: impl KeyValueStorage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    /// Embedded topics, loopback tracking, scripted engine, in-memory view,
    /// and file storage when the config names a directory
    pub fn build(self) -> ArResult<App> {
        let registry = match self.registry {
            Some(registry) => registry,
            None => TopicRegistry::builtin()?,
        };
        let storage: Box<dyn KeyValueStorage> = match (self.storage, &self.config.store_dir) {
            (Some(storage), _) => storage,
            (None, Some(dir)) => Box::new(FileStorage::new(dir.clone())),
            (None, None) => Box::new(MemoryStorage::new()),
        };
        Ok(App::new(
            self.config,
            registry,
            self.backend.unwrap_or_else(|| Box::new(LoopbackBackend::new())),
            self.engine.unwrap_or_else(|| Box::new(ScriptedEngine::new())),
            self.view.unwrap_or_else(|| Box::new(InMemoryView::new())),
            storage,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arlearn_flow::primary_regions;

    fn app(config: AppConfig) -> App {
        AppBuilder::new(config).build().unwrap()
    }

    fn visible_primary(app: &App) -> Vec<&'static str> {
        primary_regions().filter(|r| app.view().is_visible(r)).collect()
    }

    fn scanning(config: AppConfig) -> App {
        let mut app = app(config);
        app.initialize().unwrap();
        app.select_campus("North Campus").unwrap();
        app.open_menu().unwrap();
        app.start_scanning().unwrap();
        app
    }

    #[test]
    fn test_initial_flow() {
        let mut app = app(AppConfig::default());
        assert_eq!(app.state(), AppState::Loading);

        app.initialize().unwrap();
        assert!(app.ar_supported());
        assert_eq!(app.state(), AppState::CampusSelection);

        app.select_campus("North Campus").unwrap();
        assert_eq!(app.view().text(CAMPUS_NAME).as_deref(), Some("North Campus"));

        app.open_menu().unwrap();
        assert_eq!(visible_primary(&app), vec!["menu-section"]);
        assert_eq!(app.view().text(PROGRESS_COUNTER).as_deref(), Some("0 of 4 completed"));
        assert!(!app.view().is_visible(COMPLETED_LIST));
    }

    #[test]
    fn test_wrong_state_rejected() {
        let mut app = app(AppConfig::default());

        assert!(matches!(app.finish_video(), Err(ArError::WrongState { .. })));
        assert!(matches!(app.select_campus("x"), Err(ArError::WrongState { .. })));
        assert_eq!(app.state(), AppState::Loading);
    }

    #[test]
    fn test_unsupported_backend_falls_back() {
        let mut app = AppBuilder::new(AppConfig::default())
            .backend(LoopbackBackend::unavailable())
            .build()
            .unwrap();
        app.initialize().unwrap();
        app.select_campus("North Campus").unwrap();

        assert_eq!(app.start_scanning(), Err(ArError::TrackingUnavailable));
        assert_eq!(app.state(), AppState::Menu);
        assert_eq!(app.view().text(AR_STATUS).as_deref(), Some(AR_UNSUPPORTED));
        assert!(app.view().is_visible(AR_STATUS));

        app.go(AppState::Topics).unwrap();
        assert!(!app.view().is_visible(AR_STATUS));
        assert_eq!(visible_primary(&app), vec!["topics"]);
    }

    #[test]
    fn test_detection_enters_ar_ready_and_dwell_starts() {
        let mut app = scanning(AppConfig::default());

        assert_eq!(app.manual_detect(0), DispatchOutcome::Activated(TopicId::new(1)));
        assert_eq!(app.state(), AppState::ArReady);
        assert!(app.view().text(DETECTED_TOPIC).unwrap().contains("Protecting Yourself Online"));

        app.run_for(Duration::from_millis(1900), Duration::from_millis(100));
        assert_eq!(app.state(), AppState::ArReady);
        app.run_for(Duration::from_millis(200), Duration::from_millis(100));
        assert_eq!(app.state(), AppState::Animating);
        assert!(app.sequencer().is_started());
    }

    #[test]
    fn test_manual_start_and_completion_to_video() {
        let mut app = scanning(AppConfig::manual());
        app.manual_detect(0);
        app.run_for(Duration::from_secs(5), Duration::from_millis(100));
        assert_eq!(app.state(), AppState::ArReady);

        app.start_experience().unwrap();
        let reached = app.run_until(Duration::from_secs(60), Duration::from_millis(100), |a| {
            a.state() == AppState::Video
        });

        assert!(reached);
        assert_eq!(visible_primary(&app), vec!["video-section"]);
        assert!(!app.builder().is_built());
        assert!(app.view().text(VIDEO_TITLE).is_some());
    }

    #[test]
    fn test_quiz_summary_and_progress() {
        let mut app = scanning(AppConfig::manual());
        app.manual_detect(1);
        app.start_experience().unwrap();

        // step 7 of topic 2 is a pause that only the advance control ends
        assert!(app.run_until(Duration::from_secs(120), Duration::from_millis(100), |a| {
            a.sequencer().active_pause() == Some((7, 0))
        }));
        app.run_for(Duration::from_secs(30), Duration::from_millis(100));
        assert_eq!(app.state(), AppState::Animating);
        assert!(app.sequencer().is_paused());
        assert_eq!(app.sequencer().active_pause(), Some((7, 0)));
        assert_eq!(app.sequencer().pending_timers(), 0);

        assert_eq!(app.advance(), AdvanceOutcome::Resumed);
        assert!(app.run_until(Duration::from_secs(60), Duration::from_millis(100), |a| {
            a.state() == AppState::Video
        }));

        app.finish_video().unwrap();
        assert_eq!(app.view().list(QUIZ_ANSWERS).map(|a| a.len()), Some(app.registry().answers(TopicId::new(2)).len()));

        let correct: Vec<usize> = app
            .registry()
            .answers(TopicId::new(2))
            .iter()
            .enumerate()
            .filter(|(_, a)| a.correct)
            .map(|(i, _)| i)
            .collect();
        let outcome = app.submit_quiz(&correct).unwrap();
        assert!(outcome.perfect);

        app.continue_to_summary().unwrap();
        assert!(app.finish_summary().unwrap());

        assert_eq!(app.state(), AppState::Menu);
        assert_eq!(app.view().text(PROGRESS_COUNTER).as_deref(), Some("1 of 4 completed"));
        assert_eq!(app.view().text(PROGRESS_BAR).as_deref(), Some("25%"));
        assert!(app.view().is_visible(COMPLETED_LIST));
    }

    #[test]
    fn test_lost_pauses_running_timeline() {
        let mut app = scanning(AppConfig::manual());
        app.manual_detect(0);
        app.start_experience().unwrap();
        app.tick(Duration::from_millis(100));

        let outcome = app.inject_event(TrackingEvent::lost(TargetIndex::new(0)));

        assert_eq!(outcome, DispatchOutcome::Paused(TopicId::new(1)));
        assert!(app.sequencer().is_paused());
        assert_eq!(app.state(), AppState::Animating);
    }

    #[test]
    fn test_lost_during_timed_pause_holds() {
        let mut app = scanning(AppConfig::manual());
        app.manual_detect(0);
        app.start_experience().unwrap();
        assert!(app.run_until(Duration::from_secs(60), Duration::from_millis(100), |a| {
            a.sequencer().active_pause() == Some((3, 2))
        }));
        let held_at = app.sequencer().engine().position_ms();

        let outcome = app.inject_event(TrackingEvent::lost(TargetIndex::new(0)));
        assert_eq!(outcome, DispatchOutcome::Paused(TopicId::new(1)));

        app.run_for(Duration::from_secs(6), Duration::from_millis(100));
        assert!(app.sequencer().is_paused());
        assert_eq!(app.sequencer().engine().position_ms(), held_at);
        assert_eq!(app.state(), AppState::Animating);
        assert!(matches!(
            app.inject_event(TrackingEvent::lost(TargetIndex::new(0))),
            DispatchOutcome::Ignored(_)
        ));

        assert_eq!(app.advance(), AdvanceOutcome::Resumed);
        assert!(app.run_until(Duration::from_secs(60), Duration::from_millis(100), |a| {
            a.state() == AppState::Video
        }));
    }

    #[test]
    fn test_debug_keys() {
        let mut app = scanning(AppConfig::manual());
        app.manual_detect(3);

        app.handle_key(' ').unwrap();
        assert_eq!(app.state(), AppState::Animating);

        app.handle_key('0').unwrap();
        assert!(app.sequencer().is_paused());
        app.handle_key('2').unwrap();
        assert!(!app.sequencer().is_paused());
        assert_eq!(app.sequencer().playback_rate(), 2.0);

        app.handle_key(']').unwrap();
        assert_eq!(app.sequencer().current_step(), Some(10));
        assert!(!app.sequencer().is_paused());

        app.handle_key(' ').unwrap();
        assert!(app.sequencer().is_paused());
        app.handle_key('x').unwrap();
    }

    #[test]
    fn test_progress_debug_hooks() {
        let mut app = app(AppConfig::default());
        app.initialize().unwrap();
        app.select_campus("North Campus").unwrap();
        app.open_menu().unwrap();

        app.set_progress(&[TopicId::new(1), TopicId::new(3)]);
        assert_eq!(app.view().text(PROGRESS_COUNTER).as_deref(), Some("2 of 4 completed"));

        app.complete_all();
        assert_eq!(app.progress_summary().completion_percentage, 100);

        app.reset_progress();
        assert_eq!(app.progress_summary().completion_count, 0);
        assert!(!app.view().is_visible(COMPLETED_LIST));
    }

    #[test]
    fn test_status_and_history() {
        let mut app = scanning(AppConfig::manual());
        app.manual_detect(2);

        let status = app.status();
        assert_eq!(status.state, AppState::ArReady);
        assert_eq!(status.detected_topic, Some(TopicId::new(3)));
        assert!(status.timeline.loaded);
        assert!(status.to_json().contains("\"state\": \"ar_ready\""));

        let states: Vec<AppState> = app.transition_history().iter().map(|t| t.to).collect();
        assert_eq!(
            states,
            vec![
                AppState::CampusSelection,
                AppState::Topics,
                AppState::Menu,
                AppState::Scanning,
                AppState::ArReady
            ]
        );
    }

    #[test]
    fn test_leaving_ar_disposes_scene() {
        let mut app = scanning(AppConfig::manual());
        app.manual_detect(0);
        assert!(app.builder().is_built());

        app.open_menu().unwrap();

        assert!(!app.builder().is_built());
        assert_eq!(app.dispatcher().current_topic(), None);
        assert!(!app.sequencer().is_loaded());
    }
}
