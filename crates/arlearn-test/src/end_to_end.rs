//! Whole-stack tests: tracker, dispatcher, scene, timeline, state machine
//! and progress wired together through the app shell

use std::time::Duration;

use arlearn_core::{ArError, TargetIndex, TopicId, TrackingEvent};
use arlearn_flow::{AppState, ViewSurface};
use arlearn_runtime::{AppConfig, AR_STATUS, AR_UNSUPPORTED, PROGRESS_COUNTER, QUIZ_FEEDBACK};
use arlearn_scene::{DispatchOutcome, IgnoreReason};

use crate::scenario::{Scenario, ScenarioConfig, ScenarioRunner, ScenarioStep};
use crate::tracker::TrackerConfig;

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn until(state: AppState, limit: u64) -> ScenarioStep {
    ScenarioStep::RunUntil {
        state,
        limit: secs(limit),
    }
}

#[test]
fn test_topic_one_reaches_video_once() {
    let scenario = Scenario::new("topic-one")
        .to_scanning()
        .steps([ScenarioStep::Detect(0), ScenarioStep::StartExperience, until(AppState::Video, 60)]);
    let mut runner = ScenarioRunner::new(&scenario).unwrap();
    let report = runner.run_steps(&scenario);

    assert!(report.passed(), "{:?}", report);
    assert_eq!(runner.view().visible_primary(), vec!["video-section"]);
    assert!(runner.view().is_visible("progress"));
    assert_eq!(report.completions, 1);
    assert_eq!(report.action_failures, 0);

    // Nothing fires again once the scene is gone
    let tail = Scenario::new("tail").step(ScenarioStep::Run(secs(10)));
    let after = runner.run_steps(&tail);
    assert_eq!(after.completions, 1);
    assert_eq!(after.final_state(), AppState::Video);
}

#[test]
fn test_pause_countdown_prompts() {
    let scenario = Scenario::new("prompts")
        .to_scanning()
        .steps([ScenarioStep::Detect(0), ScenarioStep::StartExperience, until(AppState::Video, 60)]);

    let report = ScenarioRunner::run(&scenario).unwrap();

    assert!(report.prompts.contains(&"Continue (2s)".to_string()));
    assert!(report.prompts.contains(&"Continue (1s)".to_string()));
    assert!(report.prompts.contains(&"Continue (3s)".to_string()));
    assert!(report.prompts.contains(&"Continuing...".to_string()));
}

#[test]
fn test_camera_detection_with_dwell() {
    let scenario = Scenario::new("camera")
        .with_config(ScenarioConfig::default().with_app(AppConfig::default()))
        .show(2, Duration::from_millis(500), secs(120))
        .to_scanning()
        .steps([until(AppState::ArReady, 5), until(AppState::Animating, 5)]);

    let report = ScenarioRunner::run(&scenario).unwrap();

    assert!(report.passed(), "{:?}", report);
    assert_eq!(report.activations(), vec![TopicId::new(3)]);
    assert_eq!(report.status.scene_topic, Some(TopicId::new(3)));
    assert!(report.status.timeline.started);
}

#[test]
fn test_single_flight_until_reset() {
    let scenario = Scenario::new("single-flight")
        .to_scanning()
        .steps([ScenarioStep::Detect(0), ScenarioStep::Detect(1), ScenarioStep::Detect(0)]);

    let report = ScenarioRunner::run(&scenario).unwrap();

    assert_eq!(
        report.dispatched,
        vec![
            DispatchOutcome::Activated(TopicId::new(1)),
            DispatchOutcome::Ignored(IgnoreReason::AlreadyActive(TopicId::new(1))),
            DispatchOutcome::Ignored(IgnoreReason::AlreadyActive(TopicId::new(1))),
        ]
    );
    assert_eq!(report.status.scene_topic, Some(TopicId::new(1)));

    let rescanned = Scenario::new("rescan")
        .to_scanning()
        .steps([
            ScenarioStep::Detect(0),
            ScenarioStep::OpenMenu,
            ScenarioStep::StartScanning,
            ScenarioStep::Detect(1),
        ]);
    let report = ScenarioRunner::run(&rescanned).unwrap();
    assert_eq!(report.activations(), vec![TopicId::new(1), TopicId::new(2)]);
    assert_eq!(report.status.scene_topic, Some(TopicId::new(2)));
}

#[test]
fn test_unknown_target_ignored() {
    let scenario = Scenario::new("unknown").to_scanning().step(ScenarioStep::Detect(9));

    let report = ScenarioRunner::run(&scenario).unwrap();

    assert_eq!(
        report.dispatched,
        vec![DispatchOutcome::Ignored(IgnoreReason::UnknownTarget(TargetIndex::new(9)))]
    );
    assert_eq!(report.final_state(), AppState::Scanning);
    assert_eq!(report.status.scene_topic, None);
}

#[test]
fn test_lost_target_pauses_until_advance() {
    let scenario = Scenario::new("lost")
        .to_scanning()
        .steps([
            ScenarioStep::Detect(0),
            ScenarioStep::StartExperience,
            ScenarioStep::Run(Duration::from_millis(500)),
            ScenarioStep::Inject(TrackingEvent::lost(TargetIndex::new(0))),
        ]);
    let mut runner = ScenarioRunner::new(&scenario).unwrap();
    let report = runner.run_steps(&scenario);

    assert_eq!(report.dispatched.last(), Some(&DispatchOutcome::Paused(TopicId::new(1))));
    assert!(report.status.timeline.paused);
    let held_at = report.status.timeline.position_ms;

    let wait = Scenario::new("wait").step(ScenarioStep::Run(secs(5)));
    let report = runner.run_steps(&wait);
    assert_eq!(report.status.timeline.position_ms, held_at);
    assert_eq!(report.final_state(), AppState::Animating);

    let resume = Scenario::new("resume")
        .steps([ScenarioStep::Advance, until(AppState::Video, 60)]);
    let report = runner.run_steps(&resume);
    assert!(report.passed(), "{:?}", report);
}

#[test]
fn test_lost_without_active_topic() {
    let scenario = Scenario::new("stray-lost")
        .to_scanning()
        .step(ScenarioStep::Inject(TrackingEvent::lost(TargetIndex::new(1))));

    let report = ScenarioRunner::run(&scenario).unwrap();

    assert_eq!(
        report.dispatched,
        vec![DispatchOutcome::Ignored(IgnoreReason::NotActive(TopicId::new(2)))]
    );
}

#[test]
fn test_shaky_camera_still_completes() {
    let config = ScenarioConfig::default()
        .with_app(AppConfig::default())
        .with_tracker(TrackerConfig::shaky().with_seed(42))
        .with_auto_advance(true);
    let scenario = Scenario::new("shaky")
        .with_config(config)
        .show(0, Duration::ZERO, secs(600))
        .to_scanning()
        .step(until(AppState::Video, 300));

    let report = ScenarioRunner::run(&scenario).unwrap();

    assert!(report.passed(), "{:?}", report);
    assert_eq!(report.activations(), vec![TopicId::new(1)]);
    assert_eq!(report.completions, 1);
}

#[test]
fn test_unsupported_device_falls_back_to_menu() {
    let tracker = TrackerConfig {
        available: false,
        ..TrackerConfig::default()
    };
    let scenario = Scenario::new("no-ar")
        .with_config(ScenarioConfig::default().with_tracker(tracker))
        .to_scanning();
    let mut runner = ScenarioRunner::new(&scenario).unwrap();
    let report = runner.run_steps(&scenario);

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].1, ArError::TrackingUnavailable);
    assert_eq!(report.final_state(), AppState::Menu);
    assert!(!report.status.ar_supported);
    assert_eq!(runner.view().text_of(AR_STATUS).as_deref(), Some(AR_UNSUPPORTED));
    assert!(report.violations.is_empty());
}

#[test]
fn test_wrong_answers_get_partial_feedback() {
    let scenario = Scenario::new("wrong-answers")
        .with_config(ScenarioConfig::default().with_auto_advance(true))
        .to_scanning()
        .steps([
            ScenarioStep::Detect(0),
            ScenarioStep::StartExperience,
            until(AppState::Video, 60),
            ScenarioStep::FinishVideo,
        ]);
    let mut runner = ScenarioRunner::new(&scenario).unwrap();
    runner.run_steps(&scenario);

    let topic = TopicId::new(1);
    let correct = crate::scenario::correct_answers(runner.app().registry(), topic);
    let count = runner.app().registry().answers(topic).len();
    let wrong: Vec<usize> = (0..count).filter(|i| !correct.contains(i)).take(1).collect();
    let partial = runner.app().registry().feedback(topic).partial.clone();

    let submit = Scenario::new("submit").step(ScenarioStep::SubmitAnswers(wrong));
    let report = runner.run_steps(&submit);

    assert!(report.errors.is_empty());
    assert!(!runner.app().last_quiz().unwrap().perfect);
    assert_eq!(runner.view().text_of(QUIZ_FEEDBACK), Some(partial));
    assert_eq!(report.final_state(), AppState::Quiz);
}

#[test]
fn test_leaving_mid_animation_disposes_scene() {
    let scenario = Scenario::new("leave")
        .to_scanning()
        .steps([
            ScenarioStep::Detect(3),
            ScenarioStep::StartExperience,
            ScenarioStep::Run(secs(1)),
            ScenarioStep::OpenMenu,
            ScenarioStep::Run(secs(120)),
        ]);

    let report = ScenarioRunner::run(&scenario).unwrap();

    assert!(report.passed(), "{:?}", report);
    assert_eq!(report.completions, 0);
    assert_eq!(report.final_state(), AppState::Menu);
    assert_eq!(report.status.scene_topic, None);
    assert!(!report.status.timeline.loaded);
    assert_eq!(report.status.detected_topic, None);
}

#[test]
fn test_zero_rate_holds_timeline() {
    let scenario = Scenario::new("zero-rate")
        .to_scanning()
        .steps([
            ScenarioStep::Detect(0),
            ScenarioStep::StartExperience,
            ScenarioStep::Key('0'),
            ScenarioStep::Run(secs(60)),
        ]);
    let mut runner = ScenarioRunner::new(&scenario).unwrap();
    let report = runner.run_steps(&scenario);

    assert_eq!(report.completions, 0);
    assert_eq!(report.final_state(), AppState::Animating);
    assert_eq!(report.status.timeline.position_ms, 0);

    let resume = Scenario::new("resume").steps([ScenarioStep::Key('5'), until(AppState::Video, 30)]);
    let report = runner.run_steps(&resume);
    assert!(report.passed(), "{:?}", report);
}

#[test]
fn test_progress_persists_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let app = AppConfig {
        store_dir: Some(dir.path().to_path_buf()),
        ..AppConfig::manual()
    };

    let first = Scenario::full_topic(1).with_config(
        ScenarioConfig::default()
            .with_app(app.clone())
            .with_auto_advance(true),
    );
    let report = ScenarioRunner::run(&first).unwrap();
    assert!(report.passed(), "{:?}", report);
    assert_eq!(report.status.progress.completed_topics, vec![TopicId::new(2)]);

    let second = Scenario::new("reopen")
        .with_config(ScenarioConfig::default().with_app(app))
        .steps([
            ScenarioStep::Initialize,
            ScenarioStep::SelectCampus("Main Campus".to_string()),
            ScenarioStep::OpenMenu,
        ]);
    let mut runner = ScenarioRunner::new(&second).unwrap();
    let report = runner.run_steps(&second);

    assert_eq!(report.status.progress.completion_count, 1);
    assert_eq!(runner.view().text_of(PROGRESS_COUNTER).as_deref(), Some("1 of 4 completed"));
}

#[test]
fn test_every_topic_completes() {
    for target in 0..4 {
        let report = ScenarioRunner::run(&Scenario::full_topic(target)).unwrap();
        assert!(report.passed(), "target {}: {:?}", target, report);
        assert_eq!(report.completions, 1, "target {}", target);
        assert_eq!(report.status.progress.completion_count, 1);
    }
}

#[test]
fn test_status_json_shape() {
    let report = ScenarioRunner::run(&Scenario::full_topic(0)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.status.to_json()).unwrap();

    assert_eq!(json["state"], "menu");
    assert_eq!(json["progress"]["completionCount"], 1);
    assert_eq!(json["timeline"]["loaded"], false);
}
