//! One visualizer session: an engine, its last timeline and the live animation.

use std::time::Duration;

use dsviz_engine::{
    AnyEngine, BubbleRun, BubbleSortEngine, ElementId, Engine, EngineError, Notice, Outcome,
    RandomArray, Snapshot, StepDurations, StepTimeline, StructureKind, Tone,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::animator::{Animator, Frame};
use crate::config::VisConfig;
use crate::error::{Error, Result};
use crate::playback::{Playback, PlaybackSpeed};

/// A user command, as the control panel sends it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Insert { value: String },
    /// Linked list only
    InsertFront { value: String },
    /// Stack and queue ignore the value
    Delete {
        #[serde(default)]
        value: String,
    },
    Search { value: String },
    Clear,
    Randomize,
    PrepareSteps,
    StepForward,
    StepBackward,
    RunSort,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Insert { .. } => "insert",
            Command::InsertFront { .. } => "insert_front",
            Command::Delete { .. } => "delete",
            Command::Search { .. } => "search",
            Command::Clear => "clear",
            Command::Randomize => "randomize",
            Command::PrepareSteps => "prepare_steps",
            Command::StepForward => "step_forward",
            Command::StepBackward => "step_backward",
            Command::RunSort => "run_sort",
        }
    }
}

/// What a command did.
#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub op: &'static str,
    pub applied: bool,
    /// Why the command was a no-op
    pub ignored: Option<String>,
    /// Events to animate, unless they stream live as frames
    pub timeline: Option<StepTimeline>,
    /// Events are streaming over the frame channel
    pub live: bool,
    pub notice: Option<Notice>,
    /// State after the command
    pub snapshot: Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToneView {
    pub id: ElementId,
    pub tone: Tone,
}

/// Everything a renderer needs to draw the current instant.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub snapshot: Snapshot,
    /// Tones at the playback frame, by element id
    pub tones: Vec<ToneView>,
    pub notice: Option<Notice>,
    pub busy: bool,
}

enum Plan {
    Timeline(StepTimeline),
    Live(BubbleRun),
    Ignored(EngineError),
}

impl From<Outcome> for Plan {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Animated(timeline) => Plan::Timeline(timeline),
            Outcome::Ignored(err) => Plan::Ignored(err),
        }
    }
}

fn sort_engine<'a>(
    engine: &'a mut AnyEngine,
    op: &'static str,
) -> dsviz_engine::Result<&'a mut BubbleSortEngine> {
    let kind = engine.kind();
    engine
        .as_sort_mut()
        .ok_or(EngineError::Unsupported { kind, op })
}

fn build_engine(
    kind: StructureKind,
    durations: StepDurations,
    random: &RandomArray,
    rng: &mut StdRng,
) -> AnyEngine {
    let mut engine = AnyEngine::new(kind, durations);
    if let Some(sort) = engine.as_sort_mut() {
        sort.randomize(random, rng);
    }
    engine
}

/// Owns exactly one engine.
///
/// While an animation is in flight every command is rejected with
/// [`Error::Busy`], so the drawn state never runs ahead of canonical state.
/// Reads always succeed.
#[derive(Debug)]
pub struct Session {
    engine: AnyEngine,
    playback: Playback,
    animator: Option<Animator>,
    notice: Option<(Notice, Instant)>,
    frames: broadcast::Sender<Frame>,
    speed: PlaybackSpeed,
    durations: StepDurations,
    random: RandomArray,
    rng: StdRng,
}

impl Session {
    pub fn new(config: &VisConfig, frames: broadcast::Sender<Frame>) -> Self {
        Self::with_rng(config, frames, StdRng::from_entropy())
    }

    pub fn with_rng(config: &VisConfig, frames: broadcast::Sender<Frame>, mut rng: StdRng) -> Self {
        let engine = build_engine(config.structure, config.durations, &config.random, &mut rng);
        let mut playback = Playback::default();
        playback.set_speed(config.speed);
        Self {
            engine,
            playback,
            animator: None,
            notice: None,
            frames,
            speed: config.speed,
            durations: config.durations,
            random: config.random,
            rng,
        }
    }

    pub fn kind(&self) -> StructureKind {
        self.engine.kind()
    }

    pub fn engine(&self) -> &AnyEngine {
        &self.engine
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.snapshot()
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut Playback {
        &mut self.playback
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    /// Pacing for animations started from now on.
    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
        self.playback.set_speed(speed);
    }

    pub fn is_busy(&self) -> bool {
        self.animator.as_ref().is_some_and(Animator::is_running)
    }

    /// The current notice, until its display time runs out.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice
            .as_ref()
            .filter(|(_, expires)| Instant::now() < *expires)
            .map(|(notice, _)| notice)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.frames.subscribe()
    }

    pub fn view(&self) -> SessionView {
        let mut tones: Vec<ToneView> = self
            .playback
            .tones()
            .into_iter()
            .map(|(id, tone)| ToneView { id, tone })
            .collect();
        tones.sort_by_key(|t| t.id);
        SessionView {
            snapshot: self.snapshot(),
            tones,
            notice: self.notice().cloned(),
            busy: self.is_busy(),
        }
    }

    /// Replace the engine with a fresh one of `kind`. Any animation in
    /// flight is cancelled first.
    pub fn switch(&mut self, kind: StructureKind) {
        if let Some(animator) = self.animator.take() {
            animator.cancel();
        }
        self.engine = build_engine(kind, self.durations, &self.random, &mut self.rng);
        self.playback.load(StepTimeline::new());
        self.notice = None;
        info!(%kind, "switched structure");
    }

    /// Wait for the animation in flight, if any, to finish.
    pub async fn settle(&mut self) {
        if let Some(animator) = self.animator.as_mut() {
            animator.finished().await;
        }
    }

    pub fn apply(&mut self, command: Command) -> Result<CommandReport> {
        let op = command.name();
        if self.is_busy() {
            debug!(op, "animation in flight, command rejected");
            return Err(Error::Busy);
        }
        self.animator = None;

        let report = match self.plan(&command) {
            Plan::Ignored(err) => {
                debug!(op, error = %err, "command ignored");
                CommandReport {
                    op,
                    applied: false,
                    ignored: Some(err.to_string()),
                    timeline: None,
                    live: false,
                    notice: None,
                    snapshot: self.snapshot(),
                }
            }
            Plan::Timeline(timeline) => {
                info!(op, events = timeline.len(), "command applied");
                self.play(&timeline);
                CommandReport {
                    op,
                    applied: true,
                    ignored: None,
                    notice: timeline.notice().cloned(),
                    timeline: Some(timeline),
                    live: false,
                    snapshot: self.snapshot(),
                }
            }
            Plan::Live(run) if self.speed == PlaybackSpeed::Paused => {
                let mut timeline = StepTimeline::new();
                for event in run {
                    timeline.push(event.target, event.kind, event.duration_hint_ms);
                }
                info!(op, events = timeline.len(), "bubble sort recorded for stepping");
                self.play(&timeline);
                CommandReport {
                    op,
                    applied: true,
                    ignored: None,
                    notice: None,
                    timeline: Some(timeline),
                    live: false,
                    snapshot: self.snapshot(),
                }
            }
            Plan::Live(run) => {
                info!(op, delay_ms = run.delay_ms(), "bubble sort run started");
                self.notice = None;
                self.playback.load(StepTimeline::new());
                // the run's events already carry the speed-scaled delay
                let pacing = match self.speed {
                    PlaybackSpeed::Maximum => PlaybackSpeed::Maximum,
                    _ => PlaybackSpeed::Normal,
                };
                self.animator = Some(Animator::spawn(run, pacing, self.frames.clone()));
                CommandReport {
                    op,
                    applied: true,
                    ignored: None,
                    timeline: None,
                    live: true,
                    notice: None,
                    snapshot: self.snapshot(),
                }
            }
        };
        Ok(report)
    }

    fn plan(&mut self, command: &Command) -> Plan {
        match command {
            Command::Insert { value } => self.engine.insert(value).into(),
            Command::InsertFront { value } => self.engine.insert_front(value).into(),
            Command::Delete { value } => self.engine.delete(value).into(),
            Command::Search { value } => self.engine.search(value).into(),
            Command::Clear => self.engine.clear().into(),
            Command::Randomize => match sort_engine(&mut self.engine, "randomize") {
                Ok(sort) => Plan::Timeline(sort.randomize(&self.random, &mut self.rng).timeline),
                Err(err) => Plan::Ignored(err),
            },
            Command::PrepareSteps => match sort_engine(&mut self.engine, "prepare_steps") {
                Ok(sort) => {
                    sort.prepare_steps();
                    Plan::Timeline(StepTimeline::new())
                }
                Err(err) => Plan::Ignored(err),
            },
            Command::StepForward => match sort_engine(&mut self.engine, "step_forward") {
                Ok(sort) => sort
                    .step_forward()
                    .map_or(Plan::Ignored(EngineError::Empty), |a| Plan::Timeline(a.timeline)),
                Err(err) => Plan::Ignored(err),
            },
            Command::StepBackward => match sort_engine(&mut self.engine, "step_backward") {
                Ok(sort) => sort
                    .step_backward()
                    .map_or(Plan::Ignored(EngineError::Empty), |a| Plan::Timeline(a.timeline)),
                Err(err) => Plan::Ignored(err),
            },
            Command::RunSort => match sort_engine(&mut self.engine, "run_sort") {
                Ok(sort) => Plan::Live(sort.run_animated(self.speed.multiplier())),
                Err(err) => Plan::Ignored(err),
            },
        }
    }

    /// Load `timeline` for scrubbing and start animating it.
    ///
    /// Paused speed leaves playback at frame 0 for manual stepping; otherwise
    /// the scrubber parks at the end, matching what the animation leaves on
    /// screen.
    fn play(&mut self, timeline: &StepTimeline) {
        self.notice = timeline
            .notice()
            .map(|n| (n.clone(), Instant::now() + Duration::from_millis(n.display_ms)));
        self.playback.load(timeline.clone());
        if timeline.is_empty() || self.speed == PlaybackSpeed::Paused {
            return;
        }
        self.playback.seek(timeline.len());
        self.animator = Some(Animator::spawn(
            timeline.events().to_vec(),
            self.speed,
            self.frames.clone(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsviz_engine::NoticeKind;
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio_test::{assert_err, assert_ok};

    fn session(kind: StructureKind, speed: PlaybackSpeed) -> Session {
        let config = VisConfig {
            structure: kind,
            speed,
            ..VisConfig::default()
        };
        let (tx, _) = broadcast::channel(256);
        Session::with_rng(&config, tx, StdRng::seed_from_u64(11))
    }

    fn insert(value: &str) -> Command {
        Command::Insert {
            value: value.to_owned(),
        }
    }

    #[test]
    fn commands_parse_from_json() {
        let cmd: Command = serde_json::from_str(r#"{"op":"insert","value":"7"}"#).unwrap();
        assert_eq!(cmd, insert("7"));
        let cmd: Command = serde_json::from_str(r#"{"op":"delete"}"#).unwrap();
        assert_eq!(cmd, Command::Delete { value: String::new() });
        let cmd: Command = serde_json::from_str(r#"{"op":"run_sort"}"#).unwrap();
        assert_eq!(cmd, Command::RunSort);
        assert!(serde_json::from_str::<Command>(r#"{"op":"rotate"}"#).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn busy_while_animating() {
        let mut s = session(StructureKind::BinarySearchTree, PlaybackSpeed::Normal);
        let report = assert_ok!(s.apply(insert("5")));
        assert!(report.applied);
        assert!(s.is_busy());

        let err = assert_err!(s.apply(insert("3")));
        assert!(matches!(err, Error::Busy));
        assert_eq!(s.engine().len(), 1);

        s.settle().await;
        assert!(!s.is_busy());
        assert_ok!(s.apply(insert("3")));
        assert_eq!(s.engine().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_speed_never_blocks() {
        let mut s = session(StructureKind::Stack, PlaybackSpeed::Paused);
        assert_ok!(s.apply(insert("a")));
        assert!(!s.is_busy());
        assert_ok!(s.apply(insert("b")));
        assert_eq!(s.playback().current_frame(), 0);
        assert!(s.playback().total_frames() > 0);
        assert_eq!(s.snapshot().readout("top"), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn ignored_commands_report_the_reason() {
        let mut s = session(StructureKind::Queue, PlaybackSpeed::Normal);
        let report = assert_ok!(s.apply(insert("  ")));
        assert!(!report.applied);
        assert!(report.ignored.is_some());
        assert!(!s.is_busy());

        let report = assert_ok!(s.apply(Command::RunSort));
        assert!(!report.applied);
        assert_eq!(report.ignored.as_deref(), Some("queue does not support run_sort"));
    }

    #[tokio::test(start_paused = true)]
    async fn miss_notice_expires() {
        let mut s = session(StructureKind::LinkedList, PlaybackSpeed::Maximum);
        assert_ok!(s.apply(insert("x")));
        s.settle().await;

        let report = assert_ok!(s.apply(Command::Search {
            value: "y".to_owned()
        }));
        let notice = report.notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::NotFound);
        assert_eq!(notice.text, "Value \"y\" not found in list.");
        assert!(s.notice().is_some());

        tokio::time::sleep(Duration::from_millis(notice.display_ms)).await;
        assert!(s.notice().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn frames_reach_subscribers() {
        let mut s = session(StructureKind::MaxHeap, PlaybackSpeed::Double);
        let mut rx = s.subscribe();
        let report = assert_ok!(s.apply(insert("4")));
        let expected = report.timeline.map(|t| t.len()).unwrap_or(0);
        assert!(expected > 0);

        for index in 0..expected {
            let frame = rx.recv().await.unwrap();
            assert_eq!(frame.index, index);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn switch_cancels_animation() {
        let mut s = session(StructureKind::Queue, PlaybackSpeed::QuarterSpeed);
        let mut rx = s.subscribe();
        assert_ok!(s.apply(insert("a")));
        rx.recv().await.unwrap();
        s.switch(StructureKind::Stack);
        while rx.try_recv().is_ok() {}

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(s.kind(), StructureKind::Stack);
        assert!(s.engine().is_empty());
        assert!(!s.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn bubble_sort_run_streams_then_settles() {
        let mut s = session(StructureKind::BubbleSort, PlaybackSpeed::Maximum);
        assert_eq!(s.engine().len(), 20);
        let mut rx = s.subscribe();

        let report = assert_ok!(s.apply(Command::RunSort));
        assert!(report.live);
        assert!(report.timeline.is_none());
        assert_eq!(report.snapshot.readout("sorted"), Some("true"));

        s.settle().await;
        let mut count = 0;
        loop {
            match rx.try_recv() {
                Ok(_) => count += 1,
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        assert!(count > 0);
        assert_ok!(s.apply(Command::Randomize));
    }

    #[tokio::test(start_paused = true)]
    async fn paused_run_is_recorded_for_stepping() {
        let mut s = session(StructureKind::BubbleSort, PlaybackSpeed::Paused);
        let report = assert_ok!(s.apply(Command::RunSort));
        assert!(!report.live);
        let total = report.timeline.map(|t| t.len()).unwrap_or(0);
        assert_eq!(s.playback().total_frames(), total);
        assert!(!s.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_sort_stepping() {
        let mut s = session(StructureKind::BubbleSort, PlaybackSpeed::Paused);
        let report = assert_ok!(s.apply(Command::StepForward));
        assert!(!report.applied, "no steps prepared yet");

        assert_ok!(s.apply(Command::PrepareSteps));
        assert_ok!(s.apply(Command::StepForward));
        assert_ok!(s.apply(Command::StepForward));
        let report = assert_ok!(s.apply(Command::StepBackward));
        assert!(report.applied);
        assert_eq!(s.snapshot().readout("step"), Some("1/190"));
    }
}
