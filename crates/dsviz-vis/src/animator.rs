//! Paced delivery of step events to subscribers.

use std::sync::{Arc, Mutex, MutexGuard};

use dsviz_engine::StepEvent;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::playback::PlaybackSpeed;

/// One event as published to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// Position within the running operation, from 0
    pub index: usize,
    pub event: StepEvent,
}

type Slot = Arc<Mutex<Option<broadcast::Sender<Frame>>>>;

/// A step source playing out on its own task.
///
/// Each event is published, then the task sleeps for the event's duration
/// hint scaled by the speed. Paused speed publishes nothing.
#[derive(Debug)]
pub struct Animator {
    sender: Slot,
    handle: JoinHandle<usize>,
    published: Option<usize>,
}

impl Animator {
    /// Start playing `source`. Must be called inside a tokio runtime.
    pub fn spawn<I>(source: I, speed: PlaybackSpeed, frames: broadcast::Sender<Frame>) -> Self
    where
        I: IntoIterator<Item = StepEvent>,
        I::IntoIter: Send + 'static,
    {
        let sender: Slot = Arc::new(Mutex::new(Some(frames)));
        let slot = sender.clone();
        let events = source.into_iter();

        let handle = tokio::spawn(async move {
            let mut published = 0;
            for (index, event) in events.enumerate() {
                let Some(delay) = speed.delay(event.duration_hint_ms) else {
                    break;
                };
                if !publish(&slot, Frame { index, event }) {
                    debug!(published, "animation cancelled");
                    return published;
                }
                published += 1;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            debug!(published, "animation finished");
            published
        });

        debug!(?speed, "animation started");
        Self {
            sender,
            handle,
            published: None,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop emission. No frame is published once this returns.
    pub fn cancel(&self) {
        lock(&self.sender).take();
        self.handle.abort();
    }

    /// Wait for the source to drain; returns how many frames went out.
    pub async fn finished(&mut self) -> usize {
        if let Some(published) = self.published {
            return published;
        }
        let published = (&mut self.handle).await.unwrap_or(0);
        self.published = Some(published);
        published
    }
}

impl Drop for Animator {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lock(slot: &Slot) -> MutexGuard<'_, Option<broadcast::Sender<Frame>>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Returns false once the animator has been cancelled.
fn publish(slot: &Slot, frame: Frame) -> bool {
    match lock(slot).as_ref() {
        Some(sender) => {
            // No subscribers is fine; the animation still runs its course.
            let _ = sender.send(frame);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsviz_engine::{ElementId, StepTimeline, Tone};
    use std::time::Duration;
    use tokio::sync::broadcast::error::TryRecvError;

    fn timeline(count: u64) -> StepTimeline {
        let mut t = StepTimeline::new();
        for i in 0..count {
            t.highlight(ElementId(i), Tone::Visiting, 100);
        }
        t
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_in_order() {
        let (tx, mut rx) = broadcast::channel(16);
        let (events, _) = timeline(3).into_parts();
        let mut animator = Animator::spawn(events, PlaybackSpeed::Normal, tx);

        for expected in 0..3 {
            let frame = rx.recv().await.unwrap();
            assert_eq!(frame.index, expected);
            assert_eq!(frame.event.target, ElementId(expected as u64));
        }
        assert_eq!(animator.finished().await, 3);
        assert!(!animator.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn speed_scales_pacing() {
        let (tx, _rx) = broadcast::channel(16);
        let (events, _) = timeline(4).into_parts();
        let start = tokio::time::Instant::now();
        let mut animator = Animator::spawn(events, PlaybackSpeed::Double, tx);
        animator.finished().await;
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_after_cancel() {
        let (tx, mut rx) = broadcast::channel(16);
        let (events, _) = timeline(5).into_parts();
        let animator = Animator::spawn(events, PlaybackSpeed::Normal, tx.clone());

        let first = rx.recv().await.unwrap();
        assert_eq!(first.index, 0);
        animator.cancel();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert!(!animator.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_emission() {
        let (tx, mut rx) = broadcast::channel(16);
        let (events, _) = timeline(5).into_parts();
        let animator = Animator::spawn(events, PlaybackSpeed::Normal, tx.clone());
        rx.recv().await.unwrap();
        drop(animator);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn paused_publishes_nothing() {
        let (tx, mut rx) = broadcast::channel(16);
        let (events, _) = timeline(3).into_parts();
        let mut animator = Animator::spawn(events, PlaybackSpeed::Paused, tx.clone());
        assert_eq!(animator.finished().await, 0);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }
}
