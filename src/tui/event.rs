//! Keyboard, resize and redraw events for the dashboard.
//!
//! A spawned task merges crossterm's input stream with a redraw
//! interval and forwards the result over a channel, so the dashboard
//! can wait on input and a running test at the same time.

use std::time::Duration;

use crossterm::event::{
    Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind,
};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Input the dashboard reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Key press (releases and repeats are dropped)
    Key(KeyEvent),
    /// New terminal size as (columns, rows)
    Resize(u16, u16),
    /// Redraw the dashboard
    Render,
}

/// Map a crossterm event to a dashboard event, if it is one we use.
fn translate(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
            Some(Event::Key(key))
        }
        CrosstermEvent::Resize(columns, rows) => {
            Some(Event::Resize(columns, rows))
        }
        _ => None,
    }
}

/// Receiving end of the dashboard event task.
pub struct EventReader {
    events: mpsc::UnboundedReceiver<Event>,
    shutdown: CancellationToken,
}

impl EventReader {
    /// Start reading terminal input, with a [`Event::Render`] every
    /// `render_rate`.
    pub fn new(render_rate: Duration) -> Self {
        let (sender, events) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        tokio::spawn(pump(sender, render_rate, shutdown.clone()));

        Self { events, shutdown }
    }

    /// Next event, or `None` once the task has exited.
    pub async fn next(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Stop the event task.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn pump(
    sender: mpsc::UnboundedSender<Event>,
    render_rate: Duration,
    shutdown: CancellationToken,
) {
    let mut input = EventStream::new();
    let mut redraw = interval(render_rate);
    redraw.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = redraw.tick() => Event::Render,
            Some(Ok(raw)) = input.next() => match translate(raw) {
                Some(event) => event,
                None => continue,
            },
        };

        if sender.send(event).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_key_press_is_forwarded() {
        let press = key(KeyCode::Char('r'), KeyEventKind::Press);
        assert_eq!(
            translate(CrosstermEvent::Key(press)),
            Some(Event::Key(press))
        );
    }

    #[test]
    fn test_key_release_and_repeat_are_dropped() {
        let release = key(KeyCode::Char('q'), KeyEventKind::Release);
        let repeat = key(KeyCode::Char('q'), KeyEventKind::Repeat);

        assert_eq!(translate(CrosstermEvent::Key(release)), None);
        assert_eq!(translate(CrosstermEvent::Key(repeat)), None);
    }

    #[test]
    fn test_resize_and_focus() {
        assert_eq!(
            translate(CrosstermEvent::Resize(120, 40)),
            Some(Event::Resize(120, 40))
        );
        assert_eq!(translate(CrosstermEvent::FocusGained), None);
    }
}
