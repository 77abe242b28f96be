//! Progress reporting for sort and undo passes.
//!
//! The engines only see a [`ProgressSink`]. A terminal front-end can pass a
//! progress bar, a single-threaded caller a closure, and an embedding that
//! drives the engine from a worker thread a [`ChannelSink`], draining the
//! events on its own thread.

use std::sync::mpsc::Sender;

/// Receives one notification per file processed.
pub trait ProgressSink {
    /// `current` counts from 1, `total` is the size of the fixed work list.
    fn report(&mut self, current: usize, total: usize, message: &str);
}

impl<F> ProgressSink for F
where
    F: FnMut(usize, usize, &str),
{
    fn report(&mut self, current: usize, total: usize, message: &str) {
        self(current, total, message)
    }
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _current: usize, _total: usize, _message: &str) {}
}

/// A progress notification as sent over a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Forwards progress over a channel to another thread.
#[derive(Debug, Clone)]
pub struct ChannelSink(pub Sender<ProgressEvent>);

impl ProgressSink for ChannelSink {
    fn report(&mut self, current: usize, total: usize, message: &str) {
        // A dropped receiver only means nobody is watching anymore.
        let _ = self.0.send(ProgressEvent {
            current,
            total,
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn drive(sink: &mut dyn ProgressSink) {
        sink.report(1, 2, "first");
        sink.report(2, 2, "second");
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        let mut sink = |current: usize, total: usize, message: &str| {
            seen.push((current, total, message.to_string()));
        };
        drive(&mut sink);

        assert_eq!(
            seen,
            vec![(1, 2, "first".to_string()), (2, 2, "second".to_string())]
        );
    }

    #[test]
    fn test_channel_sink() {
        let (tx, rx) = mpsc::channel();
        let mut sink = ChannelSink(tx);
        drive(&mut sink);
        drop(sink);

        let events: Vec<ProgressEvent> = rx.iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].current, 2);
        assert_eq!(events[1].message, "second");
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (tx, rx) = mpsc::channel::<ProgressEvent>();
        drop(rx);
        drive(&mut ChannelSink(tx));
    }
}
