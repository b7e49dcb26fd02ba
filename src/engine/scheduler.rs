//! Frame-annotated events and due checks.

use crate::config::EventMatching;
use crate::song::NoteEvent;
use crate::timing::FrameTiming;

/// A song event with its start and end converted to frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    event: NoteEvent,
    start_frame: i64,
    end_frame: i64,
    start_fired: bool,
    end_fired: bool,
}

impl ScheduledEvent {
    pub(crate) fn new(event: NoteEvent, timing: &FrameTiming) -> Self {
        Self {
            start_frame: timing.frame_of(event.start_div),
            end_frame: timing.frame_of(event.end_div),
            event,
            start_fired: false,
            end_fired: false,
        }
    }

    /// The underlying event.
    pub fn event(&self) -> &NoteEvent {
        &self.event
    }

    /// Frame the event starts on.
    pub fn start_frame(&self) -> i64 {
        self.start_frame
    }

    /// Frame the event ends on.
    pub fn end_frame(&self) -> i64 {
        self.end_frame
    }

    /// Whether the start should be dispatched at `frame`. Marks it fired.
    pub(crate) fn start_due(&mut self, frame: i64, matching: EventMatching) -> bool {
        due(self.start_frame, frame, &mut self.start_fired, matching)
    }

    /// Whether the end should be dispatched at `frame`. Marks it fired.
    pub(crate) fn end_due(&mut self, frame: i64, matching: EventMatching) -> bool {
        due(self.end_frame, frame, &mut self.end_fired, matching)
    }

    /// Re-arm whichever of start and end lies at or after `frame`.
    pub(crate) fn rearm_from(&mut self, frame: i64) {
        if self.start_frame >= frame {
            self.start_fired = false;
        }
        if self.end_frame >= frame {
            self.end_fired = false;
        }
    }

    pub(crate) fn rearm(&mut self) {
        self.start_fired = false;
        self.end_fired = false;
    }
}

fn due(target: i64, frame: i64, fired: &mut bool, matching: EventMatching) -> bool {
    match matching {
        EventMatching::Exact => frame == target,
        EventMatching::CatchUp => {
            if *fired || frame < target {
                return false;
            }
            *fired = true;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::EventKind;

    fn scheduled(start_div: i32, end_div: i32) -> ScheduledEvent {
        let event = NoteEvent {
            channel: 0,
            program: 0,
            kind: EventKind::Note(60),
            velocity: 100,
            start_div,
            end_div,
            pan: 64,
            pitch_bend: 0,
            channel_volume: 100,
            volume_env: None,
            vibrato_env: None,
            slide_env: None,
        };
        ScheduledEvent::new(event, &FrameTiming::new(120, 59.73).unwrap())
    }

    #[test]
    fn frames_are_rounded_once() {
        let event = scheduled(0, 16);
        assert_eq!(event.start_frame(), 0);
        assert_eq!(event.end_frame(), 30);
    }

    #[test]
    fn catch_up_fires_once_when_reached() {
        let mut event = scheduled(0, 16);
        assert!(event.start_due(1, EventMatching::CatchUp));
        assert!(!event.start_due(2, EventMatching::CatchUp));
        assert!(!event.end_due(29, EventMatching::CatchUp));
        assert!(event.end_due(35, EventMatching::CatchUp));
        assert!(!event.end_due(36, EventMatching::CatchUp));
    }

    #[test]
    fn exact_matches_only_the_frame() {
        let mut event = scheduled(0, 16);
        assert!(!event.start_due(1, EventMatching::Exact));
        assert!(event.end_due(30, EventMatching::Exact));
        assert!(event.end_due(30, EventMatching::Exact));
        assert!(!event.end_due(31, EventMatching::Exact));
    }

    #[test]
    fn rearm_from_only_touches_later_frames() {
        let mut event = scheduled(0, 16);
        event.start_due(1, EventMatching::CatchUp);
        event.end_due(30, EventMatching::CatchUp);

        event.rearm_from(10);
        assert!(!event.start_due(11, EventMatching::CatchUp));
        assert!(event.end_due(30, EventMatching::CatchUp));

        event.rearm();
        assert!(event.start_due(1, EventMatching::CatchUp));
    }
}
