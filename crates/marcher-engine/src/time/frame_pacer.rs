use std::time::{Duration, Instant};

/// Schedules redraws at a fixed target frame duration.
///
/// The runtime hands [`FramePacer::next_deadline`] to winit as
/// `ControlFlow::WaitUntil`. Deadlines advance by exactly one frame duration;
/// if the loop falls more than one frame behind, the schedule resyncs to `now`
/// instead of bursting to catch up.
#[derive(Debug, Clone)]
pub struct FramePacer {
    frame_duration: Duration,
    next: Option<Instant>,
}

impl FramePacer {
    pub fn new(frame_duration: Duration) -> Self {
        Self {
            frame_duration,
            next: None,
        }
    }

    /// Returns `true` when a frame is due at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.next.is_none_or(|deadline| now >= deadline)
    }

    /// Records that a frame started at `now` and computes the next deadline.
    pub fn frame_started(&mut self, now: Instant) {
        if self.frame_duration.is_zero() {
            self.next = None;
            return;
        }

        let next = match self.next {
            Some(deadline) if now < deadline + self.frame_duration => {
                deadline + self.frame_duration
            }
            _ => now + self.frame_duration,
        };
        self.next = Some(next);
    }

    /// Next redraw deadline, or `None` when unpaced / before the first frame.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_micros(16_667);

    #[test]
    fn first_frame_is_always_due() {
        let pacer = FramePacer::new(FRAME);
        assert!(pacer.is_due(Instant::now()));
        assert!(pacer.next_deadline().is_none());
    }

    #[test]
    fn deadlines_advance_by_frame_duration() {
        let mut pacer = FramePacer::new(FRAME);
        let t0 = Instant::now();
        pacer.frame_started(t0);
        assert_eq!(pacer.next_deadline(), Some(t0 + FRAME));

        // A slightly late frame keeps the established cadence.
        pacer.frame_started(t0 + FRAME + Duration::from_millis(2));
        assert_eq!(pacer.next_deadline(), Some(t0 + FRAME * 2));
    }

    #[test]
    fn resyncs_after_stall() {
        let mut pacer = FramePacer::new(FRAME);
        let t0 = Instant::now();
        pacer.frame_started(t0);

        let late = t0 + Duration::from_millis(500);
        pacer.frame_started(late);
        assert_eq!(pacer.next_deadline(), Some(late + FRAME));
    }

    #[test]
    fn not_due_before_deadline() {
        let mut pacer = FramePacer::new(FRAME);
        let t0 = Instant::now();
        pacer.frame_started(t0);
        assert!(!pacer.is_due(t0 + Duration::from_millis(1)));
        assert!(pacer.is_due(t0 + FRAME));
    }

    #[test]
    fn zero_duration_disables_pacing() {
        let mut pacer = FramePacer::new(Duration::ZERO);
        pacer.frame_started(Instant::now());
        assert!(pacer.next_deadline().is_none());
        assert!(pacer.is_due(Instant::now()));
    }
}
