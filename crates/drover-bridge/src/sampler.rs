use std::collections::VecDeque;

use drover_core::Position;

/// Bounded ring of recent agent positions, used only to estimate horizontal
/// speed over a short trailing window.
#[derive(Debug)]
pub struct PositionSampler {
    ring: VecDeque<Position>,
    capacity: usize,
    tick_hz: u32,
}

impl PositionSampler {
    pub fn new(capacity: usize, tick_hz: u32) -> Self {
        Self {
            ring: VecDeque::with_capacity(capacity),
            capacity,
            tick_hz,
        }
    }

    /// Record one sample, evicting the oldest past capacity.
    pub fn record(&mut self, pos: Position) {
        self.ring.push_back(pos);
        while self.ring.len() > self.capacity {
            self.ring.pop_front();
        }
    }

    /// Average horizontal speed across the window, in m/s.
    ///
    /// Zero with fewer than two samples. Elapsed time is derived from the
    /// sample count at the nominal tick rate and clamped to at least one
    /// second so a short window cannot blow the estimate up.
    pub fn average_horizontal_speed(&self) -> f64 {
        if self.ring.len() < 2 {
            return 0.0;
        }
        let first = self.ring.front().expect("non-empty ring");
        let last = self.ring.back().expect("non-empty ring");
        let dist = first.horizontal_distance(last);
        let secs = ((self.ring.len() - 1) as f64 / self.tick_hz as f64).max(1.0);
        dist / secs
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_two_samples() {
        let mut s = PositionSampler::new(20, 20);
        assert_eq!(s.average_horizontal_speed(), 0.0);
        s.record(Position::new(0.0, 64.0, 0.0));
        assert_eq!(s.average_horizontal_speed(), 0.0);
    }

    #[test]
    fn test_speed_over_full_window() {
        let mut s = PositionSampler::new(20, 20);
        // 20 samples, one block of X per tick: 19 blocks over 19 ticks.
        for i in 0..20 {
            s.record(Position::new(i as f64, 64.0, 0.0));
        }
        // 19 ticks at 20 Hz is 0.95s, clamped to 1s
        assert!((s.average_horizontal_speed() - 19.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_window_clamped_to_one_second() {
        let mut s = PositionSampler::new(20, 20);
        s.record(Position::new(0.0, 0.0, 0.0));
        s.record(Position::new(2.0, 0.0, 0.0));
        // 2 blocks over one tick would read as 40 m/s without the clamp
        assert!((s.average_horizontal_speed() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_eviction_keeps_capacity() {
        let mut s = PositionSampler::new(5, 20);
        for i in 0..50 {
            s.record(Position::new(i as f64, 0.0, 0.0));
        }
        assert_eq!(s.len(), 5);
        // Oldest surviving sample is x=45, newest x=49
        assert!((s.average_horizontal_speed() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_vertical_motion_is_ignored() {
        let mut s = PositionSampler::new(20, 20);
        for i in 0..10 {
            s.record(Position::new(0.0, i as f64 * 10.0, 0.0));
        }
        assert_eq!(s.average_horizontal_speed(), 0.0);
    }
}
