//! Frame pacing. Only used for timing and diagnostics, audio sync does not
//! depend on it.

use std::thread;
use std::time::{Duration, Instant};

pub fn get_seconds_elapsed(start: Instant, end: Instant) -> f32 {
    end.duration_since(start).as_secs_f32()
}

pub struct FrameClock {
    target_seconds_per_frame: f32,
    last_counter: Instant,
}

impl FrameClock {
    pub fn new(target_seconds_per_frame: f32) -> Self {
        FrameClock {
            target_seconds_per_frame,
            last_counter: Instant::now(),
        }
    }

    pub fn target_seconds_per_frame(&self) -> f32 {
        self.target_seconds_per_frame
    }

    /// Time spent on the current frame so far.
    pub fn work_seconds_elapsed(&self) -> f32 {
        get_seconds_elapsed(self.last_counter, Instant::now())
    }

    /// Sleeps, then spins, until the frame has lasted its target time.
    /// Returns the full length of the frame in seconds.
    pub fn wait_for_frame_end(&mut self) -> f32 {
        let mut seconds_elapsed_for_frame = self.work_seconds_elapsed();
        if seconds_elapsed_for_frame < self.target_seconds_per_frame {
            let sleep_seconds = self.target_seconds_per_frame - seconds_elapsed_for_frame;
            // leave a millisecond to spin through, sleep is coarse
            if sleep_seconds > 0.001 {
                thread::sleep(Duration::from_secs_f32(sleep_seconds - 0.001));
            }

            while seconds_elapsed_for_frame < self.target_seconds_per_frame {
                seconds_elapsed_for_frame = self.work_seconds_elapsed();
            }
        } else {
            trace!("missed frame rate");
        }

        let end_counter = Instant::now();
        let frame_seconds = get_seconds_elapsed(self.last_counter, end_counter);
        self.last_counter = end_counter;
        trace!("{}ms/f", 1000.0 * frame_seconds);

        frame_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_lasts_at_least_the_target() {
        let mut clock = FrameClock::new(0.005);
        let seconds = clock.wait_for_frame_end();
        assert!(seconds >= 0.005);
    }

    #[test]
    fn slow_frame_does_not_wait() {
        let mut clock = FrameClock::new(0.0);
        let start = Instant::now();
        clock.wait_for_frame_end();
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
