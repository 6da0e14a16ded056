use std::time::Duration;

/// Length of one host tick.
pub const TICK_DURATION: Duration = Duration::from_millis(600);

/// Ticks dropped from a primary observer's reading to cancel its one-tick signal skew.
const PRIMARY_OFFSET_TICKS: u32 = 2;
/// Ticks dropped from every other observer's reading.
const OBSERVER_OFFSET_TICKS: u32 = 1;

/// Tick-counting timer armed by [`Stopwatch::start`] and advanced once per host tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stopwatch {
    ticks: u32,
    running: bool,
}

impl Stopwatch {
    /// Create a stopped stopwatch with no elapsed ticks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the tick count and start counting.
    pub fn start(&mut self) {
        self.ticks = 0;
        self.running = true;
    }

    /// Freeze the current tick count.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance by one tick when running.
    pub fn tick(&mut self) {
        if self.running {
            self.ticks = self.ticks.saturating_add(1);
        }
    }

    /// Raw number of ticks counted since the last start.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Whether the stopwatch is currently counting.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Elapsed seconds after removing the observer-dependent tick offset, clamped at zero.
    pub fn elapsed_seconds(&self, is_primary_observer: bool) -> f64 {
        let offset = if is_primary_observer {
            PRIMARY_OFFSET_TICKS
        } else {
            OBSERVER_OFFSET_TICKS
        };
        let adjusted = self.ticks.saturating_sub(offset);
        (TICK_DURATION * adjusted).as_secs_f64()
    }
}

/// Render seconds as `m:ss` or `m:ss.xx` when there is a fractional part.
pub fn format_elapsed(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u64;
    let remainder = seconds - (minutes as f64) * 60.0;
    if remainder.fract().abs() < f64::EPSILON {
        format!("{minutes}:{:02}", remainder as u64)
    } else {
        format!("{minutes}:{remainder:05.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_for(ticks: u32) -> Stopwatch {
        let mut watch = Stopwatch::new();
        watch.start();
        for _ in 0..ticks {
            watch.tick();
        }
        watch
    }

    #[test]
    fn new_stopwatch_is_stopped_at_zero() {
        let watch = Stopwatch::new();
        assert_eq!(watch.ticks(), 0);
        assert!(!watch.is_running());
    }

    #[test]
    fn counts_ticks_only_while_running() {
        let mut watch = running_for(7);
        assert_eq!(watch.ticks(), 7);

        watch.stop();
        watch.tick();
        watch.tick();
        assert_eq!(watch.ticks(), 7);

        watch.stop();
        assert!(!watch.is_running());
    }

    #[test]
    fn tick_without_start_is_ignored() {
        let mut watch = Stopwatch::new();
        watch.tick();
        assert_eq!(watch.ticks(), 0);
    }

    #[test]
    fn start_resets_previous_count() {
        let mut watch = running_for(5);
        watch.stop();
        watch.start();
        assert_eq!(watch.ticks(), 0);
        assert!(watch.is_running());
    }

    #[test]
    fn primary_observer_drops_an_extra_tick() {
        let watch = running_for(10);
        assert_eq!(watch.elapsed_seconds(true), 4.8);
        assert_eq!(watch.elapsed_seconds(false), 5.4);
        assert!(watch.elapsed_seconds(true) <= watch.elapsed_seconds(false));
    }

    #[test]
    fn elapsed_is_clamped_at_zero() {
        let watch = running_for(1);
        assert_eq!(watch.elapsed_seconds(true), 0.0);
        assert_eq!(watch.elapsed_seconds(false), 0.0);
        assert_eq!(Stopwatch::new().elapsed_seconds(true), 0.0);
    }

    #[test]
    fn elapsed_is_a_pure_read() {
        let watch = running_for(4);
        let _ = watch.elapsed_seconds(true);
        let _ = watch.elapsed_seconds(false);
        assert_eq!(watch.ticks(), 4);
        assert!(watch.is_running());
    }

    #[test]
    fn formats_whole_and_fractional_seconds() {
        assert_eq!(format_elapsed(0.0), "0:00");
        assert_eq!(format_elapsed(65.0), "1:05");
        assert_eq!(format_elapsed(754.2), "12:34.20");
        assert_eq!(format_elapsed(3.6), "0:03.60");
    }
}
