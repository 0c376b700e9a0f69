//! Wall-clock pacing for hosts.
//!
//! The CPU never decides when to run. A [`Pacer`] turns elapsed real time
//! into a number of instruction steps and timer ticks owed, each at its own
//! rate, carrying the remainder forward so fractional periods add up.

use std::time::Duration;

/// Upper bound on the time a single [`Pacer::advance`] call accounts for.
///
/// A host that stalls (debugger pause, suspended terminal) would otherwise
/// owe thousands of steps at once.
pub const MAX_CATCH_UP: Duration = Duration::from_millis(250);

/// Work owed after some elapsed time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
    pub steps: u32,
    pub ticks: u32,
}

#[derive(Debug, Clone)]
pub struct Pacer {
    step_period: Duration,
    tick_period: Duration,
    step_debt: Duration,
    tick_debt: Duration,
}

impl Pacer {
    /// Pace `cpu_hz` steps and `timer_hz` ticks per second.
    ///
    /// Rates of zero are treated as one per second.
    pub fn new(cpu_hz: u32, timer_hz: u32) -> Self {
        Self {
            step_period: period(cpu_hz),
            tick_period: period(timer_hz),
            step_debt: Duration::ZERO,
            tick_debt: Duration::ZERO,
        }
    }

    /// Account for `elapsed` time and return what is now due.
    pub fn advance(&mut self, elapsed: Duration) -> Budget {
        let elapsed = elapsed.min(MAX_CATCH_UP);
        self.step_debt += elapsed;
        self.tick_debt += elapsed;

        Budget {
            steps: drain(&mut self.step_debt, self.step_period),
            ticks: drain(&mut self.tick_debt, self.tick_period),
        }
    }

    /// Forget any carried remainder.
    pub fn reset(&mut self) {
        self.step_debt = Duration::ZERO;
        self.tick_debt = Duration::ZERO;
    }

    /// How long until the next step or tick falls due.
    pub fn until_next(&self) -> Duration {
        let step = self.step_period.saturating_sub(self.step_debt);
        let tick = self.tick_period.saturating_sub(self.tick_debt);
        step.min(tick)
    }
}

fn period(hz: u32) -> Duration {
    Duration::from_secs(1) / hz.max(1)
}

fn drain(debt: &mut Duration, period: Duration) -> u32 {
    let due = (debt.as_nanos() / period.as_nanos()) as u32;
    *debt -= period * due;
    due
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_second_budget() {
        let mut pacer = Pacer::new(600, 60);
        let mut total = Budget::default();
        for _ in 0..10 {
            let b = pacer.advance(Duration::from_millis(100));
            total.steps += b.steps;
            total.ticks += b.ticks;
        }
        assert_eq!(total, Budget { steps: 600, ticks: 60 });
    }

    #[test]
    fn test_fractions_carry_over() {
        let mut pacer = Pacer::new(60, 60);
        // 16.66..ms period: 10ms owes nothing, the next 10ms owes one
        assert_eq!(pacer.advance(Duration::from_millis(10)), Budget::default());
        assert_eq!(pacer.advance(Duration::from_millis(10)), Budget { steps: 1, ticks: 1 });
    }

    #[test]
    fn test_catch_up_is_capped() {
        let mut pacer = Pacer::new(1000, 60);
        let b = pacer.advance(Duration::from_secs(10));
        assert_eq!(b.steps, 250);
        assert_eq!(b.ticks, 15);
    }

    #[test]
    fn test_until_next() {
        let mut pacer = Pacer::new(100, 50);
        assert_eq!(pacer.until_next(), Duration::from_millis(10));
        pacer.advance(Duration::from_millis(4));
        assert_eq!(pacer.until_next(), Duration::from_millis(6));
    }

    #[test]
    fn test_zero_rate() {
        let mut pacer = Pacer::new(0, 0);
        assert_eq!(pacer.advance(Duration::from_millis(200)), Budget::default());
    }
}
