//! Fixed-window accounting for token endpoint requests.

// self
use crate::_prelude::*;

/// Default number of fetches allowed per window.
pub const DEFAULT_QUOTA_LIMIT: u32 = 5;
/// Default window length.
pub const DEFAULT_QUOTA_WINDOW: Duration = Duration::from_secs(3_600);

/// Fixed-window request counter anchored at construction time.
///
/// The window never slides: when a deadline lapses the anchor advances by whole window
/// lengths, so consecutive windows stay on the same grid no matter when the counter is next
/// consulted. Up to `2 x limit` requests may straddle a window boundary; that imprecision is
/// part of the contract.
#[derive(Clone, Debug)]
pub struct QuotaWindow {
	limit: u32,
	length: Duration,
	used: u32,
	resets_at: Instant,
}
impl QuotaWindow {
	/// Creates a window of `length` starting at `now` allowing `limit` requests.
	///
	/// A zero limit would wait forever and a zero length would spin; both are clamped to one.
	pub fn new(limit: u32, length: Duration, now: Instant) -> Self {
		let limit = limit.max(1);
		let length = if length.is_zero() { Duration::from_secs(1) } else { length };

		Self { limit, length, used: 0, resets_at: now + length }
	}

	/// Requests recorded in the current window.
	pub fn used(&self) -> u32 {
		self.used
	}

	/// Request ceiling per window.
	pub fn limit(&self) -> u32 {
		self.limit
	}

	/// Window length.
	pub fn length(&self) -> Duration {
		self.length
	}

	/// Deadline at which the current window ends.
	pub fn resets_at(&self) -> Instant {
		self.resets_at
	}

	/// Rolls the window forward when `now` has passed the deadline, zeroing the counter.
	pub fn tick(&mut self, now: Instant) {
		if now < self.resets_at {
			return;
		}

		while self.resets_at <= now {
			self.resets_at += self.length;
		}

		self.used = 0;
	}

	/// Returns the deadline to wait for when the current window's budget is spent.
	pub fn exhausted_until(&mut self, now: Instant) -> Option<Instant> {
		self.tick(now);

		(self.used >= self.limit).then_some(self.resets_at)
	}

	/// Records one dispatched request against the current window.
	pub fn note_request(&mut self, now: Instant) {
		self.tick(now);

		self.used = self.used.saturating_add(1);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const WINDOW: Duration = Duration::from_secs(100);

	#[test]
	fn counter_resets_exactly_at_the_deadline() {
		let t0 = Instant::now();
		let mut window = QuotaWindow::new(2, WINDOW, t0);

		window.note_request(t0);
		window.note_request(t0 + Duration::from_secs(1));

		assert_eq!(window.used(), 2);
		assert_eq!(window.exhausted_until(t0 + Duration::from_secs(2)), Some(t0 + WINDOW));

		// Waking at the deadline starts a fresh window one length later.
		window.tick(t0 + WINDOW);

		assert_eq!(window.used(), 0);
		assert_eq!(window.resets_at(), t0 + WINDOW * 2);
	}

	#[test]
	fn lapsed_windows_stay_on_the_anchor_grid() {
		let t0 = Instant::now();
		let mut window = QuotaWindow::new(5, WINDOW, t0);

		window.note_request(t0);
		// Skip far past several windows; the anchor must not drift off the grid.
		window.tick(t0 + Duration::from_secs(350));

		assert_eq!(window.used(), 0);
		assert_eq!(window.resets_at(), t0 + WINDOW * 4);
	}

	#[test]
	fn budget_is_not_exhausted_below_the_limit() {
		let t0 = Instant::now();
		let mut window = QuotaWindow::new(3, WINDOW, t0);

		window.note_request(t0);
		window.note_request(t0);

		assert_eq!(window.exhausted_until(t0 + Duration::from_secs(1)), None);

		window.note_request(t0);

		assert!(window.exhausted_until(t0 + Duration::from_secs(1)).is_some());
	}

	#[test]
	fn degenerate_configurations_are_clamped() {
		let t0 = Instant::now();
		let window = QuotaWindow::new(0, Duration::ZERO, t0);

		assert_eq!(window.limit(), 1);
		assert_eq!(window.length(), Duration::from_secs(1));
	}
}
