//! Progress reporting and cooperative cancellation.
//!
//! The search polls a [`Status`] at the top of every minimizer pass and once
//! per restart try. A poll that returns [`Interrupted`] unwinds the search;
//! whatever was accepted so far is kept and the outcome is marked incomplete.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::ProgressBar;
use thiserror::Error;

/// The user asked the search to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("search interrupted")]
pub struct Interrupted;

/// Poll hook consulted by long-running searches.
pub trait Status {
    /// Return `Err(Interrupted)` to stop the search.
    fn poll(&mut self) -> Result<(), Interrupted>;

    /// Called when a restart try begins.
    fn start_try(&mut self, _try_index: usize) {}

    /// Called when a solution is accepted.
    fn found(&mut self, _count: usize) {}
}

/// Never interrupts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStatus;

impl Status for NullStatus {
    fn poll(&mut self) -> Result<(), Interrupted> {
        Ok(())
    }
}

/// Cancellation flag that can be raised from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the search to stop at its next poll.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Status for CancelFlag {
    fn poll(&mut self) -> Result<(), Interrupted> {
        if self.is_cancelled() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}

/// Closure-backed status; the closure returns `true` to keep going.
pub struct PollFn<F>(pub F);

impl<F: FnMut() -> bool> Status for PollFn<F> {
    fn poll(&mut self) -> Result<(), Interrupted> {
        if (self.0)() {
            Ok(())
        } else {
            Err(Interrupted)
        }
    }
}

/// Progress bar over restart tries, optionally cancellable.
pub struct ProgressStatus {
    bar: ProgressBar,
    cancel: Option<CancelFlag>,
}

impl ProgressStatus {
    /// Bar sized for `n_tries` (a spinner when the try budget is unbounded).
    pub fn new(n_tries: usize) -> Self {
        let bar = if n_tries == 0 {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::new(n_tries as u64)
        };
        Self { bar, cancel: None }
    }

    /// Report through an existing bar.
    pub fn with_bar(bar: ProgressBar) -> Self {
        Self { bar, cancel: None }
    }

    /// Stop when `flag` is raised.
    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Close the bar.
    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl Status for ProgressStatus {
    fn poll(&mut self) -> Result<(), Interrupted> {
        self.bar.tick();
        match &mut self.cancel {
            Some(flag) => flag.poll(),
            None => Ok(()),
        }
    }

    fn start_try(&mut self, try_index: usize) {
        self.bar.set_position(try_index.saturating_sub(1) as u64);
    }

    fn found(&mut self, count: usize) {
        self.bar.set_message(format!("{} found", count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_shared_between_clones() {
        let flag = CancelFlag::new();
        let mut status = flag.clone();
        assert!(status.poll().is_ok());
        flag.cancel();
        assert_eq!(status.poll(), Err(Interrupted));
    }

    #[test]
    fn test_poll_fn_stops_after_budget() {
        let mut left = 2;
        let mut status = PollFn(|| {
            left -= 1;
            left >= 0
        });
        assert!(status.poll().is_ok());
        assert!(status.poll().is_ok());
        assert!(status.poll().is_err());
    }

    #[test]
    fn test_progress_status_with_hidden_bar() {
        let flag = CancelFlag::new();
        let mut status = ProgressStatus::with_bar(ProgressBar::hidden()).with_cancel(flag.clone());
        status.start_try(1);
        status.found(1);
        assert!(status.poll().is_ok());
        flag.cancel();
        assert!(status.poll().is_err());
        status.finish();
    }
}
