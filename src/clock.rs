//! Timed waits
//!
//! The setup retry loop and the teardown grace periods block the single
//! logical thread of the invocation. Hiding the sleep behind a trait keeps
//! the escalating wait sequence assertable in tests without real timers.

use std::time::Duration;

pub trait Clock {
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
