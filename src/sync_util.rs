//! Minimal helpers around std::thread::park/unpark.
//! The channel keeps the parked/running state; these only block and wake.

use std::thread;
use std::time::Duration;

/// Parks the current thread.
#[inline]
pub(crate) fn park_thread() {
  thread::park();
}

/// Parks the current thread for at most `duration`.
#[inline]
pub(crate) fn park_thread_timeout(duration: Duration) {
  thread::park_timeout(duration);
}

/// Unparks the given thread.
#[inline]
pub(crate) fn unpark_thread(thread: &thread::Thread) {
  thread.unpark();
}
