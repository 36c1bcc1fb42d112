// src/channel.rs

//! The `Sender`/`Receiver` handle pair over a shared pipe.
//!
//! The handles add what the raw pipe deliberately leaves out: a blocking
//! receive built on thread parking, disconnect detection when either side is
//! dropped, and the wakeup wired to the pipe's flush signal. The pipe reports
//! "the consumer had parked" as a `false` return from `flush`; that edge is
//! the only place a wakeup can be needed, so it is the only place one is
//! issued.

use crate::error::{RecvError, RecvErrorTimeout, SendError, TryRecvError};
use crate::pipe::Pipe;
use crate::sync_util;
use crate::telemetry;

use parking_lot::Mutex;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{self, AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, Thread};
use std::time::{Duration, Instant};

/// Default number of item slots per queue chunk.
///
/// 32 balances allocation frequency against memory footprint and cache
/// locality for typical payload sizes; pick a larger power of two via
/// [`unbounded_with_chunk`] for very small items at very high rates.
pub const DEFAULT_CHUNK_CAPACITY: usize = 32;

/// State shared by the two handles.
struct ChannelShared<T: Send, const N: usize> {
  pipe: Pipe<T, N>,

  // --- Consumer waiting state ---
  consumer_parked: AtomicBool,
  consumer_thread: Mutex<Option<Thread>>,

  sender_dropped: AtomicBool,
  receiver_dropped: AtomicBool,
}

impl<T: Send, const N: usize> ChannelShared<T, N> {
  /// Wakes the consumer if it is parked.
  #[inline]
  fn wake_consumer(&self) {
    // Pairs with the fence in `Receiver::park`: neither side may miss the
    // other's store (flag here, republished frontier there).
    atomic::fence(Ordering::SeqCst);
    if self
      .consumer_parked
      .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
    {
      telemetry::increment_counter("weft::channel", "consumer_wake");
      if let Some(thread_handle) = self.consumer_thread.lock().take() {
        sync_util::unpark_thread(&thread_handle);
      }
    }
  }
}

impl<T: Send, const N: usize> fmt::Debug for ChannelShared<T, N> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ChannelShared")
      .field("pipe", &self.pipe)
      .field(
        "consumer_parked",
        &self.consumer_parked.load(Ordering::Relaxed),
      )
      .field("sender_dropped", &self.sender_dropped.load(Ordering::Relaxed))
      .field(
        "receiver_dropped",
        &self.receiver_dropped.load(Ordering::Relaxed),
      )
      .finish_non_exhaustive()
  }
}

/// The producing half of the channel.
///
/// Items passed to [`send`](Sender::send) are buffered locally and become
/// visible to the [`Receiver`] only after [`flush`](Sender::flush). Dropping
/// the sender flushes anything still pending and disconnects the channel.
pub struct Sender<T: Send, const N: usize = DEFAULT_CHUNK_CAPACITY> {
  shared: Arc<ChannelShared<T, N>>,
  timeout: Option<Duration>,
  _phantom: PhantomData<*mut ()>,
}

/// The consuming half of the channel.
pub struct Receiver<T: Send, const N: usize = DEFAULT_CHUNK_CAPACITY> {
  shared: Arc<ChannelShared<T, N>>,
  _phantom: PhantomData<*mut ()>,
}

// The phantom raw pointer keeps the handles !Sync; each belongs to exactly
// one thread at a time, which is what makes the pipe's unsynchronized
// cursors sound.
unsafe impl<T: Send, const N: usize> Send for Sender<T, N> {}
unsafe impl<T: Send, const N: usize> Send for Receiver<T, N> {}

/// Creates an unbounded SPSC channel with the default chunk capacity.
pub fn unbounded<T: Send>() -> (Sender<T>, Receiver<T>) {
  unbounded_with_chunk::<T, DEFAULT_CHUNK_CAPACITY>()
}

/// Creates an unbounded SPSC channel whose queue grows in chunks of `N`
/// item slots.
pub fn unbounded_with_chunk<T: Send, const N: usize>() -> (Sender<T, N>, Receiver<T, N>) {
  let shared = Arc::new(ChannelShared {
    pipe: Pipe::new(),
    consumer_parked: AtomicBool::new(false),
    consumer_thread: Mutex::new(None),
    sender_dropped: AtomicBool::new(false),
    receiver_dropped: AtomicBool::new(false),
  });
  (
    Sender {
      shared: Arc::clone(&shared),
      timeout: None,
      _phantom: PhantomData,
    },
    Receiver {
      shared,
      _phantom: PhantomData,
    },
  )
}

impl<T: Send, const N: usize> Sender<T, N> {
  /// Appends `value` to the channel without publishing it.
  ///
  /// The value is not visible to the receiver until the next
  /// [`flush`](Self::flush). Never blocks; the queue grows as needed.
  pub fn send(&mut self, value: T) -> Result<(), SendError> {
    if self.shared.receiver_dropped.load(Ordering::Acquire) {
      return Err(SendError::Closed);
    }
    self.shared.pipe.write(value);
    Ok(())
  }

  /// Publishes every value sent since the last flush, waking the receiver if
  /// it went to sleep waiting for data.
  pub fn flush(&mut self) -> Result<(), SendError> {
    if self.shared.receiver_dropped.load(Ordering::Acquire) {
      return Err(SendError::Closed);
    }
    if !self.shared.pipe.flush() {
      self.shared.wake_consumer();
    }
    Ok(())
  }

  /// Stores a timeout on this sender.
  ///
  /// Reserved: no current operation consults it. It exists so deadline
  /// plumbing can be added without changing the API surface.
  pub fn set_timeout(&mut self, timeout: Duration) {
    self.timeout = Some(timeout);
  }

  /// The timeout stored by [`set_timeout`](Self::set_timeout), if any.
  pub fn timeout(&self) -> Option<Duration> {
    self.timeout
  }

  /// Returns `true` if the receiver has been dropped.
  pub fn is_closed(&self) -> bool {
    self.shared.receiver_dropped.load(Ordering::Acquire)
  }
}

impl<T: Send, const N: usize> Drop for Sender<T, N> {
  fn drop(&mut self) {
    // Publish any pending writes so the receiver can drain them, then
    // disconnect.
    self.shared.pipe.flush();
    self.shared.sender_dropped.store(true, Ordering::Release);
    self.shared.wake_consumer();
  }
}

impl<T: Send, const N: usize> Receiver<T, N> {
  /// Receives an item if one has been published.
  pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
    if let Some(value) = self.shared.pipe.read() {
      return Ok(value);
    }
    if self.shared.sender_dropped.load(Ordering::Acquire) {
      // The sender's drop flushes before it sets the flag; anything published
      // by that final flush is still owed to the caller.
      if let Some(value) = self.shared.pipe.read() {
        return Ok(value);
      }
      return Err(TryRecvError::Disconnected);
    }
    Err(TryRecvError::Empty)
  }

  /// Receives an item, blocking until the sender publishes one.
  pub fn recv(&mut self) -> Result<T, RecvError> {
    loop {
      match self.try_recv() {
        Ok(value) => return Ok(value),
        Err(TryRecvError::Disconnected) => return Err(RecvError::Disconnected),
        Err(TryRecvError::Empty) => {}
      }

      match self.park(None) {
        Ok(value) => return Ok(value),
        Err(TryRecvError::Disconnected) => return Err(RecvError::Disconnected),
        Err(TryRecvError::Empty) => {}
      }
    }
  }

  /// Receives an item, blocking for at most `timeout`.
  pub fn recv_timeout(&mut self, timeout: Duration) -> Result<T, RecvErrorTimeout> {
    let deadline = Instant::now() + timeout;
    loop {
      match self.try_recv() {
        Ok(value) => return Ok(value),
        Err(TryRecvError::Disconnected) => return Err(RecvErrorTimeout::Disconnected),
        Err(TryRecvError::Empty) => {}
      }

      let now = Instant::now();
      if now >= deadline {
        return Err(RecvErrorTimeout::Timeout);
      }

      match self.park(Some(deadline - now)) {
        Ok(value) => return Ok(value),
        Err(TryRecvError::Disconnected) => return Err(RecvErrorTimeout::Disconnected),
        Err(TryRecvError::Empty) => {}
      }
    }
  }

  /// Registers this thread for wakeup, re-checks the pipe, and parks.
  ///
  /// Returns `Empty` on a (possibly spurious) wakeup; callers loop.
  fn park(&mut self, timeout: Option<Duration>) -> Result<T, TryRecvError> {
    *self.shared.consumer_thread.lock() = Some(thread::current());
    self.shared.consumer_parked.store(true, Ordering::Release);
    // Pairs with the fence in `wake_consumer`.
    atomic::fence(Ordering::SeqCst);

    // A flush may have landed between the failed read and the flag store;
    // re-check before actually sleeping or the wakeup is lost.
    match self.try_recv() {
      Ok(value) => {
        self.clear_parked();
        return Ok(value);
      }
      Err(TryRecvError::Disconnected) => {
        self.clear_parked();
        return Err(TryRecvError::Disconnected);
      }
      Err(TryRecvError::Empty) => {}
    }

    telemetry::increment_counter("weft::channel", "consumer_park");
    match timeout {
      Some(duration) => sync_util::park_thread_timeout(duration),
      None => sync_util::park_thread(),
    }
    self.clear_parked();
    Err(TryRecvError::Empty)
  }

  #[inline]
  fn clear_parked(&self) {
    if self
      .shared
      .consumer_parked
      .compare_exchange(true, false, Ordering::AcqRel, Ordering::Relaxed)
      .is_ok()
    {
      *self.shared.consumer_thread.lock() = None;
    }
  }

  /// Returns `true` if the sender has been dropped.
  ///
  /// Published items may still be pending even when this returns `true`;
  /// [`try_recv`](Self::try_recv) drains them before reporting
  /// [`TryRecvError::Disconnected`].
  pub fn is_closed(&self) -> bool {
    self.shared.sender_dropped.load(Ordering::Acquire)
  }
}

impl<T: Send, const N: usize> Drop for Receiver<T, N> {
  fn drop(&mut self) {
    self.shared.receiver_dropped.store(true, Ordering::Release);
  }
}

impl<T: Send, const N: usize> fmt::Debug for Sender<T, N> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Sender")
      .field("shared", &self.shared)
      .field("timeout", &self.timeout)
      .finish()
  }
}

impl<T: Send, const N: usize> fmt::Debug for Receiver<T, N> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Receiver").field("shared", &self.shared).finish()
  }
}
