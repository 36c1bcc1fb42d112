// src/error.rs

//! Error types returned by channel operations.

use core::fmt;

/// Error returned by [`Sender::send`](crate::Sender::send) and
/// [`Sender::flush`](crate::Sender::flush).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SendError {
  /// The channel is closed because the receiver has been dropped.
  Closed,
}
impl std::error::Error for SendError {}
impl fmt::Display for SendError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SendError::Closed => write!(f, "channel closed"),
    }
  }
}

/// Error returned by [`Receiver::try_recv`](crate::Receiver::try_recv) when an
/// item could not be received immediately.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TryRecvError {
  /// No published item is available right now.
  Empty,
  /// The channel is empty and the sender has been dropped.
  Disconnected,
}
impl std::error::Error for TryRecvError {}
impl fmt::Display for TryRecvError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TryRecvError::Empty => write!(f, "channel empty"),
      TryRecvError::Disconnected => write!(f, "channel disconnected (empty and sender dropped)"),
    }
  }
}

/// Error returned by [`Receiver::recv`](crate::Receiver::recv).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RecvError {
  /// The channel is empty and the sender has been dropped.
  Disconnected,
}
impl std::error::Error for RecvError {}
impl fmt::Display for RecvError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RecvError::Disconnected => write!(f, "channel disconnected (empty and sender dropped)"),
    }
  }
}

/// Error returned by [`Receiver::recv_timeout`](crate::Receiver::recv_timeout).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RecvErrorTimeout {
  /// The channel is empty and the sender has been dropped.
  Disconnected,
  /// The timeout elapsed before an item was published.
  Timeout,
}
impl std::error::Error for RecvErrorTimeout {}
impl fmt::Display for RecvErrorTimeout {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RecvErrorTimeout::Disconnected => write!(f, "channel disconnected"),
      RecvErrorTimeout::Timeout => write!(f, "receive operation timed out"),
    }
  }
}
