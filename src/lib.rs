#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! An unbounded SPSC channel with explicit flush batching.
//!
//! Weft connects exactly one producer thread to exactly one consumer thread
//! through a chunked, unbounded FIFO queue. Unlike most channels, a send is
//! **not** immediately visible to the consumer: the producer accumulates items
//! locally and publishes the whole run with a single atomic compare-and-swap
//! when it calls [`Sender::flush`]. The consumer detects emptiness with one
//! atomic exchange and parks; the producer's next flush wakes it.
//!
//! This trades per-item synchronization for per-batch synchronization, which
//! makes the channel well suited to bursty pipelines that naturally produce
//! items in runs.
//!
//! # Example
//!
//! ```
//! use std::thread;
//!
//! let (mut tx, mut rx) = weft::unbounded::<u64>();
//!
//! let producer = thread::spawn(move || {
//!   for i in 0..100 {
//!     tx.send(i).unwrap();
//!   }
//!   // Nothing above is visible to the consumer until this flush.
//!   tx.flush().unwrap();
//! });
//!
//! let consumer = thread::spawn(move || {
//!   for i in 0..100 {
//!     assert_eq!(rx.recv().unwrap(), i);
//!   }
//! });
//!
//! producer.join().unwrap();
//! consumer.join().unwrap();
//! ```
//!
//! # Guarantees
//!
//! - Items are received in send order (FIFO), with no loss and no duplication.
//! - `send`, `flush` and the queue operations behind them are wait-free in
//!   steady state; a flush costs one CAS, growing the queue costs at most one
//!   allocation (usually zero, thanks to chunk recycling).
//! - Dropping the [`Sender`] publishes any pending unflushed items before
//!   disconnecting, so the consumer can drain everything that was sent.

pub mod error;
pub mod telemetry;

mod channel;
mod internal;
mod pipe;
mod queue;
mod sync_util;

pub use channel::{unbounded, unbounded_with_chunk, Receiver, Sender, DEFAULT_CHUNK_CAPACITY};
pub use error::{RecvError, RecvErrorTimeout, SendError, TryRecvError};
