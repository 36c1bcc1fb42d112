// src/queue.rs

//! A chunked, unbounded FIFO used as the storage layer of the pipe.
//!
//! Storage grows in fixed-size chunks linked into a list. When the consumer
//! drains a chunk it is not returned to the allocator immediately: a single
//! atomically-swapped spare slot keeps the most recently retired chunk so the
//! producer can reuse it on its next boundary crossing. In steady state the
//! same two chunks ping-pong between the ends and allocation drops to zero.
//!
//! The queue itself performs no cross-thread synchronization beyond the spare
//! slot. The producer owns the `back`/`end` cursors, the consumer owns the
//! `begin` cursor, and the pipe layered on top guarantees the consumer never
//! reads a slot the producer has not published.

use crate::internal::cache_padded::CachePadded;
use crate::telemetry;

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

struct Chunk<T, const N: usize> {
  values: [UnsafeCell<MaybeUninit<T>>; N],
  prev: *mut Chunk<T, N>,
  next: *mut Chunk<T, N>,
}

/// Cursors owned by the consumer: the oldest occupied slot.
struct ReaderPos<T, const N: usize> {
  begin_chunk: *mut Chunk<T, N>,
  begin_pos: usize,
}

/// Cursors owned by the producer: the most recently committed slot (`back`)
/// and the next free slot (`end`).
struct WriterPos<T, const N: usize> {
  back_chunk: *mut Chunk<T, N>,
  back_pos: usize,
  end_chunk: *mut Chunk<T, N>,
  end_pos: usize,
}

/// Unbounded FIFO over a doubly-linked list of `N`-slot chunks.
///
/// All methods take `&self`; the two cursor groups live in `UnsafeCell`s so
/// the producer and consumer handles can share the queue through an `Arc`.
/// Callers must uphold the SPSC discipline: `back_ptr`/`push` only from the
/// producer thread, `front_ptr`/`pop` only from the consumer thread.
///
/// Dropping the queue frees chunk memory only. Slots holding live values must
/// be drained by the owner first; the queue cannot tell which slots are
/// initialized.
pub(crate) struct Queue<T, const N: usize> {
  reader: CachePadded<UnsafeCell<ReaderPos<T, N>>>,
  writer: CachePadded<UnsafeCell<WriterPos<T, N>>>,

  /// Holds at most one retired chunk, unreachable from the live list.
  spare_chunk: AtomicPtr<Chunk<T, N>>,

  /// Total chunks ever allocated. Diagnostic only.
  chunk_allocs: AtomicUsize,
}

impl<T, const N: usize> Queue<T, N> {
  pub(crate) fn new() -> Self {
    assert!(N > 0, "chunk capacity must be greater than 0");
    let queue = Queue {
      reader: CachePadded::new(UnsafeCell::new(ReaderPos {
        begin_chunk: ptr::null_mut(),
        begin_pos: 0,
      })),
      writer: CachePadded::new(UnsafeCell::new(WriterPos {
        back_chunk: ptr::null_mut(),
        back_pos: 0,
        end_chunk: ptr::null_mut(),
        end_pos: 0,
      })),
      spare_chunk: AtomicPtr::new(ptr::null_mut()),
      chunk_allocs: AtomicUsize::new(0),
    };
    let first = queue.allocate_chunk();
    unsafe {
      (*queue.reader.get()).begin_chunk = first;
      (*queue.writer.get()).end_chunk = first;
    }
    queue
  }

  fn allocate_chunk(&self) -> *mut Chunk<T, N> {
    self.chunk_allocs.fetch_add(1, Ordering::Relaxed);
    telemetry::increment_counter("weft::queue", "chunk_alloc");
    let chunk = Box::new(Chunk {
      // An uninitialized array of MaybeUninit slots is a valid value.
      values: unsafe { MaybeUninit::uninit().assume_init() },
      prev: ptr::null_mut(),
      next: ptr::null_mut(),
    });
    Box::into_raw(chunk)
  }

  /// Address of the oldest occupied slot. Consumer side.
  ///
  /// The slot is only initialized if the pipe has published it; callers gate
  /// reads through the pipe's cursors.
  #[inline]
  pub(crate) fn front_ptr(&self) -> *mut T {
    unsafe {
      let reader = &*self.reader.get();
      (*reader.begin_chunk).values[reader.begin_pos].get() as *mut T
    }
  }

  /// Address of the most recently committed slot. Producer side.
  ///
  /// Valid only after at least one `push`.
  #[inline]
  pub(crate) fn back_ptr(&self) -> *mut T {
    unsafe {
      let writer = &*self.writer.get();
      (*writer.back_chunk).values[writer.back_pos].get() as *mut T
    }
  }

  /// Commits the current `end` slot as the new `back` and advances `end`,
  /// growing the chunk list when the current chunk fills. Producer side.
  pub(crate) fn push(&self) {
    unsafe {
      let writer = &mut *self.writer.get();
      writer.back_chunk = writer.end_chunk;
      writer.back_pos = writer.end_pos;

      writer.end_pos += 1;
      if writer.end_pos != N {
        return;
      }

      let spare = self.spare_chunk.swap(ptr::null_mut(), Ordering::AcqRel);
      let next = if spare.is_null() {
        self.allocate_chunk()
      } else {
        telemetry::increment_counter("weft::queue", "chunk_reuse");
        spare
      };
      (*writer.end_chunk).next = next;
      (*next).prev = writer.end_chunk;
      writer.end_chunk = next;
      writer.end_pos = 0;
    }
  }

  /// Releases the front slot and advances `begin`, retiring the head chunk
  /// into the spare slot when it empties. Consumer side.
  ///
  /// The slot's value must already have been moved out by the caller.
  pub(crate) fn pop(&self) {
    unsafe {
      let reader = &mut *self.reader.get();
      reader.begin_pos += 1;
      if reader.begin_pos != N {
        return;
      }

      let retired = reader.begin_chunk;
      reader.begin_chunk = (*retired).next;
      (*reader.begin_chunk).prev = ptr::null_mut();
      reader.begin_pos = 0;

      // Keep the retired chunk for the producer; free the previous spare.
      let displaced = self.spare_chunk.swap(retired, Ordering::AcqRel);
      if !displaced.is_null() {
        drop(Box::from_raw(displaced));
      }
    }
  }

  /// Total chunks allocated so far. In a steady-state workload this stops
  /// growing once the spare slot starts being reused.
  #[cfg(test)]
  pub(crate) fn allocations(&self) -> usize {
    self.chunk_allocs.load(Ordering::Relaxed)
  }
}

impl<T, const N: usize> Drop for Queue<T, N> {
  fn drop(&mut self) {
    // Exclusive access here: plain walks and a relaxed swap suffice.
    let end_chunk = self.writer.get_mut().end_chunk;
    let mut chunk = self.reader.get_mut().begin_chunk;
    unsafe {
      debug_assert!((*chunk).prev.is_null(), "live head must have no prev link");
      loop {
        let next = (*chunk).next;
        let last = chunk == end_chunk;
        drop(Box::from_raw(chunk));
        if last {
          break;
        }
        chunk = next;
      }

      let spare = self.spare_chunk.swap(ptr::null_mut(), Ordering::Relaxed);
      if !spare.is_null() {
        drop(Box::from_raw(spare));
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // The tests drive the queue the way the pipe does: an initial push reserves
  // the terminator slot, every write stores into `back` and pushes again.

  fn write<const N: usize>(queue: &Queue<u32, N>, value: u32) {
    unsafe {
      ptr::write(queue.back_ptr(), value);
    }
    queue.push();
  }

  fn read<const N: usize>(queue: &Queue<u32, N>) -> u32 {
    let value = unsafe { ptr::read(queue.front_ptr()) };
    queue.pop();
    value
  }

  #[test]
  fn fifo_across_chunk_boundaries() {
    let queue = Queue::<u32, 2>::new();
    queue.push();

    for i in 0..5 {
      write(&queue, i);
    }
    for i in 0..5 {
      assert_eq!(read(&queue), i);
    }
    assert_eq!(queue.front_ptr(), queue.back_ptr());
  }

  #[test]
  fn single_chunk_round_trip() {
    let queue = Queue::<u32, 64>::new();
    queue.push();

    write(&queue, 7);
    write(&queue, 8);
    assert_eq!(read(&queue), 7);
    assert_eq!(read(&queue), 8);
    assert_eq!(queue.allocations(), 1);
  }

  #[test]
  fn steady_state_reuses_spare_chunk() {
    let queue = Queue::<u32, 2>::new();
    queue.push();

    // Warm up until the spare slot is in rotation.
    for i in 0..10 {
      write(&queue, i);
      assert_eq!(read(&queue), i);
    }
    let warmed = queue.allocations();

    for i in 0..200 {
      write(&queue, i);
      assert_eq!(read(&queue), i);
    }
    assert_eq!(queue.allocations(), warmed);
  }

  #[test]
  fn burst_then_drain_allocates_proportionally() {
    let queue = Queue::<u32, 4>::new();
    queue.push();

    for i in 0..100 {
      write(&queue, i);
    }
    for i in 0..100 {
      assert_eq!(read(&queue), i);
    }
    // 100 items in 4-slot chunks plus the reserved slot.
    assert!(queue.allocations() >= 25);

    // Draining retains exactly one retired chunk in the spare slot and frees
    // the rest, so a same-size second burst has to allocate almost as many
    // chunks again.
    let after_first = queue.allocations();
    for i in 0..100 {
      write(&queue, i);
    }
    for i in 0..100 {
      assert_eq!(read(&queue), i);
    }
    assert!(queue.allocations() >= after_first + 20);
  }
}
