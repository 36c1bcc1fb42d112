// src/telemetry.rs

//! Opt-in counters for diagnosing channel behavior.
//!
//! With the `weft_telemetry` feature enabled, the channel internals count
//! interesting events (chunk allocations, chunk reuses, consumer parks,
//! flush wakeups) into a global table keyed by location. Without the feature
//! every hook compiles to a no-op.

#[cfg(feature = "weft_telemetry")]
mod enabled {
  use std::collections::HashMap;
  use std::sync::Mutex;

  type CounterKey = (&'static str, &'static str);

  lazy_static::lazy_static! {
    static ref COUNTERS: Mutex<HashMap<CounterKey, usize>> = Mutex::new(HashMap::new());
  }

  /// Adds one to the named counter.
  pub fn increment_counter_fn(location: &'static str, counter_name: &'static str) {
    if let Ok(mut counters) = COUNTERS.lock() {
      *counters.entry((location, counter_name)).or_insert(0) += 1;
    } else {
      eprintln!("[WEFT TELEMETRY] counter table mutex poisoned");
    }
  }

  /// Current value of the named counter, 0 if never incremented.
  pub fn counter_value_fn(location: &'static str, counter_name: &'static str) -> usize {
    COUNTERS
      .lock()
      .map(|counters| counters.get(&(location, counter_name)).copied().unwrap_or(0))
      .unwrap_or(0)
  }

  /// Prints every recorded counter to stdout.
  pub fn print_telemetry_report_fn() {
    if let Ok(counters) = COUNTERS.lock() {
      println!("--- Weft Telemetry Report ---");
      if counters.is_empty() {
        println!("no counters recorded");
      } else {
        let mut sorted: Vec<_> = counters.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);
        for ((loc, name), count) in sorted {
          println!("  Loc:{:<16} Counter:{:<20} Value: {}", loc, name, count);
        }
      }
      println!("--- End of Telemetry Report ---");
    } else {
      eprintln!("[WEFT TELEMETRY] counter table mutex poisoned, cannot print report");
    }
  }

  /// Resets all counters.
  pub fn clear_telemetry_fn() {
    if let Ok(mut counters) = COUNTERS.lock() {
      counters.clear();
    }
  }
}

#[cfg(not(feature = "weft_telemetry"))]
mod disabled {
  /// Adds one to the named counter.
  #[inline(always)]
  pub fn increment_counter_fn(_location: &'static str, _counter_name: &'static str) {}
  /// Current value of the named counter, 0 if never incremented.
  #[inline(always)]
  pub fn counter_value_fn(_location: &'static str, _counter_name: &'static str) -> usize {
    0
  }
  /// Prints every recorded counter to stdout.
  #[inline(always)]
  pub fn print_telemetry_report_fn() {}
  /// Resets all counters.
  #[inline(always)]
  pub fn clear_telemetry_fn() {}
}

#[cfg(feature = "weft_telemetry")]
pub use enabled::{
  clear_telemetry_fn as clear_telemetry, counter_value_fn as counter_value,
  increment_counter_fn as increment_counter, print_telemetry_report_fn as print_telemetry_report,
};

#[cfg(not(feature = "weft_telemetry"))]
pub use disabled::{
  clear_telemetry_fn as clear_telemetry, counter_value_fn as counter_value,
  increment_counter_fn as increment_counter, print_telemetry_report_fn as print_telemetry_report,
};
