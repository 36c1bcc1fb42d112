//! Internal utilities, not part of the public API.

pub(crate) mod cache_padded;
