//! Domain types for StudyBuddy study sessions.
//!
//! Pure data and state rules only: no I/O, no async. Storage and the
//! remote API are layered on top by the `storage` and `services` crates.

#![forbid(unsafe_code)]

pub mod countdown;
pub mod error;
pub mod model;
pub mod time;

pub use countdown::{Countdown, TickOutcome, format_clock};
pub use error::Error;
pub use time::Clock;
