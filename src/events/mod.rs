//! # Events Module
//!
//! Progress reporting over channels.
//!
//! The scanner emits events while it works; any caller can subscribe and
//! render them. Events are optional: pass `null_sender()` to ignore them.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Fingerprint(FingerprintEvent::BatchCompleted(p)) = event {
//!             println!("{}/{} assets", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! scanner.scan_with_events(8, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
