//! Tool handlers, grouped by backend.
//!
//! Each module exposes its descriptors via `definitions()` and one async
//! function per tool taking the backend trait object plus typed arguments.

pub mod logs;
pub mod mongo;
pub mod mysql;
