//! Purpose: Library crate backing the `cast` CLI and its tests.
//! Exports: `core` (cast store, message containers, file format, errors).
//! Role: Owns every invariant of the cast file; the binary is thin glue around it.
//! Invariants: Core modules take explicit paths and never consult the working directory.
//! Invariants: The library emits `tracing` events but never installs a subscriber.
pub mod core;
