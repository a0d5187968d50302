// # Log Sink Implementations
//
// This module provides implementations of the LogSink trait.

pub mod memory;

pub use memory::MemoryLogSink;
