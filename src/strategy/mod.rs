//! Processing strategies
//!
//! - Streaming: path-matched dispatch over chunked input with bounded memory
//! - Parallel: rayon batch lookups over one parsed tree

pub mod parallel;
pub mod streaming;

pub use streaming::{stream, PathStack, PathStreamer, StreamingDispatcher};
