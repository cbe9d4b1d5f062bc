//! Test helpers: a recording controller and snapshot rendering.
//!
//! Use the [`Recorder`] to capture the exact sequence of controller
//! notifications a mutation produces. Use [`describe`] to render a value
//! graph as a single line for snapshot-style assertions.

pub mod recorder;
pub mod snapshot;

pub use recorder::{Event, Recorder};
pub use snapshot::describe;
