//! Virtualization layer: handles, unwrapping helpers, controllers and the
//! recursive virtualizer.
//!
//! - [`Handle`] — identity-stable façade whose target can be swapped.
//! - [`unwrap`] / [`rebind`] plus kind predicates that look through handles.
//! - [`Controller`] — hooks notified as leaves come and go.
//! - [`Virtualizer`] — walks a graph, installs virtual slots, and runs the
//!   update protocol when one is reassigned.

pub mod controller;
pub mod handle;
pub mod unwrap;
pub mod virtualize;

pub use controller::{Controller, NoopController};
pub use handle::Handle;
pub use unwrap::{
    is_callable, is_empty_value, is_handle, is_null_value, is_plain_record, is_record,
    is_record_or_null, is_sequence, is_undefined_value, rebind, unwrap,
};
pub use virtualize::{virtualize, virtualize_property, Virtualizer};
