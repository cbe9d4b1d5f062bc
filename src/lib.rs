//! # restyle
//!
//! Identity-stable virtualization of style configuration graphs.
//!
//! A style configuration is a graph of records, sequences and callables
//! (dynamic rules). restyle replaces each property of such a graph with a
//! *virtual slot*: reading the property always yields the same handle, and
//! assigning to it swaps or merges the target behind that handle. References
//! taken before an update therefore observe the update. A [`Controller`]
//! hears about every leaf that becomes live or goes away, so an external
//! rule engine can activate and deactivate rules incrementally.
//!
//! ## Core Systems
//!
//! - **[`value`]** — Dynamic value model: scalars, records, sequences, callables, paths
//! - **[`proxy`]** — Handles, unwrap/rebind helpers, controllers, the recursive virtualizer
//! - **[`registry`]** — Slotmap-backed controller tracking live leaves by path
//! - **[`config`]** — Merge policy and depth limit
//! - **[`error`]** — `VirtualError` and the operation it failed on
//! - **[`testing`]** — Recording controller and snapshot rendering
//!
//! ## Example
//!
//! ```ignore
//! use restyle::{virtualize, Record, Value};
//!
//! let theme = Record::from_entries([("color", "red")]);
//! let styles = Record::from_entries([("theme", Value::from(theme))]);
//! let root = virtualize(&Value::from(styles.clone()), true)?;
//!
//! let alias = styles.get("theme");
//! styles.set("theme", Value::from(Record::from_entries([("color", "blue")])))?;
//! assert_eq!(alias.get("color")?, Value::from("blue"));
//! ```

// Foundation
pub mod config;
pub mod error;
pub mod value;

// Virtualization
pub mod proxy;
pub mod registry;

// Test support
pub mod testing;

pub use config::{MergePolicy, VirtualizeConfig};
pub use error::{Operation, VirtualError};
pub use proxy::{
    rebind, unwrap, virtualize, virtualize_property, Controller, Handle, NoopController,
    Virtualizer,
};
pub use registry::SlotRegistry;
pub use value::{parse_path, Callable, Key, Kind, Path, Record, Sequence, Symbol, Value};
