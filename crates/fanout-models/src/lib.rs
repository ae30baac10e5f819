//! Core data types for fanout.
//!
//! A [`Target`] is one identifier (usually a hostname) that the external
//! command is run against. A [`TargetList`] is the ordered, deduplicated
//! sequence of targets handed to the execution engine.
//!
//! # Example
//!
//! ```
//! use fanout_models::TargetList;
//!
//! let targets = TargetList::from_lines(["a.com", "A.com ", "b.com", ""]);
//! assert_eq!(targets.len(), 2);
//! assert_eq!(targets.get(0).unwrap().as_str(), "a.com");
//! ```

pub mod error;
pub mod target;

pub use error::{Result, TargetError};
pub use target::{Target, TargetList};
