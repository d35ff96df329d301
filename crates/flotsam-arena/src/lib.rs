//! Generational slot containers for Flotsam tracers and sources.
//!
//! [`ContainerArray<T>`] is an index-addressable collection with stable
//! slot indices, amortised O(1) insertion and O(1) removal. Removed slots
//! go on a free list and are reused by later insertions; live elements are
//! never renumbered.
//!
//! # Architecture
//!
//! ```text
//! ContainerArray<T>
//! ├── Vec<Slot<T>>       (generation stamp + Option<T> per slot)
//! ├── free_list: Vec<u32> (LIFO; lowest index on top after growth)
//! └── ContainerConfig    (initial capacity, growth factor, hard limit)
//! ```
//!
//! Handles are [`SlotIndex`] values carrying the slot's generation at
//! insertion time. A handle whose slot has since been freed (and possibly
//! reused) fails lookup with [`ContainerError::StaleIndex`] instead of
//! silently aliasing the new occupant.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod container;
pub mod error;
pub mod footprint;
pub mod handle;

pub use config::ContainerConfig;
pub use container::{ContainerArray, ContainerLayout};
pub use error::ContainerError;
pub use footprint::ContainerFootprint;
pub use handle::SlotIndex;
