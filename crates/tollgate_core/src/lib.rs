//! Core request types for the Tollgate request pipeline.
//!
//! This crate provides the data types shared by every Tollgate component:
//! the [`Operation`] a transport executes, the [`RequestDescriptor`] the
//! pipeline runs, and tracing subscriber setup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod descriptor;
mod operation;
mod telemetry;

pub use descriptor::{CacheKind, RequestDescriptor};
pub use operation::{Operation, OperationKind};
pub use telemetry::{LogFormat, init_console_telemetry, init_telemetry};
