//! Core library for charlimit.
//!
//! Text layers declare a character budget in their name (`"Title [CC:40]"`).
//! A run walks the selection, or the whole page, compares each tagged layer's
//! content length to its budget, and keeps one translucent red marker over
//! every layer that is too long. Runs are idempotent: markers are reused
//! while a layer stays over budget and removed once it fits again.
//!
//! The host document is reached only through the [`Host`] trait;
//! [`MemoryDocument`] implements it in memory.
//!
//! # Modules
//!
//! - [`limit`] - Limit tag parsing
//! - [`registry`] - Flag marker bookkeeping
//! - [`walk`] - Subtree traversal
//! - [`check`] - Per-layer check
//! - [`run`] - Run controller and host entry point
//! - [`status`] - End-of-run message
//! - [`config`] - Configuration loading
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```
//! use charlimit_core::{Bounds, Config, MemoryDocument, execute};
//!
//! let mut doc = MemoryDocument::new();
//! let page = doc.page();
//! doc.add_text(&page, "Title [CC:10]", "Hello World!", Bounds::new(0.0, 0.0, 120.0, 24.0));
//!
//! let report = execute(&mut doc, &Config::default()).expect("run should succeed");
//! assert_eq!(report.flagged(), 1);
//! ```
#![deny(unsafe_code)]

pub mod check;
pub mod config;
pub mod error;
pub mod host;
pub mod limit;
pub mod memory;
pub mod observability;
pub mod registry;
pub mod run;
pub mod status;
pub mod walk;

pub use check::{CheckOutcome, CheckTally, Checker};
pub use config::{Config, ConfigLoader, CountMode, LogLevel, UntaggedPolicy};
pub use error::{CheckError, CheckResult, ConfigError, ConfigResult, HostError, HostResult};
pub use host::{Bounds, DocumentTree, Host, NodeId, NodeKind, Paint, Rgb};
pub use limit::LimitPattern;
pub use memory::MemoryDocument;
pub use registry::{FlagRegistry, MarkerChange};
pub use run::{RunReport, Scope, execute, run};
pub use status::{Severity, StatusMessage, status_message};
