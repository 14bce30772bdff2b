//! Unit-processor - rewrite numeric unit values (`12px`, `1.5rem`) in stylesheets.
//!
//! This library provides the core functionality for unit-processor, including:
//! - Include/exclude pattern lists for property and unit names
//! - A token scanner that leaves quoted strings, `url()` and `var()` alone
//! - Rewriting tokens through a processor with fixed-precision rounding
//! - File and selector exclusion, in-place or side-by-side rewriting
//! - Configuration file parsing and cascade discovery
//!
//! # Example
//!
//! ```
//! use unit_processor::engine::{Engine, Options};
//! use unit_processor::rules::{TransformResult, from_fn};
//! use unit_processor::stylesheet::Stylesheet;
//!
//! let options = Options::default().with_processor(from_fn(|value, unit, _node| {
//!     if unit == "px" {
//!         TransformResult::shaped(value / 16.0, "rem")
//!     } else {
//!         TransformResult::Unrecognized
//!     }
//! }));
//! let engine = Engine::new(options).unwrap();
//!
//! let mut sheet = Stylesheet::parse("a { margin: 8px 1em; }").unwrap();
//! engine.process(&mut sheet, None).unwrap();
//! assert_eq!(sheet.to_string(), "a { margin: 0.5rem 1em; }");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod rules;
pub mod stylesheet;

pub use engine::{Engine, Options, ProcessReport};
pub use error::{Result, UnitError};
