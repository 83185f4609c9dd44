//! Jurnalis: turns a photograph, an instruction and an optional style
//! reference into a long-form news article.

#![allow(clippy::multiple_crate_versions)]
#![deny(clippy::all)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::complexity)]
#![deny(clippy::correctness)]
#![deny(clippy::disallowed_methods)]
#![deny(clippy::expect_used)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::panic)]
#![deny(clippy::perf)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::unreachable)]
#![deny(clippy::unwrap_used)]
#![deny(warnings)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod caption;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod generator;
pub mod history;
pub mod inference;
pub mod language;
pub mod metadata;
pub mod pipeline;
pub mod planner;
pub mod prompt;
pub mod reference;
pub mod upload;
pub mod web;
