// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # converter
//!
//! Drives a graph through its conversion pipeline:
//!
//! - ordered rewrite rules from `graph-rewrite`,
//! - shape inference from `shape-infer` after every structural change,
//! - a [`ConversionReport`] that collects every recoverable failure.
//!
//! # Type-State Pipeline
//! ```text
//! Converter<Idle> → Converter<Loaded> → ConversionOutput
//! ```
//!
//! # Error policy
//! Structural graph errors always end the run. Shape inference and rewrite
//! failures are recorded and the run continues, unless
//! [`ConverterConfig::abort_on_error`] is set, in which case the first one
//! becomes [`ConvertError::PassFailed`] (or a rewrite error).

mod config;
mod driver;
mod error;
mod report;

pub use config::ConverterConfig;
pub use driver::{convert, AbortHandle, ConversionOutput, Converter, ConverterState, Idle, Loaded};
pub use error::ConvertError;
pub use report::{ConversionReport, InferenceStats, PassFailure, Stage};
