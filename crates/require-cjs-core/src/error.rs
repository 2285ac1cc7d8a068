// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the require-cjs transform

use thiserror::Error;

/// Result type for require-cjs operations
pub type Result<T> = std::result::Result<T, RequireCjsError>;

/// Errors that can occur while configuring or running the transform.
///
/// Classification never produces one of these: every inconclusive signal
/// collapses to "not CommonJS" inside the classifier.
#[derive(Debug, Error)]
pub enum RequireCjsError {
    /// Used outside its applicability envelope (wrong output format, bad
    /// filter pattern)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid regular expression in a filter
    #[error("Invalid filter pattern '{pattern}': {source}")]
    FilterRegex {
        /// Pattern text
        pattern: String,
        /// Underlying error
        #[source]
        source: regex::Error,
    },

    /// Invalid glob in a filter
    #[error("Invalid filter glob '{pattern}': {source}")]
    FilterGlob {
        /// Pattern text
        pattern: String,
        /// Underlying error
        #[source]
        source: glob::PatternError,
    },

    /// The host handed over source its parser would reject
    #[error("Failed to parse {id}: {source}")]
    Parse {
        /// Module id
        id: String,
        /// Underlying error
        #[source]
        source: require_cjs_lexer::ParseError,
    },

    /// Internal invariant violated while rewriting; aborts the file
    #[error("Cannot rewrite import of '{specifier}' in {id}: {reason}")]
    Rewrite {
        /// Module id
        id: String,
        /// Import specifier
        specifier: String,
        /// What went wrong
        reason: String,
    },

    /// Module not found
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),

    /// Module resolution error
    #[error("Error resolving module '{module}': {reason}")]
    ModuleResolution {
        /// Module specifier
        module: String,
        /// Reason for failure
        reason: String,
    },

    /// File system error
    #[error("File system error: {0}")]
    Fs(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl RequireCjsError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a module not found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        Self::ModuleNotFound(module.into())
    }

    /// Create a resolution error
    pub fn resolution(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModuleResolution {
            module: module.into(),
            reason: reason.into(),
        }
    }
}
