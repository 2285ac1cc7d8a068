// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! User options and their normalized form

use crate::error::{RequireCjsError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Files visited by default
pub const DEFAULT_INCLUDE: &[&str] = &[r"\.m?[jt]sx?$"];

/// Files skipped by default
pub const DEFAULT_EXCLUDE: &[&str] = &["node_modules", r"\.d\.[cm]?ts$"];

/// Where the transform runs relative to the host's other transforms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Before normal transforms
    #[default]
    Pre,
    /// No ordering hint
    Normal,
    /// After normal transforms
    Post,
}

/// An include/exclude pattern as written by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPattern {
    /// Regular expression searched anywhere in the module id
    Regex(String),
    /// Glob matched against the whole module id
    Glob(String),
}

impl FilterPattern {
    /// Interpret a pattern string: `/.../` is a regex, anything else a glob.
    pub fn parse(pattern: &str) -> Self {
        match pattern
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            Some(regex) if !regex.is_empty() => FilterPattern::Regex(regex.to_string()),
            _ => FilterPattern::Glob(pattern.to_string()),
        }
    }

    fn compile(&self) -> Result<CompiledPattern> {
        match self {
            FilterPattern::Regex(pattern) => Regex::new(pattern)
                .map(CompiledPattern::Regex)
                .map_err(|source| RequireCjsError::FilterRegex {
                    pattern: pattern.clone(),
                    source,
                }),
            FilterPattern::Glob(pattern) => glob::Pattern::new(pattern)
                .map(CompiledPattern::Glob)
                .map_err(|source| RequireCjsError::FilterGlob {
                    pattern: pattern.clone(),
                    source,
                }),
        }
    }
}

impl From<&str> for FilterPattern {
    fn from(pattern: &str) -> Self {
        FilterPattern::parse(pattern)
    }
}

#[derive(Debug, Clone)]
enum CompiledPattern {
    Regex(Regex),
    Glob(glob::Pattern),
}

impl CompiledPattern {
    fn matches(&self, id: &str) -> bool {
        match self {
            CompiledPattern::Regex(regex) => regex.is_match(id),
            CompiledPattern::Glob(glob) => glob.matches(id),
        }
    }
}

/// Compiled include/exclude filter over module ids
#[derive(Debug, Clone)]
pub struct IdFilter {
    include: Vec<CompiledPattern>,
    exclude: Vec<CompiledPattern>,
}

impl IdFilter {
    /// Compile both pattern lists.
    pub fn new(include: &[FilterPattern], exclude: &[FilterPattern]) -> Result<Self> {
        Ok(Self {
            include: include.iter().map(FilterPattern::compile).collect::<Result<_>>()?,
            exclude: exclude.iter().map(FilterPattern::compile).collect::<Result<_>>()?,
        })
    }

    /// Exclusion wins over inclusion; an empty include list admits everything.
    pub fn matches(&self, id: &str) -> bool {
        let id = id.replace('\\', "/");
        if self.exclude.iter().any(|p| p.matches(&id)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|p| p.matches(&id))
    }
}

/// Per-import override hook
///
/// `Some(verdict)` is final; `None` lets the classifier decide.
#[async_trait]
pub trait TransformPredicate: Send + Sync {
    /// Decide for `specifier` imported from `importer`.
    async fn should_transform(&self, specifier: &str, importer: &str) -> Option<bool>;
}

#[async_trait]
impl<F> TransformPredicate for F
where
    F: Fn(&str, &str) -> Option<bool> + Send + Sync,
{
    async fn should_transform(&self, specifier: &str, importer: &str) -> Option<bool> {
        self(specifier, importer)
    }
}

/// Explicit override of the classifier
#[derive(Clone)]
pub enum ShouldTransform {
    /// Exactly these specifiers are transformed; every other one is not.
    List(Vec<String>),
    /// Consult a predicate per import.
    Predicate(Arc<dyn TransformPredicate>),
}

impl ShouldTransform {
    /// Wrap a predicate.
    pub fn predicate(predicate: impl TransformPredicate + 'static) -> Self {
        ShouldTransform::Predicate(Arc::new(predicate))
    }

    /// The override verdict, if any.
    pub async fn decide(&self, specifier: &str, importer: &str) -> Option<bool> {
        match self {
            ShouldTransform::List(specifiers) => Some(specifiers.iter().any(|s| s == specifier)),
            ShouldTransform::Predicate(predicate) => {
                predicate.should_transform(specifier, importer).await
            }
        }
    }
}

impl fmt::Debug for ShouldTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShouldTransform::List(list) => f.debug_tuple("List").field(list).finish(),
            ShouldTransform::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// User options
#[derive(Debug, Clone)]
pub struct Options {
    /// Files to visit (defaults to [`DEFAULT_INCLUDE`])
    pub include: Option<Vec<FilterPattern>>,
    /// Files to skip (defaults to [`DEFAULT_EXCLUDE`])
    pub exclude: Option<Vec<FilterPattern>>,
    /// Ordering hint for the host
    pub order: Order,
    /// Override of the classifier
    pub should_transform: Option<ShouldTransform>,
    /// Load Node.js built-ins through `process.getBuiltinModule()`.
    ///
    /// Requires Node.js 20.16.0 / 22.3.0 or newer at runtime.
    pub builtin_node_modules: bool,
    /// Delete side-effect-only built-in imports (`import 'node:fs'`) instead
    /// of rewriting them. Only sound when loading a built-in has no
    /// observable effect on the target runtime.
    pub remove_builtin_side_effect_imports: bool,
    /// Remember verdicts for the duration of one build
    pub cache: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            include: None,
            exclude: None,
            order: Order::Pre,
            should_transform: None,
            builtin_node_modules: false,
            remove_builtin_side_effect_imports: false,
            cache: false,
        }
    }
}

impl Options {
    /// Normalize into the record shared by every transform call.
    pub fn resolve(self) -> Result<OptionsResolved> {
        let defaults = |patterns: &[&str]| {
            patterns
                .iter()
                .map(|p| FilterPattern::Regex(p.to_string()))
                .collect::<Vec<_>>()
        };
        let include = self.include.unwrap_or_else(|| defaults(DEFAULT_INCLUDE));
        let exclude = self.exclude.unwrap_or_else(|| defaults(DEFAULT_EXCLUDE));

        Ok(OptionsResolved {
            filter: IdFilter::new(&include, &exclude)?,
            order: self.order,
            should_transform: self.should_transform,
            builtin_node_modules: self.builtin_node_modules,
            remove_builtin_side_effect_imports: self.remove_builtin_side_effect_imports,
            cache: self.cache,
        })
    }
}

/// Normalized options; immutable once built
#[derive(Debug, Clone)]
pub struct OptionsResolved {
    /// Compiled include/exclude filter
    pub filter: IdFilter,
    /// Ordering hint for the host
    pub order: Order,
    /// Override of the classifier
    pub should_transform: Option<ShouldTransform>,
    /// Built-in fast path enabled
    pub builtin_node_modules: bool,
    /// Delete side-effect-only built-in imports
    pub remove_builtin_side_effect_imports: bool,
    /// Per-build verdict cache enabled
    pub cache: bool,
}
