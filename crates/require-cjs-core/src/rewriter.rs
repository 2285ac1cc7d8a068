// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Import declaration to `require()` rewriting
//!
//! ```text
//! import 'm'                    require('m');
//! import d from 'm'             const d = require('m');
//! import * as ns from 'm'       const _cjs_ns_mod = require('m');
//!                               const ns = { ..._cjs_ns_mod, default: _cjs_ns_mod };
//! import d, { a as b } from 'm' const d = require('m');const { a: b } = d;
//! import { a } from 'm'         const { a: a } = require('m');
//! ```
//!
//! The namespace object mirrors the bundler's own CommonJS interop: every
//! own enumerable key of `module.exports` plus `default`.

use crate::module_system::builtin_accessor;
use require_cjs_lexer::{ImportDeclaration, ImportSpecifier};
use std::fmt;
use thiserror::Error;

/// The binding shapes of one declaration could not be expressed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ShapeError(pub &'static str);

/// Expression that loads the imported module synchronously
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequireExpr {
    /// `require(<specifier>)`
    Require(String),
    /// `process.getBuiltinModule(<specifier>)`
    Builtin(String),
}

impl RequireExpr {
    /// Load through `require`; `quoted` is the specifier as written.
    pub fn require(quoted: impl Into<String>) -> Self {
        RequireExpr::Require(quoted.into())
    }

    /// Load a Node.js built-in; `quoted` is the specifier as written.
    pub fn builtin(quoted: impl Into<String>) -> Self {
        RequireExpr::Builtin(quoted.into())
    }
}

impl fmt::Display for RequireExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequireExpr::Require(quoted) => write!(f, "require({quoted})"),
            RequireExpr::Builtin(quoted) => f.write_str(&builtin_accessor(quoted)),
        }
    }
}

/// The bindings one declaration introduces, by kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingPlan {
    /// Identifier holding `module.exports`; synthesized for namespace imports
    pub default_id: Option<String>,
    /// Additional local names for the default (`import d, { default as e }`)
    pub default_aliases: Vec<String>,
    /// `import * as ns`
    pub namespace_id: Option<String>,
    /// `(imported, local)` in source order, as written
    pub named: Vec<(String, String)>,
}

impl BindingPlan {
    /// Bucket the runtime bindings of `decl`; type-only specifiers are
    /// dropped. Names are sliced from `source` exactly as written.
    pub fn from_declaration(decl: &ImportDeclaration, source: &str) -> Result<Self, ShapeError> {
        let mut plan = BindingPlan::default();

        for specifier in &decl.specifiers {
            match specifier {
                ImportSpecifier::Default { local } => {
                    plan.add_default(local.span.slice(source));
                }
                ImportSpecifier::Namespace { local } => {
                    if plan.namespace_id.is_some() {
                        return Err(ShapeError("more than one namespace binding"));
                    }
                    plan.namespace_id = Some(local.span.slice(source).to_string());
                }
                ImportSpecifier::Named { type_only: true, .. } => {}
                ImportSpecifier::Named {
                    imported, local, ..
                } => {
                    let local = local.span.slice(source);
                    if imported.name == "default" {
                        plan.add_default(local);
                    } else {
                        plan.named
                            .push((imported.span.slice(source).to_string(), local.to_string()));
                    }
                }
            }
        }

        if let Some(namespace) = &plan.namespace_id {
            if plan.default_id.is_none() {
                plan.default_id = Some(format!("_cjs_{namespace}_mod"));
            }
        }
        Ok(plan)
    }

    fn add_default(&mut self, local: &str) {
        if self.default_id.is_none() {
            self.default_id = Some(local.to_string());
        } else {
            self.default_aliases.push(local.to_string());
        }
    }

    /// Nothing would be bound
    pub fn is_empty(&self) -> bool {
        self.default_id.is_none() && self.namespace_id.is_none() && self.named.is_empty()
    }
}

/// `const <default> = <require>;` plus one line per extra alias
pub fn synthesize_default(plan: &BindingPlan, require: &RequireExpr) -> Option<String> {
    let default = plan.default_id.as_deref()?;
    let mut out = format!("const {default} = {require};");
    for alias in &plan.default_aliases {
        out.push_str(&format!("const {alias} = {default};"));
    }
    Some(out)
}

/// `const <ns> = { ...<default>, default: <default> };`
pub fn synthesize_namespace(plan: &BindingPlan) -> Option<String> {
    let namespace = plan.namespace_id.as_deref()?;
    let default = plan.default_id.as_deref()?;
    Some(format!(
        "const {namespace} = {{ ...{default}, default: {default} }};"
    ))
}

/// `const { a: b, ... } = <default or require>;`
pub fn synthesize_named(plan: &BindingPlan, require: &RequireExpr) -> Option<String> {
    if plan.named.is_empty() {
        return None;
    }
    let properties = plan
        .named
        .iter()
        .map(|(imported, local)| format!("{imported}: {local}"))
        .collect::<Vec<_>>()
        .join(", ");
    let target = match plan.default_id.as_deref() {
        Some(default) => default.to_string(),
        None => require.to_string(),
    };
    Some(format!("const {{ {properties} }} = {target};"))
}

/// Replacement text for `decl`.
///
/// Callers must only pass declarations with a runtime effect.
pub fn rewrite(
    decl: &ImportDeclaration,
    source: &str,
    require: &RequireExpr,
) -> Result<String, ShapeError> {
    if decl.type_only {
        return Err(ShapeError("type-only declarations have no runtime binding"));
    }
    if decl.is_side_effect_only() {
        return Ok(format!("{require};"));
    }

    let plan = BindingPlan::from_declaration(decl, source)?;
    if plan.is_empty() {
        return Err(ShapeError("declaration binds only types"));
    }

    Ok([
        synthesize_default(&plan, require),
        synthesize_namespace(&plan),
        synthesize_named(&plan, require),
    ]
    .into_iter()
    .flatten()
    .collect())
}
