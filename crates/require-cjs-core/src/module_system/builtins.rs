// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Node.js built-in module names

/// Prefix reserved for built-in modules.
pub const NODE_PREFIX: &str = "node:";

/// Built-in modules importable with or without the `node:` prefix.
pub const BUILTIN_MODULES: &[&str] = &[
    "_http_agent",
    "_http_client",
    "_http_common",
    "_http_incoming",
    "_http_outgoing",
    "_http_server",
    "_stream_duplex",
    "_stream_passthrough",
    "_stream_readable",
    "_stream_transform",
    "_stream_wrap",
    "_stream_writable",
    "_tls_common",
    "_tls_wrap",
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Subpath built-ins (`fs/promises`, ...).
pub const BUILTIN_SUBPATHS: &[&str] = &[
    "assert/strict",
    "dns/promises",
    "fs/promises",
    "inspector/promises",
    "path/posix",
    "path/win32",
    "readline/promises",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "timers/promises",
    "util/types",
];

/// Check if a specifier names a built-in module.
///
/// Anything carrying the `node:` prefix counts, including prefix-only
/// modules such as `node:test` and `node:sqlite`.
pub fn is_builtin(specifier: &str) -> bool {
    if specifier.starts_with(NODE_PREFIX) {
        return true;
    }
    BUILTIN_MODULES.contains(&specifier) || BUILTIN_SUBPATHS.contains(&specifier)
}

/// The accessor expression that loads a built-in synchronously at module
/// initialization, given the specifier's source text (quotes included).
pub fn builtin_accessor(quoted_specifier: &str) -> String {
    format!("process.getBuiltinModule({quoted_specifier})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_builtin() {
        assert!(is_builtin("fs"));
        assert!(is_builtin("path"));
        assert!(is_builtin("node:fs"));
        assert!(is_builtin("fs/promises"));
        assert!(is_builtin("node:test"));
        assert!(is_builtin("node:sqlite"));
        assert!(!is_builtin("test"));
        assert!(!is_builtin("lodash"));
        assert!(!is_builtin("fs-extra"));
        assert!(!is_builtin("./fs"));
    }

    #[test]
    fn test_builtin_accessor() {
        assert_eq!(
            builtin_accessor("'node:fs'"),
            "process.getBuiltinModule('node:fs')"
        );
    }
}
