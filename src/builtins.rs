//! Node core modules, always external to the preload bundle.

/// Core module names for the latest stable node release.
pub const NODE_LATEST_STABLE: &[&str] = &[
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
    "assert/strict",
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
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Core module ids, both bare and with the `node:` scheme.
pub fn node_builtins() -> Vec<String> {
    NODE_LATEST_STABLE
        .iter()
        .map(|id| id.to_string())
        .chain(NODE_LATEST_STABLE.iter().map(|id| format!("node:{}", id)))
        .collect()
}

/// Determine if a module id names a core module.
pub fn is_builtin(id: &str) -> bool {
    let id = id.strip_prefix("node:").unwrap_or(id);
    NODE_LATEST_STABLE.contains(&id)
}
