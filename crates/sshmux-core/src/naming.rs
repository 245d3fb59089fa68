//! Session name normalization and collision resolution.
//!
//! tmux rewrites `.` and `:` in session names to `_` (both are target
//! separators in its addressing syntax). Normalization must mirror that
//! rewriting exactly, otherwise a session created as `host.example` is
//! reported back as `host_example` and reattachment detection misses it.

/// Rewrite a requested session name into the form tmux will store.
/// Total and idempotent.
pub fn normalize_session_name(requested: &str) -> String {
    requested
        .chars()
        .map(|c| match c {
            '.' | ':' => '_',
            c => c,
        })
        .collect()
}

/// Return a session name guaranteed not to be in `live`.
///
/// The normalized base is returned unchanged when unused; otherwise
/// suffixes `-1`, `-2`, ... are probed in increasing order and the
/// lowest unused one wins, even when higher suffixes are free from
/// prior deletions. Cannot fail.
pub fn resolve_unique_name(requested: &str, live: &[String]) -> String {
    let base = normalize_session_name(requested);
    if !live.iter().any(|name| name == &base) {
        return base;
    }
    let mut suffix = 1u64;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !live.iter().any(|name| name == &candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
