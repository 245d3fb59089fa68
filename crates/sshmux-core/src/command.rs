//! SSH invocation string construction.

use crate::server::{AuthMethod, ServerRecord, DEFAULT_SSH_PORT};

/// Seconds between client keep-alive probes. Idle tmux panes would
/// otherwise drop the remote connection silently.
const KEEPALIVE_INTERVAL_SECS: u32 = 60;

/// Missed probes tolerated before ssh gives up on the connection.
const KEEPALIVE_MAX_MISSED: u32 = 3;

/// Build the exact command injected into a tmux window for `server`.
///
/// `-t` forces a pseudo-terminal so interactive remote programs behave
/// correctly inside the pane. The port flag appears only for
/// non-default ports and the identity flag only for key auth, keeping
/// the generated command minimal. Deterministic, no I/O.
pub fn build_ssh_command(server: &ServerRecord) -> String {
    let mut cmd = String::from("ssh -t");
    if server.port != DEFAULT_SSH_PORT {
        cmd.push_str(&format!(" -p {}", server.port));
    }
    if server.auth == AuthMethod::Key {
        if let Some(key_path) = server.key_path.as_deref() {
            cmd.push_str(&format!(" -i {key_path}"));
        }
    }
    cmd.push_str(&format!(
        " -o ServerAliveInterval={KEEPALIVE_INTERVAL_SECS} -o ServerAliveCountMax={KEEPALIVE_MAX_MISSED}"
    ));
    cmd.push_str(&format!(" {}@{}", server.username, server.hostname));
    cmd
}
