//! Read-only view of live multiplexer state.
//!
//! The tmux server is external shared mutable state: sessions can be
//! created or killed by other clients at any time. Snapshots are
//! therefore fetched fresh per orchestrator invocation and never
//! cached here.

use crate::gateway::{GatewayError, Multiplexer};
use tracing::debug;

/// Per-session metadata from the detailed listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub name: String,
    pub windows: u32,
    pub attached: bool,
    /// Unix timestamp of last activity, when tmux reports one.
    pub last_activity: Option<i64>,
}

pub struct SessionInventory<'a, M: Multiplexer + ?Sized> {
    mux: &'a M,
}

impl<'a, M: Multiplexer + ?Sized> SessionInventory<'a, M> {
    pub fn new(mux: &'a M) -> Self {
        Self { mux }
    }

    /// Live normalized session names, in the order tmux reports them.
    pub fn snapshot(&self) -> Result<Vec<String>, GatewayError> {
        self.mux.list_sessions()
    }

    /// Live sessions with metadata. Lines tmux produces that do not
    /// match the expected format are skipped, not fatal.
    pub fn detailed(&self) -> Result<Vec<SessionInfo>, GatewayError> {
        let lines = self.mux.list_sessions_detailed()?;
        Ok(lines
            .iter()
            .filter_map(|line| {
                let parsed = parse_detail_line(line);
                if parsed.is_none() {
                    debug!(%line, "skipping malformed session line");
                }
                parsed
            })
            .collect())
    }
}

/// Parse one `name|windows|attached|activity` line.
fn parse_detail_line(line: &str) -> Option<SessionInfo> {
    let mut fields = line.split('|');
    let name = fields.next()?.trim();
    if name.is_empty() {
        return None;
    }
    let windows: u32 = fields.next()?.trim().parse().ok()?;
    // session_attached is the number of attached clients.
    let attached_clients: u32 = fields.next()?.trim().parse().ok()?;
    let last_activity = fields
        .next()
        .and_then(|raw| raw.trim().parse::<i64>().ok());
    Some(SessionInfo {
        name: name.to_string(),
        windows,
        attached: attached_clients > 0,
        last_activity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_detail_line() {
        assert_eq!(
            parse_detail_line("web|3|1|1724567890"),
            Some(SessionInfo {
                name: "web".to_string(),
                windows: 3,
                attached: true,
                last_activity: Some(1724567890),
            })
        );
    }

    #[test]
    fn zero_attached_clients_means_detached() {
        let info = parse_detail_line("db|1|0|1724567890").expect("parse");
        assert!(!info.attached);
    }

    #[test]
    fn missing_activity_field_is_tolerated() {
        let info = parse_detail_line("db|1|0").expect("parse");
        assert_eq!(info.last_activity, None);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert_eq!(parse_detail_line(""), None);
        assert_eq!(parse_detail_line("only-a-name"), None);
        assert_eq!(parse_detail_line("name|not-a-number|0|0"), None);
        assert_eq!(parse_detail_line("|2|0|0"), None);
    }
}
