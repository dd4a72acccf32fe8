//! The fixed command vocabulary the bridge understands. Everything else is
//! forwarded opaquely as a raw command.

use serde::{Deserialize, Serialize};

use crate::position::BlockPos;

/// Prefix every recognized command line starts with.
pub const COMMAND_PREFIX: &str = "#";

/// Maximum accepted length for a single inbound command.
pub const MAX_COMMAND_LEN: usize = 120;

/// Classification of a command / plan step. Drives how completion of the
/// step is inferred, since the engine gives no synchronous done signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Goto,
    Path,
    Wait,
    Build,
    #[serde(rename = "sel")]
    Select,
    #[serde(rename = "cmd")]
    RawCmd,
    Macro,
}

impl StepKind {
    /// Parse a wire kind name. Unknown names fall back to `RawCmd`.
    pub fn parse(s: &str) -> StepKind {
        match s.to_lowercase().as_str() {
            "goto" => StepKind::Goto,
            "wait" => StepKind::Wait,
            "build" => StepKind::Build,
            "sel" => StepKind::Select,
            "path" => StepKind::Path,
            "macro" => StepKind::Macro,
            _ => StepKind::RawCmd,
        }
    }

    /// Infer the kind from command text (expects a lowercased, trimmed line).
    pub fn infer(low_cmd: &str) -> StepKind {
        if low_cmd.starts_with("#goto") {
            StepKind::Goto
        } else if low_cmd.starts_with("#wait") {
            StepKind::Wait
        } else if low_cmd.starts_with("#build") {
            StepKind::Build
        } else if low_cmd.starts_with("#sel") {
            StepKind::Select
        } else if low_cmd == "#path" {
            StepKind::Path
        } else {
            StepKind::RawCmd
        }
    }

    /// Whether this kind should make the agent move, and therefore whether
    /// acceptance is inferred from observed motion.
    pub fn expects_movement(self) -> bool {
        matches!(self, StepKind::Goto | StepKind::Path)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Goto => "goto",
            StepKind::Path => "path",
            StepKind::Wait => "wait",
            StepKind::Build => "build",
            StepKind::Select => "sel",
            StepKind::RawCmd => "cmd",
            StepKind::Macro => "macro",
        }
    }
}

/// Parse `#goto x y z` into a block target. Fractional coordinates are
/// rounded to the containing block. Returns `None` for anything that is not
/// a well-formed goto.
pub fn parse_goto_target(low_cmd: &str) -> Option<BlockPos> {
    if !low_cmd.starts_with("#goto") {
        return None;
    }
    let parts: Vec<&str> = low_cmd.split_whitespace().collect();
    if parts.len() < 4 {
        return None;
    }
    let x = parts[1].parse::<f64>().ok()?;
    let y = parts[2].parse::<f64>().ok()?;
    let z = parts[3].parse::<f64>().ok()?;
    Some(BlockPos::new(
        x.round() as i64,
        y.round() as i64,
        z.round() as i64,
    ))
}

/// Parse the duration argument of `#wait <ms>`. Missing or unparsable
/// arguments count as zero.
pub fn parse_wait_ms(cmd: &str) -> i64 {
    cmd.split_whitespace()
        .nth(1)
        .and_then(|p| p.parse::<i64>().ok())
        .unwrap_or(0)
}

/// Whether a (lowercased, trimmed) command tells the engine to stand down.
pub fn is_cancel(low_cmd: &str) -> bool {
    low_cmd == "#cancel" || low_cmd == "#stop"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_kinds() {
        assert_eq!(StepKind::infer("#goto 1 2 3"), StepKind::Goto);
        assert_eq!(StepKind::infer("#wait 500"), StepKind::Wait);
        assert_eq!(StepKind::infer("#build shelter"), StepKind::Build);
        assert_eq!(StepKind::infer("#sel cleararea"), StepKind::Select);
        assert_eq!(StepKind::infer("#path"), StepKind::Path);
        // "#pathfind" is not the bare re-path command
        assert_eq!(StepKind::infer("#pathfind"), StepKind::RawCmd);
        assert_eq!(StepKind::infer("#mine diamond_ore"), StepKind::RawCmd);
    }

    #[test]
    fn test_parse_unknown_kind_falls_back() {
        assert_eq!(StepKind::parse("GOTO"), StepKind::Goto);
        assert_eq!(StepKind::parse("nonsense"), StepKind::RawCmd);
    }

    #[test]
    fn test_goto_parsing_rounds() {
        let t = parse_goto_target("#goto 10.6 64.2 -3.5").unwrap();
        assert_eq!((t.x, t.y, t.z), (11, 64, -3));
    }

    #[test]
    fn test_goto_parsing_rejects_short_or_bad() {
        assert!(parse_goto_target("#goto 1 2").is_none());
        assert!(parse_goto_target("#goto a b c").is_none());
        assert!(parse_goto_target("#mine 1 2 3").is_none());
    }

    #[test]
    fn test_wait_parsing() {
        assert_eq!(parse_wait_ms("#wait 500"), 500);
        assert_eq!(parse_wait_ms("#wait"), 0);
        assert_eq!(parse_wait_ms("#wait soon"), 0);
    }
}
