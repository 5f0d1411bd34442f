//! Candidate records: one eligible player or goalie with a position, score and cap hit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Playing position as listed in the source tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "C", alias = "Center")]
    Center,
    #[serde(rename = "L", alias = "LW", alias = "Left Wing")]
    LeftWing,
    #[serde(rename = "R", alias = "RW", alias = "Right Wing")]
    RightWing,
    #[serde(rename = "D", alias = "Defenseman")]
    Defenseman,
    #[serde(rename = "G", alias = "Goalie")]
    Goalie,
}

/// Quota bucket a position counts against. Centers and wingers share one forward quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PositionCategory {
    Forward,
    Defenseman,
    Goalie,
}

impl PositionCategory {
    pub const ALL: [PositionCategory; 3] = [Self::Forward, Self::Defenseman, Self::Goalie];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Defenseman => "defenseman",
            Self::Goalie => "goalie",
        }
    }
}

impl fmt::Display for PositionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Position {
    pub fn category(&self) -> PositionCategory {
        match self {
            Self::Center | Self::LeftWing | Self::RightWing => PositionCategory::Forward,
            Self::Defenseman => PositionCategory::Defenseman,
            Self::Goalie => PositionCategory::Goalie,
        }
    }

    /// Single-letter code used in the CSV tables.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Center => "C",
            Self::LeftWing => "L",
            Self::RightWing => "R",
            Self::Defenseman => "D",
            Self::Goalie => "G",
        }
    }

    /// Parse a raw position cell. Multi-position listings such as `"C, R"` resolve to the
    /// second listed position; a single entry is taken as is.
    pub fn parse_listing(raw: &str) -> Option<Self> {
        let mut entries = raw.split(',');
        let first = entries.next().unwrap_or("");
        entries.next().unwrap_or(first).trim().parse().ok()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPosition(pub String);

impl fmt::Display for UnknownPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown position '{}'", self.0)
    }
}

impl std::error::Error for UnknownPosition {}

impl FromStr for Position {
    type Err = UnknownPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "c" | "center" | "centre" => Ok(Self::Center),
            "l" | "lw" | "left wing" | "left winger" => Ok(Self::LeftWing),
            "r" | "rw" | "right wing" | "right winger" => Ok(Self::RightWing),
            "d" | "defense" | "defence" | "defenseman" | "defenceman" => Ok(Self::Defenseman),
            "g" | "goalie" | "goaltender" => Ok(Self::Goalie),
            _ => Err(UnknownPosition(s.trim().to_string())),
        }
    }
}

/// One eligible player. `score` is an opaque, externally computed metric (higher is better);
/// `cap_hit` is the salary charged against the cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub position: Position,
    pub score: f64,
    pub cap_hit: f64,
}

impl Candidate {
    pub fn new(id: impl Into<String>, position: Position, score: f64, cap_hit: f64) -> Self {
        Self {
            id: id.into(),
            position,
            score,
            cap_hit,
        }
    }

    pub fn category(&self) -> PositionCategory {
        self.position.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wingers_and_centers_share_the_forward_category() {
        assert_eq!(Position::Center.category(), PositionCategory::Forward);
        assert_eq!(Position::LeftWing.category(), PositionCategory::Forward);
        assert_eq!(Position::RightWing.category(), PositionCategory::Forward);
        assert_eq!(Position::Defenseman.category(), PositionCategory::Defenseman);
        assert_eq!(Position::Goalie.category(), PositionCategory::Goalie);
    }

    #[test]
    fn parses_codes_and_long_names() {
        assert_eq!("c".parse::<Position>(), Ok(Position::Center));
        assert_eq!(" LW ".parse::<Position>(), Ok(Position::LeftWing));
        assert_eq!("Right-Wing".parse::<Position>(), Ok(Position::RightWing));
        assert_eq!("Defenceman".parse::<Position>(), Ok(Position::Defenseman));
        assert_eq!("G".parse::<Position>(), Ok(Position::Goalie));
        assert!("X".parse::<Position>().is_err());
    }

    #[test]
    fn multi_listing_uses_second_position() {
        assert_eq!(Position::parse_listing("C, R"), Some(Position::RightWing));
        assert_eq!(Position::parse_listing("C, L, R"), Some(Position::LeftWing));
        assert_eq!(Position::parse_listing("D"), Some(Position::Defenseman));
        assert_eq!(Position::parse_listing(" G "), Some(Position::Goalie));
        assert_eq!(Position::parse_listing("C,"), None);
    }

    #[test]
    fn position_serializes_as_code() {
        let payload = serde_json::to_string(&Position::Defenseman).unwrap();
        assert_eq!(payload, "\"D\"");
        let parsed: Position = serde_json::from_str("\"Goalie\"").unwrap();
        assert_eq!(parsed, Position::Goalie);
    }
}
