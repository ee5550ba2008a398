//! Session settings exchanged once per connection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::Direction;

/// Which side of the TCP connection this instance plays.
///
/// The Host listens and dictates the geometry; the Peer connects and adopts
/// the mirror image of the Host's direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Host,
    Peer,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Host => "host",
            Mode::Peer => "peer",
        })
    }
}

/// Error returned when parsing a [`Mode`] from text fails.
#[derive(Debug, Error, PartialEq)]
#[error("unknown mode {0:?}; expected host or peer")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "host" | "server" => Ok(Mode::Host),
            "peer" | "client" => Ok(Mode::Peer),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Mode plus the edge that borders the other machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub mode: Mode,
    pub direction: Direction,
}

impl Settings {
    pub fn new(mode: Mode, direction: Direction) -> Self {
        Self { mode, direction }
    }

    /// Returns the settings a Peer adopts after receiving `host` settings.
    ///
    /// The local mode is kept; the direction becomes the mirror of the
    /// Host's, so that both sides agree on where the shared edge is.
    pub fn adopt_from(self, host: Settings) -> Settings {
        Settings {
            mode: self.mode,
            direction: host.direction.mirrored(),
        }
    }

    /// `true` when both directions face each other.
    pub fn is_complementary_to(&self, other: &Settings) -> bool {
        self.direction.mirrored() == other.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adopt_from_mirrors_host_direction_and_keeps_local_mode() {
        // Arrange
        let host = Settings::new(Mode::Host, Direction::Right);
        let local = Settings::new(Mode::Peer, Direction::Top);

        // Act
        let adopted = local.adopt_from(host);

        // Assert
        assert_eq!(adopted, Settings::new(Mode::Peer, Direction::Left));
        assert!(adopted.is_complementary_to(&host));
    }

    #[test]
    fn test_mode_parses_aliases() {
        assert_eq!("HOST".parse::<Mode>(), Ok(Mode::Host));
        assert_eq!("server".parse::<Mode>(), Ok(Mode::Host));
        assert_eq!("client".parse::<Mode>(), Ok(Mode::Peer));
        assert!("observer".parse::<Mode>().is_err());
    }

    #[test]
    fn test_settings_serialize_as_lowercase_toml() {
        // Arrange
        let settings = Settings::new(Mode::Host, Direction::Bottom);

        // Act
        let text = toml::to_string(&settings).expect("serialize");
        let restored: Settings = toml::from_str(&text).expect("deserialize");

        // Assert
        assert!(text.contains("mode = \"host\""));
        assert!(text.contains("direction = \"bottom\""));
        assert_eq!(restored, settings);
    }
}
