//! Screens of the experience, tracked so a returning viewer resumes in place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level screen the viewer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    /// Greeting with the start button.
    #[default]
    Landing,
    /// The map with the pins.
    Map,
    /// The proposal screen.
    Final,
}

impl Screen {
    pub fn name(self) -> &'static str {
        match self {
            Screen::Landing => "landing",
            Screen::Map => "map",
            Screen::Final => "final",
        }
    }

    /// Parse a persisted screen name, falling back to the landing screen.
    pub fn parse_or_default(name: Option<&str>) -> Self {
        name.and_then(|n| n.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Screen {
    type Err = UnknownScreen;

    /// Accepts both `map` and the DOM id form `map-screen`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        match name.strip_suffix("-screen").unwrap_or(&name) {
            "landing" => Ok(Screen::Landing),
            "map" => Ok(Screen::Map),
            "final" => Ok(Screen::Final),
            _ => Err(UnknownScreen(s.to_string())),
        }
    }
}

/// A screen name that matches none of [`Screen`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown screen: {0}")]
pub struct UnknownScreen(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("landing".parse::<Screen>().unwrap(), Screen::Landing);
        assert_eq!("Map".parse::<Screen>().unwrap(), Screen::Map);
        assert_eq!("final-screen".parse::<Screen>().unwrap(), Screen::Final);
        assert!("credits".parse::<Screen>().is_err());
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(Screen::parse_or_default(Some("map")), Screen::Map);
        assert_eq!(Screen::parse_or_default(Some("bogus")), Screen::Landing);
        assert_eq!(Screen::parse_or_default(None), Screen::Landing);
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for screen in [Screen::Landing, Screen::Map, Screen::Final] {
            assert_eq!(screen.to_string().parse::<Screen>().unwrap(), screen);
        }
    }
}
