use crate::errors::ProfileError;
use std::fmt;
use std::str::FromStr;

/// A player-facing identifier, `gameName#tagLine`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiotId {
    pub game_name: String,
    pub tag_line: String,
}

impl RiotId {
    pub fn new(game_name: &str, tag_line: &str) -> Result<Self, ProfileError> {
        let game_name = game_name.trim();
        let tag_line = tag_line.trim();
        if game_name.is_empty() || tag_line.is_empty() {
            return Err(ProfileError::EmptyRiotIdPart);
        }
        Ok(RiotId {
            game_name: game_name.to_string(),
            tag_line: tag_line.to_string(),
        })
    }
}

impl FromStr for RiotId {
    type Err = ProfileError;

    /// Splits on the first `#`. Later `#` characters belong to the tag line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (game_name, tag_line) = s.split_once('#').ok_or(ProfileError::MalformedRiotId)?;
        RiotId::new(game_name, tag_line)
    }
}

impl fmt::Display for RiotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.game_name, self.tag_line)
    }
}
