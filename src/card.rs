/// Card references accepted on the command line
///
/// The server accepts either a bare card id or a full BusinessMap card URL.
/// The probe sends the operator's text unchanged; parsing here only feeds
/// the transcript and warns early about locators the server will reject.

use std::fmt;
use std::sync::OnceLock;

use regex_lite::Regex;
use thiserror::Error;

/// Errors for unusable card references
#[derive(Error, Debug, PartialEq)]
pub enum CardRefError {
    #[error("card ID or URL cannot be empty")]
    Empty,
}

/// What the operator passed as the target card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardRef {
    /// A bare card id such as `12345`
    Id(String),
    /// A board URL ending in `/cards/<id>[/...]`
    Url { url: String, card_id: String },
    /// Looks like a locator but doesn't match the board URL layout
    Unrecognized(String),
}

fn card_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Covers both the ctrl_board and the older crl_board paths
        Regex::new(r"/c(?:tr|r)l_board/\d+/cards/(\d+)(?:/.*)?").expect("card URL pattern is valid")
    })
}

impl CardRef {
    /// Classify a card argument
    ///
    /// Surrounding whitespace is ignored for classification only; every
    /// variant keeps `input` exactly as given.
    pub fn parse(input: &str) -> Result<Self, CardRefError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CardRefError::Empty);
        }

        if !trimmed.contains("http") && !trimmed.contains('/') {
            return Ok(CardRef::Id(input.to_string()));
        }

        Ok(match card_url_pattern().captures(trimmed).and_then(|c| c.get(1)) {
            Some(id) => CardRef::Url {
                url: input.to_string(),
                card_id: id.as_str().to_string(),
            },
            None => CardRef::Unrecognized(input.to_string()),
        })
    }

    /// The text sent to the server as `card_id`
    pub fn as_argument(&self) -> &str {
        match self {
            CardRef::Id(id) => id,
            CardRef::Url { url, .. } => url,
            CardRef::Unrecognized(raw) => raw,
        }
    }

    /// The numeric card id, when it can be determined locally
    pub fn card_id(&self) -> Option<&str> {
        match self {
            CardRef::Id(id) => Some(id.trim()),
            CardRef::Url { card_id, .. } => Some(card_id),
            CardRef::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for CardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardRef::Id(id) => write!(f, "{}", id),
            CardRef::Url { url, card_id } => write!(f, "{} (card {})", url, card_id),
            CardRef::Unrecognized(raw) => write!(f, "{} (unrecognized locator)", raw),
        }
    }
}
