use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures surfaced to the reader through the session's error slot.
///
/// `Display` yields the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "book", rename_all = "snake_case")]
pub enum BibleError {
    #[error("Kapcsolódási hiba")]
    Network,
    #[error("Konvertálási hiba")]
    Parsing,
    #[error("Ez a fordítás nem tartalmazza: \"{0}\"")]
    Translating(String),
    #[error("Ismeretlen hiba")]
    Unknown,
}

impl BibleError {
    /// Stable identifier, suitable as a key for presenting one alert per error.
    pub fn id(&self) -> String {
        self.to_string()
    }

    pub fn is_translating(&self) -> bool {
        matches!(self, BibleError::Translating(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translating_message_names_the_book() {
        let err = BibleError::Translating("János".to_string());
        assert_eq!(err.to_string(), "Ez a fordítás nem tartalmazza: \"János\"");
        assert!(err.is_translating());
        assert!(!BibleError::Network.is_translating());
    }

    #[test]
    fn id_distinguishes_books_but_not_repeats() {
        let john = BibleError::Translating("János".to_string());
        assert_eq!(john.id(), BibleError::Translating("János".to_string()).id());
        assert_ne!(john.id(), BibleError::Translating("Tóbiás".to_string()).id());
        assert_ne!(BibleError::Network.id(), BibleError::Parsing.id());
    }

    #[test]
    fn error_round_trips_through_json() {
        let raw = serde_json::to_string(&BibleError::Translating("Tóbiás".into()))
            .expect("serialize");
        assert_eq!(raw, r#"{"kind":"translating","book":"Tóbiás"}"#);
    }
}
