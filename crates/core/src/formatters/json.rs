use crate::Result;
use crate::formatters::card::Card;
use serde::Serialize;

/// JSON output for a formatted card, with the counts a poster checks
/// against the silo's limits.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    #[serde(flatten)]
    pub card: &'a Card,
    /// Length of the text in characters.
    pub length: usize,
    /// Length of the text in UTF-8 bytes, the unit link spans are given in.
    pub byte_length: usize,
}

impl<'a> From<&'a Card> for JsonOutput<'a> {
    fn from(card: &'a Card) -> Self {
        Self { card, length: card.text.chars().count(), byte_length: card.text.len() }
    }
}

/// Convert a card to JSON
pub fn card_to_json(card: &Card, pretty: bool) -> Result<String> {
    let output = JsonOutput::from(card);
    if pretty { Ok(serde_json::to_string_pretty(&output)?) } else { Ok(serde_json::to_string(&output)?) }
}
