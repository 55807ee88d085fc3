//! Closed choice sets for item attributes.
//!
//! Codes are the persisted/wire representation; labels are for display.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use cardboard_core::DomainError;

/// Physical condition of an item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "M")]
    Mint,
    #[default]
    #[serde(rename = "NM")]
    NearMint,
    #[serde(rename = "LP")]
    LightlyPlayed,
    #[serde(rename = "MP")]
    ModeratelyPlayed,
    #[serde(rename = "HP")]
    HeavilyPlayed,
    #[serde(rename = "DMG")]
    Damaged,
}

impl Condition {
    pub const ALL: [Condition; 6] = [
        Condition::Mint,
        Condition::NearMint,
        Condition::LightlyPlayed,
        Condition::ModeratelyPlayed,
        Condition::HeavilyPlayed,
        Condition::Damaged,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Condition::Mint => "M",
            Condition::NearMint => "NM",
            Condition::LightlyPlayed => "LP",
            Condition::ModeratelyPlayed => "MP",
            Condition::HeavilyPlayed => "HP",
            Condition::Damaged => "DMG",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Condition::Mint => "Mint",
            Condition::NearMint => "Near Mint",
            Condition::LightlyPlayed => "Lightly Played",
            Condition::ModeratelyPlayed => "Moderately Played",
            Condition::HeavilyPlayed => "Heavily Played",
            Condition::Damaged => "Damaged",
        }
    }
}

impl core::fmt::Display for Condition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Condition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::ALL
            .into_iter()
            .find(|c| c.code() == s)
            .ok_or_else(|| DomainError::validation("condition", invalid_choice(s)))
    }
}

/// Printed language of an item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "EN")]
    English,
    #[serde(rename = "ZH")]
    ChineseTraditional,
    #[serde(rename = "ZH-S")]
    ChineseSimplified,
    #[serde(rename = "FR")]
    French,
    #[serde(rename = "DE")]
    German,
    #[serde(rename = "IT")]
    Italian,
    #[serde(rename = "JA")]
    Japanese,
    #[serde(rename = "KO")]
    Korean,
    #[serde(rename = "PT")]
    Portuguese,
    #[serde(rename = "RU")]
    Russian,
    #[serde(rename = "ES")]
    Spanish,
}

impl Language {
    pub const ALL: [Language; 11] = [
        Language::English,
        Language::ChineseTraditional,
        Language::ChineseSimplified,
        Language::French,
        Language::German,
        Language::Italian,
        Language::Japanese,
        Language::Korean,
        Language::Portuguese,
        Language::Russian,
        Language::Spanish,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "EN",
            Language::ChineseTraditional => "ZH",
            Language::ChineseSimplified => "ZH-S",
            Language::French => "FR",
            Language::German => "DE",
            Language::Italian => "IT",
            Language::Japanese => "JA",
            Language::Korean => "KO",
            Language::Portuguese => "PT",
            Language::Russian => "RU",
            Language::Spanish => "ES",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::ChineseTraditional => "Chinese Traditional",
            Language::ChineseSimplified => "Chinese Simplified",
            Language::French => "French",
            Language::German => "German",
            Language::Italian => "Italian",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::Portuguese => "Portuguese",
            Language::Russian => "Russian",
            Language::Spanish => "Spanish",
        }
    }
}

impl core::fmt::Display for Language {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|l| l.code() == s)
            .ok_or_else(|| DomainError::validation("language", invalid_choice(s)))
    }
}

pub(crate) fn invalid_choice(value: &str) -> String {
    format!("\"{value}\" is not a valid choice.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_near_mint_english() {
        assert_eq!(Condition::default(), Condition::NearMint);
        assert_eq!(Condition::default().label(), "Near Mint");
        assert_eq!(Language::default(), Language::English);
        assert_eq!(Language::default().label(), "English");
    }

    #[test]
    fn codes_parse_back() {
        for c in Condition::ALL {
            assert_eq!(c.code().parse::<Condition>().unwrap(), c);
        }
        for l in Language::ALL {
            assert_eq!(l.code().parse::<Language>().unwrap(), l);
        }
    }

    #[test]
    fn unknown_codes_are_validation_errors() {
        let err = "XX".parse::<Condition>().unwrap_err();
        match err {
            DomainError::Validation(fields) => assert!(fields.contains("condition")),
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!("Klingon".parse::<Language>().is_err());
    }

    #[test]
    fn serde_uses_codes() {
        let json = serde_json::to_string(&Language::ChineseSimplified).unwrap();
        assert_eq!(json, "\"ZH-S\"");
        let c: Condition = serde_json::from_str("\"DMG\"").unwrap();
        assert_eq!(c, Condition::Damaged);
    }
}
