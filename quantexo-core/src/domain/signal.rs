//! Signal kinds: the eight mutually exclusive candle classifications.
//!
//! Each kind carries the presentation metadata used by the dashboard and the
//! CSV export: a single-glyph marker, a display name, and a short reference
//! text (description + interpretation).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A classification label attached to a single candle by the detector.
///
/// "No signal" is modelled as `Option<SignalKind>::None` rather than a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    AggressiveBuying,
    AggressiveSelling,
    BuyerAbsorption,
    SellerAbsorption,
    BullishBreakout,
    BearishBreakdown,
    #[serde(rename = "bullish_poi")]
    BullishPoi,
    #[serde(rename = "bearish_poi")]
    BearishPoi,
}

impl SignalKind {
    /// All kinds, in detector priority order.
    pub const ALL: [SignalKind; 8] = [
        SignalKind::AggressiveBuying,
        SignalKind::AggressiveSelling,
        SignalKind::BuyerAbsorption,
        SignalKind::SellerAbsorption,
        SignalKind::BullishBreakout,
        SignalKind::BearishBreakdown,
        SignalKind::BullishPoi,
        SignalKind::BearishPoi,
    ];

    /// Dense index in `0..8`, matching the position in [`SignalKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            SignalKind::AggressiveBuying => 0,
            SignalKind::AggressiveSelling => 1,
            SignalKind::BuyerAbsorption => 2,
            SignalKind::SellerAbsorption => 3,
            SignalKind::BullishBreakout => 4,
            SignalKind::BearishBreakdown => 5,
            SignalKind::BullishPoi => 6,
            SignalKind::BearishPoi => 7,
        }
    }

    /// Chart marker used in exports and terminal output.
    pub fn glyph(self) -> &'static str {
        match self {
            SignalKind::AggressiveBuying => "🟢",
            SignalKind::AggressiveSelling => "🔴",
            SignalKind::BuyerAbsorption => "⛔",
            SignalKind::SellerAbsorption => "🚀",
            SignalKind::BullishBreakout => "💥",
            SignalKind::BearishBreakdown => "💣",
            SignalKind::BullishPoi => "🐂",
            SignalKind::BearishPoi => "🐻",
        }
    }

    /// snake_case identifier, stable across releases.
    pub fn key(self) -> &'static str {
        match self {
            SignalKind::AggressiveBuying => "aggressive_buying",
            SignalKind::AggressiveSelling => "aggressive_selling",
            SignalKind::BuyerAbsorption => "buyer_absorption",
            SignalKind::SellerAbsorption => "seller_absorption",
            SignalKind::BullishBreakout => "bullish_breakout",
            SignalKind::BearishBreakdown => "bearish_breakdown",
            SignalKind::BullishPoi => "bullish_poi",
            SignalKind::BearishPoi => "bearish_poi",
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            SignalKind::AggressiveBuying => "Aggressive Buying",
            SignalKind::AggressiveSelling => "Aggressive Selling",
            SignalKind::BuyerAbsorption => "Buyer Absorption",
            SignalKind::SellerAbsorption => "Seller Absorption",
            SignalKind::BullishBreakout => "Bullish Pivot Point Breakout",
            SignalKind::BearishBreakdown => "Bearish Pivot Point Breakdown",
            SignalKind::BullishPoi => "Bullish Point of Interest",
            SignalKind::BearishPoi => "Bearish Point of Interest",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SignalKind::AggressiveBuying => {
                "Strong bullish candle closing near high with high volume, indicating buyer dominance"
            }
            SignalKind::AggressiveSelling => {
                "Strong bearish candle closing near low with high volume, indicating seller dominance"
            }
            SignalKind::BuyerAbsorption => {
                "Bullish candle followed by price failing to drop below its open"
            }
            SignalKind::SellerAbsorption => {
                "Bearish candle followed by price failing to rise above its open"
            }
            SignalKind::BullishBreakout => "Price breaks above recent high with strong volume",
            SignalKind::BearishBreakdown => "Price breaks below recent low with strong volume",
            SignalKind::BullishPoi => {
                "Large bullish candle occupying >70% of range with high volume"
            }
            SignalKind::BearishPoi => {
                "Large bearish candle occupying >70% of range with high volume"
            }
        }
    }

    pub fn interpretation(self) -> &'static str {
        match self {
            SignalKind::AggressiveBuying => "Potential start of an uptrend or continuation pattern",
            SignalKind::AggressiveSelling => {
                "Potential start of a downtrend or continuation pattern"
            }
            SignalKind::BuyerAbsorption => {
                "Buyers absorbing all selling pressure - potential reversal signal"
            }
            SignalKind::SellerAbsorption => {
                "Sellers absorbing all buying pressure - potential reversal signal"
            }
            SignalKind::BullishBreakout => {
                "Potential start of new uptrend or breakout continuation"
            }
            SignalKind::BearishBreakdown => {
                "Potential start of new downtrend or breakdown continuation"
            }
            SignalKind::BullishPoi => "Strong buying interest at this price level",
            SignalKind::BearishPoi => "Strong selling interest at this price level",
        }
    }

    /// True for the four buy-side kinds.
    pub fn is_bullish(self) -> bool {
        matches!(
            self,
            SignalKind::AggressiveBuying
                | SignalKind::SellerAbsorption
                | SignalKind::BullishBreakout
                | SignalKind::BullishPoi
        )
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a string does not name any signal kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown signal tag: '{0}'")]
pub struct UnknownSignal(pub String);

impl FromStr for SignalKind {
    type Err = UnknownSignal;

    /// Accepts the glyph, the snake_case key, or the CamelCase variant name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        SignalKind::ALL
            .into_iter()
            .find(|kind| {
                kind.glyph() == trimmed
                    || kind.key() == trimmed
                    || kind.key().replace('_', "") == trimmed.to_ascii_lowercase()
            })
            .ok_or_else(|| UnknownSignal(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_priority_order() {
        for (i, kind) in SignalKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn parses_glyph_key_and_camel_case() {
        assert_eq!("🟢".parse::<SignalKind>().unwrap(), SignalKind::AggressiveBuying);
        assert_eq!(
            "seller_absorption".parse::<SignalKind>().unwrap(),
            SignalKind::SellerAbsorption
        );
        assert_eq!("BullishPOI".parse::<SignalKind>().unwrap(), SignalKind::BullishPoi);
        assert_eq!(" 💣 ".parse::<SignalKind>().unwrap(), SignalKind::BearishBreakdown);
    }

    #[test]
    fn rejects_unknown_tag() {
        let err = "🦄".parse::<SignalKind>().unwrap_err();
        assert_eq!(err, UnknownSignal("🦄".into()));
    }

    #[test]
    fn glyphs_are_unique() {
        let mut glyphs: Vec<&str> = SignalKind::ALL.iter().map(|k| k.glyph()).collect();
        glyphs.sort();
        glyphs.dedup();
        assert_eq!(glyphs.len(), 8);
    }

    #[test]
    fn serde_uses_snake_case_keys() {
        let json = serde_json::to_string(&SignalKind::BearishPoi).unwrap();
        assert_eq!(json, "\"bearish_poi\"");
        let back: SignalKind = serde_json::from_str("\"buyer_absorption\"").unwrap();
        assert_eq!(back, SignalKind::BuyerAbsorption);
    }

    #[test]
    fn bullish_split_is_even() {
        let bullish = SignalKind::ALL.iter().filter(|k| k.is_bullish()).count();
        assert_eq!(bullish, 4);
    }
}
