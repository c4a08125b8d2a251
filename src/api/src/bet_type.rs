//! Bet types as printed in payout tables.

use std::fmt;

/// Bet type (券種).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BetType {
    Win,             // 単勝 - 1st
    Place,           // 複勝 - top 2 or 3, several payouts
    BracketQuinella, // 枠連 - bracket pair any order
    Quinella,        // 馬連 - 1st and 2nd any order
    Wide,            // ワイド - 2 horses in top 3, several payouts
    BracketExacta,   // 枠単 - bracket pair in order
    Exacta,          // 馬単 - 1st and 2nd in order
    Trio,            // 3連複 - 1st, 2nd, 3rd any order
    Trifecta,        // 3連単 - 1st, 2nd, 3rd in order
}

impl BetType {
    /// Parse a payout table label (Japanese) or an English name.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "単勝" => Some(BetType::Win),
            "複勝" => Some(BetType::Place),
            "枠連" => Some(BetType::BracketQuinella),
            "馬連" => Some(BetType::Quinella),
            "ワイド" => Some(BetType::Wide),
            "枠単" => Some(BetType::BracketExacta),
            "馬単" => Some(BetType::Exacta),
            "3連複" | "３連複" | "三連複" => Some(BetType::Trio),
            "3連単" | "３連単" | "三連単" => Some(BetType::Trifecta),
            other => match other.to_lowercase().as_str() {
                "win" | "tansho" => Some(BetType::Win),
                "place" | "fukusho" => Some(BetType::Place),
                "bracket_quinella" | "wakuren" => Some(BetType::BracketQuinella),
                "quinella" | "umaren" => Some(BetType::Quinella),
                "wide" => Some(BetType::Wide),
                "bracket_exacta" | "wakutan" => Some(BetType::BracketExacta),
                "exacta" | "umatan" => Some(BetType::Exacta),
                "trio" | "sanrenpuku" => Some(BetType::Trio),
                "trifecta" | "sanrentan" => Some(BetType::Trifecta),
                _ => None,
            },
        }
    }

    /// Label used in payout tables and hit reports
    pub fn label(&self) -> &'static str {
        match self {
            BetType::Win => "単勝",
            BetType::Place => "複勝",
            BetType::BracketQuinella => "枠連",
            BetType::Quinella => "馬連",
            BetType::Wide => "ワイド",
            BetType::BracketExacta => "枠単",
            BetType::Exacta => "馬単",
            BetType::Trio => "3連複",
            BetType::Trifecta => "3連単",
        }
    }

    #[allow(dead_code)]
    pub fn name(&self) -> &'static str {
        match self {
            BetType::Win => "win",
            BetType::Place => "place",
            BetType::BracketQuinella => "bracket_quinella",
            BetType::Quinella => "quinella",
            BetType::Wide => "wide",
            BetType::BracketExacta => "bracket_exacta",
            BetType::Exacta => "exacta",
            BetType::Trio => "trio",
            BetType::Trifecta => "trifecta",
        }
    }

    /// Number of horses (or brackets) in one winning combination
    pub fn arity(&self) -> usize {
        match self {
            BetType::Win | BetType::Place => 1,
            BetType::BracketQuinella
            | BetType::Quinella
            | BetType::Wide
            | BetType::BracketExacta
            | BetType::Exacta => 2,
            BetType::Trio | BetType::Trifecta => 3,
        }
    }

    /// Whether finishing order matters
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            BetType::BracketExacta | BetType::Exacta | BetType::Trifecta
        )
    }

    /// Separator between horses of one combination in reports
    pub fn joiner(&self) -> &'static str {
        if self.is_ordered() {
            "→"
        } else {
            "-"
        }
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [BetType; 9] = [
        BetType::Win,
        BetType::Place,
        BetType::BracketQuinella,
        BetType::Quinella,
        BetType::Wide,
        BetType::BracketExacta,
        BetType::Exacta,
        BetType::Trio,
        BetType::Trifecta,
    ];

    #[test]
    fn test_from_label_japanese() {
        assert_eq!(BetType::from_label("単勝"), Some(BetType::Win));
        assert_eq!(BetType::from_label(" ワイド "), Some(BetType::Wide));
        assert_eq!(BetType::from_label("三連単"), Some(BetType::Trifecta));
        assert_eq!(BetType::from_label("３連複"), Some(BetType::Trio));
        assert_eq!(BetType::from_label("枠単"), Some(BetType::BracketExacta));
    }

    #[test]
    fn test_from_label_english() {
        assert_eq!(BetType::from_label("Exacta"), Some(BetType::Exacta));
        assert_eq!(BetType::from_label("umaren"), Some(BetType::Quinella));
        assert_eq!(BetType::from_label("WIN"), Some(BetType::Win));
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(BetType::from_label("重勝式"), None);
        assert_eq!(BetType::from_label(""), None);
    }

    #[test]
    fn test_label_roundtrip() {
        for bet_type in ALL {
            assert_eq!(BetType::from_label(bet_type.label()), Some(bet_type));
            assert_eq!(BetType::from_label(bet_type.name()), Some(bet_type));
        }
    }

    #[test]
    fn test_arity_and_order() {
        assert_eq!(BetType::Place.arity(), 1);
        assert_eq!(BetType::Wide.arity(), 2);
        assert_eq!(BetType::Trio.arity(), 3);
        assert_eq!(BetType::Exacta.joiner(), "→");
        assert_eq!(BetType::Quinella.joiner(), "-");
        assert!(BetType::Trifecta.is_ordered());
        assert!(!BetType::Trio.is_ordered());
    }
}
