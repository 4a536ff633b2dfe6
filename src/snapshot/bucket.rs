use std::fmt;

/// Categorical bedroom grouping for listings.
///
/// Snapshots are keyed by the canonical display form ("Studio", "1 B/R",
/// "2 B/R", ...), which is what report consumers see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BedroomBucket {
    Studio,
    Bedrooms(u8),
}

/// Anything above this is upstream garbage, not a penthouse.
const MAX_BEDROOMS: u8 = 20;

impl BedroomBucket {
    /// Parse the raw bedroom field of a scraped listing.
    ///
    /// Accepts the canonical forms ("Studio", "3 B/R"), bare integers ("0",
    /// "3") and a few upstream spellings ("studio", "3 br", "3 bedrooms").
    /// Returns `None` for anything else; the caller skips and logs the record.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        if s.eq_ignore_ascii_case("studio") {
            return Some(BedroomBucket::Studio);
        }

        // Strip a trailing unit word, if any
        let num = s
            .split_whitespace()
            .next()
            .unwrap_or(s);
        let rest = s[num.len()..].trim().to_ascii_lowercase();
        if !(rest.is_empty() || rest == "b/r" || rest == "br" || rest == "bedroom" || rest == "bedrooms") {
            return None;
        }

        let n: u8 = num.parse().ok()?;
        if n > MAX_BEDROOMS {
            return None;
        }
        if n == 0 {
            Some(BedroomBucket::Studio)
        } else {
            Some(BedroomBucket::Bedrooms(n))
        }
    }
}

impl fmt::Display for BedroomBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BedroomBucket::Studio => write!(f, "Studio"),
            BedroomBucket::Bedrooms(n) => write!(f, "{} B/R", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_studio_forms() {
        assert_eq!(BedroomBucket::parse("Studio"), Some(BedroomBucket::Studio));
        assert_eq!(BedroomBucket::parse("studio"), Some(BedroomBucket::Studio));
        assert_eq!(BedroomBucket::parse("0"), Some(BedroomBucket::Studio));
    }

    #[test]
    fn parses_numeric_forms() {
        assert_eq!(BedroomBucket::parse("1"), Some(BedroomBucket::Bedrooms(1)));
        assert_eq!(
            BedroomBucket::parse("2 B/R"),
            Some(BedroomBucket::Bedrooms(2))
        );
        assert_eq!(
            BedroomBucket::parse("3 bedrooms"),
            Some(BedroomBucket::Bedrooms(3))
        );
        assert_eq!(
            BedroomBucket::parse(" 4 br "),
            Some(BedroomBucket::Bedrooms(4))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(BedroomBucket::parse(""), None);
        assert_eq!(BedroomBucket::parse("N/A"), None);
        assert_eq!(BedroomBucket::parse("two"), None);
        assert_eq!(BedroomBucket::parse("3 villas"), None);
        assert_eq!(BedroomBucket::parse("250"), None);
    }

    #[test]
    fn display_matches_report_labels() {
        assert_eq!(BedroomBucket::Studio.to_string(), "Studio");
        assert_eq!(BedroomBucket::Bedrooms(1).to_string(), "1 B/R");
        assert_eq!(BedroomBucket::Bedrooms(5).to_string(), "5 B/R");
    }
}
