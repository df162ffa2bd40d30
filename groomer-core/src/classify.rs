//! Text heuristics applied to harvested records.
//!
//! Both helpers are permissive: the classifier matches any
//! keyword as a case-insensitive substring, and phone normalisation only
//! strips characters.

/// Keywords suggesting a business travels to the customer.
pub const DEFAULT_MOBILE_KEYWORDS: [&str; 8] = [
    "mobile pet grooming",
    "mobile dog grooming",
    "mobile grooming",
    "we come to you",
    "house call",
    "grooming van",
    "mobile salon",
    "at your home",
];

/// Flags free text that mentions any configured keyword.
///
/// # Examples
/// ```
/// use groomer_core::MobileClassifier;
///
/// let classifier = MobileClassifier::default();
/// assert!(classifier.looks_mobile("Paws Mobile Grooming LLC"));
/// assert!(!classifier.looks_mobile("Paws Salon"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobileClassifier {
    keywords: Vec<String>,
}

impl MobileClassifier {
    /// Build a classifier from the supplied keywords.
    ///
    /// Keywords are lower-cased; blank entries are dropped.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        Self { keywords }
    }

    /// Lower-cased keywords consulted by [`looks_mobile`](Self::looks_mobile).
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Return `true` when `text` contains any keyword, ignoring case.
    #[must_use]
    pub fn looks_mobile(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| haystack.contains(keyword.as_str()))
    }
}

impl Default for MobileClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MOBILE_KEYWORDS)
    }
}

/// Keep only digits and `+` from a phone number.
///
/// # Examples
/// ```
/// assert_eq!(groomer_core::normalize_phone("(555) 123-4567"), "5551234567");
/// assert_eq!(groomer_core::normalize_phone("+1 555.123.4567"), "+15551234567");
/// ```
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '+')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("MOBILE GROOMING by Ana", true)]
    #[case("We Come To You!", true)]
    #[case("full-service grooming van", true)]
    #[case("Mobile Grooming", true)]
    #[case("mobile", false)]
    #[case("Grooming salon", false)]
    #[case("", false)]
    fn matches_keywords_case_insensitively(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(MobileClassifier::default().looks_mobile(text), expected);
    }

    #[rstest]
    fn custom_keywords_are_lowercased_and_trimmed() {
        let classifier = MobileClassifier::new(["  Mobile ", "", "Van"]);
        assert_eq!(classifier.keywords(), ["mobile", "van"]);
        assert!(classifier.looks_mobile("Fluffy MOBILE Grooming"));
    }

    #[rstest]
    #[case("(555) 123-4567", "5551234567")]
    #[case("+1 (305) 555 0100", "+13055550100")]
    #[case("ext. none", "")]
    #[case("", "")]
    fn strips_everything_but_digits_and_plus(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_phone(raw), expected);
    }
}
