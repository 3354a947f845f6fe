//! Keyword heuristic classifier
//!
//! Walks a fixed, ordered topic table. The first topic with a merchant
//! substring hit *and* a user category containing the topic word wins.
//! With no usable hit the user's first category is returned at low confidence.

use crate::models::{Category, ClassificationSuggestion, SuggestionSource};

/// Confidence for a keyword hit
pub const KEYWORD_CONFIDENCE: f64 = 0.55;

/// Confidence for the first-category fallback
pub const FALLBACK_CONFIDENCE: f64 = 0.4;

/// One topic: the word looked for in category names, and merchant substrings
#[derive(Debug, Clone)]
pub struct Topic {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

/// Topic order is significant: earlier topics win ties
const DEFAULT_TOPICS: &[Topic] = &[
    Topic {
        name: "food",
        keywords: &[
            "swiggy", "zomato", "domino", "mcdonald", "kfc", "pizza", "burger", "starbucks",
            "cafe", "coffee", "restaurant", "dunkin", "subway", "bakery",
        ],
    },
    Topic {
        name: "groceries",
        keywords: &[
            "bigbasket", "blinkit", "zepto", "instamart", "dmart", "grofers", "grocery",
            "supermarket", "whole foods", "walmart", "trader joe",
        ],
    },
    Topic {
        name: "travel",
        keywords: &[
            "uber", "ola", "rapido", "lyft", "irctc", "indigo", "air india", "airline",
            "airways", "makemytrip", "goibibo", "redbus", "metro", "petrol", "fuel", "shell",
        ],
    },
    Topic {
        name: "shopping",
        keywords: &[
            "amazon", "flipkart", "myntra", "ajio", "meesho", "nykaa", "ikea", "decathlon",
            "mall", "store",
        ],
    },
    Topic {
        name: "entertainment",
        keywords: &[
            "netflix", "spotify", "hotstar", "prime video", "youtube", "bookmyshow", "pvr",
            "inox", "steam", "playstation", "xbox", "cinema",
        ],
    },
    Topic {
        name: "utilities",
        keywords: &[
            "electricity", "airtel", "jio", "vodafone", "bsnl", "broadband", "water bill",
            "gas bill", "recharge", "tata power", "internet",
        ],
    },
    Topic {
        name: "health",
        keywords: &[
            "pharmacy", "apollo", "medplus", "pharmeasy", "netmeds", "1mg", "hospital",
            "clinic", "practo", "doctor", "gym",
        ],
    },
];

/// Maps merchant text to one of the user's categories via keywords
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    topics: Vec<Topic>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS.to_vec(),
        }
    }
}

impl KeywordClassifier {
    /// Classify merchant text; `None` only when the user has no categories
    ///
    /// Categories are expected in creation order (lowest id first).
    pub fn classify(
        &self,
        merchant: &str,
        categories: &[Category],
    ) -> Option<ClassificationSuggestion> {
        let merchant = merchant.trim().to_lowercase();

        for topic in &self.topics {
            let Some(keyword) = topic.keywords.iter().find(|k| merchant.contains(*k)) else {
                continue;
            };
            if let Some(category) = categories
                .iter()
                .find(|c| c.name.to_lowercase().contains(topic.name))
            {
                return Some(ClassificationSuggestion::for_category(
                    category,
                    KEYWORD_CONFIDENCE,
                    format!(
                        "Merchant matched keyword '{}' for {}",
                        keyword, topic.name
                    ),
                    SuggestionSource::Keyword,
                ));
            }
        }

        let first = categories.iter().min_by_key(|c| c.id)?;
        Some(ClassificationSuggestion::for_category(
            first,
            FALLBACK_CONFIDENCE,
            "No keyword match; defaulted to the first category",
            SuggestionSource::Keyword,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(names: &[&str]) -> Vec<Category> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Category {
                id: i as i64 + 1,
                user_id: 1,
                name: name.to_string(),
                color: None,
                icon: None,
            })
            .collect()
    }

    #[test]
    fn test_keyword_hit() {
        let classifier = KeywordClassifier::default();
        let cats = categories(&["Bills", "Food & Dining", "Travel"]);

        let suggestion = classifier.classify("Uber Trip BLR", &cats).unwrap();
        assert_eq!(suggestion.category_id, Some(3));
        assert_eq!(suggestion.confidence, KEYWORD_CONFIDENCE);
        assert!(suggestion.reason.contains("uber"));

        let suggestion = classifier.classify("SWIGGY*ORDER", &cats).unwrap();
        assert_eq!(suggestion.category_name, "Food & Dining");
    }

    #[test]
    fn test_first_topic_wins() {
        let classifier = KeywordClassifier::default();
        // "amazon prime video" hits shopping before entertainment
        let cats = categories(&["Entertainment", "Shopping"]);
        let suggestion = classifier.classify("amazon prime video", &cats).unwrap();
        assert_eq!(suggestion.category_name, "Shopping");
    }

    #[test]
    fn test_topic_without_category_falls_through() {
        let classifier = KeywordClassifier::default();
        // Matches food keyword "cafe" but there is no food category;
        // "steam" then hits entertainment
        let cats = categories(&["Rent", "Entertainment"]);
        let suggestion = classifier.classify("steam cafe", &cats).unwrap();
        assert_eq!(suggestion.category_name, "Entertainment");
    }

    #[test]
    fn test_first_category_fallback() {
        let classifier = KeywordClassifier::default();
        let cats = categories(&["Rent", "Food"]);
        let suggestion = classifier.classify("Landlord Sharma", &cats).unwrap();
        assert_eq!(suggestion.category_id, Some(1));
        assert_eq!(suggestion.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(suggestion.source, SuggestionSource::Keyword);
    }

    #[test]
    fn test_fallback_uses_lowest_id() {
        let classifier = KeywordClassifier::default();
        let mut cats = categories(&["Rent", "Food"]);
        cats.reverse();
        let suggestion = classifier.classify("unknown vendor", &cats).unwrap();
        assert_eq!(suggestion.category_name, "Rent");
    }

    #[test]
    fn test_no_categories() {
        assert!(KeywordClassifier::default().classify("uber", &[]).is_none());
    }

    #[test]
    fn test_deterministic() {
        let classifier = KeywordClassifier::default();
        let cats = categories(&["Food", "Travel", "Health"]);
        for merchant in ["Apollo Pharmacy", "Ola Cabs", "mystery shop", "Zomato"] {
            let first = classifier.classify(merchant, &cats);
            for _ in 0..5 {
                assert_eq!(classifier.classify(merchant, &cats), first);
            }
        }
    }
}
