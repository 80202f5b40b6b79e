//! Task categories used for classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification confidence at or above which a task is routed without
/// asking the user.
pub const CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Rules the agent follows when picking a category.
pub const CLASSIFICATION_RULES: &str = r#"1. Choose the single best category. Never multi-classify.
2. If the task clearly fits one category, assign it immediately.
3. If the task is ambiguous between exactly two categories, state both and ask the user which one.
4. If the task doesn't fit any category, classify as "Needs Sorting".
5. Use any additional context from the conversation to inform classification."#;

/// Topical category of a captured task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Shopping / Errands")]
    ShoppingErrands,
    #[serde(rename = "Technical / Dev")]
    TechnicalDev,
    #[serde(rename = "Class / Study")]
    ClassStudy,
    #[serde(rename = "Content / Writing")]
    ContentWriting,
    #[serde(rename = "Business / Sales")]
    BusinessSales,
    Personal,
    #[serde(rename = "Workflow / Process")]
    WorkflowProcess,
    #[serde(rename = "Social / Community")]
    SocialCommunity,
    /// Catch-all for tasks that can't be classified confidently.
    #[serde(rename = "Needs Sorting")]
    NeedsSorting,
}

impl Category {
    /// Categories offered to the classifier, in prompt order.
    #[must_use]
    pub fn topical() -> &'static [Category] {
        &[
            Category::ShoppingErrands,
            Category::TechnicalDev,
            Category::ClassStudy,
            Category::ContentWriting,
            Category::BusinessSales,
            Category::Personal,
            Category::WorkflowProcess,
            Category::SocialCommunity,
        ]
    }

    /// Every category, catch-all last.
    #[must_use]
    pub fn all() -> &'static [Category] {
        &[
            Category::ShoppingErrands,
            Category::TechnicalDev,
            Category::ClassStudy,
            Category::ContentWriting,
            Category::BusinessSales,
            Category::Personal,
            Category::WorkflowProcess,
            Category::SocialCommunity,
            Category::NeedsSorting,
        ]
    }

    /// Parse an exact category name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.as_str() == name)
    }

    /// Resolve a category name, falling back to [`Category::NeedsSorting`]
    /// for anything unrecognized.
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        Self::parse(name).unwrap_or(Category::NeedsSorting)
    }

    /// Whether this is the catch-all category.
    #[must_use]
    pub fn is_catch_all(self) -> bool {
        self == Category::NeedsSorting
    }

    /// Category name as shown to the classifier and stored in Notion.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::ShoppingErrands => "Shopping / Errands",
            Category::TechnicalDev => "Technical / Dev",
            Category::ClassStudy => "Class / Study",
            Category::ContentWriting => "Content / Writing",
            Category::BusinessSales => "Business / Sales",
            Category::Personal => "Personal",
            Category::WorkflowProcess => "Workflow / Process",
            Category::SocialCommunity => "Social / Community",
            Category::NeedsSorting => "Needs Sorting",
        }
    }

    /// What belongs in this category.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Category::ShoppingErrands => "Physical tasks, purchases, pickups, drop-offs",
            Category::TechnicalDev => {
                "Coding, debugging, infrastructure, tooling, dev environment, CI/CD"
            }
            Category::ClassStudy => {
                "Coursework, certification prep, learning tasks, study sessions, exam prep"
            }
            Category::ContentWriting => {
                "Blog posts, articles, social media, creative writing, media production, newsletters"
            }
            Category::BusinessSales => {
                "Revenue, pipeline, CRM, discovery calls, proposals, customer-facing, operational"
            }
            Category::Personal => "Health, finance, home, life admin, relationships, non-work tasks",
            Category::WorkflowProcess => {
                "Building, documenting, improving workflows, systems, skills, automations"
            }
            Category::SocialCommunity => {
                "Events, meetups, community engagement, networking, social commitments"
            }
            Category::NeedsSorting => {
                "Tasks that don't fit any category or can't be classified confidently"
            }
        }
    }

    /// Example phrases, used only for prompting the classifier.
    #[must_use]
    pub fn examples(self) -> &'static [&'static str] {
        match self {
            Category::ShoppingErrands => &[
                "Pick up dry cleaning",
                "Buy birthday gift for Mom",
                "Return Amazon package",
                "Get groceries",
            ],
            Category::TechnicalDev => &[
                "Fix the auth bug in login flow",
                "Set up CI pipeline",
                "Refactor the API layer",
                "Update Node version",
            ],
            Category::ClassStudy => &[
                "Review Chapter 7 on access controls",
                "Practice CompTIA labs",
                "Read the PKI section",
                "Study for quiz",
            ],
            Category::ContentWriting => &[
                "Draft the Substack post on AI workflows",
                "Write LinkedIn post about MEDDPICC",
                "Outline podcast episode",
            ],
            Category::BusinessSales => &[
                "Follow up with Acme Corp on the proposal",
                "Update CRM with call notes",
                "Prep for Thursday's discovery call",
            ],
            Category::Personal => &[
                "Schedule dentist appointment",
                "Call Dad this weekend",
                "Renew passport",
                "Pay electric bill",
            ],
            Category::WorkflowProcess => &[
                "Write SOP for onboarding workflow",
                "Add a new category to capture skill",
                "Review classification accuracy",
            ],
            Category::SocialCommunity => &[
                "RSVP to the AI meetup",
                "Follow up with Maria from the conference",
                "Plan game night",
                "Join the Discord event",
            ],
            Category::NeedsSorting => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_name() {
        for category in Category::all() {
            assert_eq!(Category::parse(category.as_str()), Some(*category));
        }
    }

    #[test]
    fn test_resolve_unknown_is_catch_all() {
        assert_eq!(Category::resolve("Nonexistent Category"), Category::NeedsSorting);
        assert_eq!(Category::resolve(""), Category::NeedsSorting);
        // Matching is exact
        assert_eq!(Category::resolve("personal"), Category::NeedsSorting);
        assert_eq!(Category::resolve("Personal"), Category::Personal);
    }

    #[test]
    fn test_topical_excludes_catch_all() {
        assert_eq!(Category::topical().len(), 8);
        assert!(!Category::topical().contains(&Category::NeedsSorting));
        assert_eq!(Category::all().last(), Some(&Category::NeedsSorting));
    }

    #[test]
    fn test_topical_categories_have_examples() {
        for category in Category::topical() {
            assert!(!category.examples().is_empty(), "{category} has no examples");
            assert!(!category.description().is_empty());
        }
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&Category::ShoppingErrands).unwrap();
        assert_eq!(json, "\"Shopping / Errands\"");
        let parsed: Category = serde_json::from_str("\"Needs Sorting\"").unwrap();
        assert_eq!(parsed, Category::NeedsSorting);
    }
}
