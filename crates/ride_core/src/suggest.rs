//! Destination suggestions.
//!
//! Lookups never fail from the caller's point of view: without a provider the
//! fixed fallback list is returned, and a provider error turns into a single
//! diagnostic entry.

use tracing::warn;

use crate::error::SuggestionError;

pub const MAX_SUGGESTIONS: usize = 3;

pub const FALLBACK_SUGGESTIONS: [&str; MAX_SUGGESTIONS] = [
    "The Coffee Bean - 12 Main St",
    "Starbucks Reserve - 45 Broad Ave",
    "Joe's Local Brew - 88 Market St",
];

pub const ERROR_SUGGESTION: &str = "Error fetching suggestions";

/// Source of free-form suggestion text, one place per line.
pub trait SuggestionProvider: Send + Sync {
    fn suggest(&self, query: &str) -> Result<String, SuggestionError>;
}

impl<F> SuggestionProvider for F
where
    F: Fn(&str) -> Result<String, SuggestionError> + Send + Sync,
{
    fn suggest(&self, query: &str) -> Result<String, SuggestionError> {
        self(query)
    }
}

#[derive(Default)]
pub struct DestinationSuggester {
    provider: Option<Box<dyn SuggestionProvider>>,
}

impl DestinationSuggester {
    pub fn new(provider: Box<dyn SuggestionProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn without_provider() -> Self {
        Self::default()
    }

    /// At most [MAX_SUGGESTIONS] entries.
    pub fn suggest(&self, query: &str) -> Vec<String> {
        let Some(provider) = self.provider.as_ref() else {
            return FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
        };
        match provider.suggest(query).and_then(|text| parse_suggestions(&text)) {
            Ok(suggestions) => suggestions,
            Err(err) => {
                warn!(error = %err, query, "suggestion lookup failed");
                vec![ERROR_SUGGESTION.to_string()]
            }
        }
    }
}

/// One suggestion per non-blank line. A response without any is unusable.
fn parse_suggestions(text: &str) -> Result<Vec<String>, SuggestionError> {
    let suggestions: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect();
    if suggestions.is_empty() {
        return Err(SuggestionError::InvalidResponse("no places in response".into()));
    }
    Ok(suggestions)
}

/// Whether typed input looks like a question worth sending to a provider.
pub fn wants_suggestions(input: &str) -> bool {
    input.chars().count() > 4 && input.contains('?')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_provider_returns_fallback() {
        let suggester = DestinationSuggester::without_provider();
        let suggestions = suggester.suggest("coffee?");
        assert_eq!(suggestions, FALLBACK_SUGGESTIONS.to_vec());
    }

    #[test]
    fn provider_failure_becomes_diagnostic_entry() {
        let suggester = DestinationSuggester::new(Box::new(|_: &str| -> Result<String, SuggestionError> {
            Err(SuggestionError::Unavailable("timeout".into()))
        }));
        assert_eq!(suggester.suggest("coffee?"), vec![ERROR_SUGGESTION.to_string()]);
    }

    #[test]
    fn provider_output_is_split_and_truncated() {
        let suggester = DestinationSuggester::new(Box::new(|query: &str| -> Result<String, SuggestionError> {
            assert_eq!(query, "museum?");
            Ok("Art Museum - 1 Park Rd\n\n  \nCity Museum - 9 Elm St\nHistory Hall\nScience Dome\n"
                .to_string())
        }));
        assert_eq!(
            suggester.suggest("museum?"),
            vec!["Art Museum - 1 Park Rd", "City Museum - 9 Elm St", "History Hall"]
        );
    }

    #[test]
    fn blank_provider_response_is_reported() {
        let suggester = DestinationSuggester::new(Box::new(|_: &str| -> Result<String, SuggestionError> {
            Ok(" \n\n".to_string())
        }));
        assert_eq!(suggester.suggest("coffee?"), vec![ERROR_SUGGESTION.to_string()]);
        assert!(matches!(
            parse_suggestions(""),
            Err(SuggestionError::InvalidResponse(_))
        ));
    }

    #[test]
    fn question_gate() {
        assert!(wants_suggestions("coffee?"));
        assert!(!wants_suggestions("bar?"));
        assert!(!wants_suggestions("coffee shop"));
    }
}
