//! # Autocomplete Suggestion Feed
//!
//! Keeps the search box value and the current list of place suggestions.
//!
//! Each keystroke produces a [`SuggestionQuery`] tagged with a generation
//! number. Provider responses are applied only if they belong to the latest
//! generation, so a slow response for `"22"` cannot overwrite the list for
//! `"221B"`. Selecting a suggestion clears the list and bumps the generation,
//! which also discards any response still in flight.
//!
//! Input is refused with [`ReviewQrError::ProviderUnavailable`] until the
//! provider reports it is ready.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ReviewQrError;

/// A candidate place shown under the search box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub place_id: String,
    pub description: String,
}

/// Provider status for a suggestion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionStatus {
    Ok,
    /// Any non-OK status string (`ZERO_RESULTS`, `REQUEST_DENIED`, ...).
    Other(String),
}

impl SuggestionStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "OK" => SuggestionStatus::Ok,
            other => SuggestionStatus::Other(other.to_string()),
        }
    }
}

/// One provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionBatch {
    pub status: SuggestionStatus,
    pub predictions: Vec<Suggestion>,
}

/// Source of place suggestions for partial input.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Whether the provider is initialized and may be queried.
    fn is_ready(&self) -> bool;

    async fn suggest(&self, input: &str) -> Result<SuggestionBatch, ReviewQrError>;
}

/// A pending provider request for one generation of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionQuery {
    generation: u64,
    pub input: String,
}

/// Search box state plus the latest suggestion list.
pub struct SuggestionFeed {
    provider: Arc<dyn SuggestionProvider>,
    value: String,
    generation: u64,
    suggestions: Vec<Suggestion>,
}

impl SuggestionFeed {
    pub fn new(provider: Arc<dyn SuggestionProvider>) -> Self {
        Self {
            provider,
            value: String::new(),
            generation: 0,
            suggestions: Vec::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.provider.is_ready()
    }

    pub fn provider(&self) -> Arc<dyn SuggestionProvider> {
        self.provider.clone()
    }

    /// Current search box text.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Iterate the current suggestions. Each call starts from the top.
    pub fn suggestions(&self) -> std::slice::Iter<'_, Suggestion> {
        self.suggestions.iter()
    }

    /// Record new search text.
    ///
    /// Returns the query to send to the provider, or `None` when the input
    /// is blank (the list is cleared without a provider call).
    pub fn set_input(&mut self, text: &str) -> Result<Option<SuggestionQuery>, ReviewQrError> {
        if !self.is_ready() {
            return Err(ReviewQrError::ProviderUnavailable(
                "places provider is still loading".to_string(),
            ));
        }

        self.value = text.to_string();
        self.generation += 1;

        if text.trim().is_empty() {
            self.suggestions.clear();
            return Ok(None);
        }

        Ok(Some(SuggestionQuery {
            generation: self.generation,
            input: text.to_string(),
        }))
    }

    /// Apply a provider response. Returns `false` if the response is stale.
    pub fn apply(&mut self, query: &SuggestionQuery, batch: SuggestionBatch) -> bool {
        if query.generation != self.generation {
            tracing::debug!(input = %query.input, "dropping stale suggestions");
            return false;
        }

        self.suggestions = match batch.status {
            SuggestionStatus::Ok => batch.predictions,
            SuggestionStatus::Other(status) => {
                tracing::debug!(input = %query.input, %status, "no suggestions");
                Vec::new()
            }
        };
        true
    }

    /// Set input and fetch suggestions in one step.
    pub async fn update(&mut self, text: &str) -> Result<(), ReviewQrError> {
        let Some(query) = self.set_input(text)? else {
            return Ok(());
        };
        let batch = self.provider.suggest(&query.input).await?;
        self.apply(&query, batch);
        Ok(())
    }

    /// Pick a suggestion by index.
    ///
    /// The search box takes the suggestion's description and the list is
    /// cleared. Returns `None` for an out-of-range index.
    pub fn select(&mut self, index: usize) -> Option<Suggestion> {
        let chosen = self.suggestions.get(index).cloned()?;
        self.value = chosen.description.clone();
        self.suggestions.clear();
        self.generation += 1;
        Some(chosen)
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::FakeSuggestions;
    use super::*;

    fn feed(provider: FakeSuggestions) -> SuggestionFeed {
        SuggestionFeed::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn test_not_ready_blocks_input() {
        let mut feed = feed(FakeSuggestions::default());
        let result = feed.update("221B").await;
        assert!(matches!(result, Err(ReviewQrError::ProviderUnavailable(_))));
        assert_eq!(feed.value(), "");
    }

    #[tokio::test]
    async fn test_update_and_restart_iteration() {
        let mut feed = feed(FakeSuggestions::ready_with(
            "221B",
            &[("P1", "221B Baker St"), ("P9", "221B Baker Rd")],
        ));
        feed.update("221B").await.unwrap();

        let first: Vec<_> = feed.suggestions().map(|s| s.description.as_str()).collect();
        let again: Vec<_> = feed.suggestions().map(|s| s.description.as_str()).collect();
        assert_eq!(first, vec!["221B Baker St", "221B Baker Rd"]);
        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn test_non_ok_status_yields_nothing() {
        let mut feed = feed(FakeSuggestions::ready_with("a", &[("P1", "A")]));
        feed.update("zzz").await.unwrap();
        assert_eq!(feed.suggestions().count(), 0);
    }

    #[test]
    fn test_stale_response_dropped() {
        let mut feed = feed(FakeSuggestions {
            ready: true,
            ..Default::default()
        });
        let old = feed.set_input("22").unwrap().unwrap();
        let new = feed.set_input("221B").unwrap().unwrap();

        let batch = |desc: &str| SuggestionBatch {
            status: SuggestionStatus::Ok,
            predictions: vec![Suggestion {
                place_id: "x".to_string(),
                description: desc.to_string(),
            }],
        };

        assert!(feed.apply(&new, batch("221B Baker St")));
        assert!(!feed.apply(&old, batch("22 Acacia Ave")));
        assert_eq!(feed.suggestions().next().unwrap().description, "221B Baker St");
    }

    #[tokio::test]
    async fn test_blank_input_clears() {
        let mut feed = feed(FakeSuggestions::ready_with("a", &[("P1", "A")]));
        feed.update("a").await.unwrap();
        assert_eq!(feed.suggestions().count(), 1);
        assert!(feed.set_input("  ").unwrap().is_none());
        assert_eq!(feed.suggestions().count(), 0);
    }

    #[tokio::test]
    async fn test_select_clears_and_sets_value() {
        let mut feed = feed(FakeSuggestions::ready_with("221", &[("P1", "221B Baker St")]));
        feed.update("221").await.unwrap();

        let chosen = feed.select(0).unwrap();
        assert_eq!(chosen.place_id, "P1");
        assert_eq!(feed.value(), "221B Baker St");
        assert_eq!(feed.suggestions().count(), 0);
        assert!(feed.select(0).is_none());
    }
}
