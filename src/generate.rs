use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::Card;

const SYSTEM_PROMPT: &str = "You are a language-learning flashcard creator. \
Given study text, produce at most 10 flashcards. Each card has a `front` \
(a word or phrase in the language being studied) and a `back` (its \
translation or explanation). Respond with only a JSON object of the form \
{\"flashcards\":[{\"front\":\"...\",\"back\":\"...\"}]} and nothing else.";

/// Client for the upstream chat-completions API that turns raw study text
/// into a card list. The model is an opaque collaborator: text in, cards out.
#[derive(Clone)]
pub struct Generator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct CardList {
    flashcards: Vec<Card>,
}

impl Generator {
    pub fn new(api_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Generate flashcards from raw study text.
    pub async fn generate(&self, text: &str) -> Result<Vec<Card>> {
        let body = json!({
            "model": "gpt-4o-mini",
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": text },
            ],
            "response_format": { "type": "json_object" },
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "completion API returned {}",
                response.status()
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| Error::Upstream("completion API returned no choices".to_string()))?;

        parse_cards(content)
    }
}

/// Parse the model output into cards, tolerating markdown code fences.
fn parse_cards(content: &str) -> Result<Vec<Card>> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let list: CardList = serde_json::from_str(trimmed)
        .map_err(|e| Error::Upstream(format!("unparseable model output: {e}")))?;
    Ok(list.flashcards)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_output() {
        let cards = parse_cards(
            r#"{"flashcards":[{"front":"hola","back":"hello"},{"front":"adios","back":"goodbye"}]}"#,
        )
        .unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].front, "hola");
        assert_eq!(cards[1].back, "goodbye");
    }

    #[test]
    fn parses_fenced_output() {
        let cards = parse_cards(
            "```json\n{\"flashcards\":[{\"front\":\"un\",\"back\":\"one\"}]}\n```",
        )
        .unwrap();
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn rejects_garbage_output() {
        assert!(matches!(
            parse_cards("I'm sorry, I can't do that").unwrap_err(),
            Error::Upstream(_)
        ));
    }
}
