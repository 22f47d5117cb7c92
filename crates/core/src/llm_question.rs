//! Question generation with an OpenAI-compatible chat model.
//!
//! The model only names one big and one small object. Target and slot order
//! are rolled locally, so a confused response can at worst be rejected; it can
//! never produce a question with the wrong answer marked.

use crate::{
    catalog::random_question,
    error::ProviderError,
    provider::QuestionProvider,
    question::{GameObject, Question},
};
use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
};
use async_trait::async_trait;
use rand::{SeedableRng, rngs::StdRng};
use schemars::JsonSchema;
use serde::Deserialize;
use std::{collections::VecDeque, sync::Mutex};
use tracing::{info, instrument, warn};

/// Object names kept to steer the model away from repeats.
const AVOID_HISTORY: usize = 6;

const SYSTEM_PROMPT: &str = "You create picture quiz content for 4-year-old children \
learning the words big (大) and small (小).";

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct GeneratedObject {
    /// Name in Simplified Chinese, e.g. "苹果" or "狮子".
    name: String,
    /// A single emoji showing the object.
    emoji: String,
    /// A soft pastel background color as a hex code.
    color_hex: String,
}

/// One clearly big and one clearly small object from the same family.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct GeneratedPair {
    big: GeneratedObject,
    small: GeneratedObject,
}

impl GeneratedPair {
    fn into_objects(self) -> Result<(GameObject, GameObject), ProviderError> {
        for obj in [&self.big, &self.small] {
            if obj.name.trim().is_empty() || obj.emoji.trim().is_empty() {
                return Err(ProviderError::InvalidResponse(
                    "object is missing a name or emoji".to_string(),
                ));
            }
        }
        if self.big.name == self.small.name {
            return Err(ProviderError::InvalidResponse(format!(
                "big and small objects are both '{}'",
                self.big.name
            )));
        }
        let big = GameObject::new(&self.big.name, &self.big.emoji, &self.big.color_hex, true);
        let small = GameObject::new(&self.small.name, &self.small.emoji, &self.small.color_hex, false);
        Ok((big, small))
    }
}

/// Builds the user prompt, listing names the model should not reuse.
fn user_prompt(avoid: &[String]) -> String {
    let mut prompt = String::from(
        "Pick a cute pair of things a small child knows (animals, fruit, toys, nature), \
         one obviously big and one obviously small. Names MUST be Simplified Chinese (Mandarin).",
    );
    if !avoid.is_empty() {
        prompt.push_str(&format!(" Do not use any of: {}.", avoid.join("、")));
    }
    prompt
}

struct Recent {
    rng: StdRng,
    names: VecDeque<String>,
}

/// A `QuestionProvider` that asks a chat model for each pair.
pub struct LlmQuestionProvider {
    client: Client<OpenAIConfig>,
    model: String,
    recent: Mutex<Recent>,
}

impl LlmQuestionProvider {
    /// # Arguments
    ///
    /// * `config` - API key and base URL of any OpenAI-compatible endpoint.
    /// * `model` - The chat model identifier (e.g. "gpt-4o-mini", "gemini-2.5-flash").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            recent: Mutex::new(Recent {
                rng: StdRng::from_os_rng(),
                names: VecDeque::with_capacity(AVOID_HISTORY),
            }),
        }
    }

    fn avoid_list(&self) -> Vec<String> {
        self.recent
            .lock()
            .map(|r| r.names.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn request_pair(&self, avoid: &[String]) -> Result<String> {
        let schema = serde_json::to_value(schemars::schema_for!(GeneratedPair))?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt(avoid))
                    .build()?
                    .into(),
            ])
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: Some("A big object and a small object".to_string()),
                    name: "object_pair".to_string(),
                    schema: Some(schema),
                    strict: Some(true),
                },
            })
            .build()?;

        let response = self.client.chat().create(request).await?;
        let content = response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message
            .content
            .clone()
            .context("No content in LLM response")?;
        Ok(content)
    }
}

#[async_trait]
impl QuestionProvider for LlmQuestionProvider {
    #[instrument(name = "llm_question", skip(self), fields(model = %self.model))]
    async fn fetch_question(&self) -> Result<Question, ProviderError> {
        let avoid = self.avoid_list();
        let content = self
            .request_pair(&avoid)
            .await
            .map_err(|e| ProviderError::Request(format!("{e:#}")))?;

        let pair: GeneratedPair = serde_json::from_str(&content).map_err(|e| {
            warn!(error = %e, %content, "LLM returned malformed pair");
            ProviderError::InvalidResponse(e.to_string())
        })?;
        let (big, small) = pair.into_objects()?;
        info!(big = %big.name, small = %small.name, "Generated object pair");

        let mut recent = self.recent.lock().map_err(|_| ProviderError::Unavailable)?;
        for name in [&big.name, &small.name] {
            recent.names.push_back(name.clone());
        }
        while recent.names.len() > AVOID_HISTORY {
            recent.names.pop_front();
        }
        random_question(big, small, &mut recent.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(big: &str, small: &str) -> GeneratedPair {
        let obj = |name: &str| GeneratedObject {
            name: name.to_string(),
            emoji: "🐾".to_string(),
            color_hex: "#FFFFFF".to_string(),
        };
        GeneratedPair {
            big: obj(big),
            small: obj(small),
        }
    }

    #[test]
    fn test_generated_pair_parses_from_model_json() {
        let json = r##"{
            "big": {"name": "大象", "emoji": "🐘", "colorHex": "#B3E5FC"},
            "small": {"name": "蚂蚁", "emoji": "🐜", "colorHex": "#FFE0B2"}
        }"##;
        let pair: GeneratedPair = serde_json::from_str(json).unwrap();
        let (big, small) = pair.into_objects().unwrap();
        assert!(big.is_big);
        assert!(!small.is_big);
        assert_eq!(small.display_glyph, "🐜");
        assert_eq!(big.color_hint, "#B3E5FC");
    }

    #[test]
    fn test_generated_pair_rejects_duplicates_and_blanks() {
        assert!(matches!(
            generated("猫", "猫").into_objects(),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            generated("  ", "猫").into_objects(),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_user_prompt_lists_avoided_names() {
        assert!(!user_prompt(&[]).contains("Do not use"));
        let prompt = user_prompt(&["大象".to_string(), "老鼠".to_string()]);
        assert!(prompt.ends_with("Do not use any of: 大象、老鼠."));
    }

    #[test]
    fn test_schema_names_both_objects() {
        let schema = serde_json::to_value(schemars::schema_for!(GeneratedPair)).unwrap();
        let text = schema.to_string();
        assert!(text.contains("\"big\""));
        assert!(text.contains("\"small\""));
        assert!(text.contains("colorHex"));
    }

    #[test]
    fn test_schema_is_closed_for_strict_mode() {
        let required = |value: &serde_json::Value| {
            let mut names: Vec<String> = value["required"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap().to_string())
                .collect();
            names.sort();
            names
        };
        let schema = serde_json::to_value(schemars::schema_for!(GeneratedPair)).unwrap();
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(required(&schema), ["big", "small"]);

        let object = &schema["$defs"]["GeneratedObject"];
        assert_eq!(object["additionalProperties"], false);
        assert_eq!(required(object), ["colorHex", "emoji", "name"]);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let json = r##"{
            "big": {"name": "大象", "emoji": "🐘", "colorHex": "#B3E5FC", "size": 9},
            "small": {"name": "蚂蚁", "emoji": "🐜", "colorHex": "#FFE0B2"}
        }"##;
        assert!(serde_json::from_str::<GeneratedPair>(json).is_err());
    }
}
