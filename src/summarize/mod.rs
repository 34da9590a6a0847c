//! Transcript summarization and key-point extraction via GPT-4o.
//!
//! Two fixed prompt templates: a summary-plus-features analysis and a
//! grouped key-point extraction. No retries; a collaborator failure surfaces
//! directly to the caller.

use crate::config::SummarizeSettings;
use crate::error::{Result, TranscripterError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use tracing::{debug, instrument};

/// Which of the two fixed prompt templates to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Summarize,
    KeyPoints,
}

impl Mode {
    fn temperature(&self) -> f32 {
        match self {
            Mode::Summarize => 0.5,
            Mode::KeyPoints => 0.3,
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            Mode::Summarize => "You are an expert game analyst.",
            Mode::KeyPoints => "You are an expert game analyst.",
        }
    }

    fn user_prompt(&self, text: &str) -> String {
        match self {
            Mode::Summarize => format!(
                "Analyze the following game transcript and provide:\n\
                 1. A concise summary of the main ideas.\n\
                 2. A bullet-point list of the main features (skills, combat, economy, modes, etc.) mentioned.\n\n\
                 Transcript:\n{text}\n\nSummary and Features:"
            ),
            Mode::KeyPoints => format!(
                "Analyze the following game transcript and extract the key points, grouped by the following interests:\n\
                 - Gameplay\n\
                 - Combat\n\
                 - Economy\n\
                 - Skills\n\
                 - Quests\n\
                 - Modes\n\
                 - Other Features\n\n\
                 For each group, provide a bullet-point list of the most important details mentioned in the transcript. \
                 Do NOT provide a general summary. Only list key points under each group.\n\n\
                 Transcript:\n{text}\n\nKey Points by Interest:"
            ),
        }
    }
}

/// GPT-4o summarization client.
pub struct Summarizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    max_tokens: u32,
}

impl Summarizer {
    pub fn new(settings: &SummarizeSettings) -> Self {
        Self {
            client: create_client(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
        }
    }

    /// Run one completion over the given transcript text.
    ///
    /// Empty input is rejected before any API call.
    #[instrument(skip(self, text), fields(mode = ?mode, chars = text.len()))]
    pub async fn complete(&self, text: &str, mode: Mode) -> Result<String> {
        if text.trim().is_empty() {
            return Err(TranscripterError::InvalidInput("No text provided".to_string()));
        }

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(mode.system_prompt())
                .build()
                .map_err(|e| TranscripterError::Summarization(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(mode.user_prompt(text))
                .build()
                .map_err(|e| TranscripterError::Summarization(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(self.max_tokens)
            .temperature(mode.temperature())
            .build()
            .map_err(|e| TranscripterError::Summarization(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TranscripterError::OpenAI(format!("Completion failed: {e}")))?;

        let result = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| TranscripterError::Summarization("Empty response from model".to_string()))?
            .trim()
            .to_string();

        debug!("Completion returned {} chars", result.len());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parameters() {
        assert_eq!(Mode::Summarize.temperature(), 0.5);
        assert_eq!(Mode::KeyPoints.temperature(), 0.3);
    }

    #[test]
    fn test_prompts_embed_the_transcript() {
        let prompt = Mode::Summarize.user_prompt("the combat is floaty");
        assert!(prompt.contains("the combat is floaty"));
        assert!(prompt.contains("Summary and Features:"));

        let prompt = Mode::KeyPoints.user_prompt("dungeons drop gold");
        assert!(prompt.contains("dungeons drop gold"));
        assert!(prompt.contains("Key Points by Interest:"));
        assert!(prompt.contains("- Quests"));
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_before_any_call() {
        let summarizer = Summarizer::new(&crate::config::SummarizeSettings::default());
        let err = summarizer.complete("   ", Mode::Summarize).await.unwrap_err();
        assert!(matches!(err, TranscripterError::InvalidInput(_)));
    }
}
