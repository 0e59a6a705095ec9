//! Tipos de dados para requisições e respostas da API Gemini `generateContent`.
//!
//! A API usa camelCase no JSON; todas as structs aplicam
//! `serde(rename_all = "camelCase")`.

use serde::{Deserialize, Serialize};

/// Corpo da requisição para `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateRequest {
    /// Requisição com um único turno de usuário contendo `prompt`.
    pub fn from_prompt(prompt: &str, max_output_tokens: u32) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(max_output_tokens),
                temperature: None,
            }),
        }
    }
}

/// Parâmetros opcionais de geração.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Um turno da conversa, composto de partes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Uma parte de conteúdo; apenas texto é usado pelo bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Resposta de `generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    /// "STOP" em geração normal; "SAFETY", "MAX_TOKENS" etc. caso contrário.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateResponse {
    /// Texto do primeiro candidato, com as partes concatenadas e aparado.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let joined: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Motivo pelo qual não houve texto: finish reason do candidato ou
    /// bloqueio do prompt.
    pub fn stop_reason(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.clone())
            .or_else(|| {
                self.prompt_feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_camel_case() {
        let req = GenerateRequest::from_prompt("Hello", 256);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""generationConfig""#));
        assert!(json.contains(r#""maxOutputTokens":256"#));
        assert!(!json.contains("temperature"));
        assert!(json.contains(r#""text":"Hello""#));
    }

    #[test]
    fn multi_part_text_is_joined_and_trimmed() {
        let api_json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "  Great "}, {"text": "question! "}]},
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GenerateResponse = serde_json::from_str(api_json).unwrap();
        assert_eq!(resp.text().as_deref(), Some("Great question!"));
        assert_eq!(resp.stop_reason().as_deref(), Some("STOP"));
    }

    #[test]
    fn safety_block_has_no_text() {
        let api_json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let resp: GenerateResponse = serde_json::from_str(api_json).unwrap();
        assert!(resp.text().is_none());
        assert_eq!(resp.stop_reason().as_deref(), Some("SAFETY"));
    }

    #[test]
    fn blocked_prompt_reports_block_reason() {
        let api_json = r#"{"promptFeedback": {"blockReason": "OTHER"}}"#;
        let resp: GenerateResponse = serde_json::from_str(api_json).unwrap();
        assert!(resp.text().is_none());
        assert_eq!(resp.stop_reason().as_deref(), Some("OTHER"));
    }
}
