//! Per-provider endpoint table and model-family rules.

/// Standard OpenAI chat-completions base.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible bases for providers that do not use the standard one.
const BASE_URL_OVERRIDES: &[(&str, &str)] = &[
    ("anthropic", "https://api.anthropic.com/v1"),
    ("deepseek", "https://api.deepseek.com/v1"),
    ("gemini", "https://generativelanguage.googleapis.com/v1beta/openai"),
    ("groq", "https://api.groq.com/openai/v1"),
    ("mistral", "https://api.mistral.ai/v1"),
    ("moonshot", "https://api.moonshot.cn/v1"),
    ("openrouter", "https://openrouter.ai/api/v1"),
    ("qwen", "https://dashscope.aliyuncs.com/compatible-mode/v1"),
    ("together", "https://api.together.xyz/v1"),
    ("xai", "https://api.x.ai/v1"),
    ("zhipu", "https://open.bigmodel.cn/api/paas/v4"),
];

/// Model families that reject an explicit temperature.
const REASONING_PREFIXES: &[&str] = &["o1", "o3", "o4", "gpt-5"];

/// Chat-completions base URL for `provider_id`.
pub fn base_url_for(provider_id: &str) -> &'static str {
    BASE_URL_OVERRIDES
        .iter()
        .find(|(id, _)| *id == provider_id)
        .map(|(_, url)| *url)
        .unwrap_or(DEFAULT_BASE_URL)
}

/// True if `model` is a reasoning-family name: a known prefix exactly, or
/// the prefix followed by `-` and a suffix (`o1`, `o3-mini`, `gpt-5-nano`).
pub fn is_reasoning_model(model: &str) -> bool {
    REASONING_PREFIXES.iter().any(|prefix| {
        model == *prefix
            || model
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('-'))
    })
}
