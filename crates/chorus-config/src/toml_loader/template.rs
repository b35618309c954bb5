//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# chorus configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[defaults]
# provider = "openai"
# system_prompt = "You are a helpful assistant."
# temperature = 0.7            # 0.0-2.0 (ignored by reasoning models)
# max_tokens = 0               # 0 = unlimited
# max_history_messages = 50    # 2-10000, trimmed in user/assistant pairs
# event_capacity = 256         # 16-65536

# One table per provider id. The key may also come from <ID>_API_KEY.
# [providers.openai]
# api_key = "your-api-key-here"
# model = "gpt-4o-mini"

# [providers.deepseek]
# api_key = ""
# model = "deepseek-chat"

[logging]
# level = "info"               # trace, debug, info, warn, error
"##
    .to_string()
}
