use super::types::ParserKind;

pub fn default_parsers() -> Vec<ParserKind> {
    ParserKind::default_chain()
}

pub fn default_preview_chars() -> usize {
    200
}

pub fn default_provider_command() -> String {
    "ollama".to_string()
}

pub fn default_provider_args() -> Vec<String> {
    vec!["run".to_string(), "llama3".to_string()]
}

pub fn default_timeout_sec() -> u64 {
    120
}

pub fn default_max_attempts() -> u32 {
    3
}

pub fn default_backoff_base_ms() -> u64 {
    1000
}

pub fn default_true() -> bool {
    true
}
