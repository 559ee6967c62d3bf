/// One selectable model of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelEntry {
    pub id: &'static str,
    pub display_name: &'static str,
}

/// A translation backend and its ordered model list. The first model is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderEntry {
    pub id: &'static str,
    pub label: &'static str,
    pub models: &'static [ModelEntry],
}

impl ProviderEntry {
    pub fn default_model(&self) -> Option<&'static ModelEntry> {
        self.models.first()
    }

    pub fn has_model(&self, model_id: &str) -> bool {
        self.models.iter().any(|model| model.id == model_id)
    }
}

const fn model(id: &'static str, display_name: &'static str) -> ModelEntry {
    ModelEntry { id, display_name }
}

pub const PROVIDERS: &[ProviderEntry] = &[
    ProviderEntry {
        id: "modelscope",
        label: "ModelScope",
        models: &[
            model("Qwen/Qwen2.5-72B-Instruct", "Qwen2.5-72B (recommended)"),
            model("Qwen/Qwen2.5-32B-Instruct", "Qwen2.5-32B"),
            model("Qwen/Qwen2.5-Coder-32B-Instruct", "Qwen2.5-Coder-32B"),
            model("Qwen/Qwen2.5-14B-Instruct", "Qwen2.5-14B (fast)"),
        ],
    },
    ProviderEntry {
        id: "openai",
        label: "OpenAI",
        models: &[
            model("gpt-4o", "GPT-4o (recommended)"),
            model("gpt-4o-mini", "GPT-4o Mini (fast)"),
            model("gpt-4-turbo", "GPT-4 Turbo"),
            model("gpt-3.5-turbo", "GPT-3.5 Turbo (economy)"),
        ],
    },
    ProviderEntry {
        id: "qianwen",
        label: "Tongyi Qianwen",
        models: &[
            model("qwen-max", "Qwen Max (recommended)"),
            model("qwen-plus", "Qwen Plus"),
            model("qwen-turbo", "Qwen Turbo (fast)"),
        ],
    },
    ProviderEntry {
        id: "claude",
        label: "Anthropic Claude",
        models: &[
            model("claude-3-5-sonnet-20241022", "Claude 3.5 Sonnet (recommended)"),
            model("claude-3-opus-20240229", "Claude 3 Opus (high quality)"),
            model("claude-3-haiku-20240307", "Claude 3 Haiku (fast)"),
        ],
    },
];

/// Looks up a provider by its exact id. Blank or unknown ids yield `None`.
pub fn find_provider(provider_id: &str) -> Option<&'static ProviderEntry> {
    PROVIDERS.iter().find(|provider| provider.id == provider_id)
}

#[cfg(test)]
mod tests {
    use super::{find_provider, PROVIDERS};

    #[test]
    fn every_provider_has_a_default_model() {
        for provider in PROVIDERS {
            assert!(provider.default_model().is_some(), "{}", provider.id);
        }
    }

    #[test]
    fn lookup_is_exact() {
        assert_eq!(find_provider("openai").map(|p| p.id), Some("openai"));
        assert!(find_provider("OpenAI").is_none());
        assert!(find_provider("").is_none());
    }
}
