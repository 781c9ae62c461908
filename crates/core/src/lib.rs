pub mod domain;
pub mod error;
pub mod llm;
pub mod market;
pub mod pipeline;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

pub mod config {
    use anyhow::Context;

    use crate::domain::credential::ApiKey;
    use crate::error::AnalysisError;

    pub const GROQ_API_KEY: &str = "GROQ_API_KEY";

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub groq_api_key: Option<String>,
        pub groq_base_url: Option<String>,
        pub groq_model: Option<String>,
        pub groq_max_tokens: Option<u32>,
        pub market_data_base_url: Option<String>,
        pub market_data_cookie_url: Option<String>,
        pub search_base_url: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let groq_max_tokens = match non_empty_var("GROQ_MAX_TOKENS") {
                Some(s) => Some(
                    s.parse::<u32>()
                        .with_context(|| format!("GROQ_MAX_TOKENS must be a positive integer (got {s})"))?,
                ),
                None => None,
            };

            Ok(Self {
                groq_api_key: non_empty_var(GROQ_API_KEY),
                groq_base_url: non_empty_var("GROQ_BASE_URL"),
                groq_model: non_empty_var("GROQ_MODEL"),
                groq_max_tokens,
                market_data_base_url: non_empty_var("MARKET_DATA_BASE_URL"),
                market_data_cookie_url: non_empty_var("MARKET_DATA_COOKIE_URL"),
                search_base_url: non_empty_var("SEARCH_BASE_URL"),
            })
        }

        /// Resolves the LLM credential for one request. A key typed into the UI wins over the
        /// environment; whitespace-only input counts as absent.
        pub fn require_groq_api_key(&self, user_input: Option<&str>) -> Result<ApiKey, AnalysisError> {
            user_input
                .and_then(|k| ApiKey::new(k).ok())
                .or_else(|| self.groq_api_key.as_deref().and_then(|k| ApiKey::new(k).ok()))
                .ok_or(AnalysisError::MissingCredential(GROQ_API_KEY))
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

}
