//! Language-model client capability.

use async_trait::async_trait;

use crate::error::HostError;
use crate::key::ServiceKind;
use crate::traits::ServiceType;

/// Optional knobs for a single model call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LlmCallOptions {
    /// JSON schema guiding the structure of the response
    pub json_schema: Option<String>,
    /// Identifier of the prompt template
    pub prompt_id: Option<String>,
    /// Upper bound on generated tokens
    pub output_token_limit: Option<u32>,
}

/// A language-model client handed out by a provider.
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Sends an engineered prompt and returns the model's response text.
    async fn call_llm(&self, prompt: &str, options: LlmCallOptions) -> Result<String, HostError>;
}

/// Service type for [`LlmService`] instances.
///
/// There is no default instance: callers identify themselves by name.
pub struct LlmServiceType;

impl ServiceType for LlmServiceType {
    const KIND: ServiceKind = ServiceKind::LlmService;
    const DEFAULT_INSTANCE: Option<&'static str> = None;
    type Params = ();
    type Instance = dyn LlmService;
}
