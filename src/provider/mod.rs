mod command;

pub use command::CommandClient;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Black-box text completion used by the analysis runner
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, ProviderError>;
}

/// Create a client from the provider configuration
pub fn create_client(config: &ProviderConfig) -> Arc<dyn LlmClient> {
    Arc::new(CommandClient {
        command: config.command.clone(),
        args: config.args.clone(),
    })
}
