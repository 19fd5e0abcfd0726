//! Text-generation agent used by prompt stages

pub mod client;
pub mod response;
pub mod subprocess_client;

use async_trait::async_trait;
pub use client::AgentClientConfig;
pub use response::{AgentError, AgentResponse};
pub use subprocess_client::SubprocessClient;

/// Trait for agent execution - allows for different implementations
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Send a prompt and wait for the complete response
    async fn execute(&self, prompt: &str) -> Result<AgentResponse, AgentError>;
}

#[async_trait]
impl<A: AgentExecutor + ?Sized> AgentExecutor for std::sync::Arc<A> {
    async fn execute(&self, prompt: &str) -> Result<AgentResponse, AgentError> {
        (**self).execute(prompt).await
    }
}

/// Agent client that runs an external generation command
#[derive(Debug, Clone)]
pub struct AgentClient {
    subprocess_client: SubprocessClient,
}

impl AgentClient {
    /// Create a new agent client
    ///
    /// `config.command` is the executable to spawn; it defaults to "pi"
    /// (assumed to be on PATH).
    pub fn new(config: AgentClientConfig) -> Self {
        let subprocess_client =
            SubprocessClient::new(config.command, config.args, config.timeout_secs);
        Self { subprocess_client }
    }
}

#[async_trait]
impl AgentExecutor for AgentClient {
    async fn execute(&self, prompt: &str) -> Result<AgentResponse, AgentError> {
        let content = self.subprocess_client.execute(prompt).await?;
        Ok(AgentResponse::new(content))
    }
}
