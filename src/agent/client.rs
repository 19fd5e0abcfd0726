//! Agent client configuration

/// Default arguments put before the prompt: text output, print mode, no session
pub const DEFAULT_AGENT_ARGS: [&str; 4] = ["--mode", "text", "--print", "--no-session"];

/// Configuration for agent client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentClientConfig {
    /// Executable that generates text from a prompt
    pub command: String,

    /// Arguments passed before the prompt
    pub args: Vec<String>,

    /// Timeout for a single prompt in seconds
    pub timeout_secs: u64,
}

impl Default for AgentClientConfig {
    fn default() -> Self {
        Self {
            command: "pi".to_string(),
            args: DEFAULT_AGENT_ARGS.iter().map(|a| a.to_string()).collect(),
            timeout_secs: 600,
        }
    }
}

impl AgentClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
