//! Integration tests for the taskflow-agent crate.
//!
//! No real provider is contacted; these tests pin down how transport
//! failures surface through the `TextGenerator` capability.

use std::sync::Arc;
use std::time::Duration;

use taskflow_agent::{AgentError, LlmClient, LlmClientConfig, TextGenerator};

fn unreachable_client() -> LlmClient {
    // Port 9 (discard) on loopback refuses connections on test machines.
    let config = LlmClientConfig::openai_compatible("test-key", "test-model", "http://127.0.0.1:9")
        .with_timeout(Duration::from_secs(2));
    LlmClient::new(config).unwrap()
}

#[tokio::test]
async fn transport_failure_is_an_error_not_a_canned_reply() {
    let client = unreachable_client();
    let err = client.generate("capital of France?").await.unwrap_err();
    assert!(matches!(err, AgentError::LlmRequestFailed { .. }));
}

#[tokio::test]
async fn client_is_usable_as_shared_trait_object() {
    let generator: Arc<dyn TextGenerator> = Arc::new(unreachable_client());
    assert!(generator.generate("hello").await.is_err());
}
