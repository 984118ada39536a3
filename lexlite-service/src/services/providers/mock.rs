//! Mock provider for tests and local development.

use super::{GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Mock text provider.
///
/// Plays back a scripted queue of results first; once the queue is empty it
/// echoes a canned response. Every call is counted, including failed ones.
pub struct MockTextProvider {
    enabled: bool,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    params: Mutex<Vec<GenerationParams>>,
    delay: Duration,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// A provider that returns the given results in order.
    pub fn scripted(results: Vec<Result<String, ProviderError>>) -> Self {
        let provider = Self::new(true);
        if let Ok(mut script) = provider.script.lock() {
            script.extend(results);
        }
        provider
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of `generate` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Generation parameters received, in call order.
    pub fn params(&self) -> Vec<GenerationParams> {
        self.params.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Ok(mut recorded) = self.params.lock() {
            recorded.push(params.clone());
        }

        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        let text = match scripted {
            Some(result) => result?,
            None => format!("Mock response ({} chars of prompt)", prompt.chars().count()),
        };

        Ok(ProviderResponse {
            text,
            input_tokens: (prompt.len() / 4) as u32,
            output_tokens: 10,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}
