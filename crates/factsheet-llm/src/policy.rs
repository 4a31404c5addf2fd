//! Call-site policy for LLM invocations
//!
//! Providers expose a blocking interface. Every call made by the pipeline
//! goes through [`invoke_structured`], which runs the provider on the
//! blocking pool, bounds each attempt with a timeout and retries transient
//! failures with exponential backoff (base, 2x base, 4x base, ...).
//!
//! A timed-out attempt is abandoned, not cancelled: the blocking task keeps
//! running until the provider returns, but its result is discarded.

use crate::LlmError;
use factsheet_domain::traits::LlmProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Timeout and retry settings for one kind of LLM call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallPolicy {
    /// Deadline for a single attempt (seconds)
    pub timeout_secs: u64,

    /// Total attempts including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds); doubles afterwards
    pub backoff_base_ms: u64,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_attempts: 3,
            backoff_base_ms: 500,
        }
    }
}

impl CallPolicy {
    /// Get the per-attempt timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << exponent))
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Run one structured generation with timeout and retry
///
/// Returns the raw model text on success. Permanent errors are returned
/// immediately; transient ones (communication, rate limit, timeout) are
/// retried until `max_attempts` is exhausted, after which the last error
/// is returned.
pub async fn invoke_structured<L>(
    llm: &Arc<L>,
    prompt: &str,
    schema: &str,
    policy: &CallPolicy,
) -> Result<String, LlmError>
where
    L: LlmProvider<Error = LlmError> + Send + Sync + 'static,
{
    retry(policy, "generate", || {
        let llm = Arc::clone(llm);
        let prompt = prompt.to_string();
        let schema = schema.to_string();
        move || llm.generate_structured(&prompt, &schema)
    })
    .await
}

/// Check provider reachability with the same timeout and retry rules
pub async fn check_health<L>(llm: &Arc<L>, policy: &CallPolicy) -> Result<(), LlmError>
where
    L: LlmProvider<Error = LlmError> + Send + Sync + 'static,
{
    retry(policy, "health_check", || {
        let llm = Arc::clone(llm);
        move || llm.health_check()
    })
    .await
}

async fn retry<T, F, C>(policy: &CallPolicy, operation: &str, mut make_call: F) -> Result<T, LlmError>
where
    T: Send + 'static,
    F: FnMut() -> C,
    C: FnOnce() -> Result<T, LlmError> + Send + 'static,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let call = tokio::task::spawn_blocking(make_call());

        let error = match timeout(policy.timeout(), call).await {
            Ok(Ok(Ok(value))) => {
                debug!(operation, attempt, "LLM call succeeded");
                return Ok(value);
            }
            Ok(Ok(Err(e))) => e,
            Ok(Err(join_error)) => LlmError::Other(format!("Task join error: {}", join_error)),
            Err(_) => LlmError::Timeout(policy.timeout()),
        };

        if !error.is_transient() || attempt >= max_attempts {
            return Err(error);
        }

        let delay = policy.backoff(attempt);
        warn!(
            operation,
            attempt,
            max_attempts,
            error = %error,
            "Transient LLM failure, retrying in {:?}",
            delay
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy() -> CallPolicy {
        CallPolicy {
            timeout_secs: 5,
            max_attempts: 3,
            backoff_base_ms: 1,
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = CallPolicy {
            backoff_base_ms: 100,
            ..CallPolicy::default()
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_default_policy_is_valid() {
        assert!(CallPolicy::default().validate().is_ok());
        let invalid = CallPolicy {
            max_attempts: 0,
            ..CallPolicy::default()
        };
        assert!(invalid.validate().is_err());
    }

    #[tokio::test]
    async fn test_invoke_returns_response() {
        let llm = Arc::new(MockProvider::new("[]"));
        let text = invoke_structured(&llm, "prompt", "{}", &fast_policy()).await.unwrap();
        assert_eq!(text, "[]");
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_until_exhausted() {
        let mut mock = MockProvider::new("[]");
        mock.add_transient_error_containing("flaky");
        let llm = Arc::new(mock);

        let result = invoke_structured(&llm, "flaky prompt", "{}", &fast_policy()).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let mut mock = MockProvider::new("[]");
        mock.add_error("bad");
        let llm = Arc::new(mock);

        let result = invoke_structured(&llm, "bad", "{}", &fast_policy()).await;
        assert!(matches!(result, Err(LlmError::Other(_))));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let llm = Arc::new(MockProvider::new("[]").with_delay(Duration::from_millis(1500)));
        let policy = CallPolicy {
            timeout_secs: 1,
            max_attempts: 1,
            backoff_base_ms: 1,
        };

        let result = invoke_structured(&llm, "slow", "{}", &policy).await;
        assert!(matches!(result, Err(LlmError::Timeout(_))));
    }

    struct CrashingProvider {
        calls: AtomicUsize,
    }

    impl LlmProvider for CrashingProvider {
        type Error = LlmError;

        fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("provider crashed");
        }

        fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, LlmError> {
            self.generate(prompt)
        }
    }

    #[tokio::test]
    async fn test_provider_panic_is_an_error() {
        let llm = Arc::new(CrashingProvider {
            calls: AtomicUsize::new(0),
        });

        let result = invoke_structured(&llm, "prompt", "{}", &fast_policy()).await;

        assert!(matches!(result, Err(LlmError::Other(ref msg)) if msg.contains("join error")));
        // Not transient, so not retried
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_health_check() {
        let healthy = Arc::new(MockProvider::default());
        assert!(check_health(&healthy, &fast_policy()).await.is_ok());

        let down = Arc::new(MockProvider::default().unreachable());
        assert!(check_health(&down, &fast_policy()).await.is_err());
    }
}
