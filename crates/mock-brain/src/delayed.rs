//! Delayed brain implementation - wraps another brain with artificial delay.

use std::time::Duration;

use brain_core::{async_trait, Brain, BrainError, Reply, ReplyRequest};
use tokio::time::sleep;

/// A brain that wraps another brain and adds artificial delay.
///
/// Used to simulate provider latency and to exercise timeouts and
/// cancellation.
pub struct DelayedBrain<B: Brain> {
    inner: B,
    delay: Duration,
}

impl<B: Brain> DelayedBrain<B> {
    /// Create a new DelayedBrain wrapping the given brain with the specified delay.
    pub fn new(inner: B, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a brain with a delay in milliseconds.
    pub fn with_millis(inner: B, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<B: Brain> Brain for DelayedBrain<B> {
    async fn generate(&self, request: ReplyRequest) -> Result<Reply, BrainError> {
        sleep(self.delay).await;
        self.inner.generate(request).await
    }

    fn name(&self) -> &str {
        "DelayedBrain"
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }

    async fn shutdown(&self) -> Result<(), BrainError> {
        self.inner.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_request, EchoBrain};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_delayed_brain() {
        let brain = DelayedBrain::with_millis(EchoBrain::new(), 1200);

        let start = Instant::now();
        let reply = brain.generate(test_request("test")).await.unwrap();

        assert_eq!(reply.content, "test");
        assert!(start.elapsed() >= Duration::from_millis(1200));
    }

    #[tokio::test]
    async fn test_brain_name() {
        let brain = DelayedBrain::with_millis(EchoBrain::new(), 0);
        assert_eq!(brain.name(), "DelayedBrain");
    }
}
