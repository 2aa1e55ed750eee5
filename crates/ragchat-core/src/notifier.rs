//! Notification side-channel trait

use async_trait::async_trait;

use crate::Result;

/// Best-effort sink that receives every completed question/answer pair
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_name: &str, question: &str, answer: &str) -> Result<()>;
}

/// Notifier used when no side-channel is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _user_name: &str, _question: &str, _answer: &str) -> Result<()> {
        Ok(())
    }
}
