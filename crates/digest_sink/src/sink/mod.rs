use std::future::Future;

pub mod file;
pub mod gmail;

use crate::RenderedNewsletter;

pub trait DeliverySink {
    /// Deliver one rendered newsletter. `recipient` is the per-subscription
    /// address for mail-backed sinks; file-backed sinks ignore it.
    fn deliver(
        &self,
        newsletter: &RenderedNewsletter,
        recipient: Option<&str>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl<T: DeliverySink + Send + Sync> DeliverySink for &T {
    async fn deliver(
        &self,
        newsletter: &RenderedNewsletter,
        recipient: Option<&str>,
    ) -> anyhow::Result<()> {
        (**self).deliver(newsletter, recipient).await
    }
}
