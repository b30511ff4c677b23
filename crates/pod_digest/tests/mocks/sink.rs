use std::sync::{Arc, Mutex};

use digest_sink::{DeliverySink, RenderedNewsletter};

#[derive(Clone)]
pub struct MockSink {
    pub delivered: Arc<Mutex<Vec<(RenderedNewsletter, Option<String>)>>>,
    pub fail_with: Option<String>,
}

impl Default for MockSink {
    fn default() -> Self {
        Self {
            delivered: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }
}

impl MockSink {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl DeliverySink for MockSink {
    async fn deliver(
        &self,
        newsletter: &RenderedNewsletter,
        recipient: Option<&str>,
    ) -> anyhow::Result<()> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((newsletter.clone(), recipient.map(String::from)));
        Ok(())
    }
}
