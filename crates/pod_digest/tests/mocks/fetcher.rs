use pod_digest::feed::FeedFetcher;

#[derive(Clone)]
pub struct MockFeedFetcher {
    pub xml: String,
    pub fail_with: Option<String>,
    pub fail_for_url: Option<String>,
}

impl MockFeedFetcher {
    pub fn new(xml: String) -> Self {
        Self {
            xml,
            fail_with: None,
            fail_for_url: None,
        }
    }

    pub fn from_fixture() -> Self {
        Self::new(include_str!("../fixtures/feed.xml").to_string())
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            xml: String::new(),
            fail_with: Some(msg.to_string()),
            fail_for_url: None,
        }
    }

    pub fn failing_for_url(mut self, url: &str) -> Self {
        self.fail_for_url = Some(url.to_string());
        self
    }
}

impl FeedFetcher for MockFeedFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        if self.fail_for_url.as_deref() == Some(url) {
            return Err(anyhow::anyhow!("Feed unreachable: {}", url));
        }
        Ok(self.xml.clone())
    }
}
