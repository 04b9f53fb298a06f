use tracing::{debug, error, info};

use crate::{
    credentials::CredentialStore,
    outside::VideoExtractor,
    result::Error,
    types::VideoHandle,
};

/// Resolve video URLs through a random proxy with the stored tokens
#[derive(Debug)]
pub struct VideoResolver<'a> {
    extractor: &'a dyn VideoExtractor,
    credentials: &'a CredentialStore,
}

impl<'a> VideoResolver<'a> {
    pub fn new(extractor: &'a dyn VideoExtractor, credentials: &'a CredentialStore) -> Self {
        Self {
            extractor,
            credentials,
        }
    }

    /// Resolve the URL, logging any failure and returning `None` instead
    pub fn resolve(&self, url: &str) -> Option<VideoHandle> {
        let proxy = self.credentials.random_proxy();
        match proxy {
            Some(proxy) => debug!("Resolving through proxy {proxy}"),
            None => debug!("Resolving without proxy"),
        }

        match self.extractor.extract(url, proxy, self.credentials) {
            Ok(handle) => {
                info!(
                    "Resolved '{}' ({} streams available)",
                    handle.metadata.title,
                    handle.streams.len()
                );
                debug!("Metadata: {}", handle.metadata);
                Some(handle)
            }
            Err(Error::UnavailableStream) => {
                error!("Video {url} is unavailable");
                None
            }
            Err(err) => {
                error!("Could not resolve video {url}: {err}");
                None
            }
        }
    }
}
