use crate::credentials::TokenPair;

use super::{Proxy, StreamDescriptor, VideoMetadata};

/// A video resolved by the extractor.
///
/// Keeps the access parameters used to resolve it such that its streams
/// are downloaded the same way.
#[derive(Debug, Clone)]
pub struct VideoHandle {
    pub url: String,
    pub proxy: Option<Proxy>,
    pub tokens: TokenPair,
    pub metadata: VideoMetadata,
    pub streams: Vec<StreamDescriptor>,
}

impl VideoHandle {
    pub fn id(&self) -> &str {
        &self.metadata.id
    }
}
