mod handle;
mod metadata;
mod proxy;
mod stream;

pub use handle::VideoHandle;
pub use metadata::{MetadataRecord, VideoMetadata};
pub use proxy::Proxy;
pub use stream::{StreamDescriptor, StreamKind};
