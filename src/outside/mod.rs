mod command;
mod ffmpeg;
mod ytdl;

pub use ffmpeg::{Ffmpeg, StreamMuxer};
pub use ytdl::{VideoExtractor, Ytdl};
