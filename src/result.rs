use std::fmt::{Debug, Display};

use miette::miette;

use crate::types::StreamKind;

#[derive(Debug)]
pub enum Error {
    /// The extractor reported the video as unavailable
    UnavailableStream,

    /// The video does not offer any adaptive stream of the given kind
    NoStream(StreamKind),

    /// An external program did run but returned a failure status
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    Miette(miette::Report),
}

impl From<miette::Report> for Error {
    fn from(err: miette::Report) -> Self {
        Error::Miette(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Miette(miette::Report::msg(err.to_string()))
    }
}

impl From<Error> for miette::Report {
    fn from(err: Error) -> Self {
        match err {
            Error::Miette(err) => err,
            err => miette!("{err}"),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnavailableStream => write!(f, "Unavailable stream"),
            Error::NoStream(kind) => write!(f, "No adaptive {kind} stream available"),
            Error::CommandFailed {
                program,
                code,
                stderr,
            } => {
                match code {
                    Some(code) => write!(f, "{program} exited with status {code}")?,
                    None => write!(f, "{program} was terminated by a signal")?,
                }
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
            Error::Miette(report) => {
                write!(f, "{report}")?;
                for cause in report.chain().skip(1) {
                    write!(f, ": {cause}")?;
                }
                Ok(())
            }
        }
    }
}

impl Error {
    pub fn wrap_err_with<D, F>(self, f: F) -> Error
    where
        D: Display + Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        match self {
            Error::Miette(report) => Error::Miette(report.wrap_err(f())),
            err => err,
        }
    }
}

pub fn err_msg<M>(msg: M) -> Error
where
    M: Display + Debug + Send + Sync + 'static,
{
    Error::Miette(miette::Report::msg(msg))
}

pub fn bail<T, M>(msg: M) -> Result<T>
where
    M: Display + Debug + Send + Sync + 'static,
{
    Err(err_msg(msg))
}

pub type Result<T> = std::result::Result<T, Error>;
