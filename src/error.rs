use std::fmt;

use crate::pixel_format::PixelFormat;

/// Result alias used throughout the driver
pub type Result<T, E = StripError> = std::result::Result<T, E>;

/// Step of the hardware handshake that a collaborator failed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareOp {
    CreateChannel,
    CreateEncoder,
    Enable,
    Transmit,
    WaitDone,
    Disable,
    DeleteChannel,
    DeleteEncoder,
}

impl fmt::Display for HardwareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let str = match self {
            Self::CreateChannel => "create transmit channel",
            Self::CreateEncoder => "create strip encoder",
            Self::Enable => "enable channel",
            Self::Transmit => "transmit",
            Self::WaitDone => "wait for transmit done",
            Self::Disable => "disable channel",
            Self::DeleteChannel => "delete transmit channel",
            Self::DeleteEncoder => "delete strip encoder",
        };
        write!(f, "{}", str)
    }
}

/// Failure reported by a transmit channel or encoder
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    #[error("timed out")]
    Timeout,
    #[error("cancelled")]
    Cancelled,
    #[error("{0}")]
    Device(String),
    #[error(transparent)]
    Serial(#[from] serialport::Error),
}

/// Coarse classification of a [`StripError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    OutOfMemory,
    HardwareFailure,
    UnsupportedFormat,
}

/// Errors returned by strip operations
#[derive(Debug, thiserror::Error)]
pub enum StripError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("no memory for {bytes} byte pixel buffer")]
    OutOfMemory { bytes: usize },
    #[error("{op} failed: {source}")]
    Hardware {
        op: HardwareOp,
        #[source]
        source: HardwareError,
    },
    #[error("unsupported pixel format {0:?}")]
    UnsupportedFormat(PixelFormat),
    #[error("channel left in an unknown state by a failed disable")]
    Faulted,
}

impl StripError {
    pub(crate) fn hardware(op: HardwareOp, source: HardwareError) -> Self {
        Self::Hardware { op, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Self::Hardware { .. } | Self::Faulted => ErrorKind::HardwareFailure,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
        }
    }
}
