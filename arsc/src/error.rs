use crate::res::ResId;

/// Failures raised while walking a resource table.
///
/// Structural variants carry the absolute byte offset into the decoded
/// buffer at which the problem was detected.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("truncated input at {offset:#x}: wanted {wanted} bytes, {remaining} remaining")]
    TruncatedInput {
        offset: usize,
        wanted: usize,
        remaining: usize,
    },

    #[error("unexpected chunk at {offset:#x}: expected {expected:#06x}, found {found:#06x}")]
    UnexpectedChunk {
        offset: usize,
        expected: u16,
        found: u16,
    },

    #[error("invalid chunk at {offset:#x}: {reason}")]
    InvalidChunk { offset: usize, reason: String },

    #[error("invalid config at {offset:#x}: size {size} is below the minimum of 28")]
    InvalidConfig { offset: usize, size: u32 },

    #[error("oversized config at {offset:#x}: size {size}, only 32 bytes are understood")]
    OversizedConfig { offset: usize, size: u32 },

    #[error("invalid qualifier `{0}`")]
    InvalidQualifier(String),

    #[error("malformed string pool at {offset:#x}: {reason}")]
    MalformedStringPool { offset: usize, reason: String },

    #[error("string at {offset:#x} is neither valid UTF-8, UTF-16 nor CESU-8")]
    UnsupportedEncoding { offset: usize },

    #[error("invalid value at {offset:#x}: {reason}")]
    InvalidValue { offset: usize, reason: String },

    #[error("package id {id:#04x} is declared twice")]
    DuplicatePackage { id: u8 },

    #[error("resource {id} already has a value for config `{qualifiers}`")]
    DuplicateResource { id: ResId, qualifiers: String },

    #[error("unmodelled chunk {ty:#06x} at {offset:#x}")]
    UnknownChunk { offset: usize, ty: u16 },

    #[error("`resources.arsc` not found in archive")]
    MissingTable,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Options(#[from] serde_yaml::Error),
}

impl DecodeError {
    /// Byte offset the error refers to, if it is positional.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::TruncatedInput { offset, .. }
            | Self::UnexpectedChunk { offset, .. }
            | Self::InvalidChunk { offset, .. }
            | Self::InvalidConfig { offset, .. }
            | Self::OversizedConfig { offset, .. }
            | Self::MalformedStringPool { offset, .. }
            | Self::UnsupportedEncoding { offset }
            | Self::InvalidValue { offset, .. }
            | Self::UnknownChunk { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;
