use std::io;
use thiserror::Error;

/// Broad category of a decode failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// The input ran out before the stream was complete.
    Truncation,
    /// The bitstream violates the DEFLATE grammar.
    Structural,
    /// The caller's output buffer is too small.
    Capacity,
    /// The zlib header is malformed or asks for something unsupported.
    Envelope,
    /// The trailer checksum does not match the decoded bytes.
    Integrity,
}

#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InflateError {
    #[error("input ended before the stream was complete")]
    ShortInput,

    #[error("byte alignment rewound past the start of input")]
    CursorUnderflow,

    #[error("reserved block type")]
    ReservedBlockType,

    #[error("invalid Huffman code lengths")]
    BadHuffmanTable,

    #[error("literal/length code has no end-of-block symbol")]
    MissingEndOfBlock,

    #[error("bit pattern does not decode to a valid symbol")]
    InvalidCode,

    #[error("stored block length {len:#06x} does not match complement {nlen:#06x}")]
    StoredLengthMismatch { len: u16, nlen: u16 },

    #[error("repeat code with no previous code length")]
    RepeatWithoutPrevious,

    #[error("code length repeat overruns the declared symbol count")]
    LengthsOverrun,

    #[error("distance {distance} reaches before start of output ({produced} bytes written)")]
    DistanceTooFarBack { distance: usize, produced: usize },

    #[error("output buffer exhausted")]
    OutputExhausted,

    #[error("zlib header check bits are invalid")]
    BadHeaderChecksum,

    #[error("unsupported compression method {0}")]
    UnsupportedMethod(u8),

    #[error("unsupported window size (CINFO {0})")]
    UnsupportedWindow(u8),

    #[error("preset dictionaries are not supported")]
    PresetDictionary,

    #[error("adler32 mismatch: trailer {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { expected: u32, computed: u32 },
}

impl InflateError {
    pub fn class(&self) -> ErrorClass {
        match self {
            InflateError::ShortInput | InflateError::CursorUnderflow => ErrorClass::Truncation,
            InflateError::OutputExhausted => ErrorClass::Capacity,
            InflateError::BadHeaderChecksum
            | InflateError::UnsupportedMethod(_)
            | InflateError::UnsupportedWindow(_)
            | InflateError::PresetDictionary => ErrorClass::Envelope,
            InflateError::ChecksumMismatch { .. } => ErrorClass::Integrity,
            _ => ErrorClass::Structural,
        }
    }
}

impl From<InflateError> for io::Error {
    fn from(err: InflateError) -> Self {
        let kind = match err.class() {
            ErrorClass::Truncation => io::ErrorKind::UnexpectedEof,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}

pub type InflateResult<T> = Result<T, InflateError>;
