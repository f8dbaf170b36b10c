use crate::ContentType;
use std::fmt;

/// An error that can occur when decoding or encoding a save
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    pub(crate) fn end_of_buffer(offset: usize, needed: usize) -> Error {
        Error::new(ErrorKind::EndOfBuffer { offset, needed })
    }

    pub(crate) fn out_of_range<T: fmt::Display>(value: T, wire: &'static str) -> Error {
        Error::new(ErrorKind::OutOfRange {
            value: value.to_string(),
            wire,
        })
    }

    pub(crate) fn unsupported(kind: Unsupported) -> Error {
        Error::new(ErrorKind::UnsupportedVariant(kind))
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Consume the error and return the specific type of error
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns the byte offset that the error occurs (if available)
    pub fn offset(&self) -> Option<usize> {
        self.0.offset()
    }
}

/// Specific type of error
#[derive(Debug)]
pub enum ErrorKind {
    /// A read needed more bytes than remain in the buffer
    EndOfBuffer { offset: usize, needed: usize },

    /// A value does not fit the width it is written with
    OutOfRange { value: String, wire: &'static str },

    /// The first four bytes were not `MSAV`
    BadMagic { found: [u8; 4] },

    /// The data references something the codec has no shape for
    UnsupportedVariant(Unsupported),

    /// A chunk body consumed a different number of bytes than its prefix declared
    ChunkLengthMismatch {
        offset: usize,
        declared: i64,
        actual: usize,
    },

    /// A run length reaches past the last tile of the map
    MapOverrun { index: usize, run: u8, size: usize },

    /// The number of tiles does not agree with the map dimensions
    MapSize { expected: usize, actual: usize },

    /// A well known meta entry is missing or could not be parsed
    InvalidMeta { key: String, value: Option<String> },

    /// A relaxed json meta entry could not be parsed
    Json(serde_json::Error),

    /// An IO error from the compression layer
    Io(std::io::Error),
}

impl ErrorKind {
    pub fn offset(&self) -> Option<usize> {
        match *self {
            ErrorKind::EndOfBuffer { offset, .. } => Some(offset),
            ErrorKind::ChunkLengthMismatch { offset, .. } => Some(offset),
            _ => None,
        }
    }
}

/// The reasons a piece of data is rejected as an unsupported variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    /// An id with no entry in the file's content header
    UnresolvedContent { category: ContentType, id: i32 },

    /// A block name that the variant table does not know
    UnknownBlock { id: i16, name: String },

    /// A content category outside of the known twelve
    UnknownCategory(u8),

    /// An actor type id without a payload shape
    UnknownActor(u8),

    /// An actor payload that does not belong to its type id
    ActorMismatch { type_id: u8 },

    /// A block revision whose extra payload is not implemented
    Revision { block: &'static str, version: u8 },

    /// A block state whose shape disagrees with its block kind
    BlockShape { block: &'static str },

    /// A non terrain tile without a block state
    MissingBlockState { id: i16, name: &'static str },

    /// A terrain tile that carries a block state
    TerrainBlockState { id: i16 },
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Unsupported::UnresolvedContent { category, id } => {
                write!(f, "{} id {} is not in the content header", category.name(), id)
            }
            Unsupported::UnknownBlock { id, name } => {
                write!(f, "block {} ({}) is not mapped", name, id)
            }
            Unsupported::UnknownCategory(x) => write!(f, "unknown content category: {}", x),
            Unsupported::UnknownActor(x) => write!(f, "unknown actor type: {}", x),
            Unsupported::ActorMismatch { type_id } => {
                write!(f, "actor payload does not match type id {}", type_id)
            }
            Unsupported::Revision { block, version } => {
                write!(f, "{} revision {} is not implemented", block, version)
            }
            Unsupported::BlockShape { block } => {
                write!(f, "block state does not match the layout of {}", block)
            }
            Unsupported::MissingBlockState { id, name } => {
                write!(f, "block {} ({}) requires a block state", name, id)
            }
            Unsupported::TerrainBlockState { id } => {
                write!(f, "terrain block {} cannot carry a block state", id)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self.0 {
            ErrorKind::Json(ref err) => Some(err),
            ErrorKind::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::EndOfBuffer { offset, needed } => write!(
                f,
                "unexpected end of buffer (offset: {}, needed: {} bytes)",
                offset, needed
            ),
            ErrorKind::OutOfRange { ref value, wire } => {
                write!(f, "value {} does not fit in {}", value, wire)
            }
            ErrorKind::BadMagic { found } => write!(
                f,
                "incorrect header, expected MSAV but found {}",
                String::from_utf8_lossy(&found)
            ),
            ErrorKind::UnsupportedVariant(ref kind) => write!(f, "unsupported variant: {}", kind),
            ErrorKind::ChunkLengthMismatch {
                offset,
                declared,
                actual,
            } => write!(
                f,
                "read length mismatch in region at {}, expected: {}, actual: {}",
                offset, declared, actual
            ),
            ErrorKind::MapOverrun { index, run, size } => write!(
                f,
                "run of {} at tile {} overruns a map of {} tiles",
                run, index, size
            ),
            ErrorKind::MapSize { expected, actual } => write!(
                f,
                "map dimensions call for {} tiles but {} were given",
                expected, actual
            ),
            ErrorKind::InvalidMeta { ref key, value: None } => {
                write!(f, "meta entry {} is missing", key)
            }
            ErrorKind::InvalidMeta {
                ref key,
                value: Some(ref value),
            } => write!(f, "meta entry {} has an invalid value: {}", key, value),
            ErrorKind::Json(ref err) => write!(f, "relaxed json error: {}", err),
            ErrorKind::Io(ref err) => write!(f, "io error: {}", err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::new(ErrorKind::Json(error))
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(error))
    }
}

impl From<Unsupported> for Error {
    fn from(kind: Unsupported) -> Self {
        Error::unsupported(kind)
    }
}
