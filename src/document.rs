use crate::{
    ByteCursor, ContentRegistry, Entities, Error, ErrorKind, LengthMismatchStrategy, LengthPrefix,
    Meta, TileMap,
};
use serde::{Deserialize, Serialize};

/// Leading bytes of every save
pub const MAGIC: [u8; 4] = *b"MSAV";

/// Capacity set aside for an encode when not otherwise configured
pub const DEFAULT_RESERVE: usize = 0xFF_FFFF;

/// A decoded save
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDocument {
    /// Format revision
    pub version: i32,
    pub meta: Meta,
    pub content: ContentRegistry,
    pub map: TileMap,
    pub entities: Entities,
}

impl SaveDocument {
    /// Decode a save with the default options
    ///
    /// ```
    /// use msav::{ErrorKind, SaveDocument};
    ///
    /// let err = SaveDocument::decode(b"MSAX\x00\x00\x00\x01").unwrap_err();
    /// assert!(matches!(err.kind(), ErrorKind::BadMagic { found } if found == b"MSAX"));
    /// ```
    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        DecodeOptions::new().decode(data)
    }

    /// Encode the save with the default options
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        EncodeOptions::new().encode(self)
    }
}

/// Customize how a save is decoded
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    length_mismatch: LengthMismatchStrategy,
}

impl DecodeOptions {
    pub fn new() -> Self {
        DecodeOptions::default()
    }

    /// Set the reaction to a chunk that is not fully consumed or is overrun
    pub fn length_mismatch(&mut self, strategy: LengthMismatchStrategy) -> &mut Self {
        self.length_mismatch = strategy;
        self
    }

    pub fn decode(&self, data: &[u8]) -> Result<SaveDocument, Error> {
        let mut cursor = ByteCursor::new().with_length_mismatch(self.length_mismatch);
        cursor.set_buffer(data.to_vec());
        cursor.reset();

        let found = cursor.read_array::<4>()?;
        if found != MAGIC {
            return Err(Error::new(ErrorKind::BadMagic { found }));
        }

        let version = cursor.read_i32()?;
        log::debug!("decoding save version {}", version);

        let meta = cursor.read_chunk(LengthPrefix::Long, Meta::read)?;
        let content = cursor.read_chunk(LengthPrefix::Long, ContentRegistry::read)?;
        let map = cursor.read_chunk(LengthPrefix::Long, |c| TileMap::read(c, &content))?;
        let entities = cursor.read_chunk(LengthPrefix::Long, |c| Entities::read(c, &content))?;

        if cursor.remaining() != 0 {
            log::debug!("{} trailing bytes after entities", cursor.remaining());
        }

        Ok(SaveDocument {
            version,
            meta,
            content,
            map,
            entities,
        })
    }
}

/// Customize how a save is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    reserve: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions::new()
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        EncodeOptions {
            reserve: DEFAULT_RESERVE,
        }
    }

    /// Set the number of bytes to allocate up front
    pub fn reserve(&mut self, reserve: usize) -> &mut Self {
        self.reserve = reserve;
        self
    }

    pub fn encode(&self, doc: &SaveDocument) -> Result<Vec<u8>, Error> {
        let mut cursor = ByteCursor::new();
        cursor.clear(self.reserve);
        cursor.write_bytes(&MAGIC);
        cursor.write_i32(doc.version)?;

        cursor.write_chunk(LengthPrefix::Long, |c| doc.meta.write(c))?;
        cursor.write_chunk(LengthPrefix::Long, |c| doc.content.write(c))?;
        cursor.write_chunk(LengthPrefix::Long, |c| doc.map.write(c, &doc.content))?;
        cursor.write_chunk(LengthPrefix::Long, |c| doc.entities.write(c, &doc.content))?;
        log::debug!("encoded save of {} bytes", cursor.len());

        let mut data = cursor.into_inner();
        data.shrink_to_fit();
        Ok(data)
    }
}
