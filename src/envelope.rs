//! Saves are stored on disk as a zlib stream wrapped around the MSAV bytes.

use crate::{Error, SaveDocument};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use std::io::{Read, Write};

/// Inflate a zlib compressed save into its MSAV bytes
pub fn inflate(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut reader = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 4);
    reader.read_to_end(&mut out)?;
    log::debug!("inflated {} bytes into {}", data.len(), out.len());
    Ok(out)
}

/// Deflate MSAV bytes into a zlib stream
pub fn deflate(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut writer = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    writer.write_all(data)?;
    Ok(writer.finish()?)
}

impl SaveDocument {
    /// Decode a save as it is stored on disk
    pub fn from_compressed(data: &[u8]) -> Result<Self, Error> {
        let inflated = inflate(data)?;
        SaveDocument::decode(&inflated)
    }

    /// Encode the save in the form it is stored on disk
    pub fn to_compressed(&self) -> Result<Vec<u8>, Error> {
        let data = self.encode()?;
        deflate(&data)
    }
}
