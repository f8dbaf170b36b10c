use crate::{ByteCursor, Error, ErrorKind};

/// Width of the length that precedes a framed region
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LengthPrefix {
    /// Unsigned 16 bit length used by block records and actors
    Short,

    /// Signed 32 bit length used by the top level sections
    Long,
}

impl LengthPrefix {
    #[inline]
    pub fn width(&self) -> usize {
        match self {
            LengthPrefix::Short => 2,
            LengthPrefix::Long => 4,
        }
    }
}

/// Customize how decoding reacts when a chunk body consumes a different
/// number of bytes than its prefix declared
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum LengthMismatchStrategy {
    /// Stop decoding and return a
    /// [`ChunkLengthMismatch`](crate::ErrorKind::ChunkLengthMismatch)
    #[default]
    Error,

    /// Log a warning and continue after the declared end of the chunk
    Realign,
}

impl ByteCursor {
    /// Read a length prefix and decode the region it frames with `body`.
    ///
    /// ```
    /// use msav::{ByteCursor, LengthPrefix};
    ///
    /// let mut cursor = ByteCursor::from_vec(vec![0x00, 0x02, 0x01, 0xf4]);
    /// let value = cursor.read_chunk(LengthPrefix::Short, |c| c.read_i16())?;
    /// assert_eq!(value, 500);
    /// # Ok::<(), msav::Error>(())
    /// ```
    pub fn read_chunk<R, F>(&mut self, prefix: LengthPrefix, body: F) -> Result<R, Error>
    where
        F: FnOnce(&mut ByteCursor) -> Result<R, Error>,
    {
        let declared = match prefix {
            LengthPrefix::Short => i64::from(self.read_u16()?),
            LengthPrefix::Long => i64::from(self.read_i32()?),
        };

        let start = self.position();
        log::trace!("chunk at {} declares {} bytes", start, declared);
        let result = body(self)?;
        let actual = self.position() - start;
        if i64::try_from(actual).map_or(true, |x| x != declared) {
            match self.mismatch {
                LengthMismatchStrategy::Error => {
                    return Err(Error::new(ErrorKind::ChunkLengthMismatch {
                        offset: start,
                        declared,
                        actual,
                    }));
                }
                LengthMismatchStrategy::Realign => {
                    log::warn!(
                        "read length mismatch in region at {}, expected: {}, actual: {}",
                        start,
                        declared,
                        actual
                    );

                    let end = usize::try_from(declared)
                        .ok()
                        .and_then(|x| x.checked_add(start))
                        .ok_or_else(|| Error::out_of_range(declared, "chunk length"))?;
                    self.seek(end)?;
                }
            }
        }

        Ok(result)
    }

    /// Write a region with `body` and precede it with its length.
    ///
    /// The prefix is written as a placeholder and patched once the body is
    /// done, so a body that is too long for a short prefix fails with
    /// [`OutOfRange`](crate::ErrorKind::OutOfRange).
    pub fn write_chunk<F>(&mut self, prefix: LengthPrefix, body: F) -> Result<(), Error>
    where
        F: FnOnce(&mut ByteCursor) -> Result<(), Error>,
    {
        let at = self.len();
        match prefix {
            LengthPrefix::Short => self.write_u16(0)?,
            LengthPrefix::Long => self.write_i32(0)?,
        }

        body(self)?;
        let written = self.len() - at - prefix.width();
        match prefix {
            LengthPrefix::Short => self.patch_u16(at, written),
            LengthPrefix::Long => self.patch_i32(at, written),
        }
    }
}
