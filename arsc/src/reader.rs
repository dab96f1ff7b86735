use crate::error::{DecodeError, Result};
use crate::res::{ChunkType, ResChunkHeader};
use byteorder::{ByteOrder, LittleEndian};
use std::marker::PhantomData;

/// Positional cursor over an in-memory buffer.
///
/// Every read checks the remaining length before touching the buffer and
/// fails with [`DecodeError::TruncatedInput`] instead of reading short.
#[derive(Clone, Debug)]
pub struct ChunkReader<'a, E: ByteOrder = LittleEndian> {
    data: &'a [u8],
    pos: usize,
    _order: PhantomData<E>,
}

impl<'a, E: ByteOrder> ChunkReader<'a, E> {
    pub fn with_order(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            _order: PhantomData,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn truncated(&self, wanted: usize) -> DecodeError {
        DecodeError::TruncatedInput {
            offset: self.pos,
            wanted,
            remaining: self.remaining(),
        }
    }

    /// Moves to an absolute position; the end of the buffer is a valid target.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(DecodeError::TruncatedInput {
                offset: self.pos,
                wanted: pos.saturating_sub(self.pos),
                remaining: self.remaining(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// A reader over the same buffer cut at `end`, at the same position.
    /// Offsets stay absolute, so errors point into the whole buffer.
    pub fn bounded(&self, end: usize) -> Result<Self> {
        if end > self.data.len() {
            return Err(self.truncated(end.saturating_sub(self.pos)));
        }
        Ok(Self {
            data: &self.data[..end],
            pos: self.pos.min(end),
            _order: PhantomData,
        })
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(self.truncated(n));
        }
        self.pos += n;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(self.truncated(n));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(E::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(E::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(E::read_i32(self.read_bytes(4)?))
    }

    pub fn read_int_array(&mut self, count: usize) -> Result<Vec<i32>> {
        let wanted = count.checked_mul(4).ok_or_else(|| self.truncated(usize::MAX))?;
        let bytes = self.read_bytes(wanted)?;
        let mut ints = vec![0; count];
        E::read_i32_into(bytes, &mut ints);
        Ok(ints)
    }

    pub fn read_u32_array(&mut self, count: usize) -> Result<Vec<u32>> {
        let wanted = count.checked_mul(4).ok_or_else(|| self.truncated(usize::MAX))?;
        let bytes = self.read_bytes(wanted)?;
        let mut ints = vec![0; count];
        E::read_u32_into(bytes, &mut ints);
        Ok(ints)
    }

    /// Reads up to `count` words but stops as soon as the cursor reaches
    /// `bound`. Entries that were not read stay zero; the returned flag tells
    /// whether the array was cut short.
    pub fn read_bounded_u32_array(&mut self, count: usize, bound: usize) -> Result<(Vec<u32>, bool)> {
        let mut ints = vec![0; count];
        for (i, int) in ints.iter_mut().enumerate() {
            if self.pos >= bound {
                tracing::trace!("offset table cut at entry {i} of {count} by bound {bound:#x}");
                return Ok((ints, true));
            }
            *int = self.read_u32()?;
        }
        Ok((ints, false))
    }
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_order(data)
    }

    /// Reads and validates the header of the chunk starting at the cursor.
    pub fn read_chunk(&mut self) -> Result<Chunk> {
        let start = self.pos;
        let header = ResChunkHeader::read(self)?;
        let header_size = header.header_size as usize;
        let size = header.size as usize;
        if header_size < ResChunkHeader::SIZE || header_size > size {
            return Err(DecodeError::InvalidChunk {
                offset: start,
                reason: format!(
                    "header size {header_size} outside of [8, {size}] for chunk {:#06x}",
                    header.ty
                ),
            });
        }
        if size > self.data.len() - start {
            return Err(DecodeError::TruncatedInput {
                offset: start,
                wanted: size,
                remaining: self.data.len() - start,
            });
        }
        Ok(Chunk { start, header })
    }

    /// Reads a chunk header and fails unless it has the expected type.
    pub fn expect_chunk(&mut self, expected: ChunkType) -> Result<Chunk> {
        let chunk = self.read_chunk()?;
        chunk.expect(expected)?;
        Ok(chunk)
    }

    /// Reads the next chunk header without consuming it.
    pub fn peek_chunk(&mut self) -> Result<Chunk> {
        let pos = self.pos;
        let chunk = self.read_chunk();
        self.pos = pos;
        chunk
    }
}

/// A validated chunk header together with its absolute position.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Chunk {
    pub start: usize,
    pub header: ResChunkHeader,
}

impl Chunk {
    pub fn ty(&self) -> Option<ChunkType> {
        ChunkType::from_u16(self.header.ty)
    }

    pub fn header_end(&self) -> usize {
        self.start + self.header.header_size as usize
    }

    pub fn end(&self) -> usize {
        self.start + self.header.size as usize
    }

    pub fn expect(&self, expected: ChunkType) -> Result<()> {
        if self.header.ty != expected as u16 {
            return Err(DecodeError::UnexpectedChunk {
                offset: self.start,
                expected: expected as u16,
                found: self.header.ty,
            });
        }
        Ok(())
    }
}
