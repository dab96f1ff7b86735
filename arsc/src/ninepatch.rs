//! Metadata chunks that aapt embeds in compiled nine-patch PNGs.
use crate::error::Result;
use crate::reader::ChunkReader;
use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

/// `npTc`, stretch regions and padding.
pub const NINE_PATCH: u32 = 0x6e70_5463;
/// `npLb`, optical layout bounds.
pub const LAYOUT_BOUNDS: u32 = 0x6e70_4c62;

const PNG_SIGNATURE_LEN: usize = 8;

/// Walks the chunks of a PNG and returns a reader over the data of the first
/// chunk tagged `magic`.
pub fn find_chunk(png: &[u8], magic: u32) -> Result<Option<ChunkReader<'_, BigEndian>>> {
    let mut r = ChunkReader::<BigEndian>::with_order(png);
    r.skip(PNG_SIGNATURE_LEN)?;
    while r.remaining() >= 8 {
        let size = r.read_u32()? as usize;
        let tag = r.read_u32()?;
        if tag == magic {
            let end = r.position().saturating_add(size).min(png.len());
            return Ok(Some(ChunkReader::with_order(&png[r.position()..end])));
        }
        // data and crc
        r.skip(size.saturating_add(4))?;
    }
    Ok(None)
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NinePatch {
    pub padding_left: i32,
    pub padding_right: i32,
    pub padding_top: i32,
    pub padding_bottom: i32,
    pub x_divs: Vec<i32>,
    pub y_divs: Vec<i32>,
}

impl NinePatch {
    const HEADER_SIZE: u32 = 32;

    pub fn read(r: &mut ChunkReader<BigEndian>) -> Result<Self> {
        // was deserialized
        r.skip(1)?;
        let num_x_divs = r.read_u8()? as usize;
        let num_y_divs = r.read_u8()? as usize;
        // color count, x/y div offsets
        r.skip(1 + 8)?;
        let padding_left = r.read_i32()?;
        let padding_right = r.read_i32()?;
        let padding_top = r.read_i32()?;
        let padding_bottom = r.read_i32()?;
        // colors offset
        r.skip(4)?;
        let x_divs = r.read_int_array(num_x_divs)?;
        let y_divs = r.read_int_array(num_y_divs)?;
        Ok(Self {
            padding_left,
            padding_right,
            padding_top,
            padding_bottom,
            x_divs,
            y_divs,
        })
    }

    pub fn find(png: &[u8]) -> Result<Option<Self>> {
        find_chunk(png, NINE_PATCH)?
            .map(|mut r| Self::read(&mut r))
            .transpose()
    }

    /// Serializes the chunk data without colors.
    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        let x_divs_offset = Self::HEADER_SIZE;
        let y_divs_offset = x_divs_offset + self.x_divs.len() as u32 * 4;
        let colors_offset = y_divs_offset + self.y_divs.len() as u32 * 4;
        w.write_u8(0)?;
        w.write_u8(self.x_divs.len() as u8)?;
        w.write_u8(self.y_divs.len() as u8)?;
        w.write_u8(0)?;
        w.write_u32::<BigEndian>(x_divs_offset)?;
        w.write_u32::<BigEndian>(y_divs_offset)?;
        w.write_i32::<BigEndian>(self.padding_left)?;
        w.write_i32::<BigEndian>(self.padding_right)?;
        w.write_i32::<BigEndian>(self.padding_top)?;
        w.write_i32::<BigEndian>(self.padding_bottom)?;
        w.write_u32::<BigEndian>(colors_offset)?;
        for div in self.x_divs.iter().chain(&self.y_divs) {
            w.write_i32::<BigEndian>(*div)?;
        }
        Ok(())
    }
}

/// Optical insets. Stored in the producing machine's byte order, which is
/// little-endian in practice, inside a big-endian PNG.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LayoutBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl LayoutBounds {
    pub fn read(r: &mut ChunkReader<BigEndian>) -> Result<Self> {
        let left = r.read_i32()?.swap_bytes();
        let top = r.read_i32()?.swap_bytes();
        let right = r.read_i32()?.swap_bytes();
        let bottom = r.read_i32()?.swap_bytes();
        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    pub fn find(png: &[u8]) -> Result<Option<Self>> {
        find_chunk(png, LAYOUT_BOUNDS)?
            .map(|mut r| Self::read(&mut r))
            .transpose()
    }

    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        for v in [self.left, self.top, self.right, self.bottom] {
            w.write_i32::<BigEndian>(v.swap_bytes())?;
        }
        Ok(())
    }
}
