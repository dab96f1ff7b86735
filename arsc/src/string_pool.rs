use crate::error::{DecodeError, Result};
use crate::options::DecodeOptions;
use crate::reader::{Chunk, ChunkReader};
use crate::res::{ChunkType, ChunkWriter, ResSpan, ResStringPoolHeader};
use crate::styled::{escape_text, render, Span};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::io::{Seek, Write};

/// An indexable string table backed by the undecoded bytes of a pool chunk.
///
/// Strings are decoded on access; a string that cannot be decoded is a gap
/// (`None`) and never fails the pool.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StringPool {
    flags: u32,
    string_offsets: Vec<u32>,
    strings: Vec<u8>,
    style_offsets: Option<Vec<u32>>,
    styles: Option<Vec<i32>>,
}

impl StringPool {
    pub fn read_chunk(r: &mut ChunkReader, opts: &DecodeOptions) -> Result<Self> {
        let chunk = r.expect_chunk(ChunkType::StringPool)?;
        Self::read(r, &chunk, opts)
    }

    /// Reads the body of a pool whose header has already been consumed.
    /// Leaves the cursor at the end of the chunk.
    pub fn read(r: &mut ChunkReader, chunk: &Chunk, opts: &DecodeOptions) -> Result<Self> {
        tracing::trace!("string pool at {:#x}", chunk.start);
        let start = chunk.start;
        let header = ResStringPoolHeader::read(r)?;
        // some apps pad the header
        if chunk.header_end() > r.position() {
            r.seek(chunk.header_end())?;
        }

        let chunk_size = chunk.header.size as usize;
        let strings_start = header.strings_start as usize;
        let styles_start = header.styles_start as usize;
        let has_styles = styles_start != 0 && header.style_count != 0;
        if !has_styles && (styles_start != 0 || header.style_count != 0) {
            opts.lying_styles.check(|| DecodeError::MalformedStringPool {
                offset: start,
                reason: format!(
                    "style offset {styles_start:#x} declared with {} styles",
                    header.style_count
                ),
            })?;
        }

        let bound = start + strings_start;
        let (string_offsets, cut) =
            r.read_bounded_u32_array(header.string_count as usize, bound)?;
        if cut {
            opts.truncated_offsets.check(|| DecodeError::MalformedStringPool {
                offset: start,
                reason: format!(
                    "{} string offsets do not fit before the string data",
                    header.string_count
                ),
            })?;
        }
        let mut style_offsets = None;
        if header.style_count != 0 {
            let (offsets, cut) = r.read_bounded_u32_array(header.style_count as usize, bound)?;
            if cut {
                opts.truncated_offsets.check(|| DecodeError::MalformedStringPool {
                    offset: start,
                    reason: format!(
                        "{} style offsets do not fit before the string data",
                        header.style_count
                    ),
                })?;
            }
            if has_styles {
                style_offsets = Some(offsets);
            }
        }

        let data_end = if has_styles { styles_start } else { chunk_size };
        let strings = if header.string_count == 0 && strings_start == 0 {
            vec![]
        } else {
            if strings_start > data_end || data_end > chunk_size {
                return Err(DecodeError::MalformedStringPool {
                    offset: start,
                    reason: format!(
                        "string data [{strings_start:#x}, {data_end:#x}) outside of chunk of {chunk_size:#x} bytes"
                    ),
                });
            }
            r.seek(start + strings_start)?;
            r.read_bytes(data_end - strings_start)?.to_vec()
        };

        let mut styles = None;
        if has_styles {
            let len = chunk_size.checked_sub(styles_start).ok_or_else(|| {
                DecodeError::MalformedStringPool {
                    offset: start,
                    reason: format!("style data at {styles_start:#x} outside of chunk"),
                }
            })?;
            r.seek(start + styles_start)?;
            styles = Some(r.read_int_array(len / 4)?);
        }
        r.seek(chunk.end())?;

        Ok(Self {
            flags: header.flags,
            string_offsets,
            strings,
            style_offsets,
            styles,
        })
    }

    /// Builds a pool from scratch, styles are given per string in index
    /// order and may be shorter than `strings`.
    pub fn build<S: AsRef<str>>(strings: &[S], styles: &[Vec<ResSpan>], utf8: bool) -> Result<Self> {
        let mut data = vec![];
        let mut string_offsets = Vec::with_capacity(strings.len());
        for string in strings {
            string_offsets.push(data.len() as u32);
            let string = string.as_ref();
            let offset = data.len();
            if utf8 {
                let units = string.encode_utf16().count();
                write_utf8_len(&mut data, units, offset)?;
                write_utf8_len(&mut data, string.len(), offset)?;
                data.extend_from_slice(string.as_bytes());
                data.push(0);
            } else {
                let units: Vec<u16> = string.encode_utf16().collect();
                if units.len() > 0x7fff_ffff {
                    return Err(DecodeError::MalformedStringPool {
                        offset,
                        reason: format!("string of {} units is too long", units.len()),
                    });
                }
                if units.len() > 0x7fff {
                    data.write_u16::<LittleEndian>((units.len() >> 16) as u16 | 0x8000)?;
                }
                data.write_u16::<LittleEndian>(units.len() as u16)?;
                for unit in units {
                    data.write_u16::<LittleEndian>(unit)?;
                }
                data.write_u16::<LittleEndian>(0)?;
            }
        }
        while data.len() % 4 != 0 {
            data.push(0);
        }

        let (style_offsets, styles) = if styles.is_empty() {
            (None, None)
        } else {
            let mut offsets = Vec::with_capacity(styles.len());
            let mut words = vec![];
            for spans in styles {
                offsets.push(words.len() as u32 * 4);
                for span in spans {
                    words.extend([span.name, span.first_char as i32, span.last_char as i32]);
                }
                words.push(ResSpan::END);
            }
            (Some(offsets), Some(words))
        };

        Ok(Self {
            flags: if utf8 { ResStringPoolHeader::UTF8_FLAG } else { 0 },
            string_offsets,
            strings: data,
            style_offsets,
            styles,
        })
    }

    /// Writes the pool chunk with its offsets, string bytes and style words
    /// as they are held.
    pub fn write<W: Seek + Write>(&self, w: &mut W) -> Result<()> {
        let mut chunk = ChunkWriter::start_chunk(ChunkType::StringPool, w)?;
        let style_offsets = self.style_offsets.as_deref().unwrap_or_default();
        let styles = self.styles.as_deref().unwrap_or_default();
        let strings_len = self.strings.len().next_multiple_of(4);
        let strings_start =
            ResStringPoolHeader::SIZE + (self.string_offsets.len() + style_offsets.len()) * 4;
        let styles_start = if style_offsets.is_empty() {
            0
        } else {
            strings_start + strings_len
        };
        ResStringPoolHeader {
            string_count: self.string_offsets.len() as u32,
            style_count: style_offsets.len() as u32,
            flags: self.flags,
            strings_start: if self.string_offsets.is_empty() { 0 } else { strings_start as u32 },
            styles_start: styles_start as u32,
        }
        .write(w)?;
        chunk.end_header(w)?;
        for offset in self.string_offsets.iter().chain(style_offsets) {
            w.write_u32::<LittleEndian>(*offset)?;
        }
        w.write_all(&self.strings)?;
        w.write_all(&vec![0; strings_len - self.strings.len()])?;
        for word in styles {
            w.write_i32::<LittleEndian>(*word)?;
        }
        chunk.end_chunk(w)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.string_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.string_offsets.is_empty()
    }

    pub fn is_utf8(&self) -> bool {
        self.flags & ResStringPoolHeader::UTF8_FLAG != 0
    }

    pub fn is_sorted(&self) -> bool {
        self.flags & ResStringPoolHeader::SORTED_FLAG != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<String>> + '_ {
        (0..self.len()).map(|i| self.get(i))
    }

    /// Returns the raw string at `index` without style information.
    pub fn get(&self, index: usize) -> Option<String> {
        let offset = *self.string_offsets.get(index)? as usize;
        let span = if self.is_utf8() {
            utf8_span(&self.strings, offset)
        } else {
            utf16_span(&self.strings, offset)
        };
        let Some((start, len)) = span else {
            tracing::warn!("string {index} has a length field outside of the pool at {offset:#x}");
            return None;
        };
        self.decode(start, len)
    }

    fn decode(&self, start: usize, len: usize) -> Option<String> {
        let Some(bytes) = self.strings.get(start..start.saturating_add(len)) else {
            tracing::warn!("string at {start:#x} of length {len} extends outside of the pool");
            return None;
        };
        if self.is_utf8() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                return Some(s.to_string());
            }
            // Android writes supplementary characters as surrogate pairs
            if let Ok(s) = cesu8::from_cesu8(bytes) {
                return Some(s.into_owned());
            }
        } else if let Ok(s) = String::from_utf16(&utf16_units(bytes)) {
            return Some(s);
        }
        tracing::warn!("{}", DecodeError::UnsupportedEncoding { offset: start });
        None
    }

    /// Raw style triplets `[tag, first, last]*` of the string at `index`.
    pub fn style(&self, index: usize) -> Option<Vec<i32>> {
        let offsets = self.style_offsets.as_ref()?;
        let styles = self.styles.as_ref()?;
        let offset = *offsets.get(index)? as usize / 4;
        let run: Vec<i32> = styles
            .get(offset..)?
            .iter()
            .take_while(|word| **word != ResSpan::END)
            .copied()
            .collect();
        if run.is_empty() {
            return None;
        }
        if run.len() % 3 != 0 {
            tracing::warn!(
                "style of string {index} has {} words, not a multiple of 3",
                run.len()
            );
            return None;
        }
        Some(run)
    }

    /// Spans of the string at `index` with their tags resolved through this
    /// pool, in pool order.
    pub fn styles(&self, index: usize) -> Option<Vec<Span>> {
        let run = self.style(index)?;
        Some(
            run.chunks_exact(3)
                .map(|triplet| {
                    let tag = usize::try_from(triplet[0])
                        .ok()
                        .and_then(|tag| self.get(tag))
                        .unwrap_or_default();
                    Span::new(tag, triplet[1] as u32, triplet[2] as u32)
                })
                .collect(),
        )
    }

    /// The string at `index` as escaped markup with its style tags.
    pub fn html(&self, index: usize) -> Option<String> {
        let text = self.get(index)?;
        let Some(spans) = self.styles(index) else {
            return Some(escape_text(&text));
        };
        if spans[0].first_char as usize > text.encode_utf16().count() {
            return Some(escape_text(&text));
        }
        Some(render(&text, &spans))
    }

    /// Linear search by content.
    pub fn find(&self, string: &str) -> Option<usize> {
        if self.is_utf8() {
            return (0..self.len()).find(|i| self.get(*i).as_deref() == Some(string));
        }
        let needle: Vec<u16> = string.encode_utf16().collect();
        (0..self.len()).find(|i| {
            let offset = self.string_offsets[*i] as usize;
            utf16_span(&self.strings, offset)
                .and_then(|(start, len)| self.strings.get(start..start + len))
                .is_some_and(|bytes| utf16_units(bytes) == needle)
        })
    }
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes.chunks_exact(2).map(LittleEndian::read_u16).collect()
}

/// `(data start, byte length)` of a UTF-8 string. The leading UTF-16
/// length is skipped.
fn utf8_span(strings: &[u8], offset: usize) -> Option<(usize, usize)> {
    let mut at = offset;
    let val = *strings.get(at)?;
    at += if val & 0x80 != 0 { 2 } else { 1 };
    let val = *strings.get(at)?;
    at += 1;
    let len = if val & 0x80 != 0 {
        let low = *strings.get(at)?;
        at += 1;
        ((val as usize & 0x7f) << 8) + low as usize
    } else {
        val as usize
    };
    Some((at, len))
}

/// `(data start, byte length)` of a UTF-16 string.
fn utf16_span(strings: &[u8], offset: usize) -> Option<(usize, usize)> {
    let val = LittleEndian::read_u16(strings.get(offset..offset + 2)?) as usize;
    if val & 0x8000 != 0 {
        let low = LittleEndian::read_u16(strings.get(offset + 2..offset + 4)?) as usize;
        let len = ((val & 0x7fff) << 16) + low;
        return Some((offset + 4, len * 2));
    }
    Some((offset + 2, val * 2))
}

fn write_utf8_len(data: &mut Vec<u8>, len: usize, offset: usize) -> Result<()> {
    if len > 0x7fff {
        return Err(DecodeError::MalformedStringPool {
            offset,
            reason: format!("length {len} does not fit a UTF-8 string header"),
        });
    }
    if len > 0x7f {
        data.push((len >> 8) as u8 | 0x80);
    }
    data.push(len as u8);
    Ok(())
}
