use crate::config::ConfigDescriptor;
use crate::error::{DecodeError, Result};
use crate::options::Tolerance;
use crate::reader::{Chunk, ChunkReader};
use byteorder::{LittleEndian, WriteBytesExt};
use std::fmt;
use std::io::{Seek, SeekFrom, Write};
use std::num::NonZeroU8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u16)]
pub enum ChunkType {
    Null = 0x0000,
    StringPool = 0x0001,
    Table = 0x0002,
    TablePackage = 0x0200,
    TableType = 0x0201,
    TableTypeSpec = 0x0202,
    TableLibrary = 0x0203,
    TableOverlayable = 0x0204,
    TableOverlayablePolicy = 0x0205,
    TableStagedAlias = 0x0206,
}

impl ChunkType {
    pub fn from_u16(ty: u16) -> Option<Self> {
        Some(match ty {
            ty if ty == ChunkType::Null as u16 => ChunkType::Null,
            ty if ty == ChunkType::StringPool as u16 => ChunkType::StringPool,
            ty if ty == ChunkType::Table as u16 => ChunkType::Table,
            ty if ty == ChunkType::TablePackage as u16 => ChunkType::TablePackage,
            ty if ty == ChunkType::TableType as u16 => ChunkType::TableType,
            ty if ty == ChunkType::TableTypeSpec as u16 => ChunkType::TableTypeSpec,
            ty if ty == ChunkType::TableLibrary as u16 => ChunkType::TableLibrary,
            ty if ty == ChunkType::TableOverlayable as u16 => ChunkType::TableOverlayable,
            ty if ty == ChunkType::TableOverlayablePolicy as u16 => {
                ChunkType::TableOverlayablePolicy
            }
            ty if ty == ChunkType::TableStagedAlias as u16 => ChunkType::TableStagedAlias,
            _ => return None,
        })
    }

    /// Chunks that may appear inside a package but carry nothing the
    /// resource model keeps.
    pub fn is_auxiliary(self) -> bool {
        matches!(
            self,
            Self::TableLibrary
                | Self::TableOverlayable
                | Self::TableOverlayablePolicy
                | Self::TableStagedAlias
        )
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ResChunkHeader {
    /// Type identifier for this chunk. The meaning of this value depends
    /// on the containing chunk.
    pub ty: u16,
    /// Size of the chunk header (in bytes). Adding this value to the address
    /// of the chunk allows you to find its associated data (if any).
    pub header_size: u16,
    /// Total size of this chunk (in bytes). This is the header_size plus the
    /// size of any data associated with the chunk. Adding this value to the
    /// chunk allows you to completely skip its contents (including any child
    /// chunks).
    pub size: u32,
}

impl ResChunkHeader {
    pub const SIZE: usize = 8;

    pub fn read(r: &mut ChunkReader) -> Result<Self> {
        let ty = r.read_u16()?;
        let header_size = r.read_u16()?;
        let size = r.read_u32()?;
        Ok(Self {
            ty,
            header_size,
            size,
        })
    }

    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        w.write_u16::<LittleEndian>(self.ty)?;
        w.write_u16::<LittleEndian>(self.header_size)?;
        w.write_u32::<LittleEndian>(self.size)?;
        Ok(())
    }
}

/// Writes a chunk whose header sizes are only known once its body is out.
///
/// A placeholder header is emitted by [`ChunkWriter::start_chunk`] and
/// patched in place by [`ChunkWriter::end_chunk`].
#[derive(Debug)]
pub struct ChunkWriter {
    ty: ChunkType,
    start_chunk: u64,
    end_header: Option<u64>,
}

impl ChunkWriter {
    pub fn start_chunk<W: Seek + Write>(ty: ChunkType, w: &mut W) -> Result<Self> {
        let start_chunk = w.stream_position()?;
        ResChunkHeader::default().write(w)?;
        Ok(Self {
            ty,
            start_chunk,
            end_header: None,
        })
    }

    pub fn start(&self) -> u64 {
        self.start_chunk
    }

    pub fn end_header<W: Seek + Write>(&mut self, w: &mut W) -> Result<u64> {
        let end_header = w.stream_position()?;
        self.end_header = Some(end_header);
        Ok(end_header)
    }

    /// Patches the header and returns `(start, end_header, end)`.
    pub fn end_chunk<W: Seek + Write>(self, w: &mut W) -> Result<(u64, u64, u64)> {
        let end_chunk = w.stream_position()?;
        let end_header = self.end_header.unwrap_or(end_chunk);
        let header = ResChunkHeader {
            ty: self.ty as u16,
            header_size: (end_header - self.start_chunk) as u16,
            size: (end_chunk - self.start_chunk) as u32,
        };
        w.seek(SeekFrom::Start(self.start_chunk))?;
        header.write(w)?;
        w.seek(SeekFrom::Start(end_chunk))?;
        Ok((self.start_chunk, end_header, end_chunk))
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ResStringPoolHeader {
    pub string_count: u32,
    pub style_count: u32,
    pub flags: u32,
    pub strings_start: u32,
    pub styles_start: u32,
}

impl ResStringPoolHeader {
    pub const SIZE: usize = 28;
    pub const SORTED_FLAG: u32 = 1 << 0;
    pub const UTF8_FLAG: u32 = 1 << 8;

    pub fn read(r: &mut ChunkReader) -> Result<Self> {
        let string_count = r.read_u32()?;
        let style_count = r.read_u32()?;
        let flags = r.read_u32()?;
        let strings_start = r.read_u32()?;
        let styles_start = r.read_u32()?;
        Ok(Self {
            string_count,
            style_count,
            flags,
            strings_start,
            styles_start,
        })
    }

    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        w.write_u32::<LittleEndian>(self.string_count)?;
        w.write_u32::<LittleEndian>(self.style_count)?;
        w.write_u32::<LittleEndian>(self.flags)?;
        w.write_u32::<LittleEndian>(self.strings_start)?;
        w.write_u32::<LittleEndian>(self.styles_start)?;
        Ok(())
    }

    pub fn is_utf8(&self) -> bool {
        self.flags & Self::UTF8_FLAG > 0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResTableHeader {
    pub package_count: u32,
}

impl ResTableHeader {
    pub fn read(r: &mut ChunkReader) -> Result<Self> {
        let package_count = r.read_u32()?;
        Ok(Self { package_count })
    }

    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        w.write_u32::<LittleEndian>(self.package_count)?;
        Ok(())
    }
}

/// Resource identifier: `0xPPTTEEEE`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ResId(pub u32);

impl ResId {
    pub fn new(package: u8, ty: u8, entry: u16) -> Self {
        let package = (package as u32) << 24;
        let ty = (ty as u32) << 16;
        let entry = entry as u32;
        Self(package | ty | entry)
    }

    pub fn package(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn ty(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn entry(self) -> u16 {
        self.0 as u16
    }
}

impl From<u32> for ResId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<ResId> for u32 {
    fn from(id: ResId) -> u32 {
        id.0
    }
}

impl fmt::Display for ResId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResTablePackageHeader {
    /// If this is a base package, its ID. Package IDs start
    /// at 1 (corresponding to the value of the package bits in a
    /// resource identifier). 0 means this is not a base package.
    pub id: u32,
    /// Actual name of this package, \0-terminated.
    pub name: String,
    /// Offset to a ResStringPoolHeader defining the resource
    /// type symbol table. If zero, this package is inheriting
    /// from another base package (overriding specific values in it).
    pub type_strings: u32,
    /// Last index into type_strings that is for public use by others.
    pub last_public_type: u32,
    /// Offset to a ResStringPoolHeader defining the resource key
    /// symbol table. If zero, this package is inheriting from another
    /// base package (overriding specific values in it).
    pub key_strings: u32,
    /// Last index into key_strings that is for public use by others.
    pub last_public_key: u32,
    /// Absent from headers written before the field was introduced.
    pub type_id_offset: u32,
}

impl ResTablePackageHeader {
    const NAME_LEN: usize = 128;

    pub fn read(r: &mut ChunkReader, chunk: &Chunk) -> Result<Self> {
        let id = r.read_u32()?;
        let mut name = Vec::with_capacity(Self::NAME_LEN);
        let mut terminated = false;
        for _ in 0..Self::NAME_LEN {
            let c = r.read_u16()?;
            terminated |= c == 0;
            if !terminated {
                name.push(c);
            }
        }
        let name = String::from_utf16_lossy(&name);
        let type_strings = r.read_u32()?;
        let last_public_type = r.read_u32()?;
        let key_strings = r.read_u32()?;
        let last_public_key = r.read_u32()?;
        let type_id_offset = if chunk.header_end() >= r.position() + 4 {
            r.read_u32()?
        } else {
            0
        };
        Ok(Self {
            id,
            name,
            type_strings,
            last_public_type,
            key_strings,
            last_public_key,
            type_id_offset,
        })
    }

    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        w.write_u32::<LittleEndian>(self.id)?;
        let mut name = [0; Self::NAME_LEN];
        // the last unit stays a terminator
        for (i, c) in self.name.encode_utf16().take(Self::NAME_LEN - 1).enumerate() {
            name[i] = c;
        }
        for c in name {
            w.write_u16::<LittleEndian>(c)?;
        }
        w.write_u32::<LittleEndian>(self.type_strings)?;
        w.write_u32::<LittleEndian>(self.last_public_type)?;
        w.write_u32::<LittleEndian>(self.key_strings)?;
        w.write_u32::<LittleEndian>(self.last_public_key)?;
        w.write_u32::<LittleEndian>(self.type_id_offset)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResTableTypeSpecHeader {
    /// The type identifier this chunk is holding. Type IDs start
    /// at 1 (corresponding to the value of the type bits in a
    /// resource identifier). 0 is invalid.
    pub id: NonZeroU8,
    /// Must be 0.
    pub res0: u8,
    /// Used to be reserved, if >0 specifies the number of `ResTable_type` entries for this spec.
    pub types_count: u16,
    /// Number of u32 entry configuration masks that follow.
    pub entry_count: u32,
}

impl ResTableTypeSpecHeader {
    pub fn read(r: &mut ChunkReader) -> Result<Self> {
        let offset = r.position();
        let id = NonZeroU8::new(r.read_u8()?).ok_or_else(|| DecodeError::InvalidChunk {
            offset,
            reason: "type spec id of 0 is invalid".into(),
        })?;
        let res0 = r.read_u8()?;
        let types_count = r.read_u16()?;
        let entry_count = r.read_u32()?;
        Ok(Self {
            id,
            res0,
            types_count,
            entry_count,
        })
    }

    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        w.write_u8(self.id.get())?;
        w.write_u8(self.res0)?;
        w.write_u16::<LittleEndian>(self.types_count)?;
        w.write_u32::<LittleEndian>(self.entry_count)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResTableTypeHeader {
    /// The type identifier this chunk is holding. Type IDs start
    /// at 1 (corresponding to the value of the type bits in a
    /// resource identifier). 0 is invalid.
    pub id: NonZeroU8,
    pub flags: u8,
    /// Must be 0.
    pub res1: u16,
    /// Number of entry indices that follow.
    pub entry_count: u32,
    /// Offset from the chunk start where entry data starts.
    pub entries_start: u32,
    /// Configuration this collection of entries is designed for.
    pub config: ConfigDescriptor,
}

impl ResTableTypeHeader {
    pub const NO_ENTRY: u32 = 0xffff_ffff;
    pub const FLAG_SPARSE: u8 = 1 << 0;
    pub const FLAG_OFFSET16: u8 = 1 << 1;

    /// Expands a 16-bit entry offset, which counts 4-byte words.
    pub const fn offset_from16(offset: u16) -> u32 {
        if offset == 0xffff {
            Self::NO_ENTRY
        } else {
            offset as u32 * 4
        }
    }

    pub fn read(r: &mut ChunkReader, oversized_config: Tolerance) -> Result<Self> {
        let offset = r.position();
        let id = NonZeroU8::new(r.read_u8()?).ok_or_else(|| DecodeError::InvalidChunk {
            offset,
            reason: "type id of 0 is invalid".into(),
        })?;
        let flags = r.read_u8()?;
        let res1 = r.read_u16()?;
        let entry_count = r.read_u32()?;
        let entries_start = r.read_u32()?;
        let config = ConfigDescriptor::read(r, oversized_config)?;
        Ok(Self {
            id,
            flags,
            res1,
            entry_count,
            entries_start,
            config,
        })
    }

    pub fn is_sparse(&self) -> bool {
        self.flags & Self::FLAG_SPARSE != 0
    }

    pub fn is_offset16(&self) -> bool {
        self.flags & Self::FLAG_OFFSET16 != 0
    }

    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        w.write_u8(self.id.get())?;
        w.write_u8(self.flags)?;
        w.write_u16::<LittleEndian>(self.res1)?;
        w.write_u32::<LittleEndian>(self.entry_count)?;
        w.write_u32::<LittleEndian>(self.entries_start)?;
        self.config.write(w)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResTableEntry {
    pub flags: u16,
    /// Index into the package key pool.
    pub key: u32,
    pub value: ResTableValue,
}

impl ResTableEntry {
    pub const FLAG_COMPLEX: u16 = 0x1;
    pub const FLAG_PUBLIC: u16 = 0x2;
    pub const FLAG_WEAK: u16 = 0x4;
    pub const FLAG_COMPACT: u16 = 0x8;

    /// Reads an entry starting at the cursor. The value (or map) is located
    /// through the declared entry size rather than assumed to follow.
    pub fn read(r: &mut ChunkReader) -> Result<Self> {
        let start = r.position();
        let size = r.read_u16()?;
        let flags = r.read_u16()?;
        if flags & Self::FLAG_COMPACT != 0 {
            // {key:u16, flags:u16 with the data type in the high byte, data:u32}
            let data = r.read_u32()?;
            return Ok(Self {
                flags: flags & 0x00ff,
                key: size as u32,
                value: ResTableValue::Simple(ResValue {
                    size: ResValue::SIZE,
                    res0: 0,
                    data_type: (flags >> 8) as u8,
                    data,
                }),
            });
        }
        let key = r.read_u32()?;
        let is_complex = flags & Self::FLAG_COMPLEX != 0;
        let min_size = if is_complex { 16 } else { 8 };
        if size < min_size {
            return Err(DecodeError::InvalidValue {
                offset: start,
                reason: format!("entry size {size} is below {min_size}"),
            });
        }
        if is_complex {
            let entry = ResTableMapEntry::read(r)?;
            r.seek(start + size as usize)?;
            let mut map = Vec::with_capacity(entry.count.min(0x1000) as usize);
            for _ in 0..entry.count {
                map.push(ResTableMap::read(r)?);
            }
            return Ok(Self {
                flags,
                key,
                value: ResTableValue::Complex(entry, map),
            });
        }
        r.seek(start + size as usize)?;
        let value = ResValue::read(r)?;
        Ok(Self {
            flags,
            key,
            value: ResTableValue::Simple(value),
        })
    }

    pub fn is_complex(&self) -> bool {
        self.flags & Self::FLAG_COMPLEX != 0
    }

    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        let (size, flags) = match &self.value {
            ResTableValue::Simple(_) => (8, self.flags & !Self::FLAG_COMPLEX),
            ResTableValue::Complex(_, _) => (16, self.flags | Self::FLAG_COMPLEX),
        };
        w.write_u16::<LittleEndian>(size)?;
        w.write_u16::<LittleEndian>(flags & !Self::FLAG_COMPACT)?;
        w.write_u32::<LittleEndian>(self.key)?;
        self.value.write(w)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResTableValue {
    Simple(ResValue),
    Complex(ResTableMapEntry, Vec<ResTableMap>),
}

impl ResTableValue {
    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        match self {
            Self::Simple(value) => value.write(w)?,
            Self::Complex(entry, map) => {
                ResTableMapEntry {
                    parent: entry.parent,
                    count: map.len() as u32,
                }
                .write(w)?;
                for entry in map {
                    entry.write(w)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResValue {
    pub size: u16,
    pub res0: u8,
    pub data_type: u8,
    pub data: u32,
}

impl ResValue {
    pub const SIZE: u16 = 8;

    pub fn new(data_type: ResValueType, data: u32) -> Self {
        Self {
            size: Self::SIZE,
            res0: 0,
            data_type: data_type as u8,
            data,
        }
    }

    pub fn read(r: &mut ChunkReader) -> Result<Self> {
        let offset = r.position();
        let size = r.read_u16()?;
        let res0 = r.read_u8()?;
        let data_type = r.read_u8()?;
        let data = r.read_u32()?;
        if size < Self::SIZE {
            return Err(DecodeError::InvalidValue {
                offset,
                reason: format!("value size {size} is below 8"),
            });
        }
        if size > Self::SIZE {
            tracing::debug!("skipping {} trailing value bytes at {offset:#x}", size - Self::SIZE);
            r.skip((size - Self::SIZE) as usize)?;
        }
        Ok(Self {
            size,
            res0,
            data_type,
            data,
        })
    }

    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        w.write_u16::<LittleEndian>(Self::SIZE)?;
        w.write_u8(0)?;
        w.write_u8(self.data_type)?;
        w.write_u32::<LittleEndian>(self.data)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum ResValueType {
    Null = 0x00,
    Reference = 0x01,
    Attribute = 0x02,
    String = 0x03,
    Float = 0x04,
    Dimension = 0x05,
    Fraction = 0x06,
    DynamicReference = 0x07,
    DynamicAttribute = 0x08,
    IntDec = 0x10,
    IntHex = 0x11,
    IntBoolean = 0x12,
    IntColorArgb8 = 0x1c,
    IntColorRgb8 = 0x1d,
    IntColorArgb4 = 0x1e,
    IntColorRgb4 = 0x1f,
}

impl ResValueType {
    pub fn from_u8(ty: u8) -> Option<Self> {
        Some(match ty {
            x if x == Self::Null as u8 => Self::Null,
            x if x == Self::Reference as u8 => Self::Reference,
            x if x == Self::Attribute as u8 => Self::Attribute,
            x if x == Self::String as u8 => Self::String,
            x if x == Self::Float as u8 => Self::Float,
            x if x == Self::Dimension as u8 => Self::Dimension,
            x if x == Self::Fraction as u8 => Self::Fraction,
            x if x == Self::DynamicReference as u8 => Self::DynamicReference,
            x if x == Self::DynamicAttribute as u8 => Self::DynamicAttribute,
            x if x == Self::IntDec as u8 => Self::IntDec,
            x if x == Self::IntHex as u8 => Self::IntHex,
            x if x == Self::IntBoolean as u8 => Self::IntBoolean,
            x if x == Self::IntColorArgb8 as u8 => Self::IntColorArgb8,
            x if x == Self::IntColorRgb8 as u8 => Self::IntColorRgb8,
            x if x == Self::IntColorArgb4 as u8 => Self::IntColorArgb4,
            x if x == Self::IntColorRgb4 as u8 => Self::IntColorRgb4,
            _ => return None,
        })
    }
}

/// Bits of the format word of an attribute definition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ResAttributeType {
    Any = 0x0000_ffff,
    Reference = 1 << 0,
    String = 1 << 1,
    Integer = 1 << 2,
    Boolean = 1 << 3,
    Color = 1 << 4,
    Float = 1 << 5,
    Dimension = 1 << 6,
    Fraction = 1 << 7,
    Enum = 1 << 16,
    Flags = 1 << 17,
}

impl ResAttributeType {
    /// Scalar formats in the order they are listed in a `format` attribute.
    pub const SCALARS: [(Self, &'static str); 8] = [
        (Self::Reference, "reference"),
        (Self::String, "string"),
        (Self::Integer, "integer"),
        (Self::Boolean, "boolean"),
        (Self::Color, "color"),
        (Self::Float, "float"),
        (Self::Dimension, "dimension"),
        (Self::Fraction, "fraction"),
    ];

    pub fn from_u32(ty: u32) -> Option<Self> {
        Some(match ty {
            x if x == Self::Any as u32 => Self::Any,
            x if x == Self::Reference as u32 => Self::Reference,
            x if x == Self::String as u32 => Self::String,
            x if x == Self::Integer as u32 => Self::Integer,
            x if x == Self::Boolean as u32 => Self::Boolean,
            x if x == Self::Color as u32 => Self::Color,
            x if x == Self::Float as u32 => Self::Float,
            x if x == Self::Dimension as u32 => Self::Dimension,
            x if x == Self::Fraction as u32 => Self::Fraction,
            x if x == Self::Enum as u32 => Self::Enum,
            x if x == Self::Flags as u32 => Self::Flags,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResTableMapEntry {
    pub parent: u32,
    pub count: u32,
}

impl ResTableMapEntry {
    pub fn read(r: &mut ChunkReader) -> Result<Self> {
        let parent = r.read_u32()?;
        let count = r.read_u32()?;
        Ok(Self { parent, count })
    }

    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        w.write_u32::<LittleEndian>(self.parent)?;
        w.write_u32::<LittleEndian>(self.count)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResTableMap {
    pub name: u32,
    pub value: ResValue,
}

impl ResTableMap {
    pub fn read(r: &mut ChunkReader) -> Result<Self> {
        let name = r.read_u32()?;
        let value = ResValue::read(r)?;
        Ok(Self { name, value })
    }

    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        w.write_u32::<LittleEndian>(self.name)?;
        self.value.write(w)?;
        Ok(())
    }
}

/// Raw style span: a tag name index into the same pool plus an inclusive
/// UTF-16 range.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResSpan {
    pub name: i32,
    pub first_char: u32,
    pub last_char: u32,
}

impl ResSpan {
    pub const END: i32 = -1;

    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        w.write_i32::<LittleEndian>(self.name)?;
        w.write_u32::<LittleEndian>(self.first_char)?;
        w.write_u32::<LittleEndian>(self.last_char)?;
        Ok(())
    }
}
