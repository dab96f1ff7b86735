#![allow(dead_code)]

use arsc::config::ConfigDescriptor;
use arsc::res::{
    ChunkType, ChunkWriter, ResChunkHeader, ResSpan, ResTableEntry, ResTableHeader,
    ResTablePackageHeader, ResTableTypeHeader, ResTableTypeSpecHeader,
};
use arsc::StringPool;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Cursor, Seek, SeekFrom, Write};
use std::num::NonZeroU8;

/// How a type chunk lays out its entry offsets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Layout {
    Dense,
    Offset16,
    Sparse,
}

/// Hand-written entry data for shapes `ResTableEntry::write` cannot produce.
pub enum RawEntry {
    Bytes(Vec<u8>),
    /// An offset table slot pointing at `offset` without any data behind it.
    Offset(u32),
}

pub struct TypeChunk {
    pub id: u8,
    pub config: ConfigDescriptor,
    pub layout: Layout,
    pub entries: Vec<(u16, ResTableEntry)>,
    /// Written after `entries`, in order.
    pub raw: Vec<(u16, RawEntry)>,
}

pub enum PackageChunk {
    TypeSpec { id: u8, entry_count: u32 },
    Type(TypeChunk),
    Raw { ty: u16, body: Vec<u8> },
}

pub struct PackageBuilder {
    pub id: u32,
    pub name: String,
    pub types: Vec<String>,
    pub keys: Vec<String>,
    pub chunks: Vec<PackageChunk>,
}

impl PackageBuilder {
    pub fn new(id: u32, name: &str, types: &[&str], keys: &[&str]) -> Self {
        Self {
            id,
            name: name.into(),
            types: types.iter().map(|s| s.to_string()).collect(),
            keys: keys.iter().map(|s| s.to_string()).collect(),
            chunks: vec![],
        }
    }

    pub fn chunk(mut self, chunk: PackageChunk) -> Self {
        self.chunks.push(chunk);
        self
    }
}

pub fn init_logger() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Builds a table with `strings`/`styles` as global pool.
pub fn table(
    strings: &[&str],
    styles: &[Vec<ResSpan>],
    packages: &[PackageBuilder],
) -> anyhow::Result<Vec<u8>> {
    let mut w = Cursor::new(Vec::new());
    let mut chunk = ChunkWriter::start_chunk(ChunkType::Table, &mut w)?;
    ResTableHeader {
        package_count: packages.len() as u32,
    }
    .write(&mut w)?;
    chunk.end_header(&mut w)?;
    StringPool::build(strings, styles, true)?.write(&mut w)?;
    for package in packages {
        write_package(package, &mut w)?;
    }
    chunk.end_chunk(&mut w)?;
    Ok(w.into_inner())
}

fn write_package(package: &PackageBuilder, w: &mut Cursor<Vec<u8>>) -> anyhow::Result<()> {
    let mut chunk = ChunkWriter::start_chunk(ChunkType::TablePackage, w)?;
    let header_start = w.stream_position()?;
    let mut header = ResTablePackageHeader {
        id: package.id,
        name: package.name.clone(),
        type_strings: 0,
        last_public_type: 0,
        key_strings: 0,
        last_public_key: 0,
        type_id_offset: 0,
    };
    header.write(w)?;
    chunk.end_header(w)?;
    header.type_strings = (w.stream_position()? - chunk.start()) as u32;
    StringPool::build(&package.types, &[], false)?.write(w)?;
    header.key_strings = (w.stream_position()? - chunk.start()) as u32;
    StringPool::build(&package.keys, &[], true)?.write(w)?;

    for child in &package.chunks {
        match child {
            PackageChunk::TypeSpec { id, entry_count } => {
                let mut chunk = ChunkWriter::start_chunk(ChunkType::TableTypeSpec, w)?;
                ResTableTypeSpecHeader {
                    id: NonZeroU8::new(*id).unwrap(),
                    res0: 0,
                    types_count: 0,
                    entry_count: *entry_count,
                }
                .write(w)?;
                chunk.end_header(w)?;
                for _ in 0..*entry_count {
                    w.write_u32::<LittleEndian>(0)?;
                }
                chunk.end_chunk(w)?;
            }
            PackageChunk::Type(ty) => write_type(ty, w)?,
            PackageChunk::Raw { ty, body } => {
                ResChunkHeader {
                    ty: *ty,
                    header_size: 8,
                    size: 8 + body.len() as u32,
                }
                .write(w)?;
                w.write_all(body)?;
            }
        }
    }
    chunk.end_chunk(w)?;
    let end = w.stream_position()?;
    w.seek(SeekFrom::Start(header_start))?;
    header.write(w)?;
    w.seek(SeekFrom::Start(end))?;
    Ok(())
}

/// Writes a compact entry if `entry` carries the compact flag.
fn write_entry(entry: &ResTableEntry, w: &mut Vec<u8>) -> anyhow::Result<()> {
    if entry.flags & ResTableEntry::FLAG_COMPACT == 0 {
        entry.write(w)?;
        return Ok(());
    }
    let arsc::res::ResTableValue::Simple(value) = &entry.value else {
        anyhow::bail!("compact entries hold a single value");
    };
    w.write_u16::<LittleEndian>(entry.key as u16)?;
    w.write_u16::<LittleEndian>((value.data_type as u16) << 8 | entry.flags)?;
    w.write_u32::<LittleEndian>(value.data)?;
    Ok(())
}

fn write_type(ty: &TypeChunk, w: &mut Cursor<Vec<u8>>) -> anyhow::Result<()> {
    let mut data = vec![];
    let mut offsets = vec![];
    for (idx, entry) in &ty.entries {
        offsets.push((*idx, data.len() as u32));
        write_entry(entry, &mut data)?;
    }
    for (idx, raw) in &ty.raw {
        match raw {
            RawEntry::Bytes(bytes) => {
                offsets.push((*idx, data.len() as u32));
                data.extend_from_slice(bytes);
            }
            RawEntry::Offset(offset) => offsets.push((*idx, *offset)),
        }
    }
    let count = match ty.layout {
        Layout::Sparse => offsets.len(),
        _ => offsets.iter().map(|(idx, _)| *idx as usize + 1).max().unwrap_or(0),
    };
    let mut index = vec![];
    match ty.layout {
        Layout::Dense => {
            let mut dense = vec![ResTableTypeHeader::NO_ENTRY; count];
            for (idx, offset) in &offsets {
                dense[*idx as usize] = *offset;
            }
            for offset in dense {
                index.write_u32::<LittleEndian>(offset)?;
            }
        }
        Layout::Offset16 => {
            let mut dense = vec![0xffff_u16; count];
            for (idx, offset) in &offsets {
                dense[*idx as usize] = (*offset / 4) as u16;
            }
            for offset in dense {
                index.write_u16::<LittleEndian>(offset)?;
            }
        }
        Layout::Sparse => {
            for (idx, offset) in &offsets {
                index.write_u16::<LittleEndian>(*idx)?;
                index.write_u16::<LittleEndian>((*offset / 4) as u16)?;
            }
        }
    }
    while index.len() % 4 != 0 {
        index.push(0);
    }

    let mut chunk = ChunkWriter::start_chunk(ChunkType::TableType, w)?;
    let flags = match ty.layout {
        Layout::Dense => 0,
        Layout::Offset16 => ResTableTypeHeader::FLAG_OFFSET16,
        Layout::Sparse => ResTableTypeHeader::FLAG_SPARSE,
    };
    let mut header = ResTableTypeHeader {
        id: NonZeroU8::new(ty.id).unwrap(),
        flags,
        res1: 0,
        entry_count: count as u32,
        entries_start: 0,
        config: ty.config.clone(),
    };
    let header_start = w.stream_position()?;
    header.write(w)?;
    chunk.end_header(w)?;
    w.write_all(&index)?;
    header.entries_start = (w.stream_position()? - chunk.start()) as u32;
    w.write_all(&data)?;
    chunk.end_chunk(w)?;
    let end = w.stream_position()?;
    w.seek(SeekFrom::Start(header_start))?;
    header.write(w)?;
    w.seek(SeekFrom::Start(end))?;
    Ok(())
}
