use crate::config::ConfigDescriptor;
use crate::error::Result;
use crate::res::{
    ChunkType, ChunkWriter, ResTableEntry, ResTableHeader, ResTablePackageHeader,
    ResTableTypeHeader, ResTableTypeSpecHeader,
};
use crate::string_pool::StringPool;
use crate::table::{ResPackage, ResTable, ResType};
use byteorder::{LittleEndian, WriteBytesExt};
use std::collections::HashMap;
use std::io::{Cursor, Seek, SeekFrom, Write};
use std::num::NonZeroU8;

/// Re-emits a table as `resources.arsc` bytes.
///
/// The global pool is written as it was decoded so string value indices
/// stay valid. Type and key pools are rebuilt from the model.
pub fn encode(table: &ResTable) -> Result<Vec<u8>> {
    let mut w = Cursor::new(Vec::new());
    let mut chunk = ChunkWriter::start_chunk(ChunkType::Table, &mut w)?;
    ResTableHeader {
        package_count: table.packages().len() as u32,
    }
    .write(&mut w)?;
    chunk.end_header(&mut w)?;
    table.strings.write(&mut w)?;
    for package in table.packages() {
        write_package(package, &mut w)?;
    }
    chunk.end_chunk(&mut w)?;
    Ok(w.into_inner())
}

/// Spec names deduplicated in id order.
struct KeyPool<'a> {
    names: Vec<&'a str>,
    index: HashMap<&'a str, u32>,
}

impl<'a> KeyPool<'a> {
    fn new(package: &'a ResPackage) -> Self {
        let mut pool = Self {
            names: vec![],
            index: HashMap::new(),
        };
        for spec in package.specs() {
            let next = pool.names.len() as u32;
            pool.index.entry(&spec.name).or_insert_with(|| {
                pool.names.push(&spec.name);
                next
            });
        }
        pool
    }

    fn key(&self, name: &str) -> u32 {
        self.index.get(name).copied().unwrap_or(ResTableTypeHeader::NO_ENTRY)
    }
}

fn write_package<W: Seek + Write>(package: &ResPackage, w: &mut W) -> Result<()> {
    tracing::trace!("writing package {:#04x} `{}`", package.id, package.name);
    let mut chunk = ChunkWriter::start_chunk(ChunkType::TablePackage, w)?;
    let header_start = w.stream_position()?;
    let mut header = ResTablePackageHeader {
        id: package.id as u32,
        name: package.name.clone(),
        type_strings: 0,
        last_public_type: 0,
        key_strings: 0,
        last_public_key: 0,
        type_id_offset: 0,
    };
    header.write(w)?;
    chunk.end_header(w)?;

    let max_type = package.types().map(|ty| ty.id).max().unwrap_or(0);
    let mut type_names = vec![""; max_type as usize];
    for ty in package.types() {
        type_names[ty.id as usize - 1] = &ty.name;
    }
    header.type_strings = (w.stream_position()? - chunk.start()) as u32;
    header.last_public_type = type_names.len() as u32;
    StringPool::build(&type_names, &[], false)?.write(w)?;

    let keys = KeyPool::new(package);
    header.key_strings = (w.stream_position()? - chunk.start()) as u32;
    header.last_public_key = keys.names.len() as u32;
    StringPool::build(&keys.names, &[], true)?.write(w)?;

    for (i, ty) in package.types().enumerate() {
        write_type(package, ty, &keys, i == 0, w)?;
    }
    chunk.end_chunk(w)?;

    let end = w.stream_position()?;
    w.seek(SeekFrom::Start(header_start))?;
    header.write(w)?;
    w.seek(SeekFrom::Start(end))?;
    Ok(())
}

/// Writes the spec and the type chunks of `ty`. With `every_config` a chunk
/// is written for each package config, empty or not, so that configs without
/// entries and the first-seen config order survive a round trip.
fn write_type<W: Seek + Write>(
    package: &ResPackage,
    ty: &ResType,
    keys: &KeyPool,
    every_config: bool,
    w: &mut W,
) -> Result<()> {
    // ids are validated when the type is created
    let Some(id) = NonZeroU8::new(ty.id) else {
        return Ok(());
    };
    let entry_count = ty.specs().map(|id| id.entry() as u32 + 1).max().unwrap_or(0);

    let mut chunk = ChunkWriter::start_chunk(ChunkType::TableTypeSpec, w)?;
    ResTableTypeSpecHeader {
        id,
        res0: 0,
        types_count: 0,
        entry_count,
    }
    .write(w)?;
    chunk.end_header(w)?;
    for _ in 0..entry_count {
        w.write_u32::<LittleEndian>(0)?;
    }
    chunk.end_chunk(w)?;

    for config in package.configs() {
        let mut entries = vec![None; entry_count as usize];
        for (spec, res) in package.resources(ty, config) {
            entries[spec.id.entry() as usize] = Some(ResTableEntry {
                flags: 0,
                key: keys.key(&spec.name),
                value: res.value.to_table_value(),
            });
        }
        if every_config || entries.iter().any(Option::is_some) {
            write_type_chunk(id, config, &entries, w)?;
        }
    }
    Ok(())
}

fn write_type_chunk<W: Seek + Write>(
    id: NonZeroU8,
    config: &ConfigDescriptor,
    entries: &[Option<ResTableEntry>],
    w: &mut W,
) -> Result<()> {
    tracing::trace!("writing type {id} for `{config}`");
    let mut chunk = ChunkWriter::start_chunk(ChunkType::TableType, w)?;
    let header_start = w.stream_position()?;
    let mut header = ResTableTypeHeader {
        id,
        flags: 0,
        res1: 0,
        entry_count: entries.len() as u32,
        entries_start: 0,
        config: config.clone(),
    };
    header.write(w)?;
    let end_header = chunk.end_header(w)?;

    // offsets are patched once the entries are out
    for _ in entries {
        w.write_u32::<LittleEndian>(0)?;
    }
    let entries_pos = w.stream_position()?;
    let mut offsets = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Some(entry) => {
                offsets.push((w.stream_position()? - entries_pos) as u32);
                entry.write(w)?;
            }
            None => offsets.push(ResTableTypeHeader::NO_ENTRY),
        }
    }
    let (start, _, end) = chunk.end_chunk(w)?;

    w.seek(SeekFrom::Start(end_header))?;
    for offset in offsets {
        w.write_u32::<LittleEndian>(offset)?;
    }
    header.entries_start = (entries_pos - start) as u32;
    w.seek(SeekFrom::Start(header_start))?;
    header.write(w)?;
    w.seek(SeekFrom::Start(end))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use crate::res::ResId;
    use crate::value::{Scalar, Value};

    #[test]
    fn test_empty_table_round_trip() -> anyhow::Result<()> {
        let table = ResTable::default();
        let bytes = encode(&table)?;
        assert_eq!(decode(&bytes)?, table);
        Ok(())
    }

    #[test]
    fn test_package_round_trip() -> anyhow::Result<()> {
        let mut package = ResPackage::new(0x7f, "com.example");
        package.get_or_create_type(2, "dimen");
        let default = ConfigDescriptor::default();
        let land: ConfigDescriptor = "land".parse()?;
        package.add_config(&default);
        package.add_config(&land);
        let spec = package.get_or_create_spec(ResId::new(0x7f, 2, 3), "margin");
        spec.add_resource(default.clone(), Value::Scalar(Scalar::Dimension(16 << 8 | 1)))?;
        spec.add_resource(land, Value::Scalar(Scalar::Dimension(24 << 8 | 1)))?;
        let mut table = ResTable::default();
        table.add_package(package)?;

        let decoded = decode(&encode(&table)?)?;
        assert_eq!(decoded, table);
        let package = decoded.package(0x7f).unwrap();
        // type 1 has no name but keeps its slot in the type pool
        assert!(package.ty(1).is_none());
        assert_eq!(package.ty(2).map(|ty| ty.name.as_str()), Some("dimen"));
        let value = decoded.value("com.example", "dimen", "margin");
        assert_eq!(value.and_then(Value::as_scalar).map(ToString::to_string).as_deref(), Some("16.0dip"));
        Ok(())
    }

    #[test]
    fn test_configs_without_entries_survive() -> anyhow::Result<()> {
        let mut package = ResPackage::new(0x7f, "com.example");
        package.get_or_create_type(1, "bool");
        package.get_or_create_type(2, "integer");
        let default = ConfigDescriptor::default();
        let sdk: ConfigDescriptor = "v21".parse()?;
        let land: ConfigDescriptor = "land".parse()?;
        package.add_config(&land);
        package.add_config(&sdk);
        package.add_config(&default);
        let spec = package.get_or_create_spec(ResId::new(0x7f, 1, 0), "enabled");
        spec.add_resource(default.clone(), Value::Scalar(Scalar::Bool(true)))?;
        let spec = package.get_or_create_spec(ResId::new(0x7f, 2, 0), "columns");
        spec.add_resource(land.clone(), Value::Scalar(Scalar::Int(3)))?;
        let mut table = ResTable::default();
        table.add_package(package)?;

        let decoded = decode(&encode(&table)?)?;
        let package = decoded.package(0x7f).unwrap();
        // v21 holds no entries in any type
        assert_eq!(package.configs().to_vec(), vec![land, sdk, default]);
        assert_eq!(decoded, table);
        Ok(())
    }
}
