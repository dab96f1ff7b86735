use crate::error::{DecodeError, Result};
use crate::options::DecodeOptions;
use crate::reader::{Chunk, ChunkReader};
use crate::res::{
    ChunkType, ResId, ResTableEntry, ResTableHeader, ResTablePackageHeader,
    ResTableTypeHeader, ResTableTypeSpecHeader, ResTableValue,
};
use crate::string_pool::StringPool;
use crate::table::{ResPackage, ResTable};
use crate::value::{Bag, Scalar, Value};

/// Decodes a `resources.arsc` buffer with the default tolerances.
pub fn decode(data: &[u8]) -> Result<ResTable> {
    decode_with_options(data, &DecodeOptions::default())
}

pub fn decode_with_options(data: &[u8], opts: &DecodeOptions) -> Result<ResTable> {
    let mut decoder = TableDecoder {
        r: ChunkReader::new(data),
        opts,
    };
    let table = decoder.table()?;
    if decoder.r.remaining() > 0 {
        tracing::debug!("ignoring {} bytes after the table chunk", decoder.r.remaining());
    }
    Ok(table)
}

/// Per package state: the name pools and the type id shift.
struct PackageContext {
    types: StringPool,
    keys: StringPool,
    type_id_offset: u8,
}

struct TableDecoder<'a> {
    r: ChunkReader<'a>,
    opts: &'a DecodeOptions,
}

impl TableDecoder<'_> {
    fn table(&mut self) -> Result<ResTable> {
        let chunk = self.r.expect_chunk(ChunkType::Table)?;
        let header = ResTableHeader::read(&mut self.r)?;
        tracing::trace!("table with {} packages", header.package_count);
        self.r.seek(chunk.header_end())?;

        let mut table = ResTable::default();
        while self.r.position() < chunk.end() {
            let child = self.r.peek_chunk()?;
            match child.ty() {
                Some(ChunkType::StringPool) => {
                    tracing::trace!("table string pool");
                    table.strings = StringPool::read_chunk(&mut self.r, self.opts)?;
                }
                Some(ChunkType::TablePackage) => {
                    let package = self.package(&table.strings)?;
                    table.add_package(package)?;
                }
                Some(ChunkType::Null) => {
                    tracing::warn!(
                        "skipping null chunk of {} bytes at {:#x}",
                        child.header.size,
                        child.start
                    );
                }
                _ => {
                    return Err(DecodeError::UnexpectedChunk {
                        offset: child.start,
                        expected: ChunkType::TablePackage as u16,
                        found: child.header.ty,
                    })
                }
            }
            self.r.seek(child.end())?;
        }
        if table.packages().len() != header.package_count as usize {
            tracing::warn!(
                "table declares {} packages but contains {}",
                header.package_count,
                table.packages().len()
            );
        }
        Ok(table)
    }

    fn package(&mut self, strings: &StringPool) -> Result<ResPackage> {
        let chunk = self.r.expect_chunk(ChunkType::TablePackage)?;
        let header = ResTablePackageHeader::read(&mut self.r, &chunk)?;
        let id = u8::try_from(header.id).map_err(|_| DecodeError::InvalidChunk {
            offset: chunk.start,
            reason: format!("package id {:#x} does not fit in a byte", header.id),
        })?;
        tracing::trace!("table package {id:#04x} `{}`", header.name);
        let type_id_offset = u8::try_from(header.type_id_offset).map_err(|_| {
            DecodeError::InvalidChunk {
                offset: chunk.start,
                reason: format!("type id offset {} does not fit in a byte", header.type_id_offset),
            }
        })?;
        if type_id_offset > 0 {
            tracing::warn!("package `{}` shifts its type ids by {type_id_offset}", header.name);
        }

        let mut body = chunk.header_end();
        let types = self.name_pool(&chunk, header.type_strings, &mut body)?;
        let keys = self.name_pool(&chunk, header.key_strings, &mut body)?;
        let ctx = PackageContext {
            types,
            keys,
            type_id_offset,
        };
        self.r.seek(body)?;

        let mut package = ResPackage::new(id, header.name);
        while self.r.position() < chunk.end() {
            let child = self.r.read_chunk()?;
            match child.ty() {
                Some(ChunkType::TableTypeSpec) => self.type_spec(&child, &ctx, &mut package)?,
                Some(ChunkType::TableType) => self.ty(&child, &ctx, strings, &mut package)?,
                Some(ty) if ty.is_auxiliary() => {
                    tracing::debug!("skipping {ty:?} chunk at {:#x}", child.start);
                    self.opts.unknown_chunks.check(|| DecodeError::UnknownChunk {
                        offset: child.start,
                        ty: child.header.ty,
                    })?;
                }
                Some(ChunkType::Null) => {
                    tracing::warn!(
                        "skipping null chunk of {} bytes at {:#x}",
                        child.header.size,
                        child.start
                    );
                }
                _ => {
                    return Err(DecodeError::UnexpectedChunk {
                        offset: child.start,
                        expected: ChunkType::TableType as u16,
                        found: child.header.ty,
                    })
                }
            }
            self.r.seek(child.end())?;
        }
        Ok(package)
    }

    /// Reads the pool at `offset` from the package start. A zero offset means
    /// the package inherits its names and gets an empty pool.
    fn name_pool(&mut self, package: &Chunk, offset: u32, body: &mut usize) -> Result<StringPool> {
        if offset == 0 {
            return Ok(StringPool::default());
        }
        let start = package.start + offset as usize;
        if start < package.header_end() || start >= package.end() {
            return Err(DecodeError::InvalidChunk {
                offset: package.start,
                reason: format!("name pool offset {offset:#x} lies outside of the package body"),
            });
        }
        let mut r = self.r.bounded(package.end())?;
        r.seek(start)?;
        let pool = StringPool::read_chunk(&mut r, self.opts)?;
        *body = (*body).max(r.position());
        Ok(pool)
    }

    fn type_id(&self, chunk: &Chunk, id: u8, ctx: &PackageContext) -> Result<u8> {
        match id.checked_sub(ctx.type_id_offset) {
            Some(id) if id > 0 => Ok(id),
            _ => Err(DecodeError::InvalidChunk {
                offset: chunk.start,
                reason: format!("type id {id} is not above the offset {}", ctx.type_id_offset),
            }),
        }
    }

    fn type_name(ctx: &PackageContext, id: u8) -> String {
        ctx.types.get(id as usize - 1).unwrap_or_else(|| {
            tracing::warn!("type {id:#04x} has no name, using a generated one");
            format!("type{id:02x}")
        })
    }

    fn type_spec(&mut self, chunk: &Chunk, ctx: &PackageContext, package: &mut ResPackage) -> Result<()> {
        let header = ResTableTypeSpecHeader::read(&mut self.r)?;
        let id = self.type_id(chunk, header.id.get(), ctx)?;
        let name = Self::type_name(ctx, id);
        tracing::trace!("table type spec `{name}` with {} entries", header.entry_count);
        package.get_or_create_type(id, &name);
        Ok(())
    }

    fn ty(
        &mut self,
        chunk: &Chunk,
        ctx: &PackageContext,
        strings: &StringPool,
        package: &mut ResPackage,
    ) -> Result<()> {
        let header = ResTableTypeHeader::read(&mut self.r, self.opts.oversized_config)?;
        let type_id = self.type_id(chunk, header.id.get(), ctx)?;
        // Older tools emit type chunks without a preceding type spec.
        let type_name = match package.ty(type_id).map(|ty| ty.name.clone()) {
            Some(name) => name,
            None => {
                let name = Self::type_name(ctx, type_id);
                package.get_or_create_type(type_id, &name);
                name
            }
        };
        let config = &header.config;
        tracing::trace!(
            "table type `{type_name}{}` with {} entries",
            config.qualifiers(),
            header.entry_count
        );
        package.add_config(config);
        self.r.seek(chunk.header_end())?;
        // nothing below may read past this type chunk
        let mut r = self.r.bounded(chunk.end())?;

        let count = header.entry_count as usize;
        let mut offsets = Vec::with_capacity(count.min(r.remaining() / 2));
        for i in 0..count {
            offsets.push(if header.is_sparse() {
                let idx = r.read_u16()?;
                (idx, r.read_u16()? as u32 * 4)
            } else if header.is_offset16() {
                (i as u16, ResTableTypeHeader::offset_from16(r.read_u16()?))
            } else {
                (i as u16, r.read_u32()?)
            });
        }

        let entries_start = chunk.start + header.entries_start as usize;
        for (idx, offset) in offsets {
            if offset == ResTableTypeHeader::NO_ENTRY {
                continue;
            }
            let start = entries_start.saturating_add(offset as usize);
            if start >= chunk.end() {
                tracing::warn!("entry {idx} of `{type_name}` lies past its chunk at {start:#x}");
                continue;
            }
            r.seek(start)?;
            let entry = ResTableEntry::read(&mut r).map_err(|err| match err {
                DecodeError::TruncatedInput { offset, .. } => DecodeError::InvalidValue {
                    offset,
                    reason: format!("entry overruns its type chunk ending at {:#x}", chunk.end()),
                },
                err => err,
            });
            let entry = match entry {
                Ok(entry) => entry,
                Err(err @ DecodeError::InvalidValue { .. }) => {
                    tracing::warn!("dropping entry {idx} of `{type_name}`: {err}");
                    continue;
                }
                Err(err) => return Err(err),
            };
            if entry.key == ResTableTypeHeader::NO_ENTRY {
                tracing::debug!("entry {idx} of `{type_name}` has no key");
                continue;
            }

            let id = ResId::new(package.id, type_id, idx);
            let value = match &entry.value {
                ResTableValue::Simple(value) => {
                    let scalar = match Scalar::from_res_value(value, strings) {
                        // a string resource is never a file
                        Scalar::File { index, path } if type_name == "string" => Scalar::String {
                            index,
                            text: Some(path),
                        },
                        scalar => scalar,
                    };
                    Value::Scalar(scalar)
                }
                ResTableValue::Complex(map_entry, map) => {
                    Value::Bag(Bag::from_map(map_entry, map, strings, &type_name))
                }
            };
            let name = ctx.keys.get(entry.key as usize).unwrap_or_else(|| {
                tracing::warn!("key {} of {id} has no name, using a generated one", entry.key);
                format!("{type_name}_{:04x}", id.entry())
            });
            let spec = package.get_or_create_spec(id, &name);
            if let Err(err) = spec.add_resource(config.clone(), value) {
                self.opts.duplicate_resources.check(|| err)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Tolerance;
    use crate::res::{ChunkWriter, ResChunkHeader};
    use std::io::Cursor;

    fn table_with(children: &[(ChunkType, u32)]) -> anyhow::Result<Vec<u8>> {
        let mut w = Cursor::new(Vec::new());
        let mut chunk = ChunkWriter::start_chunk(ChunkType::Table, &mut w)?;
        ResTableHeader { package_count: 0 }.write(&mut w)?;
        chunk.end_header(&mut w)?;
        StringPool::default().write(&mut w)?;
        for (ty, size) in children {
            ResChunkHeader {
                ty: *ty as u16,
                header_size: 8,
                size: *size,
            }
            .write(&mut w)?;
            std::io::Write::write_all(&mut w, &vec![0; *size as usize - 8])?;
        }
        chunk.end_chunk(&mut w)?;
        Ok(w.into_inner())
    }

    #[test]
    fn test_empty_table() -> anyhow::Result<()> {
        crate::tests::init_logger()?;
        let table = decode(&table_with(&[])?)?;
        assert!(table.packages().is_empty());
        assert!(table.strings.is_empty());
        Ok(())
    }

    #[test]
    fn test_not_a_table() {
        let buf = table_with(&[]).unwrap();
        // the string pool is not a valid outer chunk
        let err = decode(&buf[12..]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedChunk {
                offset: 0,
                expected: 0x0002,
                found: 0x0001
            }
        ));
    }

    #[test]
    fn test_unexpected_chunk_in_table() -> anyhow::Result<()> {
        let buf = table_with(&[(ChunkType::TableType, 16)])?;
        let err = decode(&buf).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedChunk { found: 0x0201, .. }));
        assert_eq!(err.offset(), Some(buf.len() - 16));
        Ok(())
    }

    #[test]
    fn test_null_chunk_is_skipped() -> anyhow::Result<()> {
        let table = decode(&table_with(&[(ChunkType::Null, 12)])?)?;
        assert!(table.packages().is_empty());
        Ok(())
    }

    #[test]
    fn test_truncated_table() -> anyhow::Result<()> {
        let buf = table_with(&[])?;
        let err = decode(&buf[..buf.len() - 4]).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedInput { offset: 0, .. }));

        let opts = DecodeOptions {
            truncated_offsets: Tolerance::Reject,
            ..Default::default()
        };
        assert!(decode_with_options(&buf, &opts).is_ok());
        Ok(())
    }
}
