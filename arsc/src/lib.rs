//! Decoder for compiled Android resource tables (`resources.arsc`).
//!
//! The table is decoded into a [`ResTable`] of packages, types, specs and
//! per-configuration values. [`encode`] writes a table back out.
pub mod config;
mod decoder;
mod encoder;
mod error;
pub mod ninepatch;
mod options;
pub mod reader;
pub mod res;
pub mod string_pool;
pub mod styled;
mod table;
pub mod value;

pub use crate::config::ConfigDescriptor;
pub use crate::decoder::{decode, decode_with_options};
pub use crate::encoder::encode;
pub use crate::error::{DecodeError, Result};
pub use crate::ninepatch::{LayoutBounds, NinePatch};
pub use crate::options::{DecodeOptions, Tolerance};
pub use crate::reader::ChunkReader;
pub use crate::res::ResId;
pub use crate::string_pool::StringPool;
pub use crate::styled::Span;
pub use crate::table::{Ref, ResPackage, ResResource, ResSpec, ResTable, ResType};
pub use crate::value::{AttrDef, AttrKind, Bag, BagKind, Scalar, Value};

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{BufReader, Read};
    use std::path::Path;
    use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};
    use zip::ZipArchive;

    pub fn init_logger() -> anyhow::Result<()> {
        tracing_log::LogTracer::init().ok();
        let env = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| "info".to_owned());
        let subscriber = tracing_subscriber::FmtSubscriber::builder()
            .with_span_events(FmtSpan::ACTIVE | FmtSpan::CLOSE)
            .with_env_filter(EnvFilter::new(env))
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
        Ok(())
    }

    #[test]
    fn test_parse_android_resources() -> anyhow::Result<()> {
        init_logger()?;
        let Ok(home) = std::env::var("ANDROID_HOME") else {
            return Ok(());
        };
        let platforms = Path::new(&home).join("platforms");
        if !platforms.exists() {
            return Ok(());
        }
        for entry in std::fs::read_dir(platforms)? {
            let platform = entry?;
            let android = platform.path().join("android.jar");
            if !android.exists() {
                continue;
            }
            let mut zip = ZipArchive::new(BufReader::new(File::open(&android)?))?;
            let mut f = zip.by_name("resources.arsc")?;
            let mut buf = vec![];
            f.read_to_end(&mut buf)?;
            tracing::info!("parsing {}", android.display());
            let table = decode(&buf)?;
            let android = table.package_by_name("android").unwrap();
            assert_eq!(android.id, 0x01);
            assert!(table.lookup("@android:attr/layout_width").is_some());
            assert_eq!(decode(&encode(&table)?)?, table);
        }
        Ok(())
    }
}
