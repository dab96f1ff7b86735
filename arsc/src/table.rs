use crate::config::ConfigDescriptor;
use crate::error::{DecodeError, Result};
use crate::options::DecodeOptions;
use crate::res::ResId;
use crate::string_pool::StringPool;
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use zip::ZipArchive;

/// A parsed `@[package:]type/name` reference.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ref<'a> {
    pub package: Option<&'a str>,
    pub ty: &'a str,
    pub name: &'a str,
}

impl<'a> Ref<'a> {
    pub fn parse(s: &'a str) -> Option<Self> {
        let s = s.strip_prefix('@').unwrap_or(s);
        let (descr, name) = s.split_once('/')?;
        let (package, ty) = match descr.split_once(':') {
            Some((package, ty)) => (Some(package), ty),
            None => (None, descr),
        };
        Some(Self { package, ty, name })
    }
}

/// Decoded resource table. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResTable {
    /// Global value string pool.
    pub strings: StringPool,
    packages: Vec<ResPackage>,
}

impl ResTable {
    pub fn new(strings: StringPool) -> Self {
        Self {
            strings,
            packages: vec![],
        }
    }

    /// Extracts `resources.arsc` from an apk (or any zip) and decodes it.
    pub fn from_apk(path: &Path, opts: &DecodeOptions) -> Result<Self> {
        tracing::trace!("Parse `resources.arsc` chunk from `{path:?}`");
        let mut zip = ZipArchive::new(BufReader::new(File::open(path)?))?;
        let mut f = match zip.by_name("resources.arsc") {
            Ok(f) => f,
            Err(zip::result::ZipError::FileNotFound) => return Err(DecodeError::MissingTable),
            Err(err) => return Err(err.into()),
        };
        let mut buf = Vec::with_capacity(f.size() as usize);
        f.read_to_end(&mut buf)?;
        crate::decoder::decode_with_options(&buf, opts)
    }

    pub(crate) fn add_package(&mut self, package: ResPackage) -> Result<()> {
        if self.package(package.id).is_some() {
            return Err(DecodeError::DuplicatePackage { id: package.id });
        }
        self.packages.push(package);
        Ok(())
    }

    pub fn packages(&self) -> &[ResPackage] {
        &self.packages
    }

    pub fn package(&self, id: u8) -> Option<&ResPackage> {
        self.packages.iter().find(|package| package.id == id)
    }

    pub fn package_by_name(&self, name: &str) -> Option<&ResPackage> {
        self.packages.iter().find(|package| package.name == name)
    }

    /// Package that references without a `package:` prefix resolve
    /// against: the application package `0x7f` if present, else the first.
    pub fn main_package(&self) -> Option<&ResPackage> {
        self.package(0x7f).or_else(|| self.packages.first())
    }

    pub fn spec(&self, id: ResId) -> Option<&ResSpec> {
        self.package(id.package())?.spec(id)
    }

    /// Looks a spec up by a `@[package:]type/name` reference.
    pub fn lookup(&self, reference: &str) -> Option<&ResSpec> {
        let r = Ref::parse(reference)?;
        let package = match r.package {
            Some(name) => self.package_by_name(name)?,
            None => self.main_package()?,
        };
        package.spec_by_name(r.ty, r.name)
    }

    /// Value of `type/name` in package `package`, preferring the default
    /// configuration.
    pub fn value(&self, package: &str, ty: &str, name: &str) -> Option<&Value> {
        let spec = self.package_by_name(package)?.spec_by_name(ty, name)?;
        spec.default_resource().map(|res| &res.value)
    }

    /// `package:type/name` of a resource id.
    pub fn full_name(&self, id: ResId) -> Option<String> {
        let package = self.package(id.package())?;
        let spec = package.spec(id)?;
        let ty = package.ty(id.ty())?;
        Some(format!("{}:{}/{}", package.name, ty.name, spec.name))
    }

    /// Renders the global pool string `index` with its style spans as markup.
    pub fn html(&self, index: usize) -> Option<String> {
        self.strings.html(index)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResPackage {
    pub id: u8,
    pub name: String,
    types: BTreeMap<u8, ResType>,
    specs: BTreeMap<ResId, ResSpec>,
    /// Distinct configurations in first-seen order.
    configs: Vec<ConfigDescriptor>,
}

impl ResPackage {
    pub fn new(id: u8, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            types: BTreeMap::new(),
            specs: BTreeMap::new(),
            configs: vec![],
        }
    }

    pub fn types(&self) -> impl Iterator<Item = &ResType> + '_ {
        self.types.values()
    }

    pub fn ty(&self, id: u8) -> Option<&ResType> {
        self.types.get(&id)
    }

    pub fn type_by_name(&self, name: &str) -> Option<&ResType> {
        self.types.values().find(|ty| ty.name == name)
    }

    /// Returns the type `id`, creating it on first sight.
    pub(crate) fn get_or_create_type(&mut self, id: u8, name: &str) -> &mut ResType {
        self.types.entry(id).or_insert_with(|| ResType {
            id,
            name: name.to_string(),
            specs: BTreeSet::new(),
        })
    }

    pub fn specs(&self) -> impl Iterator<Item = &ResSpec> + '_ {
        self.specs.values()
    }

    pub fn spec(&self, id: ResId) -> Option<&ResSpec> {
        self.specs.get(&id)
    }

    pub fn spec_by_name(&self, ty: &str, name: &str) -> Option<&ResSpec> {
        self.type_by_name(ty)?
            .specs
            .iter()
            .filter_map(|id| self.specs.get(id))
            .find(|spec| spec.name == name)
    }

    pub(crate) fn get_or_create_spec(&mut self, id: ResId, name: &str) -> &mut ResSpec {
        if let Some(ty) = self.types.get_mut(&id.ty()) {
            ty.specs.insert(id);
        }
        self.specs.entry(id).or_insert_with(|| ResSpec {
            id,
            name: name.to_string(),
            resources: vec![],
        })
    }

    pub fn configs(&self) -> &[ConfigDescriptor] {
        &self.configs
    }

    pub(crate) fn add_config(&mut self, config: &ConfigDescriptor) {
        if !self.configs.contains(config) {
            self.configs.push(config.clone());
        }
    }

    /// Resources of type `ty` in `config`, ordered by id.
    pub fn resources<'a>(
        &'a self,
        ty: &'a ResType,
        config: &'a ConfigDescriptor,
    ) -> impl Iterator<Item = (&'a ResSpec, &'a ResResource)> + 'a {
        ty.specs
            .iter()
            .filter_map(|id| self.specs.get(id))
            .filter_map(move |spec| Some((spec, spec.resource(config)?)))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResType {
    pub id: u8,
    pub name: String,
    specs: BTreeSet<ResId>,
}

impl ResType {
    /// Ids of the specs of this type in ascending order.
    pub fn specs(&self) -> impl Iterator<Item = ResId> + '_ {
        self.specs.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Identity of one resource across all of its configurations.
#[derive(Clone, Debug)]
pub struct ResSpec {
    pub id: ResId,
    pub name: String,
    resources: Vec<ResResource>,
}

impl ResSpec {
    pub fn resources(&self) -> &[ResResource] {
        &self.resources
    }

    pub fn resource(&self, config: &ConfigDescriptor) -> Option<&ResResource> {
        self.resources.iter().find(|res| &res.config == config)
    }

    pub fn default_resource(&self) -> Option<&ResResource> {
        self.resources
            .iter()
            .find(|res| res.config.is_default())
            .or_else(|| self.resources.first())
    }

    /// Adds the value for `config`. A second value for the same config is
    /// reported as [`DecodeError::DuplicateResource`]; callers decide
    /// whether that is fatal. The first value is kept.
    pub(crate) fn add_resource(&mut self, config: ConfigDescriptor, value: Value) -> Result<()> {
        if self.resource(&config).is_some() {
            return Err(DecodeError::DuplicateResource {
                id: self.id,
                qualifiers: config.qualifiers(),
            });
        }
        self.resources.push(ResResource { config, value });
        Ok(())
    }
}

/// Resources are keyed by config, their order is not part of the identity.
impl PartialEq for ResSpec {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.resources.len() == other.resources.len()
            && self
                .resources
                .iter()
                .all(|res| other.resource(&res.config) == Some(res))
    }
}

/// One value of a spec in one configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ResResource {
    pub config: ConfigDescriptor,
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Scalar;

    fn table() -> anyhow::Result<ResTable> {
        let mut package = ResPackage::new(0x7f, "com.example");
        package.get_or_create_type(1, "string");
        let default = ConfigDescriptor::default();
        let de: ConfigDescriptor = "de".parse()?;
        package.add_config(&default);
        package.add_config(&de);
        let spec = package.get_or_create_spec(ResId::new(0x7f, 1, 0), "hello");
        spec.add_resource(de.clone(), Value::Scalar(Scalar::Int(2)))?;
        spec.add_resource(default.clone(), Value::Scalar(Scalar::Int(1)))?;
        let mut table = ResTable::default();
        table.add_package(package)?;
        Ok(table)
    }

    #[test]
    fn test_ref_parse() {
        let r = Ref::parse("@android:string/ok").unwrap();
        assert_eq!(r.package, Some("android"));
        assert_eq!(r.ty, "string");
        assert_eq!(r.name, "ok");
        let r = Ref::parse("mipmap/icon").unwrap();
        assert_eq!(r.package, None);
        assert!(Ref::parse("@nothing").is_none());
    }

    #[test]
    fn test_lookups() -> anyhow::Result<()> {
        let table = table()?;
        let id = ResId(0x7f01_0000);
        assert_eq!(table.package_by_name("com.example").map(|p| p.id), Some(0x7f));
        assert_eq!(table.spec(id).map(|s| s.name.as_str()), Some("hello"));
        assert_eq!(table.lookup("@string/hello").map(|s| s.id), Some(id));
        assert_eq!(table.lookup("@com.example:string/hello").map(|s| s.id), Some(id));
        assert!(table.lookup("@string/missing").is_none());
        assert_eq!(
            table.value("com.example", "string", "hello"),
            Some(&Value::Scalar(Scalar::Int(1)))
        );
        assert_eq!(table.full_name(id).as_deref(), Some("com.example:string/hello"));
        let package = table.package(0x7f).unwrap();
        assert_eq!(package.configs().len(), 2);
        assert_eq!(package.ty(1).map(ResType::len), Some(1));
        Ok(())
    }

    #[test]
    fn test_duplicate_resource_keeps_first() -> anyhow::Result<()> {
        let mut package = ResPackage::new(0x7f, "com.example");
        package.get_or_create_type(1, "string");
        let spec = package.get_or_create_spec(ResId::new(0x7f, 1, 0), "hello");
        spec.add_resource(Default::default(), Value::Scalar(Scalar::Int(1)))?;
        let err = spec
            .add_resource(Default::default(), Value::Scalar(Scalar::Int(2)))
            .unwrap_err();
        assert!(matches!(err, DecodeError::DuplicateResource { .. }));
        assert_eq!(spec.resources().len(), 1);
        Ok(())
    }

    #[test]
    fn test_duplicate_package() -> anyhow::Result<()> {
        let mut table = table()?;
        let err = table
            .add_package(ResPackage::new(0x7f, "other"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::DuplicatePackage { id: 0x7f }));
        Ok(())
    }

    #[test]
    fn test_table_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ResTable>();
    }
}
