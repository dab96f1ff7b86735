use crate::res::{
    ResAttributeType, ResId, ResTableMap, ResTableMapEntry, ResTableValue, ResValue, ResValueType,
};
use crate::string_pool::StringPool;
use std::fmt;

pub const BAG_KEY_ATTR_TYPE: u32 = 0x0100_0000;
pub const BAG_KEY_ATTR_MIN: u32 = 0x0100_0001;
pub const BAG_KEY_ATTR_MAX: u32 = 0x0100_0002;
pub const BAG_KEY_ATTR_L10N: u32 = 0x0100_0003;

const BAG_KEY_PLURALS: [(u32, &str); 6] = [
    (0x0100_0004, "other"),
    (0x0100_0005, "zero"),
    (0x0100_0006, "one"),
    (0x0100_0007, "two"),
    (0x0100_0008, "few"),
    (0x0100_0009, "many"),
];

const DATA_NULL_EMPTY: u32 = 1;

const COMPLEX_UNIT_MASK: u32 = 0xf;
const COMPLEX_RADIX_SHIFT: u32 = 4;
const COMPLEX_RADIX_MASK: u32 = 0x3;
const COMPLEX_MANTISSA_MASK: u32 = 0xffff_ff00;
const MANTISSA_MULT: f32 = 1.0 / (1 << 8) as f32;
const RADIX_MULTS: [f32; 4] = [
    MANTISSA_MULT,
    MANTISSA_MULT / (1 << 7) as f32,
    MANTISSA_MULT / (1 << 15) as f32,
    MANTISSA_MULT / (1 << 23) as f32,
];
const DIMENSION_UNITS: [&str; 6] = ["px", "dip", "sp", "pt", "in", "mm"];
const FRACTION_UNITS: [&str; 2] = ["%", "%p"];

/// Decodes a complex dimension or fraction word into its magnitude.
pub fn complex_to_float(complex: u32) -> f32 {
    let mantissa = (complex & COMPLEX_MANTISSA_MASK) as i32 as f32;
    mantissa * RADIX_MULTS[((complex >> COMPLEX_RADIX_SHIFT) & COMPLEX_RADIX_MASK) as usize]
}

/// Resource value, either one scalar or a bag of them.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Bag(Bag),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(scalar) => Some(scalar),
            Self::Bag(_) => None,
        }
    }

    pub fn as_bag(&self) -> Option<&Bag> {
        match self {
            Self::Bag(bag) => Some(bag),
            Self::Scalar(_) => None,
        }
    }

    pub fn to_table_value(&self) -> ResTableValue {
        match self {
            Self::Scalar(scalar) => ResTableValue::Simple(scalar.to_res_value()),
            Self::Bag(bag) => {
                let map: Vec<_> = bag
                    .items
                    .iter()
                    .map(|(name, value)| ResTableMap {
                        name: name.0,
                        value: value.to_res_value(),
                    })
                    .collect();
                let entry = ResTableMapEntry {
                    parent: bag.parent.map(u32::from).unwrap_or_default(),
                    count: map.len() as u32,
                };
                ResTableValue::Complex(entry, map)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// Undefined value, `@null`.
    Null,
    /// Explicitly empty value, `@empty`.
    Empty,
    Reference(ResId),
    /// Theme attribute reference, `?attr`.
    Attribute(ResId),
    /// Index into the table string pool; `text` is `None` when the string
    /// could not be decoded.
    String {
        index: u32,
        text: Option<String>,
    },
    /// A string naming a file inside the package.
    File {
        index: u32,
        path: String,
    },
    /// IEEE 754 bits.
    Float(u32),
    /// Complex dimension word.
    Dimension(u32),
    /// Complex fraction word.
    Fraction(u32),
    Int(i32),
    Hex(u32),
    Bool(bool),
    Color(ResValueType, u32),
    Raw {
        data_type: u8,
        data: u32,
    },
}

impl Scalar {
    /// Maps a raw typed value, resolving strings through the table pool.
    pub fn from_res_value(value: &ResValue, strings: &StringPool) -> Self {
        let data = value.data;
        let Some(ty) = ResValueType::from_u8(value.data_type) else {
            tracing::warn!("unknown value type {:#04x} with data {data:#010x}", value.data_type);
            return Self::Raw {
                data_type: value.data_type,
                data,
            };
        };
        match ty {
            ResValueType::Null if data == DATA_NULL_EMPTY => Self::Empty,
            ResValueType::Null => Self::Null,
            ResValueType::Reference | ResValueType::DynamicReference => Self::Reference(ResId(data)),
            ResValueType::Attribute | ResValueType::DynamicAttribute => Self::Attribute(ResId(data)),
            ResValueType::String => match strings.get(data as usize) {
                Some(path) if is_file_path(&path) => Self::File { index: data, path },
                text => Self::String { index: data, text },
            },
            ResValueType::Float => Self::Float(data),
            ResValueType::Dimension => Self::Dimension(data),
            ResValueType::Fraction => Self::Fraction(data),
            ResValueType::IntDec => Self::Int(data as i32),
            ResValueType::IntHex => Self::Hex(data),
            ResValueType::IntBoolean => Self::Bool(data != 0),
            ResValueType::IntColorArgb8
            | ResValueType::IntColorRgb8
            | ResValueType::IntColorArgb4
            | ResValueType::IntColorRgb4 => Self::Color(ty, data),
        }
    }

    pub fn to_res_value(&self) -> ResValue {
        let (ty, data) = match self {
            Self::Null => (ResValueType::Null, 0),
            Self::Empty => (ResValueType::Null, DATA_NULL_EMPTY),
            Self::Reference(id) => (ResValueType::Reference, id.0),
            Self::Attribute(id) => (ResValueType::Attribute, id.0),
            Self::String { index, .. } | Self::File { index, .. } => (ResValueType::String, *index),
            Self::Float(bits) => (ResValueType::Float, *bits),
            Self::Dimension(data) => (ResValueType::Dimension, *data),
            Self::Fraction(data) => (ResValueType::Fraction, *data),
            Self::Int(value) => (ResValueType::IntDec, *value as u32),
            Self::Hex(value) => (ResValueType::IntHex, *value),
            Self::Bool(value) => (ResValueType::IntBoolean, if *value { u32::MAX } else { 0 }),
            Self::Color(ty, argb) => (*ty, *argb),
            Self::Raw { data_type, data } => {
                return ResValue {
                    size: ResValue::SIZE,
                    res0: 0,
                    data_type: *data_type,
                    data: *data,
                }
            }
        };
        ResValue::new(ty, data)
    }

    /// The 32-bit data word the value was decoded from.
    pub fn data(&self) -> u32 {
        self.to_res_value().data
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(bits) => Some(f32::from_bits(*bits)),
            Self::Dimension(data) => Some(complex_to_float(*data)),
            Self::Fraction(data) => Some(complex_to_float(*data) * 100.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String { text, .. } => text.as_deref(),
            Self::File { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn reference(&self) -> Option<ResId> {
        match self {
            Self::Reference(id) | Self::Attribute(id) if id.0 != 0 => Some(*id),
            _ => None,
        }
    }
}

fn is_file_path(s: &str) -> bool {
    s.starts_with("res/") || s.starts_with("r/") || s.starts_with("R/")
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("@null"),
            Self::Empty => f.write_str("@empty"),
            Self::Reference(id) if id.0 == 0 => f.write_str("@null"),
            Self::Reference(id) => write!(f, "@{id}"),
            Self::Attribute(id) => write!(f, "?{id}"),
            Self::String { text, .. } => f.write_str(text.as_deref().unwrap_or_default()),
            Self::File { path, .. } => f.write_str(path),
            Self::Float(bits) => write!(f, "{:?}", f32::from_bits(*bits)),
            Self::Dimension(data) => {
                let unit = DIMENSION_UNITS
                    .get((data & COMPLEX_UNIT_MASK) as usize)
                    .unwrap_or(&"");
                write!(f, "{:?}{unit}", complex_to_float(*data))
            }
            Self::Fraction(data) => {
                let unit = FRACTION_UNITS
                    .get((data & COMPLEX_UNIT_MASK) as usize)
                    .unwrap_or(&"");
                write!(f, "{:?}{unit}", complex_to_float(*data) * 100.0)
            }
            Self::Int(value) => write!(f, "{value}"),
            Self::Hex(value) => write!(f, "0x{value:x}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Color(ty, argb) => {
                let hex = format!("{argb:08x}");
                let digits: Vec<char> = hex.chars().collect();
                match ty {
                    ResValueType::IntColorRgb8 => write!(f, "#{}", &hex[2..]),
                    ResValueType::IntColorArgb4 => {
                        write!(f, "#{}{}{}{}", digits[0], digits[2], digits[4], digits[6])
                    }
                    ResValueType::IntColorRgb4 => {
                        write!(f, "#{}{}{}", digits[2], digits[4], digits[6])
                    }
                    _ => write!(f, "#{hex}"),
                }
            }
            Self::Raw { data, .. } => write!(f, "0x{data:08x}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttrKind {
    Plain,
    Enum,
    Flags,
}

/// An `attr` definition: accepted formats plus optional bounds and symbols.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttrDef {
    /// `ResAttributeType` scalar bits.
    pub format: u32,
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub l10n: Option<bool>,
    pub kind: AttrKind,
    /// Index of the first enum or flag symbol in the bag items.
    pub symbols_start: usize,
}

impl AttrDef {
    /// Names of the accepted scalar formats, e.g. `["reference", "color"]`.
    pub fn format_names(&self) -> Vec<&'static str> {
        ResAttributeType::SCALARS
            .iter()
            .filter(|(ty, _)| self.format & *ty as u32 != 0)
            .map(|(_, name)| *name)
            .collect()
    }

    fn from_items(items: &[(ResId, Scalar)]) -> Option<Self> {
        let (mut min, mut max, mut l10n) = (None, None, None);
        let mut i = 1;
        while i < items.len() {
            let (key, value) = &items[i];
            match key.0 {
                BAG_KEY_ATTR_MIN => min = Some(value.data() as i32),
                BAG_KEY_ATTR_MAX => max = Some(value.data() as i32),
                BAG_KEY_ATTR_L10N => l10n = Some(value.data() != 0),
                _ => break,
            }
            i += 1;
        }
        let raw = items[0].1.data();
        let format = raw & 0xffff;
        let kind = if i == items.len() {
            AttrKind::Plain
        } else if raw & 0xff_0000 == ResAttributeType::Enum as u32 {
            AttrKind::Enum
        } else if raw & 0xff_0000 == ResAttributeType::Flags as u32 {
            AttrKind::Flags
        } else {
            return None;
        };
        Some(Self {
            format,
            min,
            max,
            l10n,
            kind,
            symbols_start: i,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BagKind {
    Generic,
    Array,
    Style,
    Plurals,
    Attr(AttrDef),
}

/// Ordered `(key, value)` items with an optional parent.
#[derive(Clone, Debug, PartialEq)]
pub struct Bag {
    pub parent: Option<ResId>,
    pub kind: BagKind,
    pub items: Vec<(ResId, Scalar)>,
}

impl Bag {
    /// Builds a bag from a raw map, picking its kind from the name of the
    /// type it belongs to.
    pub fn from_map(
        entry: &ResTableMapEntry,
        map: &[ResTableMap],
        strings: &StringPool,
        type_name: &str,
    ) -> Self {
        let parent = (entry.parent != 0).then_some(ResId(entry.parent));
        let items: Vec<_> = map
            .iter()
            .map(|item| (ResId(item.name), Scalar::from_res_value(&item.value, strings)))
            .collect();
        let kind = Self::kind_for(type_name, &items);
        Self {
            parent,
            kind,
            items,
        }
    }

    fn kind_for(type_name: &str, items: &[(ResId, Scalar)]) -> BagKind {
        if items.is_empty() {
            return BagKind::Generic;
        }
        match type_name {
            "attr" | "^attr-private" => match AttrDef::from_items(items) {
                Some(attr) => BagKind::Attr(attr),
                None => {
                    tracing::warn!(
                        "attr with format {:#010x} has symbols but is neither enum nor flags",
                        items[0].1.data()
                    );
                    BagKind::Generic
                }
            },
            "array" => BagKind::Array,
            "plurals" => BagKind::Plurals,
            name if name.starts_with("style") => BagKind::Style,
            name => {
                tracing::debug!("bag in type `{name}` kept as a generic bag");
                BagKind::Generic
            }
        }
    }

    pub fn attr(&self) -> Option<&AttrDef> {
        match &self.kind {
            BagKind::Attr(attr) => Some(attr),
            _ => None,
        }
    }

    /// Enum or flag symbols of an attribute definition.
    pub fn symbols(&self) -> &[(ResId, Scalar)] {
        match self.attr() {
            Some(attr) => &self.items[attr.symbols_start..],
            None => &[],
        }
    }

    /// `(quantity, value)` pairs of a plurals bag; unknown keys are skipped.
    pub fn plurals(&self) -> impl Iterator<Item = (&'static str, &Scalar)> + '_ {
        self.items
            .iter()
            .filter_map(|(key, value)| Some((plural_quantity(*key)?, value)))
    }
}

pub fn plural_quantity(key: ResId) -> Option<&'static str> {
    BAG_KEY_PLURALS
        .iter()
        .find(|(k, _)| *k == key.0)
        .map(|(_, name)| *name)
}
