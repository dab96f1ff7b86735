use crate::error::{DecodeError, Result};
use crate::options::Tolerance;
use crate::reader::ChunkReader;
use byteorder::{LittleEndian, WriteBytesExt};
use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::str::FromStr;

pub const ORIENTATION_PORT: u8 = 0x01;
pub const ORIENTATION_LAND: u8 = 0x02;
pub const ORIENTATION_SQUARE: u8 = 0x03;

pub const TOUCHSCREEN_NOTOUCH: u8 = 0x01;
pub const TOUCHSCREEN_STYLUS: u8 = 0x02;
pub const TOUCHSCREEN_FINGER: u8 = 0x03;

pub const DENSITY_DEFAULT: u16 = 0;
pub const DENSITY_LOW: u16 = 120;
pub const DENSITY_MEDIUM: u16 = 160;
pub const DENSITY_HIGH: u16 = 240;
pub const DENSITY_NONE: u16 = 0xffff;

pub const KEYBOARD_NOKEYS: u8 = 0x01;
pub const KEYBOARD_QWERTY: u8 = 0x02;
pub const KEYBOARD_12KEY: u8 = 0x03;

pub const NAVIGATION_NONAV: u8 = 0x01;
pub const NAVIGATION_DPAD: u8 = 0x02;
pub const NAVIGATION_TRACKBALL: u8 = 0x03;
pub const NAVIGATION_WHEEL: u8 = 0x04;

pub const MASK_KEYSHIDDEN: u8 = 0x03;
pub const KEYSHIDDEN_NO: u8 = 0x01;
pub const KEYSHIDDEN_YES: u8 = 0x02;
pub const KEYSHIDDEN_SOFT: u8 = 0x03;

pub const MASK_NAVHIDDEN: u8 = 0x0c;
pub const NAVHIDDEN_NO: u8 = 0x04;
pub const NAVHIDDEN_YES: u8 = 0x08;

pub const MASK_SCREENSIZE: u8 = 0x0f;
pub const SCREENSIZE_SMALL: u8 = 0x01;
pub const SCREENSIZE_NORMAL: u8 = 0x02;
pub const SCREENSIZE_LARGE: u8 = 0x03;

pub const MASK_SCREENLONG: u8 = 0x30;
pub const SCREENLONG_NO: u8 = 0x10;
pub const SCREENLONG_YES: u8 = 0x20;

// (value, qualifier) pairs shared by the generator and the parser.
const SCREEN_SIZES: [(u8, &str); 3] = [
    (SCREENSIZE_SMALL, "small"),
    (SCREENSIZE_NORMAL, "normal"),
    (SCREENSIZE_LARGE, "large"),
];
const SCREEN_LONGS: [(u8, &str); 2] = [(SCREENLONG_YES, "long"), (SCREENLONG_NO, "notlong")];
const ORIENTATIONS: [(u8, &str); 3] = [
    (ORIENTATION_PORT, "port"),
    (ORIENTATION_LAND, "land"),
    (ORIENTATION_SQUARE, "square"),
];
const DENSITIES: [(u16, &str); 4] = [
    (DENSITY_LOW, "ldpi"),
    (DENSITY_MEDIUM, "mdpi"),
    (DENSITY_HIGH, "hdpi"),
    (DENSITY_NONE, "nodpi"),
];
const TOUCHSCREENS: [(u8, &str); 3] = [
    (TOUCHSCREEN_NOTOUCH, "notouch"),
    (TOUCHSCREEN_STYLUS, "stylus"),
    (TOUCHSCREEN_FINGER, "finger"),
];
const KEYS_HIDDEN: [(u8, &str); 3] = [
    (KEYSHIDDEN_NO, "keysexposed"),
    (KEYSHIDDEN_YES, "keyshidden"),
    (KEYSHIDDEN_SOFT, "keyssoft"),
];
const KEYBOARDS: [(u8, &str); 3] = [
    (KEYBOARD_NOKEYS, "nokeys"),
    (KEYBOARD_QWERTY, "qwerty"),
    (KEYBOARD_12KEY, "12key"),
];
const NAV_HIDDEN: [(u8, &str); 2] = [(NAVHIDDEN_NO, "navexposed"), (NAVHIDDEN_YES, "navhidden")];
const NAVIGATIONS: [(u8, &str); 4] = [
    (NAVIGATION_NONAV, "nonav"),
    (NAVIGATION_DPAD, "dpad"),
    (NAVIGATION_TRACKBALL, "trackball"),
    (NAVIGATION_WHEEL, "wheel"),
];

fn lookup<T: PartialEq + Copy>(table: &[(T, &'static str)], value: T) -> Option<&'static str> {
    table.iter().find(|(v, _)| *v == value).map(|(_, s)| *s)
}

fn reverse<T: Copy>(table: &[(T, &'static str)], token: &str) -> Option<T> {
    table.iter().find(|(_, s)| *s == token).map(|(v, _)| *v)
}

/// Device configuration a set of resource values applies to.
///
/// Identity is the generated qualifier string: two descriptors that only
/// differ in padding or in trailing zero bytes compare equal.
#[derive(Clone, Debug, Default)]
pub struct ConfigDescriptor {
    /// Declared size; 28 or more.
    pub size: u32,
    pub mcc: u16,
    pub mnc: u16,
    /// Two ASCII bytes, or a packed three letter code when the high bit of
    /// the first byte is set. `[0, 0]` means any.
    pub language: [u8; 2],
    pub country: [u8; 2],
    pub orientation: u8,
    pub touchscreen: u8,
    pub density: u16,
    pub keyboard: u8,
    pub navigation: u8,
    pub input_flags: u8,
    pub screen_width: u16,
    pub screen_height: u16,
    pub sdk_version: u16,
    pub screen_layout: u8,
    /// Bytes past the 32 this descriptor understands.
    pub extra: Vec<u8>,
}

impl ConfigDescriptor {
    pub const MIN_SIZE: u32 = 28;
    pub const KNOWN_SIZE: u32 = 32;

    pub fn read(r: &mut ChunkReader, oversized: Tolerance) -> Result<Self> {
        let start = r.position();
        let size = r.read_u32()?;
        if size < Self::MIN_SIZE {
            return Err(DecodeError::InvalidConfig {
                offset: start,
                size,
            });
        }
        let mcc = r.read_u16()?;
        let mnc = r.read_u16()?;
        let language = [r.read_u8()?, r.read_u8()?];
        let country = [r.read_u8()?, r.read_u8()?];
        let orientation = r.read_u8()?;
        let touchscreen = r.read_u8()?;
        let density = r.read_u16()?;
        let keyboard = r.read_u8()?;
        let navigation = r.read_u8()?;
        let input_flags = r.read_u8()?;
        r.skip(1)?;
        let screen_width = r.read_u16()?;
        let screen_height = r.read_u16()?;
        let sdk_version = r.read_u16()?;
        r.skip(2)?;
        let mut screen_layout = 0;
        if size >= Self::KNOWN_SIZE {
            screen_layout = r.read_u8()?;
            r.skip(3)?;
        }
        let read = (r.position() - start) as u32;
        let rest = r.read_bytes((size - read) as usize)?;
        // between 28 and 32 the tail is a partial screen layout, not unknown data
        let extra = if size > Self::KNOWN_SIZE {
            rest.to_vec()
        } else {
            Vec::new()
        };
        if size > Self::KNOWN_SIZE && extra.iter().any(|b| *b != 0) {
            oversized.check(|| DecodeError::OversizedConfig {
                offset: start,
                size,
            })?;
        } else if !extra.is_empty() {
            tracing::debug!("config at {start:#x} has {} zero trailing bytes", extra.len());
        }
        Ok(Self {
            size,
            mcc,
            mnc,
            language,
            country,
            orientation,
            touchscreen,
            density,
            keyboard,
            navigation,
            input_flags,
            screen_width,
            screen_height,
            sdk_version,
            screen_layout,
            extra,
        })
    }

    /// Writes the descriptor with the 32 known bytes followed by the
    /// trailing bytes it was read with.
    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        w.write_u32::<LittleEndian>(Self::KNOWN_SIZE + self.extra.len() as u32)?;
        w.write_u16::<LittleEndian>(self.mcc)?;
        w.write_u16::<LittleEndian>(self.mnc)?;
        w.write_all(&self.language)?;
        w.write_all(&self.country)?;
        w.write_u8(self.orientation)?;
        w.write_u8(self.touchscreen)?;
        w.write_u16::<LittleEndian>(self.density)?;
        w.write_u8(self.keyboard)?;
        w.write_u8(self.navigation)?;
        w.write_u8(self.input_flags)?;
        w.write_u8(0)?;
        w.write_u16::<LittleEndian>(self.screen_width)?;
        w.write_u16::<LittleEndian>(self.screen_height)?;
        w.write_u16::<LittleEndian>(self.sdk_version)?;
        w.write_u16::<LittleEndian>(0)?;
        w.write_u8(self.screen_layout)?;
        w.write_all(&[0; 3])?;
        w.write_all(&self.extra)?;
        Ok(())
    }

    pub fn is_default(&self) -> bool {
        self.qualifiers().is_empty()
    }

    pub fn language(&self) -> String {
        unpack_language_or_region(self.language, b'a')
    }

    pub fn country(&self) -> String {
        unpack_language_or_region(self.country, b'0')
    }

    /// Directory qualifier suffix, e.g. `-en-rUS-hdpi`; empty for the
    /// default configuration.
    pub fn qualifiers(&self) -> String {
        let mut ret = String::new();
        if self.mcc != 0 {
            write!(ret, "-mcc{}", self.mcc).ok();
            if self.mnc != 0 {
                write!(ret, "-mnc{}", self.mnc).ok();
            }
        }
        if self.language[0] != 0 {
            ret.push('-');
            ret.push_str(&self.language());
            if self.country[0] != 0 {
                ret.push_str("-r");
                ret.push_str(&self.country());
            }
        }
        let tokens = [
            lookup(&SCREEN_SIZES, self.screen_layout & MASK_SCREENSIZE),
            lookup(&SCREEN_LONGS, self.screen_layout & MASK_SCREENLONG),
            lookup(&ORIENTATIONS, self.orientation),
        ];
        for token in tokens.into_iter().flatten() {
            ret.push('-');
            ret.push_str(token);
        }
        match lookup(&DENSITIES, self.density) {
            Some(token) => {
                ret.push('-');
                ret.push_str(token);
            }
            None if self.density != DENSITY_DEFAULT => {
                write!(ret, "-{}dpi", self.density).ok();
            }
            None => {}
        }
        let tokens = [
            lookup(&TOUCHSCREENS, self.touchscreen),
            lookup(&KEYS_HIDDEN, self.input_flags & MASK_KEYSHIDDEN),
            lookup(&KEYBOARDS, self.keyboard),
            lookup(&NAV_HIDDEN, self.input_flags & MASK_NAVHIDDEN),
            lookup(&NAVIGATIONS, self.navigation),
        ];
        for token in tokens.into_iter().flatten() {
            ret.push('-');
            ret.push_str(token);
        }
        if self.screen_width != 0 && self.screen_height != 0 {
            let (w, h) = if self.screen_width > self.screen_height {
                (self.screen_width, self.screen_height)
            } else {
                (self.screen_height, self.screen_width)
            };
            write!(ret, "-{w}x{h}").ok();
        }
        if self.sdk_version != 0 {
            write!(ret, "-v{}", self.sdk_version).ok();
        }
        // keeps configs with fields we cannot interpret apart from the ones we can
        let end = self.extra.iter().rposition(|b| *b != 0);
        if let Some(end) = end {
            ret.push_str("-ERR");
            for b in &self.extra[..=end] {
                write!(ret, "{b:02x}").ok();
            }
        }
        ret
    }
}

impl PartialEq for ConfigDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.qualifiers() == other.qualifiers()
    }
}

impl Eq for ConfigDescriptor {}

impl Hash for ConfigDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualifiers().hash(state);
    }
}

impl fmt::Display for ConfigDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let qualifiers = self.qualifiers();
        if qualifiers.is_empty() {
            f.write_str("[DEFAULT]")
        } else {
            f.write_str(&qualifiers)
        }
    }
}

impl FromStr for ConfigDescriptor {
    type Err = DecodeError;

    /// Parses a qualifier string as produced by
    /// [`ConfigDescriptor::qualifiers`]. Tokens are accepted in any order.
    fn from_str(s: &str) -> Result<Self> {
        let mut config = Self {
            size: Self::KNOWN_SIZE,
            ..Default::default()
        };
        let invalid = |token: &str| DecodeError::InvalidQualifier(token.to_string());
        for token in s.split('-').filter(|t| !t.is_empty()) {
            if let Some(mcc) = token.strip_prefix("mcc") {
                config.mcc = mcc.parse().map_err(|_| invalid(token))?;
            } else if let Some(mnc) = token.strip_prefix("mnc") {
                config.mnc = mnc.parse().map_err(|_| invalid(token))?;
            } else if let Some(hex) = token.strip_prefix("ERR") {
                if hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(invalid(token));
                }
                config.extra = hex
                    .as_bytes()
                    .chunks(2)
                    .map(|pair| {
                        let pair = std::str::from_utf8(pair).ok()?;
                        u8::from_str_radix(pair, 16).ok()
                    })
                    .collect::<Option<_>>()
                    .ok_or_else(|| invalid(token))?;
            } else if is_language(token) {
                config.language = pack_language_or_region(token, b'a').ok_or_else(|| invalid(token))?;
            } else if let Some(country) = token.strip_prefix('r').filter(|c| is_region(c)) {
                config.country = pack_language_or_region(country, b'0').ok_or_else(|| invalid(token))?;
            } else if let Some(v) = reverse(&SCREEN_SIZES, token) {
                config.screen_layout |= v;
            } else if let Some(v) = reverse(&SCREEN_LONGS, token) {
                config.screen_layout |= v;
            } else if let Some(v) = reverse(&ORIENTATIONS, token) {
                config.orientation = v;
            } else if let Some(v) = reverse(&DENSITIES, token) {
                config.density = v;
            } else if let Some(v) = reverse(&TOUCHSCREENS, token) {
                config.touchscreen = v;
            } else if let Some(v) = reverse(&KEYS_HIDDEN, token) {
                config.input_flags |= v;
            } else if let Some(v) = reverse(&KEYBOARDS, token) {
                config.keyboard = v;
            } else if let Some(v) = reverse(&NAV_HIDDEN, token) {
                config.input_flags |= v;
            } else if let Some(v) = reverse(&NAVIGATIONS, token) {
                config.navigation = v;
            } else if let Some(dpi) = token.strip_suffix("dpi") {
                config.density = dpi.parse().map_err(|_| invalid(token))?;
            } else if let Some((w, h)) = token.split_once('x') {
                config.screen_width = w.parse().map_err(|_| invalid(token))?;
                config.screen_height = h.parse().map_err(|_| invalid(token))?;
            } else if let Some(sdk) = token.strip_prefix('v') {
                config.sdk_version = sdk.parse().map_err(|_| invalid(token))?;
            } else {
                return Err(invalid(token));
            }
        }
        Ok(config)
    }
}

fn is_language(token: &str) -> bool {
    (2..=3).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_lowercase())
}

fn is_region(token: &str) -> bool {
    (token.len() == 2 && token.bytes().all(|b| b.is_ascii_uppercase()))
        || (token.len() == 3 && token.bytes().all(|b| b.is_ascii_digit()))
}

/// Expands a two byte locale field. A set high bit marks three letters of
/// five bits each, offset from `base`.
pub fn unpack_language_or_region(value: [u8; 2], base: u8) -> String {
    if value[0] == 0 {
        return String::new();
    }
    if value[0] & 0x80 != 0 {
        let first = base + (value[1] & 0x1f);
        let second = base + ((value[1] & 0xe0) >> 5) + ((value[0] & 0x03) << 3);
        let third = base + ((value[0] & 0x7c) >> 2);
        return [first, second, third].iter().map(|b| *b as char).collect();
    }
    value.iter().map(|b| *b as char).collect()
}

/// Inverse of [`unpack_language_or_region`].
pub fn pack_language_or_region(value: &str, base: u8) -> Option<[u8; 2]> {
    match value.as_bytes() {
        [a, b] => Some([*a, *b]),
        [a, b, c] => {
            let (first, second, third) = (
                a.checked_sub(base)?,
                b.checked_sub(base)?,
                c.checked_sub(base)?,
            );
            if first > 0x1f || second > 0x1f || third > 0x1f {
                return None;
            }
            Some([
                0x80 | (third << 2) | (second >> 3),
                ((second & 0x07) << 5) | first,
            ])
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(bytes: &[u8]) -> Result<ConfigDescriptor> {
        ConfigDescriptor::read(&mut ChunkReader::new(bytes), Tolerance::Warn)
    }

    fn encode(config: &ConfigDescriptor) -> Vec<u8> {
        let mut buf = vec![];
        config.write(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_locale_and_density() {
        let config = ConfigDescriptor {
            language: *b"en",
            country: *b"US",
            density: 240,
            ..Default::default()
        };
        assert_eq!(config.qualifiers(), "-en-rUS-hdpi");
        assert_eq!(config.to_string(), "-en-rUS-hdpi");
    }

    #[test]
    fn test_density_buckets() {
        let qualifier = |density| {
            ConfigDescriptor {
                density,
                ..Default::default()
            }
            .qualifiers()
        };
        assert_eq!(qualifier(0), "");
        assert_eq!(qualifier(120), "-ldpi");
        assert_eq!(qualifier(160), "-mdpi");
        assert_eq!(qualifier(240), "-hdpi");
        assert_eq!(qualifier(0xffff), "-nodpi");
        assert_eq!(qualifier(320), "-320dpi");
    }

    #[test]
    fn test_default_display() {
        let config = ConfigDescriptor::default();
        assert!(config.is_default());
        assert_eq!(config.to_string(), "[DEFAULT]");
    }

    #[test]
    fn test_qualifier_order() {
        let config = ConfigDescriptor {
            mcc: 310,
            mnc: 4,
            language: *b"fr",
            country: *b"CA",
            screen_layout: SCREENSIZE_LARGE | SCREENLONG_YES,
            orientation: ORIENTATION_LAND,
            density: 160,
            touchscreen: TOUCHSCREEN_FINGER,
            input_flags: KEYSHIDDEN_SOFT | NAVHIDDEN_YES,
            keyboard: KEYBOARD_QWERTY,
            navigation: NAVIGATION_DPAD,
            screen_width: 480,
            screen_height: 800,
            sdk_version: 4,
            ..Default::default()
        };
        assert_eq!(
            config.qualifiers(),
            "-mcc310-mnc4-fr-rCA-large-long-land-mdpi-finger-keyssoft-qwerty-navhidden-dpad-800x480-v4"
        );
        let parsed: ConfigDescriptor = config.qualifiers().parse().unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.qualifiers(), config.qualifiers());
    }

    #[test]
    fn test_mnc_needs_mcc_and_country_needs_language() {
        let config = ConfigDescriptor {
            mnc: 4,
            country: *b"US",
            ..Default::default()
        };
        assert_eq!(config.qualifiers(), "");
    }

    #[test]
    fn test_decode_28_and_32_bytes() -> anyhow::Result<()> {
        let config = ConfigDescriptor {
            language: *b"de",
            screen_layout: SCREENSIZE_SMALL,
            sdk_version: 8,
            ..Default::default()
        };
        let mut bytes = encode(&config);
        assert_eq!(bytes.len(), 32);
        let decoded = descriptor(&bytes)?;
        assert_eq!(decoded.qualifiers(), "-de-small-v8");
        assert_eq!(decoded.size, 32);

        // a 28 byte descriptor has no screen layout
        bytes.truncate(28);
        bytes[0] = 28;
        let decoded = descriptor(&bytes)?;
        assert_eq!(decoded.qualifiers(), "-de-v8");
        Ok(())
    }

    #[test]
    fn test_too_small_is_rejected() {
        let mut bytes = encode(&ConfigDescriptor::default());
        bytes[0] = 24;
        assert!(matches!(
            descriptor(&bytes),
            Err(DecodeError::InvalidConfig { offset: 0, size: 24 })
        ));
    }

    #[test]
    fn test_oversized_skips_unknown_fields() -> anyhow::Result<()> {
        let config = ConfigDescriptor {
            density: 120,
            extra: vec![0; 16],
            ..Default::default()
        };
        let mut bytes = encode(&config);
        bytes.extend_from_slice(&[0xaa; 4]);
        let mut r = ChunkReader::new(&bytes);
        let decoded = ConfigDescriptor::read(&mut r, Tolerance::Reject)?;
        assert_eq!(r.position(), 48);
        assert_eq!(decoded.size, 48);
        assert_eq!(decoded.qualifiers(), "-ldpi");
        assert_eq!(decoded, config);
        Ok(())
    }

    #[test]
    fn test_oversized_with_data() -> anyhow::Result<()> {
        let config = ConfigDescriptor {
            extra: vec![0x00, 0x02, 0x58, 0x00],
            ..Default::default()
        };
        let bytes = encode(&config);
        let err = ConfigDescriptor::read(&mut ChunkReader::new(&bytes), Tolerance::Reject);
        assert!(matches!(err, Err(DecodeError::OversizedConfig { size: 36, .. })));

        let decoded = descriptor(&bytes)?;
        assert_eq!(decoded.qualifiers(), "-ERR000258");
        assert_ne!(decoded, ConfigDescriptor::default());
        let parsed: ConfigDescriptor = "-ERR000258".parse()?;
        assert_eq!(parsed, decoded);
        Ok(())
    }

    #[test]
    fn test_partial_screen_layout_is_not_unknown_data() -> anyhow::Result<()> {
        let mut bytes = encode(&ConfigDescriptor::default());
        bytes.truncate(30);
        bytes[0] = 30;
        bytes[28] = SCREENSIZE_LARGE;
        bytes[29] = 0x11;
        let mut r = ChunkReader::new(&bytes);
        let decoded = ConfigDescriptor::read(&mut r, Tolerance::Reject)?;
        assert_eq!(r.position(), 30);
        assert!(decoded.extra.is_empty());
        assert!(decoded.is_default());
        assert_eq!(encode(&decoded).len(), 32);
        Ok(())
    }

    #[test]
    fn test_padding_does_not_split_configs() -> anyhow::Result<()> {
        use std::collections::hash_map::DefaultHasher;

        let hash = |config: &ConfigDescriptor| {
            let mut hasher = DefaultHasher::new();
            config.hash(&mut hasher);
            hasher.finish()
        };
        let config = ConfigDescriptor {
            language: *b"en",
            density: DENSITY_HIGH,
            ..Default::default()
        };
        let clean = encode(&config);
        let mut padded = clean.clone();
        // after input flags, after sdk version, after screen layout
        padded[19] = 0xff;
        padded[26] = 0x12;
        padded[27] = 0x34;
        padded[29] = 0x56;
        padded.extend_from_slice(&[0; 8]);
        padded[0] = 40;

        let a = descriptor(&clean)?;
        let b = descriptor(&padded)?;
        assert_eq!(b.size, 40);
        assert_eq!(a, b);
        assert_eq!(hash(&a), hash(&b));
        Ok(())
    }

    #[test]
    fn test_packed_three_letter_locale() -> anyhow::Result<()> {
        let packed = pack_language_or_region("fil", b'a').unwrap();
        assert_ne!(packed[0] & 0x80, 0);
        assert_eq!(unpack_language_or_region(packed, b'a'), "fil");

        let config: ConfigDescriptor = "-fil-rPH".parse()?;
        assert_eq!(config.language, packed);
        assert_eq!(config.qualifiers(), "-fil-rPH");

        let config: ConfigDescriptor = "es-r419".parse()?;
        assert_eq!(config.qualifiers(), "-es-r419");
        Ok(())
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "-en-bogus".parse::<ConfigDescriptor>(),
            Err(DecodeError::InvalidQualifier(token)) if token == "bogus"
        ));
        assert!("".parse::<ConfigDescriptor>().unwrap().is_default());
        assert!(matches!(
            "-ERR\u{20ac}a".parse::<ConfigDescriptor>(),
            Err(DecodeError::InvalidQualifier(token)) if token == "ERR\u{20ac}a"
        ));
        assert!("-ERR0g".parse::<ConfigDescriptor>().is_err());
        assert!("-ERR+1".parse::<ConfigDescriptor>().is_err());
    }
}
