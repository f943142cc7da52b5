//! Dynamic state variables ("DsgVar")
//!
//! A table is a `u32` count followed by that many 12-byte infos. Values live
//! in a buffer right after the info array, each at `buffer + info.offset`.

use byteorder::{ByteOrder, LE};
use serde::Serialize;
use tracing::warn;

use super::{decode_array, hex_u32, FieldReader, Record};
use crate::pointer::Word;
use crate::space::AddressSource;
use crate::Result;

/// The engine's closed list of variable kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum DsgVarType {
    None = 0,
    Boolean = 1,
    Byte = 2,
    UByte = 3,
    Short = 4,
    UShort = 5,
    Int = 6,
    UInt = 7,
    Float = 8,
    Vector = 9,
    List = 10,
    ComportRef = 11,
    ActionRef = 12,
    Text = 13,
    Graph = 14,
    Way = 15,
    PersoRef = 16,
    SoundEventRef = 17,
    ObjectList = 18,
    LightRef = 19,
    Caps = 20,
    Input = 21,
    GameMaterial = 22,
    VisualMaterial = 23,
    String = 24,
    SuperObjectRef = 25,
    DsgVarRef = 26,
    CustomBits = 27,
}

impl TryFrom<u32> for DsgVarType {
    type Error = u32;

    fn try_from(tag: u32) -> std::result::Result<Self, u32> {
        Ok(match tag {
            0 => Self::None,
            1 => Self::Boolean,
            2 => Self::Byte,
            3 => Self::UByte,
            4 => Self::Short,
            5 => Self::UShort,
            6 => Self::Int,
            7 => Self::UInt,
            8 => Self::Float,
            9 => Self::Vector,
            10 => Self::List,
            11 => Self::ComportRef,
            12 => Self::ActionRef,
            13 => Self::Text,
            14 => Self::Graph,
            15 => Self::Way,
            16 => Self::PersoRef,
            17 => Self::SoundEventRef,
            18 => Self::ObjectList,
            19 => Self::LightRef,
            20 => Self::Caps,
            21 => Self::Input,
            22 => Self::GameMaterial,
            23 => Self::VisualMaterial,
            24 => Self::String,
            25 => Self::SuperObjectRef,
            26 => Self::DsgVarRef,
            27 => Self::CustomBits,
            other => return Err(other),
        })
    }
}

impl DsgVarType {
    /// Bytes the value occupies in the value buffer
    pub fn value_size(self) -> usize {
        match self {
            Self::None => 0,
            Self::Boolean | Self::Byte | Self::UByte => 1,
            Self::Short | Self::UShort => 2,
            Self::Vector => 12,
            _ => 4,
        }
    }

    /// The reference kind for variables that hold a pointer
    pub fn ref_kind(self) -> Option<RefKind> {
        Some(match self {
            Self::List => RefKind::List,
            Self::ComportRef => RefKind::Comport,
            Self::ActionRef => RefKind::Action,
            Self::Text => RefKind::Text,
            Self::Graph => RefKind::Graph,
            Self::Way => RefKind::Way,
            Self::PersoRef => RefKind::Perso,
            Self::SoundEventRef => RefKind::SoundEvent,
            Self::ObjectList => RefKind::ObjectList,
            Self::LightRef => RefKind::Light,
            Self::GameMaterial => RefKind::GameMaterial,
            Self::VisualMaterial => RefKind::VisualMaterial,
            Self::String => RefKind::String,
            Self::SuperObjectRef => RefKind::SuperObject,
            Self::DsgVarRef => RefKind::DsgVar,
            _ => return Option::None,
        })
    }
}

/// What a reference-kind variable points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    List,
    Comport,
    Action,
    Text,
    Graph,
    Way,
    Perso,
    SoundEvent,
    ObjectList,
    Light,
    GameMaterial,
    VisualMaterial,
    String,
    SuperObject,
    DsgVar,
}

/// A decoded variable value, one variant per kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DsgVarValue {
    None,
    Boolean(bool),
    Byte(i8),
    UByte(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Float(f32),
    Vector([f32; 3]),
    Reference { kind: RefKind, target: Word },
    Caps(u32),
    Input(u32),
    CustomBits(u32),
    /// Tag outside the known kind list
    Unsupported(u32),
}

impl DsgVarValue {
    /// Decode a value of `kind` from the head of `bytes`
    ///
    /// `bytes` must hold at least `kind.value_size()` bytes.
    pub fn read(kind: DsgVarType, bytes: &[u8]) -> Self {
        match kind {
            DsgVarType::None => Self::None,
            DsgVarType::Boolean => Self::Boolean(bytes[0] != 0),
            DsgVarType::Byte => Self::Byte(bytes[0] as i8),
            DsgVarType::UByte => Self::UByte(bytes[0]),
            DsgVarType::Short => Self::Short(LE::read_i16(bytes)),
            DsgVarType::UShort => Self::UShort(LE::read_u16(bytes)),
            DsgVarType::Int => Self::Int(LE::read_i32(bytes)),
            DsgVarType::UInt => Self::UInt(LE::read_u32(bytes)),
            DsgVarType::Float => Self::Float(LE::read_f32(bytes)),
            DsgVarType::Vector => Self::Vector([
                LE::read_f32(&bytes[0..4]),
                LE::read_f32(&bytes[4..8]),
                LE::read_f32(&bytes[8..12]),
            ]),
            DsgVarType::Caps => Self::Caps(LE::read_u32(bytes)),
            DsgVarType::Input => Self::Input(LE::read_u32(bytes)),
            DsgVarType::CustomBits => Self::CustomBits(LE::read_u32(bytes)),
            other => match other.ref_kind() {
                Some(kind) => Self::Reference {
                    kind,
                    target: Word::classify(LE::read_u32(bytes)),
                },
                None => Self::Unsupported(other as u32),
            },
        }
    }

    /// Unrelocated character word, when this is a non-null perso reference
    pub fn perso_target(&self) -> Option<Word> {
        match self {
            Self::Reference {
                kind: RefKind::Perso,
                target,
            } if !target.is_null() => Some(*target),
            _ => None,
        }
    }
}

/// One 12-byte variable info
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DsgVarInfo {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    pub type_tag: u32,
    pub number: u16,
    pub additional: u16,
    /// Offset of the value in the value buffer
    pub offset: u16,
    pub init_value_index: u16,
}

impl DsgVarInfo {
    pub fn kind(&self) -> std::result::Result<DsgVarType, u32> {
        DsgVarType::try_from(self.type_tag)
    }
}

impl Record for DsgVarInfo {
    const KIND: &'static str = "DsgVarInfo";
    const SIZE: usize = 12;

    fn parse(address: u32, bytes: &[u8]) -> Self {
        let mut r = FieldReader::new(bytes);
        Self {
            address,
            type_tag: r.u32(),
            number: r.u16(),
            additional: r.u16(),
            offset: r.u16(),
            init_value_index: r.u16(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DsgVariable {
    pub index: usize,
    pub info: DsgVarInfo,
    /// `None` when the value lies outside the owning block
    pub value: Option<DsgVarValue>,
}

/// A decoded variable table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DsgVarTable {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    /// Count declared by the table
    pub count: u32,
    pub variables: Vec<DsgVariable>,
    /// True when the info array ran past the block end
    pub truncated: bool,
}

impl DsgVarTable {
    /// Characters referenced by perso-kind variables
    pub fn perso_refs(&self) -> impl Iterator<Item = (usize, Word)> + '_ {
        self.variables
            .iter()
            .filter_map(|v| v.value.as_ref()?.perso_target().map(|p| (v.index, p)))
    }
}

/// Read the table at `address`
pub(crate) fn read_table<S>(source: &S, address: u32) -> Result<DsgVarTable>
where
    S: AddressSource + ?Sized,
{
    let count = source.read_u32(address)?;
    let infos_at = address.wrapping_add(4);
    let infos = decode_array::<DsgVarInfo, S>(source, infos_at, count as usize)?;
    let truncated = !infos.is_complete();

    let buffer = infos_at.wrapping_add(count.wrapping_mul(DsgVarInfo::SIZE as u32));
    let variables = infos
        .items
        .into_iter()
        .enumerate()
        .map(|(index, info)| {
            let value = read_value(source, buffer, &info);
            DsgVariable { index, info, value }
        })
        .collect();

    Ok(DsgVarTable {
        address,
        count,
        variables,
        truncated,
    })
}

fn read_value<S>(source: &S, buffer: u32, info: &DsgVarInfo) -> Option<DsgVarValue>
where
    S: AddressSource + ?Sized,
{
    let kind = match info.kind() {
        Ok(kind) => kind,
        Err(tag) => return Some(DsgVarValue::Unsupported(tag)),
    };
    if kind == DsgVarType::None {
        return Some(DsgVarValue::None);
    }

    let at = buffer.wrapping_add(u32::from(info.offset));
    match source.read_span("DsgVarValue", at, kind.value_size()) {
        Ok(bytes) => Some(DsgVarValue::read(kind, bytes)),
        Err(error) => {
            warn!(
                info = format_args!("0x{:08x}", info.address),
                %error,
                "Variable value is not readable"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{session_from, Image};

    #[test]
    fn test_type_tags() {
        assert_eq!(DsgVarType::try_from(16u32), Ok(DsgVarType::PersoRef));
        assert_eq!(DsgVarType::try_from(27u32), Ok(DsgVarType::CustomBits));
        assert_eq!(DsgVarType::try_from(28u32), Err(28));
        for tag in 0..28u32 {
            assert_eq!(DsgVarType::try_from(tag).unwrap() as u32, tag);
        }
    }

    #[test]
    fn test_value_variants() {
        assert_eq!(
            DsgVarValue::read(DsgVarType::Boolean, &[2]),
            DsgVarValue::Boolean(true)
        );
        assert_eq!(DsgVarValue::read(DsgVarType::Byte, &[0xFF]), DsgVarValue::Byte(-1));
        assert_eq!(
            DsgVarValue::read(DsgVarType::Short, &[0xFE, 0xFF]),
            DsgVarValue::Short(-2)
        );
        assert_eq!(
            DsgVarValue::read(DsgVarType::Float, &1.5f32.to_le_bytes()),
            DsgVarValue::Float(1.5)
        );

        let mut vector = Vec::new();
        for f in [1.0f32, -2.0, 0.25] {
            vector.extend_from_slice(&f.to_le_bytes());
        }
        assert_eq!(
            DsgVarValue::read(DsgVarType::Vector, &vector),
            DsgVarValue::Vector([1.0, -2.0, 0.25])
        );

        let perso = DsgVarValue::read(DsgVarType::PersoRef, &0x1000_0040u32.to_le_bytes());
        assert_eq!(perso.perso_target(), Some(Word::Pointer(0x1000_0040)));
        let way = DsgVarValue::read(DsgVarType::Way, &0x1000_0040u32.to_le_bytes());
        assert_eq!(way.perso_target(), None);
        assert_eq!(
            DsgVarValue::read(DsgVarType::PersoRef, &[0, 0, 0, 0]).perso_target(),
            None
        );
    }

    #[test]
    fn test_read_table() {
        // count = 3, infos at +4, buffer at +40
        let mut image = Image::new(64);
        image.put_u32(0, 3);
        image.put_u32(4, 6).put_u16(12, 0);
        image.put_u32(16, 16).put_u16(24, 4);
        image.put_u32(28, 99).put_u16(36, 8);
        image.put_u32(40, (-7i32) as u32);
        image.put_u32(44, 0x1000_0000);
        let session = session_from(&[image.bytes]);

        let table = read_table(&session, 0x1000_0000).unwrap();
        assert_eq!(table.count, 3);
        assert!(!table.truncated);
        assert_eq!(table.variables.len(), 3);
        assert_eq!(table.variables[0].value, Some(DsgVarValue::Int(-7)));
        assert_eq!(
            table.variables[1].value,
            Some(DsgVarValue::Reference {
                kind: RefKind::Perso,
                target: Word::Pointer(0x1000_0000)
            })
        );
        assert_eq!(table.variables[2].value, Some(DsgVarValue::Unsupported(99)));
        assert_eq!(
            table.perso_refs().collect::<Vec<_>>(),
            vec![(1, Word::Pointer(0x1000_0000))]
        );
    }

    #[test]
    fn test_oversized_count_truncates() {
        let mut image = Image::new(20);
        image.put_u32(0, 1000).put_u32(4, 1);
        let session = session_from(&[image.bytes]);

        let table = read_table(&session, 0x1000_0000).unwrap();
        assert!(table.truncated);
        assert_eq!(table.variables.len(), 1);
        // The value buffer lies past the block end
        assert_eq!(table.variables[0].value, None);
    }
}
