use serde::Serialize;

use super::{hex_u32, FieldReader, Record};
use crate::pointer::Word;

/// A character instance ("perso"): nine pointer words
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Character {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    pub data_3d: Word,
    pub std_game: Word,
    pub dynamics: Word,
    pub brain: Word,
    pub camera: Word,
    pub collision_set: Word,
    pub ms_way: Word,
    pub ms_light: Word,
    pub sector_info: Word,
}

impl Record for Character {
    const KIND: &'static str = "Character";
    const SIZE: usize = 36;

    fn parse(address: u32, bytes: &[u8]) -> Self {
        let mut r = FieldReader::new(bytes);
        Self {
            address,
            data_3d: r.word(),
            std_game: r.word(),
            dynamics: r.word(),
            brain: r.word(),
            camera: r.word(),
            collision_set: r.word(),
            ms_way: r.word(),
            ms_light: r.word(),
            sector_info: r.word(),
        }
    }
}

/// Family/model/instance indices of a character
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandardGame {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    pub family: u8,
    pub model: u8,
    pub instance: u8,
    pub flags: u8,
    pub extra: u32,
}

impl Record for StandardGame {
    const KIND: &'static str = "StandardGame";
    const SIZE: usize = 8;

    fn parse(address: u32, bytes: &[u8]) -> Self {
        let mut r = FieldReader::new(bytes);
        Self {
            address,
            family: r.u8(),
            model: r.u8(),
            instance: r.u8(),
            flags: r.u8(),
            extra: r.u32(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Image;

    #[test]
    fn test_parse_character() {
        let mut image = Image::new(36);
        image.put_u32(4, 0x1000_0100).put_u32(12, 0x1000_0200).put_u32(32, 7);
        let perso = Character::parse(0x1000_0040, &image.bytes);
        assert_eq!(perso.address, 0x1000_0040);
        assert_eq!(perso.std_game, Word::Pointer(0x1000_0100));
        assert_eq!(perso.brain, Word::Pointer(0x1000_0200));
        assert_eq!(perso.sector_info, Word::Scalar(7));
        assert!(perso.camera.is_null());
    }

    #[test]
    fn test_parse_standard_game() {
        let bytes = [3u8, 1, 4, 0x80, 0xEF, 0xBE, 0xAD, 0xDE];
        let std_game = StandardGame::parse(0x1000_0000, &bytes);
        assert_eq!(std_game.family, 3);
        assert_eq!(std_game.model, 1);
        assert_eq!(std_game.instance, 4);
        assert_eq!(std_game.flags, 0x80);
        assert_eq!(std_game.extra, 0xDEAD_BEEF);
    }
}
