//! A character whose variable table points back at it

use hype_sna::{
    container, AddressSpace, ContainerWriter, HeaderLayout, LoadOptions, RelocationTable,
    WalkNode, WalkOptions, Walker,
};

const BASE: u32 = 0x1000_0000;

fn put(image: &mut [u8], offset: usize, value: u32) {
    image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Character at 0x00, Brain at 0x40, Mind at 0x50, variable table at 0x80
fn cyclic_image() -> Vec<u8> {
    let mut image = vec![0u8; 0xA8];
    put(&mut image, 0x0C, BASE + 0x40);
    put(&mut image, 0x40, BASE + 0x50);
    put(&mut image, 0x5C, BASE + 0x80);
    // Two variables: an int and a perso reference to the character
    put(&mut image, 0x80, 2);
    put(&mut image, 0x84, 6);
    put(&mut image, 0x90, 16);
    image[0x98] = 4;
    // Value buffer follows the two 12-byte entries
    put(&mut image, 0x9C, 42);
    put(&mut image, 0xA0, BASE);
    image
}

#[test]
fn test_back_reference_terminates() {
    let image = cyclic_image();
    let mut writer = ContainerWriter::new(HeaderLayout::Full);
    writer.push_stored(&image);
    let report = container::load(&writer.finish(), &LoadOptions::default());
    let session = AddressSpace::layout(report.blocks)
        .unwrap()
        .seal(&RelocationTable::default());

    let root = Walker::new(&session, WalkOptions::default()).walk_character(BASE);
    assert_eq!(root.record_count(), 4);

    let table = root
        .child("brain")
        .and_then(|b| b.child("mind"))
        .and_then(|m| m.child("dsg_mem"))
        .expect("variable table");
    assert_eq!(table.kind(), "DsgVarTable");
    assert_eq!(table.children().len(), 1);
    assert_eq!(
        table.child("var[1]"),
        Some(&WalkNode::Visited {
            address: BASE,
            kind: "Character",
            cycle: true,
        })
    );
}

#[test]
fn test_cycle_with_tight_depth_limit() {
    let mut writer = ContainerWriter::new(HeaderLayout::Full);
    writer.push_stored(&cyclic_image());
    let report = container::load(&writer.finish(), &LoadOptions::default());
    let session = AddressSpace::layout(report.blocks)
        .unwrap()
        .seal(&RelocationTable::default());

    let options = WalkOptions {
        max_depth: 1,
        ..WalkOptions::default()
    };
    let root = Walker::new(&session, options).walk_character(BASE);
    assert!(matches!(
        root.child("brain").and_then(|b| b.child("mind")),
        Some(WalkNode::DepthLimit { kind: "Mind", .. })
    ));
}
