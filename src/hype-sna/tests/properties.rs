//! Property tests over synthetic containers

use hype_sna::{
    container, AddressSource, AddressSpace, ContainerWriter, Error, FlatTable, HeaderLayout,
    LoadOptions, PatchEntry, BASE_ADDRESS,
};
use proptest::prelude::*;

fn payloads() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 1..96), 1..8)
}

fn laid_out(blocks: &[Vec<u8>]) -> AddressSpace {
    let mut writer = ContainerWriter::new(HeaderLayout::Full);
    for data in blocks {
        writer.push_stored(data);
    }
    let report = container::load(&writer.finish(), &LoadOptions::default());
    AddressSpace::layout(report.blocks).unwrap()
}

proptest! {
    #[test]
    fn prop_block_ranges_are_disjoint(blocks in payloads()) {
        let space = laid_out(&blocks);
        let ranges: Vec<(u32, u64)> = space.blocks().iter().filter_map(|b| b.range()).collect();
        prop_assert_eq!(ranges.len(), blocks.len());
        prop_assert_eq!(ranges[0].0, BASE_ADDRESS);

        for (i, a) in ranges.iter().enumerate() {
            for b in &ranges[i + 1..] {
                let (a_start, a_end) = (u64::from(a.0), a.1);
                let (b_start, b_end) = (u64::from(b.0), b.1);
                prop_assert!(a_end <= b_start || b_end <= a_start);
            }
        }
    }

    #[test]
    fn prop_resolve_inverts_layout(blocks in payloads()) {
        let space = laid_out(&blocks);
        for (index, block) in space.blocks().iter().enumerate() {
            let base = block.base.unwrap();
            for k in 0..block.size() {
                let resolved = space.resolve(base + k as u32).unwrap();
                prop_assert_eq!(resolved.block, index);
                prop_assert_eq!(resolved.offset, k);
                prop_assert_eq!(resolved.remaining, block.size() - k);
            }
        }
        let end = space.blocks().last().and_then(|b| b.range()).unwrap().1;
        prop_assert!(space.resolve(end as u32).is_err());
    }

    #[test]
    fn prop_stored_round_trip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut writer = ContainerWriter::new(HeaderLayout::Full);
        writer.push_stored(&data);
        let report = container::load(&writer.finish(), &LoadOptions::default());
        prop_assert!(report.is_clean());
        prop_assert_eq!(&report.blocks[0].data, &report.blocks[0].raw);
        prop_assert_eq!(&report.blocks[0].data, &data);
    }

    #[test]
    fn prop_single_bit_flip_is_rejected(
        data in prop::collection::vec(any::<u8>(), 1..128),
        deflate in any::<bool>(),
        pick in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut writer = ContainerWriter::new(HeaderLayout::Full);
        if deflate {
            writer.push_deflated(&data).unwrap();
        } else {
            writer.push_stored(&data);
        }
        let mut bytes = writer.finish();
        let payload_len = bytes.len() - HeaderLayout::Full.size();
        let at = HeaderLayout::Full.size() + pick.index(payload_len);
        bytes[at] ^= 1 << bit;

        let report = container::load(&bytes, &LoadOptions::default());
        prop_assert!(report.blocks.is_empty());
        prop_assert_eq!(report.failures.len(), 1);
        let rejected = matches!(report.failures[0].error, Error::ChecksumMismatch { .. });
        prop_assert!(rejected);
    }

    #[test]
    fn prop_flat_patches_are_idempotent(
        blocks in payloads(),
        raw in prop::collection::vec((any::<u32>(), any::<u32>()), 0..16),
    ) {
        let space = laid_out(&blocks);
        let total = space
            .blocks()
            .last()
            .and_then(|b| b.range())
            .map(|(_, end)| end - u64::from(BASE_ADDRESS))
            .unwrap();
        // Offsets land anywhere in the space, including straddles and past the end
        let table: FlatTable = raw
            .iter()
            .map(|&(o, v)| PatchEntry::new(BASE_ADDRESS + (u64::from(o) % (total + 8)) as u32, v))
            .collect();

        let mut once = space.clone();
        once.apply_patches(&table);
        let mut twice = space;
        twice.apply_patches(&table);
        twice.apply_patches(&table);

        let once: Vec<Vec<u8>> = once.into_blocks().into_iter().map(|b| b.data).collect();
        let twice: Vec<Vec<u8>> = twice.into_blocks().into_iter().map(|b| b.data).collect();
        prop_assert_eq!(once, twice);
    }
}
