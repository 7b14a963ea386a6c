//! Property-based tests for decoder and adjacency correctness
//!
//! Uses proptest to verify invariants hold across many random dumps

use heapdump_rs::adjacency::analyze;
use heapdump_rs::decoder::{decode, DecodeOptions};
use heapdump_rs::signature::TEST_HEAP_BASE;
use heapdump_rs::{
    AllocatorSignature, BlockRecord, HeapBlock, HeapDumpError, Relation, ReportPolicy,
    StreamHeader, WarningKind, FRAMED_RECORD_SIZE, RAW_RECORD_SIZE,
};
use proptest::prelude::*;

fn block_strategy() -> impl Strategy<Value = BlockRecord> {
    (0u64..0x1_0000, 0u64..0x400, any::<bool>(), any::<bool>())
        .prop_map(|(address, size, is_free, is_reusable)| {
            BlockRecord::new(address, size, is_free, is_reusable)
        })
}

proptest! {
    #[test]
    fn prop_raw_round_trip(
        chunks in prop::collection::vec(prop::array::uniform32(any::<u8>()), 0..64)
    ) {
        let bytes: Vec<u8> = chunks.iter().flatten().copied().collect();
        let stream = decode(&bytes, &DecodeOptions::raw()).unwrap();

        prop_assert_eq!(stream.records.len(), bytes.len() / RAW_RECORD_SIZE);

        for (record, chunk) in stream.records.iter().zip(&chunks) {
            let encoded = record.to_raw_bytes();

            // Size and address survive as-is; flags collapse to 0/1
            prop_assert_eq!(&encoded[0..8], &chunk[0..8]);
            prop_assert_eq!(&encoded[9..17], &chunk[9..17]);
            prop_assert_eq!(encoded[8] != 0, chunk[8] != 0);
            prop_assert_eq!(encoded[17] != 0, chunk[17] != 0);
            prop_assert!(encoded[18..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn prop_raw_round_trip_canonical_records(
        blocks in prop::collection::vec(block_strategy(), 0..64)
    ) {
        let bytes: Vec<u8> = blocks.iter().flat_map(|b| b.to_raw_bytes()).collect();
        let stream = decode(&bytes, &DecodeOptions::raw()).unwrap();

        prop_assert_eq!(&stream.records, &blocks);
        let reencoded: Vec<u8> = stream.records.iter().flat_map(|b| b.to_raw_bytes()).collect();
        prop_assert_eq!(reencoded, bytes);
    }

    #[test]
    fn prop_misaligned_raw_fails(
        records in 0usize..16,
        extra in 1usize..RAW_RECORD_SIZE
    ) {
        let bytes = vec![0u8; records * RAW_RECORD_SIZE + extra];
        let err = decode(&bytes, &DecodeOptions::raw()).unwrap_err();

        prop_assert!(err.is_framing());
        let is_misaligned = matches!(err, HeapDumpError::MisalignedLength { remainder, .. } if remainder == extra);
        prop_assert!(is_misaligned);
    }

    #[test]
    fn prop_framed_record_count(
        blocks in prop::collection::vec(block_strategy(), 0..32),
        tail in 0usize..FRAMED_RECORD_SIZE
    ) {
        let mut bytes = StreamHeader::new("heap", 0).to_bytes();
        for block in &blocks {
            bytes.extend_from_slice(&block.to_framed_bytes());
        }
        bytes.extend(std::iter::repeat(0xEE).take(tail));

        let options = DecodeOptions {
            signature: None,
            ..DecodeOptions::framed()
        };
        let stream = decode(&bytes, &options).unwrap();

        prop_assert_eq!(&stream.records, &blocks);
        prop_assert_eq!(stream.trailing, tail);
    }

    #[test]
    fn prop_one_warning_per_foreign_address(
        tagged in prop::collection::vec(any::<bool>(), 1..32)
    ) {
        let mut bytes = StreamHeader::new("heap", 0).to_bytes();
        for (i, &ok) in tagged.iter().enumerate() {
            let base = if ok { TEST_HEAP_BASE } else { 0x1000_0000 };
            let block = BlockRecord::new(base + i as u64 * 0x40, 0x40, false, false);
            bytes.extend_from_slice(&block.to_framed_bytes());
        }

        let stream = decode(&bytes, &DecodeOptions::framed()).unwrap();

        for (i, &ok) in tagged.iter().enumerate() {
            let mismatches = stream
                .warnings_for(i)
                .filter(|w| matches!(w.kind, WarningKind::SignatureMismatch { .. }))
                .count();
            prop_assert_eq!(mismatches, if ok { 0 } else { 1 });
            prop_assert_eq!(AllocatorSignature::TEST.matches(stream.records[i].address), ok);
        }
    }

    #[test]
    fn prop_adjacency_is_symmetric(
        blocks in prop::collection::vec(block_strategy(), 0..48)
    ) {
        let report = analyze(&blocks, ReportPolicy::ReportBoth);

        for entry in &report.blocks {
            for relation in &entry.relations {
                if let Relation::AdjacentTo(other) = *relation {
                    prop_assert!(report.blocks[other].relations.contains(&Relation::AdjacentTo(entry.id)));

                    let (x, y) = (&blocks[entry.id], &blocks[other]);
                    prop_assert!(x.end() == y.address() || y.end() == x.address());
                }
            }
        }
    }

    #[test]
    fn prop_first_match_keeps_at_most_one_adjacency(
        blocks in prop::collection::vec(block_strategy(), 0..48)
    ) {
        let both = analyze(&blocks, ReportPolicy::ReportBoth);
        let first = analyze(&blocks, ReportPolicy::FirstMatch);

        prop_assert_eq!(&both.order, &first.order);
        prop_assert_eq!(&both.degenerate, &first.degenerate);

        for (b, f) in both.blocks.iter().zip(&first.blocks) {
            prop_assert!(f.adjacent().count() <= 1);
            prop_assert_eq!(f.adjacent().next(), b.adjacent().next());
        }
    }

    #[test]
    fn prop_duplicate_addresses_always_flagged(
        blocks in prop::collection::vec(block_strategy(), 1..32),
        pick in any::<prop::sample::Index>()
    ) {
        let mut blocks = blocks;
        let copy = blocks[pick.index(blocks.len())];
        blocks.push(copy);

        let report = analyze(&blocks, ReportPolicy::ReportBoth);
        prop_assert!(!report.degenerate.is_empty());
    }
}
