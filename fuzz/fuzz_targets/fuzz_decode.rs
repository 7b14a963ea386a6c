#![no_main]
use heapdump_rs::adjacency::analyze;
use heapdump_rs::decoder::{decode, DecodeOptions};
use heapdump_rs::fragmentation::summarize;
use heapdump_rs::{HeapDumpError, ReportPolicy, RAW_RECORD_SIZE};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Raw dumps fail only on length, never on content
    match decode(data, &DecodeOptions::raw()) {
        Ok(stream) => {
            assert_eq!(stream.records.len(), data.len() / RAW_RECORD_SIZE);
            let report = analyze(&stream.records, ReportPolicy::ReportBoth);
            summarize(&stream.records, &report);
        }
        Err(err) => assert!(matches!(err, HeapDumpError::MisalignedLength { .. })),
    }

    // Framed streams fail only on their header
    match decode(data, &DecodeOptions::framed()) {
        Ok(stream) => {
            assert_eq!(stream.consumed + stream.trailing, data.len());
            let report = analyze(&stream.records, ReportPolicy::FirstMatch);
            summarize(&stream.records, &report);
        }
        Err(err) => assert!(err.is_framing()),
    }
});
