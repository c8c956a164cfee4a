#![no_main]

use libfuzzer_sys::fuzz_target;

use fitspix::record::parse_record;

fuzz_target!(|data: &[u8]| {
    // Record parsing must never panic, and every accepted record must obey
    // the keyword width invariant.
    if let Ok(record) = parse_record(data) {
        assert!(record.keyword.len() <= fitspix::record::KEYWORD_LEN);
        // The continuation marker is always stripped from the value.
        if record.continued {
            assert!(!record.value.ends_with('&'));
        }
    }
});
