#![no_main]
use libfuzzer_sys::fuzz_target;
use zenpic::{DecodeRequest, Limits, ShortReadPolicy};

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixel_bytes: Some(64 << 20),
        max_tag_bytes: Some(16 << 20),
        max_tag_depth: Some(32),
        ..Limits::default()
    };

    // Every entry point must reject or accept without panicking
    let _ = DecodeRequest::new(data).with_limits(&limits).decode(enough::Unstoppable);
    let _ = DecodeRequest::new(data)
        .with_limits(&limits)
        .with_short_read(ShortReadPolicy::Fail)
        .decode(enough::Unstoppable);
    let _ = DecodeRequest::new(data).with_limits(&limits).decode_header();
    let _ = DecodeRequest::new(data).with_limits(&limits).decode_tags(enough::Unstoppable);
    let _ = DecodeRequest::new(data).with_limits(&limits).decode_slice(1, enough::Unstoppable);
});
