#![no_main]
use libfuzzer_sys::fuzz_target;
use zenpic::{DecodeRequest, EncodeRequest, Limits, ShortReadPolicy};

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixel_bytes: Some(64 << 20),
        max_tag_bytes: Some(16 << 20),
        max_tag_depth: Some(32),
        ..Limits::default()
    };

    // Only complete images are expected to survive a second pass unchanged
    let Ok(decoded) = DecodeRequest::new(data)
        .with_limits(&limits)
        .with_short_read(ShortReadPolicy::Fail)
        .decode(enough::Unstoppable)
    else {
        return;
    };

    let Ok(reencoded) = EncodeRequest::new(&decoded).encode(enough::Unstoppable) else {
        return;
    };
    let Ok(decoded2) = DecodeRequest::new(&reencoded).decode(enough::Unstoppable) else {
        panic!("re-encoded data failed to decode");
    };

    assert_eq!(decoded.element_type, decoded2.element_type);
    assert_eq!(decoded.bpe, decoded2.bpe);
    assert_eq!(decoded.shape, decoded2.shape);
    assert_eq!(decoded.tags, decoded2.tags, "roundtrip tag mismatch");
    assert_eq!(decoded.data(), decoded2.data(), "roundtrip pixel mismatch");
});
