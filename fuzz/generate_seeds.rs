#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn words(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn tag(name: &str, ty: u32, bpe: u32, extents: &[u32], payload: &[u8]) -> Vec<u8> {
    let mut out = format!("{name:<32}").into_bytes();
    out.truncate(32);
    let entry_len = 12 + 4 * extents.len() as u32 + payload.len() as u32;
    out.extend(words(&[entry_len, ty, bpe, extents.len() as u32]));
    out.extend(words(extents));
    out.extend_from_slice(payload);
    out
}

fn pic(version: &[u8; 32], ty: u32, bpe: u32, extents: &[u32], tags: &[u8], pixels: &[u8]) -> Vec<u8> {
    let mut out = version.to_vec();
    let total = 12 + 4 * extents.len() as u32 + tags.len() as u32;
    out.extend(words(&[total, ty, bpe, extents.len() as u32]));
    out.extend(words(extents));
    out.extend_from_slice(tags);
    out.extend_from_slice(pixels);
    out
}

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    let plain = b"PIC VERSION 3.00                ";
    let encrypted = b"PIC VERSION 3.00e               ";

    // uint8 4x3 with one ASCII tag
    let note = tag("NOTE", 2, 8, &[2], b"hi");
    let pixels: Vec<u8> = (0..12).collect();
    fs::write(format!("{dir}/uint8_4x3_note.pic"), pic(plain, 4, 8, &[4, 3], &note, &pixels)).unwrap();

    // int16 2x2x2 with a nested dictionary
    let inner = [tag("A", 4, 16, &[1], &[1, 0]), tag("B", 2, 8, &[3], b"xyz")].concat();
    let group = tag("GROUP", 8, 32, &[2], &inner);
    fs::write(
        format!("{dir}/int16_nested.pic"),
        pic(plain, 3, 16, &[2, 2, 2], &group, &[7u8; 16]),
    )
    .unwrap();

    // Redacted text tag
    let secret = tag("PATIENT", 2, 8, &[6], b"secret");
    fs::write(format!("{dir}/encrypted.pic"), pic(encrypted, 5, 32, &[1], &secret, &1.0f32.to_le_bytes())).unwrap();

    // Legacy: id, dummy1, dummy2, conv, rank, n1, n2, type, ntxt, ltxt, text, pixels
    let mut legacy = words(&[0, 0, 0, 4, 2, 2, 2, 1, 1, 3]);
    legacy.extend_from_slice(b"abc");
    legacy.extend_from_slice(&[1, 2, 3, 4]);
    fs::write(format!("{dir}/legacy_2x2.pic"), legacy).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/just_magic.bin"), b"PIC ").unwrap();
    fs::write(format!("{dir}/gzip_magic.bin"), [0x1F, 0x8B, 0x08, 0x00]).unwrap();
    fs::write(
        format!("{dir}/short_pixels.pic"),
        pic(plain, 4, 8, &[16, 16], &[], &[0xAB; 10]),
    )
    .unwrap();
    fs::write(
        format!("{dir}/bad_tag_length.pic"),
        pic(plain, 4, 8, &[1], &tag("X", 4, 8, &[4], &[0; 2]), &[0]),
    )
    .unwrap();

    println!("Generated seed corpus in {dir}/");
}
