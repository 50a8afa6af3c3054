//! Bounded Reader Tests

use crate::raw::{RawAccessError, RawReader};

#[test]
fn test_read_within_bounds() {
    let data = [1u8, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0];
    let reader = RawReader::new(&data);
    assert_eq!(reader.u32(0), Ok(1));
    assert_eq!(reader.u64(4), Ok(2));
    assert_eq!(reader.len(), 12);
}

#[test]
fn test_read_past_end() {
    let data = [0u8; 8];
    let reader = RawReader::new(&data);
    assert_eq!(
        reader.u64(4),
        Err(RawAccessError::OutOfBounds {
            offset: 4,
            size: 8,
            len: 8
        })
    );
}

#[test]
fn test_offset_overflow() {
    let data = [0u8; 8];
    let reader = RawReader::new(&data);
    assert_eq!(reader.u32(usize::MAX), Err(RawAccessError::Overflow));
}

#[test]
fn test_word_view() {
    let words = [0x1122_3344_5566_7788u64, 42];
    let reader = RawReader::from_words(&words);
    assert_eq!(reader.len(), 16);
    assert_eq!(reader.base_addr(), words.as_ptr() as u64);
    assert_eq!(reader.slice::<u64>(8, 1), Ok(&words[1..]));
}

#[test]
fn test_slice_alignment_is_checked() {
    let words = [0u64; 4];
    let reader = RawReader::from_words(&words);
    assert_eq!(
        reader.slice::<u64>(4, 1),
        Err(RawAccessError::Misaligned { offset: 4, align: 8 })
    );
    assert_eq!(reader.slice::<u64>(4, 0), Ok(&[][..]));
}

#[test]
fn test_sub_narrows_view() {
    let data: Vec<u8> = (0..32).collect();
    let reader = RawReader::new(&data);
    let sub = reader.sub(8, 8).unwrap();
    assert_eq!(sub.len(), 8);
    assert_eq!(sub.read::<u8>(0), Ok(8));
    assert!(sub.read::<u8>(8).is_err());
    assert!(reader.sub(30, 4).is_err());
}
