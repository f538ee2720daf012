pub const GAP: u8 = b'-';

#[inline]
pub fn normalize_base(b: u8) -> u8 {
    match b.to_ascii_uppercase() {
        b'T' => b'U',
        b'.' => GAP,
        up => up,
    }
}

/// 统一为大写 RNA 字母表（T -> U，'.' -> '-'）。
pub fn normalize_seq(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| normalize_base(b)).collect()
}
