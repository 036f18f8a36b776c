// MIDI variable-length quantities.
//
// Seven data bits per byte, most significant group first, high bit set on
// every byte except the last. Four bytes carry at most 28 bits, so the
// largest encodable value is 0x0FFF_FFFF.

use crate::error::EncodeError;

pub const VLQ_MAX: u32 = 0x0FFF_FFFF;

/// Append the VLQ encoding of `value` to `out`.
pub fn write_vlq(out: &mut Vec<u8>, value: u32) -> Result<(), EncodeError> {
    if value > VLQ_MAX {
        return Err(EncodeError::VlqOverflow(value));
    }
    let mut groups = [0u8; 4];
    let mut len = 0;
    let mut rest = value;
    loop {
        groups[len] = (rest & 0x7F) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for (i, group) in groups[..len].iter().enumerate().rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        out.push(group | continuation);
    }
    Ok(())
}

/// Decode one VLQ from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed, or `None` if the
/// input ends mid-quantity or runs past four bytes.
pub fn read_vlq(bytes: &[u8]) -> Option<(u32, usize)> {
    let mut value: u32 = 0;
    for (i, &byte) in bytes.iter().take(4).enumerate() {
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}
