//! Small helper functions for transpose handling

pub const TRANSPOSE_MIN: i32 = -24;
pub const TRANSPOSE_MAX: i32 = 24;

pub fn clamp_transpose(value: i32) -> i32 {
    value.clamp(TRANSPOSE_MIN, TRANSPOSE_MAX)
}

/// Shift a note number by `transpose` semitones.
/// Saturates at 0 and 127 instead of wrapping.
pub fn map_note(note: u8, transpose: i32) -> u8 {
    (note as i32 + transpose).clamp(0, 127) as u8
}
