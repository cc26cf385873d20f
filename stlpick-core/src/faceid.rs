//! Face ids packed into RGB colours for picking.
//!
//! Each face is drawn with a colour that spells its index, one byte per
//! channel (red is the low byte). Reading a pixel back gives the face under
//! it. Colour 0 is the background, so face 0 cannot be told apart from
//! "nothing".

/// First face index that no longer fits in three 8-bit channels
pub const MAX_FACE_ID: u32 = 1 << 24;

/// Face id meaning "no face"
pub const NO_FACE: u32 = 0;

/// Range of the channel values handed to [`decode_face_id`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScale {
    /// Channels in `0.0..=1.0`, as written by [`encode_face_id`]
    Normalized,
    /// Channels in `0.0..=255.0`, as sampled from an 8-bit image
    Bytes,
}

/// Encode `id` as three normalized channel values.
///
/// Ids of [`MAX_FACE_ID`] and above cannot be encoded; they log a warning and
/// come back as the background colour.
pub fn encode_face_id(id: u32) -> [f32; 3] {
    if id >= MAX_FACE_ID {
        tracing::warn!(id, "face id does not fit in 24 bits, encoding as background");
        return [0.0; 3];
    }
    let [r, g, b] = split_bytes(id);
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

/// Encode a face index, treating indices past `u32` like any other overflow
pub fn encode_face_index(face: usize) -> [f32; 3] {
    encode_face_id(u32::try_from(face).unwrap_or(u32::MAX))
}

/// Recover a face id from channel values in the given scale
pub fn decode_face_id(color: [f32; 3], scale: ColorScale) -> u32 {
    let factor = match scale {
        ColorScale::Normalized => 255.0,
        ColorScale::Bytes => 1.0,
    };
    let channel = |v: f32| (v * factor).round().clamp(0.0, 255.0) as u8;
    decode_face_id_bytes([channel(color[0]), channel(color[1]), channel(color[2])])
}

/// Recover a face id from an 8-bit RGB pixel
pub fn decode_face_id_bytes(rgb: [u8; 3]) -> u32 {
    (rgb[2] as u32) << 16 | (rgb[1] as u32) << 8 | rgb[0] as u32
}

/// Convert normalized channel values to the bytes an 8-bit target would store
pub fn to_rgb_bytes(color: [f32; 3]) -> [u8; 3] {
    color.map(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
}

fn split_bytes(id: u32) -> [u8; 3] {
    [
        (id & 0xff) as u8,
        ((id >> 8) & 0xff) as u8,
        ((id >> 16) & 0xff) as u8,
    ]
}
