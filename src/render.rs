use crate::common::{OffscreenBuffer, BYTES_PER_PIXEL};

/// Fills the buffer with the blue/green test gradient. Channels wrap at 256
/// by truncation, so negative offsets scroll the pattern the other way.
pub fn render_weird_gradient(buffer: &mut OffscreenBuffer, blue_offset: i32, green_offset: i32) {
    let width = buffer.width;
    let rows = buffer.memory.chunks_mut(buffer.pitch).take(buffer.height);
    for (y, row) in rows.enumerate() {
        let green = (y as i32).wrapping_add(green_offset) as u8;
        for (x, pixel) in row[..width * BYTES_PER_PIXEL]
            .chunks_exact_mut(BYTES_PER_PIXEL)
            .enumerate()
        {
            let blue = (x as i32).wrapping_add(blue_offset) as u8;
            let color = (u32::from(green) << 8) | u32::from(blue);
            pixel.copy_from_slice(&color.to_le_bytes());
        }
    }
}
