//! Audio sync markers drawn over the back buffer.

use crate::common::{OffscreenBuffer, BYTES_PER_PIXEL};
use crate::sound::{PlayCursors, RingRegion, SoundOutput};

pub const MARKER_COUNT: usize = 30;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DebugTimeMarker {
    pub output_play_cursor: u32,
    pub output_write_cursor: u32,
    pub output_location: u32,
    pub output_byte_count: u32,

    pub flip_play_cursor: u32,
    pub flip_write_cursor: u32,
}

/// The last `MARKER_COUNT` frames of sound output.
#[derive(Debug, Default)]
pub struct SoundMarkers {
    markers: [DebugTimeMarker; MARKER_COUNT],
    index: usize,
}

impl SoundMarkers {
    pub fn record_output(&mut self, cursors: PlayCursors, region: RingRegion) {
        let marker = &mut self.markers[self.index];
        marker.output_play_cursor = cursors.play_cursor;
        marker.output_write_cursor = cursors.write_cursor;
        marker.output_location = region.byte_to_lock;
        marker.output_byte_count = region.bytes_to_write;
    }

    pub fn record_flip(&mut self, cursors: PlayCursors) {
        let marker = &mut self.markers[self.index];
        marker.flip_play_cursor = cursors.play_cursor;
        marker.flip_write_cursor = cursors.write_cursor;
    }

    pub fn advance(&mut self) {
        self.index += 1;
        if self.index == self.markers.len() {
            self.index = 0;
        }
    }

    /// The most recently completed frame.
    pub fn last_index(&self) -> usize {
        if self.index == 0 {
            self.markers.len() - 1
        } else {
            self.index - 1
        }
    }

    pub fn markers(&self) -> &[DebugTimeMarker] {
        &self.markers
    }
}

pub fn debug_draw_vertical(
    buffer: &mut OffscreenBuffer,
    x: i32,
    top: i32,
    bottom: i32,
    color: u32,
) {
    if x < 0 || x as usize >= buffer.width {
        return;
    }
    let top = top.max(0) as usize;
    let bottom = (bottom.max(0) as usize).min(buffer.height);

    let column = x as usize * BYTES_PER_PIXEL;
    for y in top..bottom {
        let offset = y * buffer.pitch + column;
        buffer.memory[offset..offset + BYTES_PER_PIXEL]
            .copy_from_slice(&color.to_le_bytes());
    }
}

fn draw_sound_buffer_marker(
    buffer: &mut OffscreenBuffer,
    c: f32,
    pad_x: i32,
    top: i32,
    bottom: i32,
    value: u32,
    color: u32,
) {
    let x = pad_x + (c * value as f32) as i32;
    debug_draw_vertical(buffer, x, top, bottom, color);
}

pub fn debug_sync_display(
    buffer: &mut OffscreenBuffer,
    markers: &SoundMarkers,
    sound_output: &SoundOutput,
) {
    let pad_x = 16;
    let pad_y = 16;
    let line_height = 64;

    let play_color = 0xFF_FF_FF_FF;
    let write_color = 0xFF_FF_00_00;

    let c = (buffer.width as i32 - 2 * pad_x) as f32 / sound_output.sound_buffer_size as f32;
    let last_index = markers.last_index();
    for (marker_index, marker) in markers.markers().iter().enumerate() {
        let mut draw = |top, bottom, value, color| {
            draw_sound_buffer_marker(buffer, c, pad_x, top, bottom, value, color)
        };

        let mut top = pad_y;
        let mut bottom = pad_y + line_height;

        if marker_index == last_index {
            top += line_height + pad_y;
            bottom += line_height + pad_y;

            draw(top, bottom, marker.output_play_cursor, play_color);
            draw(top, bottom, marker.output_write_cursor, write_color);

            top += line_height + pad_y;
            bottom += line_height + pad_y;

            draw(top, bottom, marker.output_location, play_color);
            draw(
                top,
                bottom,
                marker.output_location + marker.output_byte_count,
                write_color,
            );

            top += line_height + pad_y;
            bottom += line_height + pad_y;
        }

        draw(top, bottom, marker.flip_play_cursor, play_color);
        draw(top, bottom, marker.flip_write_cursor, write_color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PixelSurface;

    #[test]
    fn vertical_line_is_clipped() {
        let mut surface = PixelSurface::new(4, 4).unwrap();
        debug_draw_vertical(&mut surface.buffer(), 2, -3, 10, 0x00AB_CDEF);
        debug_draw_vertical(&mut surface.buffer(), 9, 0, 4, 0xFFFF_FFFF);
        debug_draw_vertical(&mut surface.buffer(), -1, 0, 4, 0xFFFF_FFFF);
        for y in 0..4 {
            assert_eq!(surface.pixel(2, y), 0x00AB_CDEF);
            assert_eq!(surface.pixel(1, y), 0);
            assert_eq!(surface.pixel(3, y), 0);
        }
    }

    #[test]
    fn markers_wrap_around() {
        let mut markers = SoundMarkers::default();
        assert_eq!(markers.last_index(), MARKER_COUNT - 1);
        for _ in 0..MARKER_COUNT {
            markers.advance();
        }
        assert_eq!(markers.last_index(), MARKER_COUNT - 1);
        markers.advance();
        assert_eq!(markers.last_index(), 0);
    }

    #[test]
    fn sync_display_draws_flip_cursor() {
        let mut surface = PixelSurface::new(132, 400).unwrap();
        let sound_output = SoundOutput::new(48_000, 4_000, 100).unwrap();
        let mut markers = SoundMarkers::default();
        markers.record_flip(PlayCursors {
            play_cursor: 2_000,
            write_cursor: 2_400,
        });
        markers.advance();

        debug_sync_display(&mut surface.buffer(), &markers, &sound_output);
        // c = (132 - 32) / 4000, play cursor 2000 lands at x = 16 + 50;
        // the last marker's flip lines sit three rows down
        let flip_top = 16 + 3 * (64 + 16);
        assert_eq!(surface.pixel(66, flip_top + 1), 0xFF_FF_FF_FF);
        assert_eq!(surface.pixel(76, flip_top + 1), 0xFF_FF_00_00);
    }
}
