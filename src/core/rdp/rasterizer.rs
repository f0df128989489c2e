// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Software Rasterizer
//!
//! Fills flat-shaded triangles and rectangles into the RGBA8 frame buffer.
//!
//! # Algorithm
//!
//! Triangles are drawn with a scanline approach which splits them into
//! top-flat and bottom-flat sub-triangles:
//!
//! 1. Sort vertices by Y coordinate
//! 2. Split the triangle at the middle vertex
//! 3. Rasterize each half using linear interpolation
//! 4. Clip each scanline to the scissor rectangle
//!
//! Coverage follows no particular hardware rule; edges may differ from real
//! RDP output by a pixel.

use super::{FRAME_HEIGHT, FRAME_WIDTH};

/// Triangle and rectangle rasterizer
///
/// # Examples
///
/// ```
/// use n64rx::core::rdp::{Rasterizer, FRAME_WIDTH, PIXEL_BUFFER_SIZE};
///
/// let mut pixels = vec![0u8; PIXEL_BUFFER_SIZE];
/// let mut rasterizer = Rasterizer::new();
/// rasterizer.set_clip_rect(0, 0, 640, 480);
///
/// // Draw a red triangle
/// rasterizer.draw_triangle(&mut pixels, (100, 100), (200, 100), (150, 200), 0xFF0000FF);
///
/// let center = (150 * FRAME_WIDTH + 150) * 4;
/// assert_eq!(&pixels[center..center + 4], &[0xFF, 0x00, 0x00, 0xFF]);
/// ```
pub struct Rasterizer {
    /// Clipping rectangle: (left, top, right, bottom), right/bottom exclusive
    clip_rect: (i32, i32, i32, i32),
}

impl Rasterizer {
    /// Create a rasterizer clipped to the whole frame
    pub fn new() -> Self {
        Self {
            clip_rect: (0, 0, FRAME_WIDTH as i32, FRAME_HEIGHT as i32),
        }
    }

    /// Set the clipping rectangle
    ///
    /// `right` and `bottom` are exclusive. The rectangle is intersected with
    /// the frame.
    pub fn set_clip_rect(&mut self, left: i32, top: i32, right: i32, bottom: i32) {
        self.clip_rect = (
            left.max(0),
            top.max(0),
            right.min(FRAME_WIDTH as i32),
            bottom.min(FRAME_HEIGHT as i32),
        );
    }

    pub fn clip_rect(&self) -> (i32, i32, i32, i32) {
        self.clip_rect
    }

    /// Fill `[left, right) × [top, bottom)` with a solid color
    pub fn fill_rect(
        &self,
        pixels: &mut [u8],
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        color: u32,
    ) {
        let (clip_left, clip_top, clip_right, clip_bottom) = self.clip_rect;
        let left = left.max(clip_left);
        let top = top.max(clip_top);
        let right = right.min(clip_right);
        let bottom = bottom.min(clip_bottom);

        for y in top..bottom {
            for x in left..right {
                Self::write_pixel(pixels, x, y, color);
            }
        }
    }

    /// Rasterize a solid color triangle
    ///
    /// 1. Sort vertices by Y coordinate (v0.y <= v1.y <= v2.y)
    /// 2. Check for degenerate cases (zero height)
    /// 3. Split triangle at middle vertex
    /// 4. Rasterize top and bottom halves separately
    pub fn draw_triangle(
        &self,
        pixels: &mut [u8],
        v0: (i32, i32),
        v1: (i32, i32),
        v2: (i32, i32),
        color: u32,
    ) {
        let (v0, v1, v2) = Self::sort_vertices_by_y(v0, v1, v2);

        // Zero height triangle - nothing to draw
        if v0.1 == v2.1 {
            return;
        }

        if v1.1 == v2.1 {
            self.draw_bottom_flat_triangle(pixels, v0, v1, v2, color);
        } else if v0.1 == v1.1 {
            self.draw_top_flat_triangle(pixels, v0, v1, v2, color);
        } else {
            // Point on the v0-v2 edge at v1.y
            let v3_x = v0.0 + (v1.1 - v0.1) * (v2.0 - v0.0) / (v2.1 - v0.1);
            let v3 = (v3_x, v1.1);

            self.draw_bottom_flat_triangle(pixels, v0, v1, v3, color);
            self.draw_top_flat_triangle(pixels, v1, v3, v2, color);
        }
    }

    fn sort_vertices_by_y(
        v0: (i32, i32),
        v1: (i32, i32),
        v2: (i32, i32),
    ) -> ((i32, i32), (i32, i32), (i32, i32)) {
        let mut verts = [v0, v1, v2];
        verts.sort_by_key(|v| v.1);
        (verts[0], verts[1], verts[2])
    }

    /// Triangle whose v1 and v2 share a Y coordinate
    fn draw_bottom_flat_triangle(
        &self,
        pixels: &mut [u8],
        v0: (i32, i32),
        v1: (i32, i32),
        v2: (i32, i32),
        color: u32,
    ) {
        let inv_slope1 = (v1.0 - v0.0) as f32 / (v1.1 - v0.1) as f32;
        let inv_slope2 = (v2.0 - v0.0) as f32 / (v2.1 - v0.1) as f32;

        let mut cur_x1 = v0.0 as f32;
        let mut cur_x2 = v0.0 as f32;

        for scanline in v0.1..=v1.1 {
            self.draw_scanline(pixels, scanline, cur_x1 as i32, cur_x2 as i32, color);
            cur_x1 += inv_slope1;
            cur_x2 += inv_slope2;
        }
    }

    /// Triangle whose v0 and v1 share a Y coordinate
    fn draw_top_flat_triangle(
        &self,
        pixels: &mut [u8],
        v0: (i32, i32),
        v1: (i32, i32),
        v2: (i32, i32),
        color: u32,
    ) {
        let inv_slope1 = (v2.0 - v0.0) as f32 / (v2.1 - v0.1) as f32;
        let inv_slope2 = (v2.0 - v1.0) as f32 / (v2.1 - v1.1) as f32;

        let mut cur_x1 = v2.0 as f32;
        let mut cur_x2 = v2.0 as f32;

        for scanline in (v0.1..=v2.1).rev() {
            self.draw_scanline(pixels, scanline, cur_x1 as i32, cur_x2 as i32, color);
            cur_x1 -= inv_slope1;
            cur_x2 -= inv_slope2;
        }
    }

    fn draw_scanline(&self, pixels: &mut [u8], y: i32, mut x1: i32, mut x2: i32, color: u32) {
        if x1 > x2 {
            std::mem::swap(&mut x1, &mut x2);
        }

        let (clip_left, clip_top, clip_right, clip_bottom) = self.clip_rect;
        if y < clip_top || y >= clip_bottom {
            return;
        }

        let x1 = x1.max(clip_left);
        let x2 = x2.min(clip_right - 1);

        for x in x1..=x2 {
            Self::write_pixel(pixels, x, y, color);
        }
    }

    /// Store an RGBA8888 color at (x, y); out-of-frame writes are dropped
    #[inline(always)]
    fn write_pixel(pixels: &mut [u8], x: i32, y: i32, color: u32) {
        if !(0..FRAME_WIDTH as i32).contains(&x) || !(0..FRAME_HEIGHT as i32).contains(&y) {
            return;
        }

        let index = (y as usize * FRAME_WIDTH + x as usize) * 4;
        if let Some(pixel) = pixels.get_mut(index..index + 4) {
            pixel.copy_from_slice(&color.to_be_bytes());
        }
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}
