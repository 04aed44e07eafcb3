use std::ops::{Add, Sub};

use crate::types::{ColorImage, Rgba};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        self.x.hypot(self.y)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Where and how a sprite lands on the target.
///
/// `origin` is in sprite pixels and is the point placed at `position`;
/// rotation (radians, clockwise on screen) and scale are applied around it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpritePlacement {
    pub position: Vec2,
    pub origin: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    pub tint: Rgba,
}

pub trait Renderer {
    fn clear(&mut self, color: Rgba);

    /// Stretches `image` over `dest`.
    fn draw_image(&mut self, image: &ColorImage, dest: Rect, tint: Rgba);

    fn draw_sprite(&mut self, sprite: &ColorImage, placement: SpritePlacement);
}

/// CPU rasterizer backing the window.
pub struct SoftwareCanvas {
    target: ColorImage,
}

impl SoftwareCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: ColorImage::filled(width, height, [0, 0, 0, 255]),
        }
    }

    pub fn full_rect(&self) -> Rect {
        Rect {
            x: 0,
            y: 0,
            width: self.target.width,
            height: self.target.height,
        }
    }

    pub fn into_image(self) -> ColorImage {
        self.target
    }

    fn blend(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 {
            return;
        }
        let (ux, uy) = (x as u32, y as u32);
        if ux >= self.target.width || uy >= self.target.height {
            return;
        }
        let idx = (uy * self.target.width + ux) as usize;
        let dst = &mut self.target.pixels[idx];
        *dst = blend_over(*dst, color);
    }
}

impl Renderer for SoftwareCanvas {
    fn clear(&mut self, color: Rgba) {
        self.target.pixels.fill(color);
    }

    fn draw_image(&mut self, image: &ColorImage, dest: Rect, tint: Rgba) {
        if image.width == 0 || image.height == 0 || dest.width == 0 || dest.height == 0 {
            return;
        }
        for dy in 0..dest.height {
            let sy = (dy as u64 * image.height as u64 / dest.height as u64) as u32;
            for dx in 0..dest.width {
                let sx = (dx as u64 * image.width as u64 / dest.width as u64) as u32;
                if let Some(src) = image.pixel(sx, sy) {
                    self.blend(dest.x + dx as i32, dest.y + dy as i32, modulate(src, tint));
                }
            }
        }
    }

    fn draw_sprite(&mut self, sprite: &ColorImage, placement: SpritePlacement) {
        let SpritePlacement {
            position,
            origin,
            rotation,
            scale,
            tint,
        } = placement;
        if sprite.width == 0 || sprite.height == 0 || scale.x == 0.0 || scale.y == 0.0 {
            return;
        }

        let (sin, cos) = rotation.sin_cos();
        let to_screen = |local: Vec2| {
            let sx = (local.x - origin.x) * scale.x;
            let sy = (local.y - origin.y) * scale.y;
            position + Vec2::new(sx * cos - sy * sin, sx * sin + sy * cos)
        };

        let corners = [
            to_screen(Vec2::new(0.0, 0.0)),
            to_screen(Vec2::new(sprite.width as f32, 0.0)),
            to_screen(Vec2::new(0.0, sprite.height as f32)),
            to_screen(Vec2::new(sprite.width as f32, sprite.height as f32)),
        ];
        let (mut lo, mut hi) = (corners[0], corners[0]);
        for corner in &corners[1..] {
            lo = Vec2::new(lo.x.min(corner.x), lo.y.min(corner.y));
            hi = Vec2::new(hi.x.max(corner.x), hi.y.max(corner.y));
        }
        let min_x = lo.x.floor().max(0.0) as i32;
        let min_y = lo.y.floor().max(0.0) as i32;
        let max_x = hi.x.ceil().min(self.target.width as f32) as i32;
        let max_y = hi.y.ceil().min(self.target.height as f32) as i32;

        for y in min_y..max_y {
            for x in min_x..max_x {
                // Inverse transform of the pixel centre back into sprite space.
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - position;
                let rx = d.x * cos + d.y * sin;
                let ry = -d.x * sin + d.y * cos;
                let lx = rx / scale.x + origin.x;
                let ly = ry / scale.y + origin.y;
                if lx < 0.0 || ly < 0.0 {
                    continue;
                }
                if let Some(src) = sprite.pixel(lx as u32, ly as u32) {
                    self.blend(x, y, modulate(src, tint));
                }
            }
        }
    }
}

fn modulate(color: Rgba, tint: Rgba) -> Rgba {
    let mul = |a: u8, b: u8| ((a as u16 * b as u16 + 127) / 255) as u8;
    [
        mul(color[0], tint[0]),
        mul(color[1], tint[1]),
        mul(color[2], tint[2]),
        mul(color[3], tint[3]),
    ]
}

/// Straight-alpha source-over.
fn blend_over(dst: Rgba, src: Rgba) -> Rgba {
    match src[3] {
        0 => dst,
        255 => src,
        alpha => {
            let a = alpha as u16;
            let mix = |s: u8, d: u8| ((s as u16 * a + d as u16 * (255 - a) + 127) / 255) as u8;
            [
                mix(src[0], dst[0]),
                mix(src[1], dst[1]),
                mix(src[2], dst[2]),
                dst[3].max(alpha),
            ]
        }
    }
}
