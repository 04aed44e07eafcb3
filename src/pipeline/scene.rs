use super::canvas::{Renderer, SoftwareCanvas};
use super::compositor::CompositedFrame;
use super::sensor::COLOR_RESOLUTION;
use super::skeleton::draw_skeleton;
use crate::types::{ColorImage, Rgba, WHITE};

pub const CORNFLOWER_BLUE: Rgba = [100, 149, 237, 255];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositeMode {
    /// Only the masked background over the clear color.
    #[default]
    MaskOnly,
    /// Live video first, so it shows through the transparent background.
    VideoBehindMask,
}

impl CompositeMode {
    pub fn toggled(self) -> Self {
        match self {
            CompositeMode::MaskOnly => CompositeMode::VideoBehindMask,
            CompositeMode::VideoBehindMask => CompositeMode::MaskOnly,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompositeMode::MaskOnly => "仅遮罩",
            CompositeMode::VideoBehindMask => "视频 + 遮罩",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SceneConfig {
    pub mode: CompositeMode,
    pub clear_color: Rgba,
    pub bone_color: Rgba,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            mode: CompositeMode::default(),
            clear_color: CORNFLOWER_BLUE,
            bone_color: WHITE,
        }
    }
}

/// Paints one composited frame at the color stream resolution.
pub fn render_scene(
    frame: Option<&CompositedFrame>,
    config: &SceneConfig,
    line_sprite: &ColorImage,
) -> ColorImage {
    let mut canvas = SoftwareCanvas::new(COLOR_RESOLUTION.width, COLOR_RESOLUTION.height);
    canvas.clear(config.clear_color);
    let full_screen = canvas.full_rect();

    let Some(frame) = frame else {
        return canvas.into_image();
    };

    if config.mode == CompositeMode::VideoBehindMask {
        if let Some(video) = &frame.video {
            canvas.draw_image(video, full_screen, WHITE);
        }
    }

    if let Some(overlay) = &frame.overlay {
        canvas.draw_image(&frame.masked_background, full_screen, WHITE);
        draw_skeleton(&mut canvas, line_sprite, overlay, config.bone_color);
    }

    canvas.into_image()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::pipeline::canvas::Vec2;
    use crate::pipeline::skeleton::{BoneSegment, SkeletonOverlay, line_sprite};
    const TRANSPARENT: Rgba = [0, 0, 0, 0];
    const RED: Rgba = [255, 0, 0, 255];
    const GREEN: Rgba = [0, 255, 0, 255];

    fn frame(background: ColorImage, overlay: Option<SkeletonOverlay>) -> CompositedFrame {
        CompositedFrame {
            sequence: 1,
            video: Some(Arc::new(ColorImage::filled(2, 2, RED))),
            masked_background: Arc::new(background),
            active_player: if overlay.is_some() { 1 } else { 0 },
            overlay,
        }
    }

    fn overlay() -> SkeletonOverlay {
        SkeletonOverlay {
            segments: vec![BoneSegment {
                from: Vec2::new(100.0, 100.0),
                to: Vec2::new(100.0, 200.0),
            }],
        }
    }

    #[test]
    fn no_frame_is_just_the_clear_color() {
        let image = render_scene(None, &SceneConfig::default(), &line_sprite());
        assert_eq!(image.width, 640);
        assert!(image.pixels.iter().all(|px| *px == CORNFLOWER_BLUE));
    }

    #[test]
    fn untracked_frame_draws_no_overlay() {
        let frame = frame(ColorImage::filled(2, 2, GREEN), None);
        let image = render_scene(Some(&frame), &SceneConfig::default(), &line_sprite());
        assert!(image.pixels.iter().all(|px| *px == CORNFLOWER_BLUE));
    }

    #[test]
    fn tracked_frame_draws_background_and_bones() {
        let frame = frame(ColorImage::filled(2, 2, GREEN), Some(overlay()));
        let image = render_scene(Some(&frame), &SceneConfig::default(), &line_sprite());
        assert_eq!(image.pixel(0, 0), Some(GREEN));
        assert_eq!(image.pixel(100, 150), Some(WHITE));
    }

    #[test]
    fn video_shows_through_transparent_background() {
        let background = ColorImage {
            width: 2,
            height: 1,
            pixels: vec![GREEN, TRANSPARENT],
        };
        let frame = frame(background, Some(overlay()));

        let mask_only = render_scene(Some(&frame), &SceneConfig::default(), &line_sprite());
        assert_eq!(mask_only.pixel(639, 0), Some(CORNFLOWER_BLUE));

        let config = SceneConfig {
            mode: CompositeMode::VideoBehindMask,
            ..SceneConfig::default()
        };
        let layered = render_scene(Some(&frame), &config, &line_sprite());
        assert_eq!(layered.pixel(639, 0), Some(RED));
        assert_eq!(layered.pixel(0, 0), Some(GREEN));
    }
}
