//! Per-tick fusion of color, depth and skeleton frames.
//!
//! Every tick produces a [`CompositedFrame`] snapshot: the latest video
//! texture, the background with everything but the active player cut out, and
//! the projected skeleton of the active player. Sub-frames missing from a tick
//! leave the previous value in place.

use std::sync::Arc;

use rayon::prelude::*;

use super::sensor::{COLOR_RESOLUTION, CoordinateMapper};
use super::skeleton::{SkeletonOverlay, project_skeleton};
use crate::types::{ColorFrame, ColorImage, DepthFrame, FrameSet, Skeleton, player_index};

/// The color stream runs at twice the depth and background resolution.
pub const COLOR_TO_BACKGROUND_SCALE: i32 = 2;

#[derive(Clone, Debug)]
pub struct ActiveSkeleton {
    /// 1-based slot index, matching the player index stored in depth pixels.
    pub player_number: u8,
    pub skeleton: Skeleton,
}

#[derive(Clone, Debug)]
pub struct CompositedFrame {
    pub sequence: u64,
    pub video: Option<Arc<ColorImage>>,
    pub masked_background: Arc<ColorImage>,
    pub active_player: u8,
    pub overlay: Option<SkeletonOverlay>,
}

/// Reorders blue, green, red, unused into opaque RGBA.
pub fn convert_color_frame(frame: &ColorFrame) -> ColorImage {
    let pixels = frame
        .bgrx()
        .par_chunks_exact(4)
        .map(|src| [src[2], src[1], src[0], 255])
        .collect();

    ColorImage {
        width: frame.width(),
        height: frame.height(),
        pixels,
    }
}

/// First tracked skeleton wins; there is no scoring and no hysteresis.
pub fn select_active_skeleton(skeletons: &[Skeleton]) -> Option<ActiveSkeleton> {
    skeletons
        .iter()
        .enumerate()
        .filter(|(_, skeleton)| skeleton.is_tracked())
        .find_map(|(idx, skeleton)| {
            // Slots past u8::MAX cannot be named in a player number.
            let player_number = u8::try_from(idx + 1).ok()?;
            Some(ActiveSkeleton {
                player_number,
                skeleton: skeleton.clone(),
            })
        })
}

/// Copies `background` and clears alpha wherever a depth pixel that does not
/// belong to `active_player` maps to. Mappings outside the background are
/// dropped.
pub fn mask_background(
    background: &ColorImage,
    depth: &DepthFrame,
    active_player: u8,
    mapper: &dyn CoordinateMapper,
) -> ColorImage {
    let mut masked = background.clone();
    if active_player == 0 {
        return masked;
    }

    let width = depth.width() as usize;
    let stride = i64::from(depth.width());
    let len = masked.pixels.len();

    let holes: Vec<usize> = depth
        .data()
        .par_iter()
        .enumerate()
        .filter(|&(_, &raw)| player_index(raw) != active_player)
        .filter_map(|(pos, &raw)| {
            let x = (pos % width) as i32;
            let y = (pos / width) as i32;
            let point = mapper.map_depth_to_color(x, y, raw, COLOR_RESOLUTION);

            let scaled_x = i64::from(point.x / COLOR_TO_BACKGROUND_SCALE);
            let scaled_y = i64::from(point.y / COLOR_TO_BACKGROUND_SCALE);
            // Wide enough that any mapped row times any stride stays exact.
            let target = scaled_x + scaled_y * stride;

            usize::try_from(target).ok().filter(|&target| target < len)
        })
        .collect();

    for pos in holes {
        masked.pixels[pos][3] = 0;
    }
    masked
}

pub struct FrameCompositor {
    background: Arc<ColorImage>,
    video: Option<Arc<ColorImage>>,
    masked_background: Arc<ColorImage>,
    active: Option<ActiveSkeleton>,
    sequence: u64,
}

impl FrameCompositor {
    pub fn new(background: Arc<ColorImage>) -> Self {
        Self {
            masked_background: background.clone(),
            background,
            video: None,
            active: None,
            sequence: 0,
        }
    }

    pub fn process(&mut self, frames: FrameSet, mapper: &dyn CoordinateMapper) -> CompositedFrame {
        self.sequence += 1;

        if let Some(color) = &frames.color {
            self.video = Some(Arc::new(convert_color_frame(color)));
        }

        if let Some(skeletons) = &frames.skeletons {
            let previous = self.active_player();
            self.active = select_active_skeleton(skeletons);
            if self.active_player() != previous {
                log::debug!(
                    "active player changed from {previous} to {}",
                    self.active_player()
                );
            }
        }

        if let Some(depth) = &frames.depth {
            self.masked_background = match &self.active {
                Some(active) => Arc::new(mask_background(
                    &self.background,
                    depth,
                    active.player_number,
                    mapper,
                )),
                None => self.background.clone(),
            };
        }

        CompositedFrame {
            sequence: self.sequence,
            video: self.video.clone(),
            masked_background: self.masked_background.clone(),
            active_player: self.active_player(),
            overlay: self
                .active
                .as_ref()
                .map(|active| project_skeleton(&active.skeleton, mapper)),
        }
    }

    pub fn active_player(&self) -> u8 {
        self.active.as_ref().map_or(0, |active| active.player_number)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{ColorPoint, Resolution, SkeletonPoint, TrackingState, pack_depth};

    /// Maps depth pixel (x, y) straight to color pixel (2x, 2y) and joints to
    /// their x/y coordinates.
    pub(crate) struct FlatMapper;

    impl CoordinateMapper for FlatMapper {
        fn map_depth_to_color(&self, x: i32, y: i32, _raw: u16, _target: Resolution) -> ColorPoint {
            ColorPoint { x: x * 2, y: y * 2 }
        }

        fn map_skeleton_point_to_color(&self, point: SkeletonPoint, _target: Resolution) -> ColorPoint {
            ColorPoint {
                x: point.x as i32,
                y: point.y as i32,
            }
        }
    }

    /// Sends every depth pixel to one fixed color coordinate.
    struct FixedMapper(ColorPoint);

    impl CoordinateMapper for FixedMapper {
        fn map_depth_to_color(&self, _x: i32, _y: i32, _raw: u16, _target: Resolution) -> ColorPoint {
            self.0
        }

        fn map_skeleton_point_to_color(&self, _point: SkeletonPoint, _target: Resolution) -> ColorPoint {
            self.0
        }
    }

    fn background(width: u32, height: u32) -> ColorImage {
        let pixels = (0..width * height)
            .map(|i| [(i % 251) as u8, 40, 200, 255])
            .collect();
        ColorImage {
            width,
            height,
            pixels,
        }
    }

    fn depth(width: u32, height: u32, player: u8) -> DepthFrame {
        let data = vec![pack_depth(1_500, player); (width * height) as usize];
        DepthFrame::new(width, height, data).unwrap()
    }

    fn skeletons(states: &[TrackingState]) -> Vec<Skeleton> {
        states
            .iter()
            .map(|&state| {
                let mut skeleton = Skeleton::untracked();
                skeleton.tracking_state = state;
                skeleton
            })
            .collect()
    }

    #[test]
    fn color_frame_becomes_opaque_rgba() {
        let frame = ColorFrame::new(2, 1, vec![1, 2, 3, 0, 10, 20, 30, 77]).unwrap();
        let image = convert_color_frame(&frame);
        assert_eq!(image.width, 2);
        assert_eq!(image.height, 1);
        assert_eq!(image.pixels, vec![[3, 2, 1, 255], [30, 20, 10, 255]]);
    }

    #[test]
    fn color_conversion_keeps_row_major_order() {
        let bgrx: Vec<u8> = (0..3 * 2).flat_map(|i| [i as u8, 0, 0, 0]).collect();
        let image = convert_color_frame(&ColorFrame::new(3, 2, bgrx).unwrap());
        let blues: Vec<u8> = image.pixels.iter().map(|px| px[2]).collect();
        assert_eq!(blues, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn first_tracked_skeleton_is_selected() {
        use TrackingState::*;
        let slots = skeletons(&[NotTracked, PositionOnly, Tracked, Tracked]);
        let active = select_active_skeleton(&slots).unwrap();
        assert_eq!(active.player_number, 3);
    }

    #[test]
    fn slots_beyond_the_player_number_range_are_skipped() {
        let mut slots = vec![Skeleton::untracked(); 300];
        slots[260].tracking_state = TrackingState::Tracked;
        assert!(select_active_skeleton(&slots).is_none());

        slots[254].tracking_state = TrackingState::Tracked;
        let active = select_active_skeleton(&slots).unwrap();
        assert_eq!(active.player_number, 255);
    }

    #[test]
    fn no_tracked_skeleton_selects_nothing() {
        use TrackingState::*;
        assert!(select_active_skeleton(&skeletons(&[NotTracked, PositionOnly])).is_none());
        assert!(select_active_skeleton(&[]).is_none());
    }

    #[test]
    fn background_only_depth_clears_every_pixel() {
        let bg = background(8, 6);
        let masked = mask_background(&bg, &depth(8, 6, 0), 1, &FlatMapper);
        assert!(masked.pixels.iter().all(|px| px[3] == 0));
        // Only alpha changes.
        for (before, after) in bg.pixels.iter().zip(&masked.pixels) {
            assert_eq!(before[..3], after[..3]);
        }
    }

    #[test]
    fn active_player_everywhere_leaves_background_untouched() {
        let bg = background(8, 6);
        let masked = mask_background(&bg, &depth(8, 6, 2), 2, &FlatMapper);
        assert_eq!(masked, bg);
    }

    #[test]
    fn other_players_are_masked_too() {
        let bg = background(4, 4);
        let mut data = vec![pack_depth(1_500, 1); 16];
        data[5] = pack_depth(1_500, 3);
        let masked = mask_background(&bg, &DepthFrame::new(4, 4, data).unwrap(), 1, &FlatMapper);
        let cleared: Vec<usize> = (0..16).filter(|&i| masked.pixels[i][3] == 0).collect();
        assert_eq!(cleared, vec![5]);
    }

    #[test]
    fn zero_player_number_masks_nothing() {
        let bg = background(4, 4);
        let masked = mask_background(&bg, &depth(4, 4, 0), 0, &FlatMapper);
        assert_eq!(masked, bg);
    }

    #[test]
    fn last_valid_index_is_masked_and_one_past_is_not() {
        let bg = background(4, 3);
        let single = DepthFrame::new(1, 1, vec![pack_depth(900, 0)]).unwrap();

        // Depth width 1 makes the row stride 1: position = x/2 + y/2.
        let last = mask_background(&bg, &single, 1, &FixedMapper(ColorPoint { x: 0, y: 22 }));
        assert_eq!(last.pixels[11], [bg.pixels[11][0], 40, 200, 0]);

        let past = mask_background(&bg, &single, 1, &FixedMapper(ColorPoint { x: 0, y: 24 }));
        assert_eq!(past, bg);
    }

    #[test]
    fn negative_mapping_is_dropped() {
        let bg = background(4, 4);
        let masked = mask_background(
            &bg,
            &depth(4, 4, 0),
            1,
            &FixedMapper(ColorPoint { x: -8, y: -4 }),
        );
        assert_eq!(masked, bg);
    }

    #[test]
    fn far_off_mapping_does_not_wrap_into_the_image() {
        let bg = background(320, 240);
        // 13_421_773 * 320 wraps to 64 in 32-bit arithmetic.
        let far = FixedMapper(ColorPoint {
            x: 0,
            y: 2 * 13_421_773,
        });
        let masked = mask_background(&bg, &depth(320, 240, 0), 1, &far);
        assert_eq!(masked, bg);

        let extreme = FixedMapper(ColorPoint {
            x: i32::MAX,
            y: i32::MAX,
        });
        let masked = mask_background(&bg, &depth(320, 240, 0), 1, &extreme);
        assert_eq!(masked, bg);
    }

    #[test]
    fn masking_is_a_pure_function_of_its_inputs() {
        let bg = background(8, 6);
        let mut data = vec![pack_depth(1_200, 0); 48];
        for value in data.iter_mut().skip(10).take(12) {
            *value = pack_depth(1_200, 1);
        }
        let frame = DepthFrame::new(8, 6, data).unwrap();
        let first = mask_background(&bg, &frame, 1, &FlatMapper);
        let second = mask_background(&bg, &frame, 1, &FlatMapper);
        assert_eq!(first, second);
    }

    #[test]
    fn masks_are_rebuilt_rather_than_accumulated() {
        let bg = Arc::new(background(4, 4));
        let mut compositor = FrameCompositor::new(bg.clone());
        let tracked = skeletons(&[TrackingState::Tracked]);

        compositor.process(
            FrameSet {
                depth: Some(depth(4, 4, 0)),
                skeletons: Some(tracked.clone()),
                ..Default::default()
            },
            &FlatMapper,
        );
        let frame = compositor.process(
            FrameSet {
                depth: Some(depth(4, 4, 1)),
                skeletons: Some(tracked),
                ..Default::default()
            },
            &FlatMapper,
        );
        assert_eq!(*frame.masked_background, *bg);
    }

    #[test]
    fn missing_color_frame_keeps_previous_video() {
        let mut compositor = FrameCompositor::new(Arc::new(background(2, 2)));
        let first = compositor.process(
            FrameSet {
                color: Some(ColorFrame::new(1, 1, vec![9, 8, 7, 0]).unwrap()),
                ..Default::default()
            },
            &FlatMapper,
        );
        let second = compositor.process(FrameSet::default(), &FlatMapper);

        let video = second.video.expect("video retained");
        assert_eq!(video.pixels, vec![[7, 8, 9, 255]]);
        assert!(Arc::ptr_eq(&video, first.video.as_ref().unwrap()));
        assert_eq!(second.sequence, 2);
    }

    #[test]
    fn untracked_tick_has_no_overlay_but_textures_update() {
        let bg = Arc::new(background(4, 4));
        let mut compositor = FrameCompositor::new(bg.clone());
        let frame = compositor.process(
            FrameSet {
                color: Some(ColorFrame::new(1, 1, vec![0, 0, 255, 0]).unwrap()),
                depth: Some(depth(4, 4, 0)),
                skeletons: Some(skeletons(&[TrackingState::PositionOnly])),
            },
            &FlatMapper,
        );
        assert_eq!(frame.active_player, 0);
        assert!(frame.overlay.is_none());
        assert!(frame.video.is_some());
        assert_eq!(*frame.masked_background, *bg);
    }

    #[test]
    fn missing_skeleton_frame_keeps_previous_selection() {
        let mut compositor = FrameCompositor::new(Arc::new(background(4, 4)));
        compositor.process(
            FrameSet {
                skeletons: Some(skeletons(&[TrackingState::NotTracked, TrackingState::Tracked])),
                ..Default::default()
            },
            &FlatMapper,
        );
        let frame = compositor.process(
            FrameSet {
                depth: Some(depth(4, 4, 0)),
                ..Default::default()
            },
            &FlatMapper,
        );
        assert_eq!(frame.active_player, 2);
        assert!(frame.overlay.is_some());
        assert!(frame.masked_background.pixels.iter().all(|px| px[3] == 0));
    }

    #[test]
    fn selection_moves_when_active_skeleton_is_lost() {
        use TrackingState::*;
        let mut compositor = FrameCompositor::new(Arc::new(background(2, 2)));
        compositor.process(
            FrameSet {
                skeletons: Some(skeletons(&[Tracked, Tracked])),
                ..Default::default()
            },
            &FlatMapper,
        );
        assert_eq!(compositor.active_player(), 1);

        compositor.process(
            FrameSet {
                skeletons: Some(skeletons(&[NotTracked, Tracked])),
                ..Default::default()
            },
            &FlatMapper,
        );
        assert_eq!(compositor.active_player(), 2);
    }
}
