use std::f32::consts::FRAC_PI_2;

use super::canvas::{Renderer, SpritePlacement, Vec2};
use super::sensor::{COLOR_RESOLUTION, CoordinateMapper};
use crate::types::{ColorImage, JointType, Rgba, Skeleton, WHITE};

use JointType::*;

pub const BONES: &[(JointType, JointType)] = &[
    // Spine
    (Head, ShoulderCenter),
    (ShoulderCenter, Spine),
    (Spine, HipCenter),
    // Left leg
    (HipCenter, HipLeft),
    (HipLeft, KneeLeft),
    (KneeLeft, AnkleLeft),
    (AnkleLeft, FootLeft),
    // Right leg
    (HipCenter, HipRight),
    (HipRight, KneeRight),
    (KneeRight, AnkleRight),
    (AnkleRight, FootRight),
    // Left arm
    (ShoulderCenter, ShoulderLeft),
    (ShoulderLeft, ElbowLeft),
    (ElbowLeft, WristLeft),
    (WristLeft, HandLeft),
    // Right arm
    (ShoulderCenter, ShoulderRight),
    (ShoulderRight, ElbowRight),
    (ElbowRight, WristRight),
    (WristRight, HandRight),
];

pub const LINE_SPRITE_SIZE: u32 = 3;

/// The unit sprite stretched into every bone.
pub fn line_sprite() -> ColorImage {
    ColorImage::filled(LINE_SPRITE_SIZE, LINE_SPRITE_SIZE, WHITE)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneSegment {
    pub from: Vec2,
    pub to: Vec2,
}

/// Bones of one skeleton in color image pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct SkeletonOverlay {
    pub segments: Vec<BoneSegment>,
}

pub fn project_skeleton(skeleton: &Skeleton, mapper: &dyn CoordinateMapper) -> SkeletonOverlay {
    let project = |kind: JointType| {
        let point =
            mapper.map_skeleton_point_to_color(skeleton.joint(kind).position, COLOR_RESOLUTION);
        Vec2::new(point.x as f32, point.y as f32)
    };

    SkeletonOverlay {
        segments: BONES
            .iter()
            .map(|&(a, b)| BoneSegment {
                from: project(a),
                to: project(b),
            })
            .collect(),
    }
}

pub fn draw_skeleton(
    renderer: &mut dyn Renderer,
    sprite: &ColorImage,
    overlay: &SkeletonOverlay,
    color: Rgba,
) {
    for segment in &overlay.segments {
        draw_line(renderer, sprite, segment.from, segment.to, color);
    }
}

/// Draws a segment by stretching `sprite` from `from` towards `to`. The sprite
/// points down by default, hence the quarter-turn correction, and is anchored
/// at the middle of its top edge.
pub fn draw_line(renderer: &mut dyn Renderer, sprite: &ColorImage, from: Vec2, to: Vec2, color: Rgba) {
    renderer.draw_sprite(sprite, line_placement(sprite, from, to, color));
}

fn line_placement(sprite: &ColorImage, from: Vec2, to: Vec2, color: Rgba) -> SpritePlacement {
    let diff = to - from;
    SpritePlacement {
        position: from,
        origin: Vec2::new(sprite.width as f32 / 2.0, 0.0),
        rotation: diff.y.atan2(diff.x) - FRAC_PI_2,
        scale: Vec2::new(1.0, diff.length() / sprite.height as f32),
        tint: color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::canvas::{Rect, SoftwareCanvas};
    use crate::pipeline::compositor::tests::FlatMapper;
    use crate::types::{Joint, SkeletonPoint, TrackingState};

    #[derive(Default)]
    struct RecordingRenderer {
        sprites: Vec<SpritePlacement>,
    }

    impl Renderer for RecordingRenderer {
        fn clear(&mut self, _color: Rgba) {}

        fn draw_image(&mut self, _image: &ColorImage, _dest: Rect, _tint: Rgba) {}

        fn draw_sprite(&mut self, _sprite: &ColorImage, placement: SpritePlacement) {
            self.sprites.push(placement);
        }
    }

    fn posed_skeleton() -> Skeleton {
        let mut joints = [Joint::default(); JointType::COUNT];
        for (i, joint) in joints.iter_mut().enumerate() {
            *joint = Joint {
                position: SkeletonPoint::new(10.0 * i as f32, 5.0 * i as f32, 2.0),
            };
        }
        Skeleton::with_joints(TrackingState::Tracked, joints)
    }

    #[test]
    fn bone_list_covers_the_joint_tree() {
        assert_eq!(BONES.len(), JointType::COUNT - 1);
        for kind in JointType::ALL {
            assert!(
                BONES.iter().any(|&(a, b)| a == kind || b == kind),
                "{kind:?} is not connected"
            );
        }
    }

    #[test]
    fn downward_line_needs_no_rotation() {
        let sprite = line_sprite();
        let placement = line_placement(&sprite, Vec2::new(10.0, 10.0), Vec2::new(10.0, 40.0), WHITE);
        assert!(placement.rotation.abs() < 1e-6);
        assert!((placement.scale.y - 10.0).abs() < 1e-6);
        assert_eq!(placement.scale.x, 1.0);
        assert_eq!(placement.position, Vec2::new(10.0, 10.0));
        assert_eq!(placement.origin, Vec2::new(1.5, 0.0));
    }

    #[test]
    fn bone_is_centred_on_its_segment() {
        let mut canvas = SoftwareCanvas::new(40, 40);
        canvas.clear([0, 0, 0, 255]);
        draw_line(
            &mut canvas,
            &line_sprite(),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 30.0),
            WHITE,
        );
        let out = canvas.into_image();
        // Three pixels wide, covering x in [8.5, 11.5).
        let painted: Vec<u32> = (0..40)
            .filter(|&x| out.pixel(x, 20) == Some(WHITE))
            .collect();
        assert_eq!(painted, vec![8, 9, 10]);
    }

    #[test]
    fn rightward_line_is_rotated_a_quarter_turn_back() {
        let sprite = line_sprite();
        let placement = line_placement(&sprite, Vec2::new(0.0, 0.0), Vec2::new(6.0, 0.0), WHITE);
        assert!((placement.rotation + FRAC_PI_2).abs() < 1e-6);
        assert!((placement.scale.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn every_bone_is_projected_and_drawn_in_order() {
        let overlay = project_skeleton(&posed_skeleton(), &FlatMapper);
        assert_eq!(overlay.segments.len(), BONES.len());

        let head = Head.index() as f32;
        assert_eq!(overlay.segments[0].from, Vec2::new(10.0 * head, 5.0 * head));

        let mut renderer = RecordingRenderer::default();
        draw_skeleton(&mut renderer, &line_sprite(), &overlay, WHITE);
        assert_eq!(renderer.sprites.len(), BONES.len());
        for (placement, segment) in renderer.sprites.iter().zip(&overlay.segments) {
            assert_eq!(placement.position, segment.from);
        }
    }

    #[test]
    fn canvas_paints_along_the_segment() {
        let mut canvas = SoftwareCanvas::new(40, 40);
        canvas.clear([0, 0, 0, 255]);
        draw_line(
            &mut canvas,
            &line_sprite(),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 30.0),
            WHITE,
        );
        let out = canvas.into_image();
        assert_eq!(out.pixel(10, 20), Some(WHITE));
        assert_eq!(out.pixel(10, 29), Some(WHITE));
        assert_eq!(out.pixel(10, 5), Some([0, 0, 0, 255]));
        assert_eq!(out.pixel(20, 20), Some([0, 0, 0, 255]));
    }

    #[test]
    fn offscreen_bones_are_clipped_without_panicking() {
        let mut canvas = SoftwareCanvas::new(16, 16);
        draw_line(
            &mut canvas,
            &line_sprite(),
            Vec2::new(-50.0, -50.0),
            Vec2::new(100.0, 80.0),
            WHITE,
        );
        draw_line(
            &mut canvas,
            &line_sprite(),
            Vec2::new(500.0, 500.0),
            Vec2::new(900.0, 900.0),
            WHITE,
        );
    }
}
