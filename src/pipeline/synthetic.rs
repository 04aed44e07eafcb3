//! A depth sensor that makes up its own scene.
//!
//! One player walks side to side in front of a wall while a bystander stands
//! still. Frames are generated on the depth grid and lifted into sensor space
//! through [`KinectRegistration`], so masks and bones line up with what a real
//! device would report.

use std::{
    thread,
    time::{Duration, Instant},
};

use anyhow::Result;

use super::registration::KinectRegistration;
use super::sensor::{COLOR_RESOLUTION, CoordinateMapper, DEPTH_RESOLUTION, SensorSource};
use super::skeleton::BONES;
use crate::types::{
    ColorFrame, DepthFrame, FrameSet, Joint, JointType, Resolution, Skeleton, TrackingState,
    pack_depth, player_index,
};

const SYNTHETIC_FPS: u64 = 30;
const FRAME_INTERVAL: Duration = Duration::from_millis(1_000 / SYNTHETIC_FPS);

pub const SKELETON_SLOTS: usize = 6;
pub const PLAYER_SLOT: usize = 1;
pub const BYSTANDER_SLOT: usize = 3;

const PLAYER_DEPTH_MM: u16 = 2_000;
const BYSTANDER_DEPTH_MM: u16 = 2_600;
const WALL_DEPTH_MM: u16 = 3_800;

const BYSTANDER_CENTER: (f32, f32) = (272.0, 150.0);
const BYSTANDER_RADIUS: f32 = 22.0;
const LIMB_RADIUS: f32 = 5.0;
const TORSO_RADIUS: f32 = 11.0;
const HEAD_RADIUS: f32 = 10.0;

const WALL_BGR: [u8; 3] = [180, 190, 200];
const PLAYER_BGR: [u8; 3] = [60, 90, 200];
const BYSTANDER_BGR: [u8; 3] = [70, 160, 70];

/// Joint offsets from the hip centre, in depth pixels.
const POSE: [(JointType, f32, f32); JointType::COUNT] = [
    (JointType::HipCenter, 0.0, 0.0),
    (JointType::Spine, 0.0, -20.0),
    (JointType::ShoulderCenter, 0.0, -48.0),
    (JointType::Head, 0.0, -64.0),
    (JointType::ShoulderLeft, -16.0, -45.0),
    (JointType::ElbowLeft, -26.0, -24.0),
    (JointType::WristLeft, -31.0, -4.0),
    (JointType::HandLeft, -33.0, 2.0),
    (JointType::ShoulderRight, 16.0, -45.0),
    (JointType::ElbowRight, 26.0, -24.0),
    (JointType::WristRight, 31.0, -4.0),
    (JointType::HandRight, 33.0, 2.0),
    (JointType::HipLeft, -9.0, 4.0),
    (JointType::KneeLeft, -11.0, 32.0),
    (JointType::AnkleLeft, -11.0, 58.0),
    (JointType::FootLeft, -16.0, 62.0),
    (JointType::HipRight, 9.0, 4.0),
    (JointType::KneeRight, 11.0, 32.0),
    (JointType::AnkleRight, 11.0, 58.0),
    (JointType::FootRight, 16.0, 62.0),
];

pub struct SyntheticSensor {
    registration: KinectRegistration,
    tick: u64,
    paced: bool,
    last_frame: Option<Instant>,
}

impl SyntheticSensor {
    pub fn new() -> Self {
        Self {
            registration: KinectRegistration::default(),
            tick: 0,
            paced: true,
            last_frame: None,
        }
    }

    #[cfg(test)]
    fn unpaced() -> Self {
        Self {
            paced: false,
            ..Self::new()
        }
    }

    /// Joint positions on the depth grid for `tick`.
    fn pose_at(tick: u64) -> [(f32, f32); JointType::COUNT] {
        let t = tick as f32;
        let hip_x = DEPTH_RESOLUTION.width as f32 / 2.0 + 70.0 * (t * 0.03).sin();
        let hip_y = DEPTH_RESOLUTION.height as f32 / 2.0 + 10.0;
        let wave = 10.0 * (t * 0.2).sin();

        let mut points = [(0.0, 0.0); JointType::COUNT];
        for (kind, dx, dy) in POSE {
            let lift = match kind {
                JointType::WristRight | JointType::HandRight => -wave,
                JointType::WristLeft | JointType::HandLeft => wave,
                _ => 0.0,
            };
            points[kind.index()] = (hip_x + dx, hip_y + dy + lift);
        }
        points
    }

    pub fn frame_set_at(&self, tick: u64) -> Result<FrameSet> {
        let pose = Self::pose_at(tick);
        let depth = self.depth_frame(&pose)?;
        let color = self.color_frame(&depth)?;

        let mut skeletons = vec![Skeleton::untracked(); SKELETON_SLOTS];
        skeletons[PLAYER_SLOT] = self.player_skeleton(&pose);
        skeletons[BYSTANDER_SLOT] = self.bystander_skeleton();

        Ok(FrameSet {
            color: Some(color),
            depth: Some(depth),
            skeletons: Some(skeletons),
        })
    }

    fn depth_frame(&self, pose: &[(f32, f32); JointType::COUNT]) -> Result<DepthFrame> {
        let Resolution { width, height } = DEPTH_RESOLUTION;
        let player = (PLAYER_SLOT + 1) as u8;
        let bystander = (BYSTANDER_SLOT + 1) as u8;

        let mut data = Vec::with_capacity(DEPTH_RESOLUTION.pixel_count());
        for y in 0..height {
            for x in 0..width {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let value = if on_body(pose, p) {
                    pack_depth(PLAYER_DEPTH_MM, player)
                } else if distance(p, BYSTANDER_CENTER) <= BYSTANDER_RADIUS {
                    pack_depth(BYSTANDER_DEPTH_MM, bystander)
                } else {
                    pack_depth(WALL_DEPTH_MM, 0)
                };
                data.push(value);
            }
        }
        Ok(DepthFrame::new(width, height, data)?)
    }

    fn color_frame(&self, depth: &DepthFrame) -> Result<ColorFrame> {
        let Resolution { width, height } = COLOR_RESOLUTION;
        let scale = width / depth.width();

        let mut bgrx = Vec::with_capacity(COLOR_RESOLUTION.pixel_count() * 4);
        for y in 0..height {
            for x in 0..width {
                let raw = depth.data()[((y / scale) * depth.width() + x / scale) as usize];
                let [b, g, r] = match player_index(raw) as usize {
                    0 => {
                        let shade = (y * 40 / height) as u8;
                        [
                            WALL_BGR[0] - shade,
                            WALL_BGR[1] - shade,
                            WALL_BGR[2] - shade,
                        ]
                    }
                    slot if slot == PLAYER_SLOT + 1 => PLAYER_BGR,
                    _ => BYSTANDER_BGR,
                };
                bgrx.extend_from_slice(&[b, g, r, 0]);
            }
        }
        Ok(ColorFrame::new(width, height, bgrx)?)
    }

    fn player_skeleton(&self, pose: &[(f32, f32); JointType::COUNT]) -> Skeleton {
        let mut joints = [Joint::default(); JointType::COUNT];
        for kind in JointType::ALL {
            let (x, y) = pose[kind.index()];
            joints[kind.index()] = Joint {
                position: self.registration.unproject_depth(x, y, PLAYER_DEPTH_MM),
            };
        }
        Skeleton::with_joints(TrackingState::Tracked, joints)
    }

    /// Position-only slots report just the body centre.
    fn bystander_skeleton(&self) -> Skeleton {
        let (x, y) = BYSTANDER_CENTER;
        let mut joints = [Joint::default(); JointType::COUNT];
        joints[JointType::HipCenter.index()] = Joint {
            position: self.registration.unproject_depth(x, y, BYSTANDER_DEPTH_MM),
        };
        Skeleton::with_joints(TrackingState::PositionOnly, joints)
    }
}

impl SensorSource for SyntheticSensor {
    fn next_frame_set(&mut self) -> Result<FrameSet> {
        if self.paced {
            if let Some(last) = self.last_frame {
                let elapsed = last.elapsed();
                if elapsed < FRAME_INTERVAL {
                    thread::sleep(FRAME_INTERVAL - elapsed);
                }
            }
            self.last_frame = Some(Instant::now());
        }

        let frames = self.frame_set_at(self.tick)?;
        self.tick += 1;
        Ok(frames)
    }

    fn mapper(&self) -> &dyn CoordinateMapper {
        &self.registration
    }
}

fn on_body(pose: &[(f32, f32); JointType::COUNT], p: (f32, f32)) -> bool {
    if distance(p, pose[JointType::Head.index()]) <= HEAD_RADIUS {
        return true;
    }
    BONES.iter().any(|&(a, b)| {
        let radius = match (a, b) {
            (JointType::ShoulderCenter, JointType::Spine)
            | (JointType::Spine, JointType::HipCenter) => TORSO_RADIUS,
            _ => LIMB_RADIUS,
        };
        distance_to_segment(p, pose[a.index()], pose[b.index()]) <= radius
    })
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

fn distance_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f32::EPSILON {
        return distance(p, a);
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    distance(p, (a.0 + t * dx, a.1 + t * dy))
}
