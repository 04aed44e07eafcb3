//! Depth to color registration for a Kinect-style sensor.
//!
//! Reference calibration is given at 640x480 and scaled to the requested
//! resolution. Sensor space is centred on the depth camera, meters, Y up.

use super::sensor::{COLOR_RESOLUTION, CoordinateMapper, DEPTH_RESOLUTION};
use crate::types::{ColorPoint, Resolution, SkeletonPoint, depth_millimeters};

const BASE_RESOLUTION: Resolution = Resolution::new(640, 480);

/// Depth (IR) camera focal lengths and principal point at 640x480.
const DEPTH_FX: f32 = 594.21;
const DEPTH_FY: f32 = 591.04;
const DEPTH_CX: f32 = 339.5;
const DEPTH_CY: f32 = 242.7;

/// Color camera focal lengths and principal point at 640x480.
const COLOR_FX: f32 = 525.0;
const COLOR_FY: f32 = 525.0;
const COLOR_CX: f32 = 319.5;
const COLOR_CY: f32 = 239.5;

/// Horizontal offset of the color camera from the depth camera, meters.
const COLOR_BASELINE_M: f32 = 0.025;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl CameraIntrinsics {
    fn scaled_to(&self, target: Resolution) -> Self {
        let sx = target.width as f32 / BASE_RESOLUTION.width as f32;
        let sy = target.height as f32 / BASE_RESOLUTION.height as f32;
        Self {
            fx: self.fx * sx,
            fy: self.fy * sy,
            cx: self.cx * sx,
            cy: self.cy * sy,
        }
    }

    fn project(&self, point: SkeletonPoint) -> (f32, f32) {
        (
            self.fx * point.x / point.z + self.cx,
            self.cy - self.fy * point.y / point.z,
        )
    }
}

#[derive(Clone, Debug)]
pub struct KinectRegistration {
    depth_resolution: Resolution,
    depth: CameraIntrinsics,
    color: CameraIntrinsics,
    baseline_m: f32,
}

impl KinectRegistration {
    pub fn new(depth_resolution: Resolution) -> Self {
        let depth = CameraIntrinsics {
            fx: DEPTH_FX,
            fy: DEPTH_FY,
            cx: DEPTH_CX,
            cy: DEPTH_CY,
        };
        Self {
            depth_resolution,
            depth: depth.scaled_to(depth_resolution),
            color: CameraIntrinsics {
                fx: COLOR_FX,
                fy: COLOR_FY,
                cx: COLOR_CX,
                cy: COLOR_CY,
            },
            baseline_m: COLOR_BASELINE_M,
        }
    }

    /// Lifts a depth pixel with a known distance into sensor space.
    pub fn unproject_depth(&self, x: f32, y: f32, millimeters: u16) -> SkeletonPoint {
        let z = millimeters as f32 / 1_000.0;
        SkeletonPoint::new(
            (x - self.depth.cx) * z / self.depth.fx,
            (self.depth.cy - y) * z / self.depth.fy,
            z,
        )
    }

    /// Projects a sensor space point onto the depth image plane.
    #[cfg(test)]
    fn project_to_depth(&self, point: SkeletonPoint) -> (f32, f32) {
        if point.z <= 0.0 {
            return (self.depth.cx, self.depth.cy);
        }
        self.depth.project(point)
    }

    fn project_to_color(&self, point: SkeletonPoint, target: Resolution) -> ColorPoint {
        let color = self.color.scaled_to(target);
        if point.z <= 0.0 {
            return ColorPoint {
                x: color.cx.round() as i32,
                y: color.cy.round() as i32,
            };
        }
        let in_color_space = SkeletonPoint {
            x: point.x - self.baseline_m,
            ..point
        };
        let (u, v) = color.project(in_color_space);
        ColorPoint {
            x: u.round() as i32,
            y: v.round() as i32,
        }
    }
}

impl Default for KinectRegistration {
    fn default() -> Self {
        Self::new(DEPTH_RESOLUTION)
    }
}

impl CoordinateMapper for KinectRegistration {
    fn map_depth_to_color(&self, x: i32, y: i32, raw_depth: u16, target: Resolution) -> ColorPoint {
        let millimeters = depth_millimeters(raw_depth);
        if millimeters == 0 {
            // No reading: fall back to the plain resolution ratio.
            return ColorPoint {
                x: x * target.width as i32 / self.depth_resolution.width as i32,
                y: y * target.height as i32 / self.depth_resolution.height as i32,
            };
        }
        let point = self.unproject_depth(x as f32, y as f32, millimeters);
        self.project_to_color(point, target)
    }

    fn map_skeleton_point_to_color(&self, point: SkeletonPoint, target: Resolution) -> ColorPoint {
        self.project_to_color(point, target)
    }
}
