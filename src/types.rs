use crate::error::FrameError;

/// Straight-alpha RGBA color.
pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [255, 255, 255, 255];

/// Player index bits packed into the low end of every depth value.
pub const PLAYER_INDEX_MASK: u16 = 0x07;
pub const PLAYER_INDEX_BITS: u16 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Raw color image as delivered by the sensor: blue, green, red, unused.
#[derive(Clone, Debug)]
pub struct ColorFrame {
    width: u32,
    height: u32,
    bgrx: Vec<u8>,
}

impl ColorFrame {
    pub fn new(width: u32, height: u32, bgrx: Vec<u8>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * 4;
        if bgrx.len() != expected {
            return Err(FrameError::BufferSize {
                kind: "color",
                expected,
                actual: bgrx.len(),
            });
        }
        Ok(Self {
            width,
            height,
            bgrx,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bgrx(&self) -> &[u8] {
        &self.bgrx
    }
}

/// Depth image; every value carries the player index in its low three bits.
#[derive(Clone, Debug)]
pub struct DepthFrame {
    width: u32,
    height: u32,
    data: Vec<u16>,
}

impl DepthFrame {
    pub fn new(width: u32, height: u32, data: Vec<u16>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                kind: "depth",
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }
}

/// Packs a distance and a player slot into one depth value.
pub fn pack_depth(millimeters: u16, player: u8) -> u16 {
    (millimeters << PLAYER_INDEX_BITS) | (player as u16 & PLAYER_INDEX_MASK)
}

pub fn player_index(raw: u16) -> u8 {
    (raw & PLAYER_INDEX_MASK) as u8
}

pub fn depth_millimeters(raw: u16) -> u16 {
    raw >> PLAYER_INDEX_BITS
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackingState {
    #[default]
    NotTracked,
    PositionOnly,
    Tracked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JointType {
    HipCenter,
    Spine,
    ShoulderCenter,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
}

impl JointType {
    pub const COUNT: usize = 20;

    pub const ALL: [JointType; JointType::COUNT] = [
        JointType::HipCenter,
        JointType::Spine,
        JointType::ShoulderCenter,
        JointType::Head,
        JointType::ShoulderLeft,
        JointType::ElbowLeft,
        JointType::WristLeft,
        JointType::HandLeft,
        JointType::ShoulderRight,
        JointType::ElbowRight,
        JointType::WristRight,
        JointType::HandRight,
        JointType::HipLeft,
        JointType::KneeLeft,
        JointType::AnkleLeft,
        JointType::FootLeft,
        JointType::HipRight,
        JointType::KneeRight,
        JointType::AnkleRight,
        JointType::FootRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Position in sensor space, meters. Y points up, Z away from the sensor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SkeletonPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl SkeletonPoint {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Pixel coordinates in the color image. May fall outside the image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorPoint {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Joint {
    pub position: SkeletonPoint,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Skeleton {
    pub tracking_state: TrackingState,
    joints: [Joint; JointType::COUNT],
}

impl Skeleton {
    pub fn untracked() -> Self {
        Self::default()
    }

    pub fn with_joints(tracking_state: TrackingState, joints: [Joint; JointType::COUNT]) -> Self {
        Self {
            tracking_state,
            joints,
        }
    }

    pub fn joint(&self, kind: JointType) -> &Joint {
        &self.joints[kind.index()]
    }

    pub fn is_tracked(&self) -> bool {
        self.tracking_state == TrackingState::Tracked
    }
}

/// Everything the sensor delivered for one tick. Any sub-frame may be missing.
#[derive(Clone, Debug, Default)]
pub struct FrameSet {
    pub color: Option<ColorFrame>,
    pub depth: Option<DepthFrame>,
    pub skeletons: Option<Vec<Skeleton>>,
}

/// Decoded RGBA image, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgba>,
}

impl ColorImage {
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels.into_iter().flatten().collect()
    }
}
