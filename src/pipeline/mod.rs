pub mod background;
pub mod canvas;
pub mod compositor;
pub mod registration;
pub mod scene;
pub mod sensor;
pub mod skeleton;
pub mod synthetic;

// Re-exports for convenience
pub use background::load_background;
pub use compositor::CompositedFrame;
pub use scene::{CompositeMode, SceneConfig, render_scene};
pub use sensor::{
    DEPTH_RESOLUTION, SensorDevice, SensorStream, available_sensors, start_sensor_stream,
};
pub use skeleton::line_sprite;
