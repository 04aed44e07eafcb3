use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("no depth sensors detected")]
    NoSensor,
    #[error("sensor initialisation failed: {0}")]
    Init(String),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("{kind} buffer has {actual} entries, expected {expected}")]
    BufferSize {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}
