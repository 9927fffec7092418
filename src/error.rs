//! Error types for sierp.
//!
//! The animation core itself cannot fail. These errors cover input
//! validation for the point generator and setting up the window and GPU.

use std::fmt;

/// Errors that can occur while generating the point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorError {
    /// The requested coordinate count is zero or not a multiple of 3.
    InvalidCoordinateCount(usize),
    /// More points were requested than a draw call can address.
    TooManyPoints { requested: usize, max: usize },
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::InvalidCoordinateCount(n) => write!(
                f,
                "Coordinate count must be a positive multiple of 3, got {}",
                n
            ),
            GeneratorError::TooManyPoints { requested, max } => write!(
                f,
                "Requested {} points, at most {} are supported",
                requested, max
            ),
        }
    }
}

impl std::error::Error for GeneratorError {}

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The point cloud does not fit in a single vertex buffer.
    PointBufferTooLarge { points: usize, max_points: usize },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::PointBufferTooLarge { points, max_points } => write!(
                f,
                "{} points exceed the vertex buffer limit of {} points",
                points, max_points
            ),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter | GpuError::PointBufferTooLarge { .. } => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur when running the viewer.
#[derive(Debug)]
pub enum ViewerError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// The point cloud could not be generated.
    Generator(GeneratorError),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            ViewerError::Window(e) => write!(f, "Failed to create window: {}", e),
            ViewerError::Gpu(e) => write!(f, "GPU error: {}", e),
            ViewerError::Generator(e) => write!(f, "Point generation failed: {}", e),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::EventLoop(e) => Some(e),
            ViewerError::Window(e) => Some(e),
            ViewerError::Gpu(e) => Some(e),
            ViewerError::Generator(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for ViewerError {
    fn from(e: winit::error::EventLoopError) -> Self {
        ViewerError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for ViewerError {
    fn from(e: winit::error::OsError) -> Self {
        ViewerError::Window(e)
    }
}

impl From<GpuError> for ViewerError {
    fn from(e: GpuError) -> Self {
        ViewerError::Gpu(e)
    }
}

impl From<GeneratorError> for ViewerError {
    fn from(e: GeneratorError) -> Self {
        ViewerError::Generator(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_generator_error_message() {
        let err = GeneratorError::InvalidCoordinateCount(2048);
        assert!(err.to_string().contains("2048"));
    }

    #[test]
    fn test_viewer_error_wraps_generator_error() {
        let err: ViewerError = GeneratorError::InvalidCoordinateCount(0).into();
        assert!(matches!(err, ViewerError::Generator(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_too_many_points_message() {
        let err = GeneratorError::TooManyPoints {
            requested: 5000,
            max: 4096,
        };
        let msg = err.to_string();
        assert!(msg.contains("5000"));
        assert!(msg.contains("4096"));
    }

    #[test]
    fn test_point_buffer_error_message() {
        let err = GpuError::PointBufferTooLarge {
            points: 30_000_000,
            max_points: 22_369_621,
        };
        assert!(err.to_string().contains("22369621"));
        assert!(err.source().is_none());
    }

    #[test]
    fn test_no_adapter_has_no_source() {
        assert!(GpuError::NoAdapter.source().is_none());
    }
}
