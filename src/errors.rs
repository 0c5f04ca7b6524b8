//! Error Types
//!
//! This module defines the error types used throughout the viewer.
//!
//! # Overview
//!
//! The main error type [`ViewerError`] covers all failure modes including:
//! - GPU and window initialization failures
//! - Asset loading and decoding errors
//! - HTTP and network errors
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, ViewerError>`.

use thiserror::Error;

/// The main error type for the viewer.
///
/// Each variant provides specific context about what went wrong. A missing
/// animation clip is deliberately NOT an error: the click interaction
/// degrades to a no-op instead (see `interaction`).
#[derive(Error, Debug)]
pub enum ViewerError {
    // ========================================================================
    // GPU & Window Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create the presentation surface.
    #[error("Failed to create surface: {0}")]
    SurfaceCreateFailed(#[from] wgpu::CreateSurfaceError),

    /// The surface does not support any usable configuration.
    #[error("Surface configuration unsupported by the adapter")]
    SurfaceConfigUnsupported,

    /// Event loop error (winit).
    #[error("Event loop error: {0}")]
    EventLoopError(#[from] winit::error::EventLoopError),

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// HTTP response with a non-success status code.
    #[error("HTTP response error: status {status}")]
    HttpResponseError {
        /// HTTP status code
        status: u16,
    },

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// glTF parsing or decoding error.
    #[error("glTF error: {0}")]
    GltfError(String),

    /// The asset decoded but contains no renderable triangle geometry.
    #[error("Model contains no triangle geometry")]
    NoGeometry,
}

impl From<gltf::Error> for ViewerError {
    fn from(err: gltf::Error) -> Self {
        ViewerError::GltfError(err.to_string())
    }
}

/// Alias for `Result<T, ViewerError>`.
pub type Result<T> = std::result::Result<T, ViewerError>;
