//! Image I/O and compositing.
//!
//! | Operation | Where |
//! |---|---|
//! | **Load layer** | [`ImageBackend::load`] → `image::ImageReader` |
//! | **Composite** | [`blend::composite`] (source-over, rayon rows) |
//! | **Save** | [`ImageBackend::save`] → PNG |
//!
//! The module is split into:
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Blend**: pure pixel math, no I/O (unit testable)

pub mod backend;
pub mod blend;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use blend::{BlendError, CompositeImage, composite};
pub use rust_backend::RustBackend;
