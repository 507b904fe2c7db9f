//! Table events and render observers
//!
//! Tables record what happened to them as [`events::TableEvent`]s and
//! notify [`dispatcher::RenderObserver`]s after each render.

pub mod dispatcher;
pub mod events;
