//! `badgeforge-core` — the badge decoration pipeline.
//!
//! One module per pipeline component: C1 [`settings`], C2
//! [`media_client`], C3 [`ratings`], C4 [`anime_map`], C5 [`awards`], C6
//! [`dominant`], C7 [`resolution`], C8 [`image_select`], C9 [`render`],
//! C10 [`compositor`], C11 [`processors`], C12 [`dispatcher`].

pub mod anime_map;
pub mod awards;
pub mod compositor;
pub mod context;
pub mod dispatcher;
pub mod dominant;
pub mod error;
pub mod image_select;
pub mod media_client;
pub mod processors;
pub mod ratings;
pub mod render;
pub mod resolution;
pub mod settings;

pub use context::PipelineContext;
pub use dispatcher::{dispatch, run_bulk, run_single, DispatchOutcome};
pub use error::{CoreError, Result};
