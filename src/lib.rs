//! Direct-manipulation editing engine for a page-flipping scrapbook.
//!
//! The engine is headless. A host (browser shell, native UI, or a test)
//! feeds it pointer and keyboard intents in page-local coordinates, renders
//! from its read API, and hands the returned [`engine::Action`]s to
//! [`services::persistence::PersistenceSync`], which talks to a
//! [`store::PageStore`] in the background.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::EngineCore`]: gestures, selection, deletion, page flips |
//! | [`doc`] | Items, pages, and the in-memory page list |
//! | [`geom`] | Pure rotate/resize/crop math |
//! | [`input`] | Control kinds, gesture snapshot, scoped pointer capture |
//! | [`flip`] | Spread index and page-turn transitions |
//! | [`history`] | Selection and the undo snapshot stack |
//! | [`payload`] | Drop payloads and the media palette |
//! | [`store`] | Page store contract with memory and Postgres backends (migrations in `src/db`) |
//! | [`services`] | Background persistence |
//! | [`config`] | Editor settings from the environment |
//! | [`consts`] | Shared numeric constants (minimum size, defaults, font limits) |

pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod flip;
pub mod geom;
pub mod history;
pub mod input;
pub mod payload;
pub mod services;
pub mod store;
