//! Service modules for the kanban board.
//!
//! - [`blob_store`] - object storage backends for uploaded images
//! - [`image`] - task image upload, listing and removal

pub mod blob_store;
pub mod image;
