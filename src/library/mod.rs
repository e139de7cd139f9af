//! Library Module
//!
//! Learning materials (documents, links, videos), the summaries derived from them, and the
//! tags used to group them.
//!
//! Materials and tags are linked many-to-many through the `material_tags` join table. Each
//! side reaches the other with its own join query ([`Library::tags_for_material`],
//! [`Library::materials_for_tag`]); neither row type holds references to the other.
//!
//! # Usage
//!
//! ```rust,ignore
//! use finsight::library;
//!
//! let app = Router::new()
//!     .merge(library::routes())
//!     .with_state(app_state);
//!
//! let conn = db.session()?;
//! let lib = library::Library::new(&conn);
//! let recent = lib.recent_materials(10).await?;
//! ```

mod handler;
mod routes;
mod store;

pub use routes::routes;
pub use store::Library;
