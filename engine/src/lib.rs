//! # Casa Engine
//!
//! Media editing and agenda layout for the Casa real-estate back-office.
//!
//! This crate keeps the in-memory state of a property being edited in step
//! with the hosted store it came from. It owns no network or file handles:
//! remote calls go through the [`MediaRepository`] and [`BlobStore`]
//! traits, so the same logic runs against PostgreSQL in the server and
//! against in-memory fakes in tests.
//!
//! ## Core Concepts
//!
//! ### Media records
//!
//! A [`MediaRecord`] is one image or floorplan attached to a property. It
//! carries a [`MediaId`] that is either server-assigned or a temporary
//! placeholder for drafts that have not been saved yet.
//!
//! ### Gallery
//!
//! The [`Gallery`] is the local mirror of a property's media: ordered
//! collections per [`MediaKind`], plus a log of [`PendingChange`]s waiting
//! on the remote store. The main image and the featured set (at most
//! [`MAX_FEATURED`]) are derived from record flags.
//!
//! ### Reconciliation
//!
//! The [`Reconciler`] applies confirmed [`RemoteOutcome`]s to a gallery and
//! merges full remote listings into it.
//!
//! ### Sessions
//!
//! A [`MediaSession`] drives user actions (upload, remove, main image,
//! featured toggle, reorder, attach on first save) against the remote store
//! and collects user-facing [`Notice`]s.
//!
//! ### Agenda
//!
//! The [`calendar`] module positions agenda events in a Monday-start
//! 08:00-19:00 week grid.
//!
//! ## Quick Start
//!
//! ```rust
//! use casa_engine::{Gallery, MediaId, MediaKind, MediaRecord};
//!
//! let record = MediaRecord {
//!     id: MediaId::Persisted("img-1".to_string()),
//!     url: "https://cdn.example/front.jpg".to_string(),
//!     property_id: Some("prop-1".to_string()),
//!     kind: MediaKind::Image,
//!     sort_order: 1,
//!     is_main: true,
//!     is_featured: false,
//! };
//!
//! let gallery = Gallery::from_records(Some("prop-1".to_string()), vec![record]);
//! assert_eq!(gallery.main_image_url(), Some("https://cdn.example/front.jpg"));
//! assert_eq!(gallery.next_sort_order(MediaKind::Image, Some(4)), 5);
//! ```

pub mod calendar;
pub mod error;
pub mod gallery;
pub mod media;
pub mod notice;
pub mod property;
pub mod reconcile;
pub mod remote;
pub mod session;
pub mod snapshot;
pub mod storage;

// Re-export main types at crate root
pub use calendar::{AgendaEvent, DayColumn, EventPlacement, WeekLayout};
pub use error::{Error, RemoteError};
pub use gallery::{ChangeKind, Gallery, PendingChange, MAX_FEATURED};
pub use media::{MediaId, MediaKind, MediaRecord, NewMedia, UploadFile};
pub use notice::{Notice, NoticeLevel};
pub use property::{Area, NearbyPlace, PropertyFields};
pub use reconcile::{ReconcileResult, Reconciler, RemoteOutcome};
pub use remote::{BlobStore, MediaRepository, RemoteResult};
pub use session::{AttachSummary, FailedUpload, MediaSession, UploadSummary};
pub use snapshot::{GallerySnapshot, SNAPSHOT_FORMAT_VERSION};

/// Type aliases for clarity
pub type PropertyId = String;
pub type SortOrder = i64;
pub type Timestamp = u64;
pub type ChangeId = u64;
