//! Version-control system support.
//!
//! - **Registry**: the fixed, ordered table of supported systems (Git,
//!   Mercurial, Subversion, Bazaar) with their markers and argument templates
//! - **Detection**: which system manages a package directory

mod detect;
pub mod registry;

pub use detect::{Detection, MarkerError, detect};
pub use registry::{MarkerKind, VCS_LIST, VcsInfo};
