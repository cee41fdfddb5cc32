//! Static table of supported version-control systems.
//!
//! Adding a VCS is a data-only change: a new [`VcsInfo`] entry in
//! [`VCS_LIST`]. Order matters only as the tie-break when several markers
//! are present in one tree.

/// Placeholder token in argument templates, replaced by the revision.
pub const REV_PLACEHOLDER: &str = "{rev}";

/// What kind of filesystem entry a marker must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Dir,
    /// Directory, or a file pointing elsewhere (git worktrees, submodules).
    DirOrFile,
}

#[derive(Debug, PartialEq, Eq)]
pub struct VcsInfo {
    /// Display name (e.g. "Mercurial")
    pub name: &'static str,
    /// Executable looked up on PATH
    pub tool: &'static str,
    /// Marker path relative to the package root
    pub marker: &'static str,
    pub marker_kind: MarkerKind,
    /// Arguments that move the working tree to a revision
    pub checkout: &'static [&'static str],
    /// Arguments that print the currently checked-out revision
    pub current: &'static [&'static str],
}

pub static GIT: VcsInfo = VcsInfo {
    name: "Git",
    tool: "git",
    marker: ".git",
    marker_kind: MarkerKind::DirOrFile,
    checkout: &["checkout", REV_PLACEHOLDER],
    current: &["rev-parse", "HEAD"],
};

pub static MERCURIAL: VcsInfo = VcsInfo {
    name: "Mercurial",
    tool: "hg",
    marker: ".hg",
    marker_kind: MarkerKind::Dir,
    checkout: &["update", "-C", "-r", REV_PLACEHOLDER],
    current: &["identify", "-i"],
};

pub static SUBVERSION: VcsInfo = VcsInfo {
    name: "Subversion",
    tool: "svn",
    marker: ".svn",
    marker_kind: MarkerKind::Dir,
    checkout: &["update", "-r", REV_PLACEHOLDER],
    current: &["info", "--show-item", "revision"],
};

pub static BAZAAR: VcsInfo = VcsInfo {
    name: "Bazaar",
    tool: "bzr",
    marker: ".bzr",
    marker_kind: MarkerKind::Dir,
    checkout: &["pull", "--overwrite", "-r", REV_PLACEHOLDER],
    current: &["revno"],
};

/// Every supported VCS, in detection priority order.
pub static VCS_LIST: [&VcsInfo; 4] = [&GIT, &MERCURIAL, &SUBVERSION, &BAZAAR];

impl VcsInfo {
    /// Checkout arguments for `rev`. The revision always stays a single
    /// argument, even when it contains whitespace.
    pub fn checkout_args(&self, rev: &str) -> Vec<String> {
        self.checkout
            .iter()
            .map(|arg| {
                if *arg == REV_PLACEHOLDER {
                    rev.to_string()
                } else {
                    arg.to_string()
                }
            })
            .collect()
    }

    pub fn current_args(&self) -> Vec<String> {
        self.current.iter().map(|arg| arg.to_string()).collect()
    }
}
