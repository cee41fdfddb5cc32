use super::registry::{MarkerKind, VCS_LIST, VcsInfo};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A marker that could not be inspected.
#[derive(Debug)]
pub struct MarkerError {
    pub marker: &'static str,
    pub path: PathBuf,
    pub source: io::Error,
}

/// Outcome of scanning one package directory.
#[derive(Debug, Default)]
pub struct Detection {
    pub vcs: Option<&'static VcsInfo>,
    /// Stat failures other than "not found", in scan order. The scan skips
    /// past these and keeps looking.
    pub errors: Vec<MarkerError>,
}

/// Find which VCS manages `dir`, honouring the registry's priority order.
pub fn detect(dir: &Path) -> Detection {
    let mut detection = Detection::default();

    for vcs in VCS_LIST {
        let path = dir.join(vcs.marker);
        match marker_present(&path, vcs.marker_kind) {
            Ok(true) => {
                detection.vcs = Some(vcs);
                break;
            }
            Ok(false) => {}
            Err(source) => detection.errors.push(MarkerError {
                marker: vcs.marker,
                path,
                source,
            }),
        }
    }

    detection
}

fn marker_present(path: &Path, kind: MarkerKind) -> io::Result<bool> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    Ok(match kind {
        MarkerKind::Dir => meta.is_dir(),
        MarkerKind::DirOrFile => meta.is_dir() || meta.is_file(),
    })
}
