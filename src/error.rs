use std::io;
use std::path::PathBuf;

use nix::errno::Errno;

/// Errors surfaced by `FrameBufferDevice`.
///
/// Failed geometry queries and blanking requests are not in here: those are
/// logged and leave the device's fields untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to open framebuffer device {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("framebuffer device {} is held by another process: {source}", path.display())]
    Busy { path: PathBuf, source: Errno },
    #[error("unable to map framebuffer device {}: {source}", path.display())]
    Map { path: PathBuf, source: io::Error },
    #[error("I/O error on framebuffer: {0}")]
    Io(#[from] io::Error),
    #[error("framebuffer device {} has been closed", .0.display())]
    Closed(PathBuf),
}
