//! Linux framebuffer device-control protocol.
//!
//! Mirrors the parts of `<linux/fb.h>` the device object talks to: the fixed
//! and variable screen info queries, and the blanking control. Every call
//! returns a `nix::Result`, so the errno of a failed request is carried with
//! the result instead of being read back from global state afterwards.
//!
//! See <https://www.kernel.org/doc/Documentation/fb/api.txt>.

use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd};

use memmap2::{MmapMut, MmapOptions};
use nix::libc::{c_int, c_ulong};

pub const FBIOGET_VSCREENINFO: c_ulong = 0x4600;
pub const FBIOGET_FSCREENINFO: c_ulong = 0x4602;
pub const FBIOBLANK: c_ulong = 0x4611;

mod ioctl {
    use super::{FixScreenInfo, VarScreenInfo};

    nix::ioctl_read_bad!(fbioget_vscreeninfo, super::FBIOGET_VSCREENINFO, VarScreenInfo);
    nix::ioctl_read_bad!(fbioget_fscreeninfo, super::FBIOGET_FSCREENINFO, FixScreenInfo);
    nix::ioctl_write_int_bad!(fbioblank, super::FBIOBLANK);
}

/// `struct fb_fix_screeninfo`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixScreenInfo {
    pub id: [u8; 16],
    pub smem_start: c_ulong,
    pub smem_len: u32,
    pub type_: u32,
    pub type_aux: u32,
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    pub line_length: u32,
    pub mmio_start: c_ulong,
    pub mmio_len: u32,
    pub accel: u32,
    pub capabilities: u16,
    pub reserved: [u16; 2],
}

/// `struct fb_bitfield`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bitfield {
    pub offset: u32,
    pub length: u32,
    pub msb_right: u32,
}

/// `struct fb_var_screeninfo`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VarScreenInfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: Bitfield,
    pub green: Bitfield,
    pub blue: Bitfield,
    pub transp: Bitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

/// Power state passed to `FBIOBLANK` (`FB_BLANK_*`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum BlankingLevel {
    Unblank = 0,
    Normal = 1,
    VsyncSuspend = 2,
    HsyncSuspend = 3,
    Powerdown = 4,
}

impl BlankingLevel {
    pub fn as_raw(self) -> c_int {
        self as c_int
    }
}

/// Decodes the 16 byte `id` field of the fixed screen info.
///
/// Drivers pad the name with NULs, and some leave trailing whitespace or
/// line endings in it, all of which are trimmed from the end.
pub fn decode_identifier(id: &[u8; 16]) -> String {
    String::from_utf8_lossy(id)
        .trim_end_matches(['\r', '\n', ' ', '\0'])
        .to_owned()
}

/// Maps `len` bytes of `file`, starting at offset 0, for writing.
pub fn map_frame(file: &File, len: usize) -> io::Result<MmapMut> {
    // Safety: the mapping is owned by the device object and dropped before
    // the file it was created from.
    unsafe { MmapOptions::new().len(len).map_mut(file) }
}

/// The device-control requests issued against an open framebuffer handle.
pub trait DeviceControl: Send + Sync {
    fn fixed_screen_info(&self, fd: BorrowedFd<'_>) -> nix::Result<FixScreenInfo>;

    fn variable_screen_info(&self, fd: BorrowedFd<'_>) -> nix::Result<VarScreenInfo>;

    fn set_blanking(&self, fd: BorrowedFd<'_>, level: BlankingLevel) -> nix::Result<()>;

    /// Creates the memory mapping over the display memory.
    fn map_frame(&self, file: &File, len: usize) -> io::Result<MmapMut> {
        map_frame(file, len)
    }
}

/// Issues the requests as real `ioctl(2)` calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ioctl;

impl DeviceControl for Ioctl {
    fn fixed_screen_info(&self, fd: BorrowedFd<'_>) -> nix::Result<FixScreenInfo> {
        let mut info = FixScreenInfo::default();
        unsafe { ioctl::fbioget_fscreeninfo(fd.as_raw_fd(), &mut info) }?;
        Ok(info)
    }

    fn variable_screen_info(&self, fd: BorrowedFd<'_>) -> nix::Result<VarScreenInfo> {
        let mut info = VarScreenInfo::default();
        unsafe { ioctl::fbioget_vscreeninfo(fd.as_raw_fd(), &mut info) }?;
        Ok(info)
    }

    fn set_blanking(&self, fd: BorrowedFd<'_>, level: BlankingLevel) -> nix::Result<()> {
        unsafe { ioctl::fbioblank(fd.as_raw_fd(), level.as_raw()) }?;
        Ok(())
    }
}
