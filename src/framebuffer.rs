use std::fs::{File, OpenOptions};
use std::io::{Cursor, Seek, SeekFrom, Write};
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use memmap2::MmapMut;
use nix::fcntl::{Flock, FlockArg};

use crate::error::Error;
use crate::fbio::{self, BlankingLevel, DeviceControl, Ioctl};

pub const DEFAULT_DISPLAY_DEVICE: &str = "/dev/fb0";

/// The device file and the view mapped over its display memory.
///
/// `view` is `None` when the frame size was zero at mapping time.
struct FrameMapping {
    file: File,
    view: Option<MmapMut>,
}

impl FrameMapping {
    fn len(&self) -> usize {
        self.view.as_ref().map_or(0, |view| view.len())
    }

    /// Overwrites the start of the frame with as much of `frame` as fits.
    fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<usize> {
        let view = match self.view.as_mut() {
            Some(view) => view,
            None => return Ok(0),
        };
        let len = frame.len().min(view.len());

        let mut cursor = Cursor::new(&mut view[..]);
        cursor.seek(SeekFrom::Start(0))?;
        log::trace!(
            "Writing to FB - Stream pos: {} Length: {} Buffer Size: {} Writing len: {}",
            cursor.position(),
            cursor.get_ref().len(),
            frame.len(),
            len
        );
        cursor.write_all(&frame[..len])?;

        view.flush()?;
        Ok(len)
    }

    /// Drops the view first, then the handle it was mapped from.
    fn release(mut self) {
        drop(self.view.take());
        drop(self.file);
    }
}

enum MappingState {
    Unopened,
    Open(FrameMapping),
    Closed,
}

/// Raw access to a Linux framebuffer device such as `/dev/fb0`.
///
/// Geometry is read from the device with [`refresh_device_info`], either at
/// construction (autoprobe) or later. The display memory is mapped on the
/// first write, clear or blank, sized `width * height * depth / 8` from the
/// geometry known at that moment, and is kept until the device is closed or
/// dropped.
///
/// The device can be shared between threads. Creating the mapping is
/// serialized, so only one mapping is ever made for a device object.
///
/// [`refresh_device_info`]: FrameBufferDevice::refresh_device_info
pub struct FrameBufferDevice<C: DeviceControl = Ioctl> {
    device: PathBuf,
    id: Option<String>,
    pixel_width: u32,
    pixel_height: u32,
    pixel_depth: u32,
    control: C,
    mapping: Mutex<MappingState>,
}

impl FrameBufferDevice<Ioctl> {
    pub fn new(device: impl AsRef<Path>, autoprobe: bool) -> Result<Self, Error> {
        Self::with_control(device, autoprobe, Ioctl)
    }

    /// Opens `/dev/fb0` and probes it.
    pub fn open_default() -> Result<Self, Error> {
        Self::new(DEFAULT_DISPLAY_DEVICE, true)
    }
}

impl<C: DeviceControl> FrameBufferDevice<C> {
    /// Creates the device object with a custom device-control implementation.
    ///
    /// Fails only when `autoprobe` is set and the device cannot be opened.
    pub fn with_control(
        device: impl AsRef<Path>,
        autoprobe: bool,
        control: C,
    ) -> Result<Self, Error> {
        let mut fb = FrameBufferDevice {
            device: device.as_ref().to_path_buf(),
            id: None,
            pixel_width: 0,
            pixel_height: 0,
            pixel_depth: 0,
            control,
            mapping: Mutex::new(MappingState::Unopened),
        };

        if autoprobe {
            fb.refresh_device_info()?;
        }

        Ok(fb)
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    /// Name reported by the driver, if the fixed screen info could be read.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    /// Bits per pixel.
    pub fn pixel_depth(&self) -> u32 {
        self.pixel_depth
    }

    pub fn bytes_per_pixel(&self) -> usize {
        (self.pixel_depth / 8) as usize
    }

    /// Size in bytes of one full frame for the current geometry.
    pub fn frame_size(&self) -> usize {
        self.pixel_width as usize * self.pixel_height as usize * self.bytes_per_pixel()
    }

    /// Whether the mapping has been set up and not yet closed.
    ///
    /// A device with a zero frame size counts as mapped once written to,
    /// with an empty view and no OS mapping behind it.
    pub fn is_mapped(&self) -> bool {
        matches!(*self.lock_mapping(), MappingState::Open(_))
    }

    /// Reads the identifier and geometry from the device.
    ///
    /// The device is opened exclusively for the duration of the call. The
    /// two queries are independent: a failure of either is logged and leaves
    /// its fields as they were, while the other still runs. Only failing to
    /// open the device is returned as an error.
    pub fn refresh_device_info(&mut self) -> Result<(), Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.device)
            .map_err(|source| Error::Open {
                path: self.device.clone(),
                source,
            })?;
        let handle = Flock::lock(file, FlockArg::LockExclusiveNonblock).map_err(
            |(_, source)| Error::Busy {
                path: self.device.clone(),
                source,
            },
        )?;

        match self.control.fixed_screen_info(handle.as_fd()) {
            Ok(fixed_info) => {
                let id = fbio::decode_identifier(&fixed_info.id);
                log::debug!(
                    "Display memory for {} starts at: {:#x} length: {}",
                    id,
                    fixed_info.smem_start,
                    fixed_info.smem_len
                );
                self.id = Some(id);
            }
            Err(errno) => log::error!(
                "Probe of {} ioctl({:#x}) error: {}",
                self.device.display(),
                fbio::FBIOGET_FSCREENINFO,
                errno
            ),
        }

        match self.control.variable_screen_info(handle.as_fd()) {
            Ok(variable_info) => {
                log::debug!(
                    "Actual width => {} height => {} bpp => {}",
                    variable_info.xres,
                    variable_info.yres,
                    variable_info.bits_per_pixel
                );
                self.pixel_width = variable_info.xres;
                self.pixel_height = variable_info.yres;
                self.pixel_depth = variable_info.bits_per_pixel;
            }
            Err(errno) => log::error!(
                "Probe of {} ioctl({:#x}) error: {}",
                self.device.display(),
                fbio::FBIOGET_VSCREENINFO,
                errno
            ),
        }

        Ok(())
    }

    /// Writes a zeroed frame.
    pub fn clear(&self) -> Result<usize, Error> {
        self.write_raw(&vec![0; self.frame_size()])
    }

    /// Copies `frame` to the start of display memory.
    ///
    /// Input longer than the mapping is truncated, shorter input leaves the
    /// rest of the display untouched. Returns the number of bytes written.
    pub fn write_raw(&self, frame: &[u8]) -> Result<usize, Error> {
        self.with_mapping(|mapping| Ok(mapping.write_frame(frame)?))
    }

    /// Powers the display down.
    pub fn blank(&self) -> Result<(), Error> {
        self.set_blanking(BlankingLevel::Powerdown)
    }

    pub fn unblank(&self) -> Result<(), Error> {
        self.set_blanking(BlankingLevel::Unblank)
    }

    /// Issues `FBIOBLANK` on the mapped device. A rejected request is only
    /// logged; the error return is for a failure to create the mapping.
    pub fn set_blanking(&self, level: BlankingLevel) -> Result<(), Error> {
        self.with_mapping(|mapping| {
            if let Err(errno) = self.control.set_blanking(mapping.file.as_fd(), level) {
                log::error!(
                    "Blanking ioctl({:#x}) arg({}) error: {}",
                    fbio::FBIOBLANK,
                    level.as_raw(),
                    errno
                );
            }
            Ok(())
        })
    }

    /// Unmaps display memory and closes the device handle.
    ///
    /// Safe to call more than once, and from several threads; only the first
    /// call releases anything. Later writes fail with [`Error::Closed`].
    pub fn close(&self) {
        let previous = std::mem::replace(&mut *self.lock_mapping(), MappingState::Closed);
        if let MappingState::Open(mapping) = previous {
            log::debug!("Releasing framebuffer mapping for {}", self.device.display());
            mapping.release();
        }
    }

    fn lock_mapping(&self) -> MutexGuard<'_, MappingState> {
        self.mapping.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the mapping, creating it first if this is its first use.
    fn with_mapping<T>(
        &self,
        f: impl FnOnce(&mut FrameMapping) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut state = self.lock_mapping();

        if let MappingState::Unopened = *state {
            match self.open_mapping() {
                Ok(mapping) => *state = MappingState::Open(mapping),
                Err(e) => {
                    log::error!("Unable to ensure framebuffer mapping: {}", e);
                    return Err(e);
                }
            }
        }

        match &mut *state {
            MappingState::Open(mapping) => f(mapping),
            MappingState::Closed | MappingState::Unopened => {
                Err(Error::Closed(self.device.clone()))
            }
        }
    }

    fn open_mapping(&self) -> Result<FrameMapping, Error> {
        let map_error = |source| Error::Map {
            path: self.device.clone(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.device)
            .map_err(map_error)?;

        let len = self.frame_size();
        let view = match len {
            0 => None,
            len => Some(self.control.map_frame(&file, len).map_err(map_error)?),
        };

        let mapping = FrameMapping { file, view };
        log::debug!(
            "Mapped {} bytes of {}",
            mapping.len(),
            self.device.display()
        );
        Ok(mapping)
    }
}

impl<C: DeviceControl> Drop for FrameBufferDevice<C> {
    fn drop(&mut self) {
        self.close();
    }
}
