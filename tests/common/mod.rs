use std::fs::File;
use std::io;
use std::os::fd::BorrowedFd;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use memmap2::MmapMut;
use nix::errno::Errno;
use rawfb::fbio::{self, BlankingLevel, DeviceControl, FixScreenInfo, VarScreenInfo};
use simple_logger::SimpleLogger;
use tempfile::NamedTempFile;

#[allow(dead_code)]
pub fn init_logger() {
    let _ = SimpleLogger::new()
        .with_level(log::LevelFilter::Trace)
        .init();
}

/// A regular file of `len` bytes, every byte set to `fill`, standing in for `/dev/fbN`.
#[allow(dead_code)]
pub fn backing_file(len: usize, fill: u8) -> NamedTempFile {
    let tmp_file = tempfile::Builder::new()
        .prefix("rawfbTest")
        .tempfile()
        .expect("Unable to make temporary file");
    std::fs::write(tmp_file.path(), vec![fill; len]).expect("Unable to fill temporary file");
    tmp_file
}

#[allow(dead_code)]
pub fn fixed_info(id: &str) -> FixScreenInfo {
    let mut info = FixScreenInfo::default();
    info.id[..id.len()].copy_from_slice(id.as_bytes());
    info.smem_start = 0x3c10_0000;
    info.smem_len = 0x0040_0000;
    info
}

#[allow(dead_code)]
pub fn variable_info(xres: u32, yres: u32, bits_per_pixel: u32) -> VarScreenInfo {
    VarScreenInfo {
        xres,
        yres,
        xres_virtual: xres,
        yres_virtual: yres,
        bits_per_pixel,
        ..Default::default()
    }
}

struct Script {
    fixed: Mutex<Result<FixScreenInfo, Errno>>,
    variable: Mutex<Result<VarScreenInfo, Errno>>,
    blank_result: Mutex<Result<(), Errno>>,
    fail_map: Mutex<bool>,
    blanking: Mutex<Vec<BlankingLevel>>,
    map_calls: AtomicUsize,
}

/// Answers device-control requests from canned results and records what it was asked.
#[derive(Clone)]
pub struct ScriptedControl {
    script: Arc<Script>,
}

impl ScriptedControl {
    pub fn new(fixed: Result<FixScreenInfo, Errno>, variable: Result<VarScreenInfo, Errno>) -> Self {
        ScriptedControl {
            script: Arc::new(Script {
                fixed: Mutex::new(fixed),
                variable: Mutex::new(variable),
                blank_result: Mutex::new(Ok(())),
                fail_map: Mutex::new(false),
                blanking: Mutex::new(Vec::new()),
                map_calls: AtomicUsize::new(0),
            }),
        }
    }

    pub fn set_fixed(&self, fixed: Result<FixScreenInfo, Errno>) {
        *self.script.fixed.lock().unwrap() = fixed;
    }

    pub fn set_variable(&self, variable: Result<VarScreenInfo, Errno>) {
        *self.script.variable.lock().unwrap() = variable;
    }

    pub fn set_blank_result(&self, result: Result<(), Errno>) {
        *self.script.blank_result.lock().unwrap() = result;
    }

    pub fn fail_map(&self) {
        *self.script.fail_map.lock().unwrap() = true;
    }

    pub fn blanking(&self) -> Vec<BlankingLevel> {
        self.script.blanking.lock().unwrap().clone()
    }

    pub fn map_calls(&self) -> usize {
        self.script.map_calls.load(Ordering::SeqCst)
    }
}

impl DeviceControl for ScriptedControl {
    fn fixed_screen_info(&self, _fd: BorrowedFd<'_>) -> nix::Result<FixScreenInfo> {
        *self.script.fixed.lock().unwrap()
    }

    fn variable_screen_info(&self, _fd: BorrowedFd<'_>) -> nix::Result<VarScreenInfo> {
        *self.script.variable.lock().unwrap()
    }

    fn set_blanking(&self, _fd: BorrowedFd<'_>, level: BlankingLevel) -> nix::Result<()> {
        self.script.blanking.lock().unwrap().push(level);
        *self.script.blank_result.lock().unwrap()
    }

    fn map_frame(&self, file: &File, len: usize) -> io::Result<MmapMut> {
        self.script.map_calls.fetch_add(1, Ordering::SeqCst);
        if *self.script.fail_map.lock().unwrap() {
            return Err(io::Error::new(io::ErrorKind::Other, "mmap refused"));
        }
        fbio::map_frame(file, len)
    }
}
