use crate::errors::ShmError;
use memmap2::{MmapMut, MmapOptions};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::mman::{shm_open, shm_unlink};
use nix::sys::stat::Mode;
use std::fs::File;
use std::io;

pub(crate) struct Mapping {
    mmap: MmapMut,
}

impl Mapping {
    pub fn as_ptr(&self) -> *const u8 {
        self.mmap.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mmap.as_mut_ptr()
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }
}

/// Create `name` with `size` zero-filled bytes and map it read/write.
///
/// A stale object with the same name is unlinked first. macOS also refuses to
/// `ftruncate` an existing object, so this must happen before resizing.
pub(crate) fn create(name: &str, size: usize) -> Result<Mapping, ShmError> {
    if unlink(name) {
        tracing::debug!(name, "Removed stale shared memory before creation");
    }

    let fd = shm_open(
        name,
        OFlag::O_CREAT | OFlag::O_RDWR,
        Mode::from_bits_truncate(0o666),
    )
    .map_err(|errno| ShmError::CreationFailed {
        name: name.to_string(),
        source: errno.into(),
    })?;
    let file = File::from(fd);

    // ftruncate zero-fills the new object
    if let Err(source) = file.set_len(size as u64) {
        unlink(name);
        return Err(ShmError::TruncateFailed {
            name: name.to_string(),
            size,
            source,
        });
    }

    map(&file, size).map_err(|source| {
        unlink(name);
        ShmError::MappingFailed {
            name: name.to_string(),
            source,
        }
    })
}

/// Attach to an existing object. A `size_hint` of 0 maps the whole object.
pub(crate) fn open(name: &str, size_hint: usize) -> Result<Mapping, ShmError> {
    let fd = shm_open(name, OFlag::O_RDWR, Mode::empty()).map_err(|errno| {
        ShmError::OpenFailed {
            name: name.to_string(),
            source: errno.into(),
        }
    })?;
    let file = File::from(fd);

    let actual = file
        .metadata()
        .map_err(|source| ShmError::OpenFailed {
            name: name.to_string(),
            source,
        })?
        .len() as usize;

    let size = if size_hint == 0 { actual } else { size_hint };

    // Touching pages past the end of the object raises SIGBUS
    if size > actual {
        return Err(ShmError::MappingFailed {
            name: name.to_string(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("requested {size} bytes but the object holds {actual}"),
            ),
        });
    }

    map(&file, size).map_err(|source| ShmError::MappingFailed {
        name: name.to_string(),
        source,
    })
}

/// Remove `name` from the namespace. Returns true if an object was removed.
pub(crate) fn unlink(name: &str) -> bool {
    match shm_unlink(name) {
        Ok(()) => true,
        Err(Errno::ENOENT) => false,
        Err(errno) => {
            tracing::warn!(name, "shm_unlink failed: {}", errno);
            false
        }
    }
}

fn map(file: &File, size: usize) -> io::Result<Mapping> {
    // Both sides map read/write: the consumer publishes its own cursor
    let mmap = unsafe { MmapOptions::new().len(size).map_mut(file)? };
    Ok(Mapping { mmap })
}
