use crate::errors::ShmError;
use std::ffi::CString;
use std::io;
use std::mem::{MaybeUninit, size_of};
use std::ptr;
use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::System::Memory::{
    CreateFileMappingA, FILE_MAP_ALL_ACCESS, MEMORY_BASIC_INFORMATION,
    MEMORY_MAPPED_VIEW_ADDRESS, MapViewOfFile, OpenFileMappingA, PAGE_READWRITE,
    UnmapViewOfFile, VirtualQuery,
};

/// A pagefile-backed file mapping and its view.
///
/// The kernel object lives as long as any handle to it is open, so there is
/// no separate unlink step on Windows.
pub(crate) struct Mapping {
    handle: HANDLE,
    view: MEMORY_MAPPED_VIEW_ADDRESS,
    len: usize,
}

// The view is plain memory owned by this process; handles are process-wide
unsafe impl Send for Mapping {}

impl Mapping {
    pub fn as_ptr(&self) -> *const u8 {
        self.view.Value as *const u8
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.view.Value as *mut u8
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        unsafe {
            UnmapViewOfFile(self.view);
            CloseHandle(self.handle);
        }
    }
}

pub(crate) fn create(name: &str, size: usize) -> Result<Mapping, ShmError> {
    let c_name = c_name(name)?;
    let size64 = size as u64;

    // Pagefile-backed mappings are zero-initialized by the kernel
    let handle = unsafe {
        CreateFileMappingA(
            INVALID_HANDLE_VALUE,
            ptr::null(),
            PAGE_READWRITE,
            (size64 >> 32) as u32,
            (size64 & 0xFFFF_FFFF) as u32,
            c_name.as_ptr() as *const u8,
        )
    };
    if handle.is_null() {
        return Err(ShmError::CreationFailed {
            name: name.to_string(),
            source: io::Error::last_os_error(),
        });
    }

    map_view(handle, size).map_err(|source| ShmError::MappingFailed {
        name: name.to_string(),
        source,
    })
}

pub(crate) fn open(name: &str, size_hint: usize) -> Result<Mapping, ShmError> {
    let c_name = c_name(name)?;

    let handle = unsafe { OpenFileMappingA(FILE_MAP_ALL_ACCESS, 0, c_name.as_ptr() as *const u8) };
    if handle.is_null() {
        return Err(ShmError::OpenFailed {
            name: name.to_string(),
            source: io::Error::last_os_error(),
        });
    }

    map_view(handle, size_hint).map_err(|source| ShmError::MappingFailed {
        name: name.to_string(),
        source,
    })
}

/// Named mappings disappear with their last handle; nothing to remove.
pub(crate) fn unlink(_name: &str) -> bool {
    false
}

/// Map `len` bytes of `handle`, or the whole object when `len` is 0.
///
/// Takes ownership of `handle` and closes it on failure.
fn map_view(handle: HANDLE, len: usize) -> io::Result<Mapping> {
    let view = unsafe { MapViewOfFile(handle, FILE_MAP_ALL_ACCESS, 0, 0, len) };
    if view.Value.is_null() {
        let err = io::Error::last_os_error();
        unsafe { CloseHandle(handle) };
        return Err(err);
    }

    let len = if len == 0 {
        match region_size(view) {
            Ok(size) => size,
            Err(err) => {
                unsafe {
                    UnmapViewOfFile(view);
                    CloseHandle(handle);
                }
                return Err(err);
            }
        }
    } else {
        len
    };

    Ok(Mapping { handle, view, len })
}

/// Size of a whole-object view, rounded up to the page size by the kernel.
fn region_size(view: MEMORY_MAPPED_VIEW_ADDRESS) -> io::Result<usize> {
    let mut info = MaybeUninit::<MEMORY_BASIC_INFORMATION>::zeroed();
    let written = unsafe {
        VirtualQuery(
            view.Value,
            info.as_mut_ptr(),
            size_of::<MEMORY_BASIC_INFORMATION>(),
        )
    };
    if written == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { info.assume_init() }.RegionSize)
}

fn c_name(name: &str) -> Result<CString, ShmError> {
    CString::new(name).map_err(|_| ShmError::InvalidName {
        name: name.to_string(),
        reason: "name contains a NUL byte",
    })
}
