//! Named shared memory segments.
//!
//! A [`Segment`] owns one mapping of a named, OS-provided memory object. The
//! producer side creates and sizes the object; the consumer side opens it,
//! optionally discovering the size from the OS. Dropping a segment unmaps it.
//! The name itself is only removed by [`Segment::destroy`], by
//! [`Segment::remove`], or on drop when the creator asked for
//! [`Segment::unlink_on_drop`].

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use unix as platform;
#[cfg(windows)]
use windows as platform;

use crate::errors::ShmError;
use crate::naming;

pub struct Segment {
    name: String,
    mapping: Option<platform::Mapping>,
    owner: bool,
    unlink_on_drop: bool,
    unlinked: bool,
}

impl Segment {
    /// Create a new segment of at least `size` bytes and map it read/write.
    ///
    /// Any stale object with the same name is removed first, so creating
    /// twice with the same name yields a fresh, zeroed segment.
    pub fn create(name: &str, size: usize) -> Result<Self, ShmError> {
        let name = naming::normalize(name)?;
        let mapping = platform::create(&name, size)?;

        tracing::debug!(name = %name, size = mapping.len(), "Shared memory segment created");

        Ok(Self {
            name,
            mapping: Some(mapping),
            owner: true,
            unlink_on_drop: false,
            unlinked: false,
        })
    }

    /// Attach to an existing segment.
    ///
    /// With `size_hint == 0` the size is discovered from the OS; otherwise
    /// exactly `size_hint` bytes are mapped.
    pub fn open(name: &str, size_hint: usize) -> Result<Self, ShmError> {
        let name = naming::normalize(name)?;
        let mapping = platform::open(&name, size_hint)?;

        tracing::debug!(name = %name, size = mapping.len(), "Shared memory segment opened");

        Ok(Self {
            name,
            mapping: Some(mapping),
            owner: false,
            unlink_on_drop: false,
            unlinked: false,
        })
    }

    /// Remove `name` from the namespace without attaching to it.
    ///
    /// Idempotent: removing a name that does not exist is a no-op.
    pub fn remove(name: &str) {
        match naming::normalize(name) {
            Ok(name) => {
                if platform::unlink(&name) {
                    tracing::debug!(name = %name, "Shared memory segment removed");
                }
            }
            Err(e) => tracing::debug!("Nothing to remove: {}", e),
        }
    }

    /// Unlink the name when this handle is dropped. Only honoured by the creator.
    pub fn unlink_on_drop(mut self, enabled: bool) -> Self {
        self.unlink_on_drop = enabled;
        self
    }

    /// Remove the name from the namespace.
    ///
    /// Existing mappings, including this one, stay valid; later `open` calls
    /// fail. Calling it more than once is a no-op.
    pub fn destroy(&mut self) {
        if self.unlinked {
            return;
        }
        self.unlinked = true;
        if platform::unlink(&self.name) {
            tracing::info!(name = %self.name, "Shared memory segment destroyed");
        }
    }

    /// Unmap the segment. The handle is invalid afterwards.
    pub fn close(&mut self) {
        if self.mapping.take().is_none() {
            return;
        }
        if self.owner && self.unlink_on_drop {
            self.destroy();
        }
    }

    /// The mapped bytes. Empty once the segment is closed.
    pub fn data(&self) -> &[u8] {
        match &self.mapping {
            Some(mapping) => unsafe { std::slice::from_raw_parts(mapping.as_ptr(), mapping.len()) },
            None => &[],
        }
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        match &mut self.mapping {
            Some(mapping) => unsafe {
                std::slice::from_raw_parts_mut(mapping.as_mut_ptr(), mapping.len())
            },
            None => &mut [],
        }
    }

    /// Base address of the mapping, or null once closed.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mapping
            .as_mut()
            .map_or(std::ptr::null_mut(), |mapping| mapping.as_mut_ptr())
    }

    pub fn size(&self) -> usize {
        self.mapping.as_ref().map_or(0, |mapping| mapping.len())
    }

    pub fn is_valid(&self) -> bool {
        self.mapping.is_some()
    }

    /// The normalized OS name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if this handle created the object.
    pub fn is_owner(&self) -> bool {
        self.owner
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("name", &self.name)
            .field("size", &self.size())
            .field("owner", &self.owner)
            .field("unlink_on_drop", &self.unlink_on_drop)
            .field("unlinked", &self.unlinked)
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn unique_name(tag: &str) -> String {
        format!("shmch_seg_{}_{}", tag, std::process::id())
    }

    #[test]
    fn test_create_is_zeroed_and_sized() {
        let name = unique_name("zeroed");
        Segment::remove(&name);

        let segment = Segment::create(&name, 4096).expect("Failed to create segment");

        assert!(segment.is_valid());
        assert!(segment.is_owner());
        assert_eq!(segment.size(), 4096);
        assert!(segment.data().iter().all(|&b| b == 0), "New segment must be zeroed");

        drop(segment);
        Segment::remove(&name);
    }

    #[test]
    fn test_open_sees_creator_writes() {
        let name = unique_name("shared");
        Segment::remove(&name);

        let mut creator = Segment::create(&name, 128).unwrap();
        creator.data_mut()[..5].copy_from_slice(b"hello");

        let opener = Segment::open(&name, 128).expect("Failed to open segment");
        assert!(!opener.is_owner());
        assert_eq!(&opener.data()[..5], b"hello");

        creator.destroy();
    }

    #[test]
    fn test_open_with_zero_hint_discovers_size() {
        let name = unique_name("autosize");
        Segment::remove(&name);

        let mut creator = Segment::create(&name, 1040).unwrap();
        let opener = Segment::open(&name, 0).unwrap();

        // Some platforms round the object up to a whole page
        assert!(opener.size() >= 1040);

        creator.destroy();
    }

    #[test]
    fn test_open_larger_than_object_fails() {
        let name = unique_name("toolarge");
        Segment::remove(&name);

        let mut creator = Segment::create(&name, 64).unwrap();
        let err = Segment::open(&name, 1 << 20).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MappingFailed);

        creator.destroy();
    }

    #[test]
    fn test_open_missing_fails_with_open_failed() {
        let name = unique_name("missing");
        Segment::remove(&name);

        let err = Segment::open(&name, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OpenFailed);
    }

    #[test]
    fn test_destroy_keeps_mapping_but_blocks_new_opens() {
        let name = unique_name("destroy");
        Segment::remove(&name);

        let mut creator = Segment::create(&name, 64).unwrap();
        let mut opener = Segment::open(&name, 64).unwrap();

        creator.destroy();
        creator.destroy();

        opener.data_mut()[0] = 42;
        assert_eq!(creator.data()[0], 42, "Existing mappings must stay shared");
        assert_eq!(
            Segment::open(&name, 64).unwrap_err().kind(),
            ErrorKind::OpenFailed
        );
    }

    #[test]
    fn test_create_replaces_stale_segment() {
        let name = unique_name("stale");
        Segment::remove(&name);

        let mut first = Segment::create(&name, 64).unwrap();
        first.data_mut()[0] = 0xAB;
        drop(first);

        let mut second = Segment::create(&name, 64).unwrap();
        assert_eq!(second.data()[0], 0, "Recreated segment must start zeroed");

        second.destroy();
    }

    #[test]
    fn test_unlink_on_drop_removes_name() {
        let name = unique_name("unlinkdrop");
        Segment::remove(&name);

        let segment = Segment::create(&name, 64).unwrap().unlink_on_drop(true);
        drop(segment);

        assert_eq!(
            Segment::open(&name, 0).unwrap_err().kind(),
            ErrorKind::OpenFailed
        );
    }

    #[test]
    fn test_drop_without_destroy_persists_name() {
        let name = unique_name("persist");
        Segment::remove(&name);

        drop(Segment::create(&name, 64).unwrap());

        let mut reopened = Segment::open(&name, 64).expect("Name should outlive creator");
        reopened.destroy();
    }

    #[test]
    fn test_opener_never_unlinks_on_drop() {
        let name = unique_name("openerdrop");
        Segment::remove(&name);

        let mut creator = Segment::create(&name, 64).unwrap();
        drop(Segment::open(&name, 64).unwrap().unlink_on_drop(true));

        assert!(Segment::open(&name, 64).is_ok());
        creator.destroy();
    }

    #[test]
    fn test_close_is_idempotent() {
        let name = unique_name("close");
        Segment::remove(&name);

        let mut segment = Segment::create(&name, 64).unwrap();
        segment.close();
        segment.close();

        assert!(!segment.is_valid());
        assert_eq!(segment.size(), 0);
        assert!(segment.data().is_empty());
        assert!(segment.as_mut_ptr().is_null());

        Segment::remove(&name);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let name = unique_name("remove");
        Segment::remove(&name);
        Segment::remove(&name);
        Segment::remove("");
    }
}
