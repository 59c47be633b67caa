//! OS shared-memory adapters.
//!
//! Each adapter hands out one fixed-size block of memory that other processes
//! can map under the same identifier. The engine never cares which adapter is
//! active; it only needs a pointer, a length, and whether this process was the
//! one that created (and therefore zero-initialized) the block.
//!
//! Cross-process visibility note: acquire/release atomics order accesses
//! within one process's memory model. Visibility between processes
//! additionally depends on the coherence the mapping primitive provides. All
//! adapters here map the same physical pages into each attacher, which on the
//! supported platforms gives cache-coherent access, but this remains a
//! property of the OS primitive, not of the atomics.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::ptr::NonNull;

use memmap2::MmapMut;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("shared region {name:?} could not be opened: {source}")]
    Open { name: String, source: io::Error },
    #[error("shared region could not be sized to {size} bytes: {source}")]
    Resize { size: usize, source: io::Error },
    #[error("shared region could not be mapped ({size} bytes): {source}")]
    Map { size: usize, source: io::Error },
    #[error("shared region holds {actual} bytes, need at least {expected}")]
    TooSmall { expected: usize, actual: usize },
}

/// A fixed block of memory shared with other processes for the lifetime of
/// the handle. Dropping the handle detaches the mapping; the OS releases the
/// underlying object once the last process detaches.
pub trait CrossProcessRegion: Send {
    /// Base address of the mapping. Valid for [`len`](Self::len) bytes until
    /// the handle is dropped.
    fn as_ptr(&self) -> NonNull<u8>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when this handle created the block, meaning it arrived
    /// zero-filled and this process is responsible for writing the initial
    /// contents. Attachers to an existing block must not reinitialize it.
    fn created(&self) -> bool;
}

/// Region backed by a regular file mapped with `memmap2`.
///
/// Works on every platform and doubles as the test backend. Creation is
/// detected by the file being shorter than the requested size; two processes
/// racing on a brand-new path is outside this adapter's contract, matching
/// the one-writer/one-reader deployment of the plugins.
pub struct FileBackedRegion {
    map: MmapMut,
    ptr: NonNull<u8>,
    created: bool,
}

// SAFETY: the mapping stays valid wherever the handle moves; the raw pointer
// is derived from the owned map.
unsafe impl Send for FileBackedRegion {}

impl FileBackedRegion {
    pub fn acquire(path: &Path, size: usize) -> Result<Self, RegionError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| RegionError::Open {
                name: path.display().to_string(),
                source,
            })?;

        let existing_len = file
            .metadata()
            .map_err(|source| RegionError::Open {
                name: path.display().to_string(),
                source,
            })?
            .len();
        let created = existing_len < size as u64;
        if created {
            // set_len zero-fills, so a fresh file satisfies the
            // "created means zeroed" contract.
            file.set_len(size as u64)
                .map_err(|source| RegionError::Resize { size, source })?;
        }

        // SAFETY: the file is writable and sized; the map is kept alive for
        // as long as the derived pointer by the struct itself.
        let mut map = unsafe { MmapMut::map_mut(&file) }
            .map_err(|source| RegionError::Map { size, source })?;
        let ptr = NonNull::new(map.as_mut_ptr()).ok_or_else(|| RegionError::Map {
            size,
            source: io::Error::new(io::ErrorKind::Other, "mapping returned null"),
        })?;

        tracing::info!(
            path = %path.display(),
            size,
            created,
            "file-backed region acquired"
        );
        Ok(Self { map, ptr, created })
    }
}

impl CrossProcessRegion for FileBackedRegion {
    fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn created(&self) -> bool {
        self.created
    }
}

/// POSIX named shared memory (`shm_open` + `mmap`).
///
/// The object is not unlinked on drop: contents persist for the OS session so
/// a plugin reload re-attaches to the same audio, and the kernel reclaims the
/// object once the last mapping goes away.
#[cfg(unix)]
pub struct PosixShmRegion {
    ptr: NonNull<u8>,
    len: usize,
    created: bool,
}

#[cfg(unix)]
// SAFETY: the mapping is process-global until munmap in Drop; nothing is tied
// to the creating thread.
unsafe impl Send for PosixShmRegion {}

#[cfg(unix)]
impl PosixShmRegion {
    pub fn acquire(name: &str, size: usize) -> Result<Self, RegionError> {
        let c_name = std::ffi::CString::new(format!("/{name}")).map_err(|_| RegionError::Open {
            name: name.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "identifier contains NUL"),
        })?;

        // Exclusive create first so exactly one attacher learns it owns
        // zero-initialization.
        let mut created = true;
        // SAFETY: c_name is a valid NUL-terminated string.
        let mut fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_RDWR | libc::O_CREAT | libc::O_EXCL,
                0o600 as libc::mode_t,
            )
        };
        if fd < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EEXIST) {
                return Err(RegionError::Open {
                    name: name.to_string(),
                    source: err,
                });
            }
            created = false;
            // SAFETY: as above.
            fd = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDWR, 0) };
            if fd < 0 {
                return Err(RegionError::Open {
                    name: name.to_string(),
                    source: io::Error::last_os_error(),
                });
            }
        }

        if created {
            // SAFETY: fd is a freshly created shm object owned by us.
            // ftruncate zero-fills the new extent.
            if unsafe { libc::ftruncate(fd, size as libc::off_t) } != 0 {
                let source = io::Error::last_os_error();
                // SAFETY: fd is open.
                unsafe {
                    libc::close(fd);
                    libc::shm_unlink(c_name.as_ptr());
                }
                return Err(RegionError::Resize { size, source });
            }
        }

        // SAFETY: fd refers to an shm object of at least `size` bytes.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        // The descriptor is only needed to establish the mapping.
        // SAFETY: fd is open.
        unsafe { libc::close(fd) };
        if ptr == libc::MAP_FAILED {
            return Err(RegionError::Map {
                size,
                source: io::Error::last_os_error(),
            });
        }
        let ptr = NonNull::new(ptr.cast::<u8>()).ok_or_else(|| RegionError::Map {
            size,
            source: io::Error::new(io::ErrorKind::Other, "mmap returned null"),
        })?;

        tracing::info!(name, size, created, "posix shm region acquired");
        Ok(Self {
            ptr,
            len: size,
            created,
        })
    }
}

#[cfg(unix)]
impl Drop for PosixShmRegion {
    fn drop(&mut self) {
        // SAFETY: ptr/len describe the mapping established in acquire.
        unsafe {
            libc::munmap(self.ptr.as_ptr().cast(), self.len);
        }
    }
}

#[cfg(unix)]
impl CrossProcessRegion for PosixShmRegion {
    fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    fn len(&self) -> usize {
        self.len
    }

    fn created(&self) -> bool {
        self.created
    }
}

/// Windows named file mapping (`CreateFileMappingW` + `MapViewOfFile`).
#[cfg(windows)]
pub struct WindowsMappingRegion {
    ptr: NonNull<u8>,
    len: usize,
    created: bool,
    handle: windows::Win32::Foundation::HANDLE,
}

#[cfg(windows)]
// SAFETY: mapping handles and views are process-wide resources.
unsafe impl Send for WindowsMappingRegion {}

#[cfg(windows)]
impl WindowsMappingRegion {
    pub fn acquire(name: &str, size: usize) -> Result<Self, RegionError> {
        use windows::core::PCWSTR;
        use windows::Win32::Foundation::{CloseHandle, GetLastError, ERROR_ALREADY_EXISTS};
        use windows::Win32::System::Memory::{
            CreateFileMappingW, MapViewOfFile, FILE_MAP_ALL_ACCESS, PAGE_READWRITE,
        };
        use windows::Win32::Foundation::INVALID_HANDLE_VALUE;

        let qualified = format!("Local\\{name}");
        let wide: Vec<u16> = qualified.encode_utf16().chain(std::iter::once(0)).collect();

        // SAFETY: the wide string is NUL-terminated and outlives the call.
        let handle = unsafe {
            CreateFileMappingW(
                INVALID_HANDLE_VALUE,
                None,
                PAGE_READWRITE,
                0,
                size as u32,
                PCWSTR(wide.as_ptr()),
            )
        }
        .map_err(|e| RegionError::Open {
            name: qualified.clone(),
            source: io::Error::new(io::ErrorKind::Other, e.to_string()),
        })?;

        // SAFETY: CreateFileMappingW sets the thread error even on success to
        // report whether the object already existed.
        let created = unsafe { GetLastError() } != ERROR_ALREADY_EXISTS;

        // SAFETY: handle is a valid mapping of at least `size` bytes.
        let view = unsafe { MapViewOfFile(handle, FILE_MAP_ALL_ACCESS, 0, 0, size) };
        let Some(ptr) = NonNull::new(view.Value.cast::<u8>()) else {
            // SAFETY: handle came from CreateFileMappingW above.
            unsafe {
                let _ = CloseHandle(handle);
            }
            return Err(RegionError::Map {
                size,
                source: io::Error::last_os_error(),
            });
        };

        tracing::info!(name = %qualified, size, created, "windows mapping region acquired");
        Ok(Self {
            ptr,
            len: size,
            created,
            handle,
        })
    }
}

#[cfg(windows)]
impl Drop for WindowsMappingRegion {
    fn drop(&mut self) {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Memory::{UnmapViewOfFile, MEMORY_MAPPED_VIEW_ADDRESS};

        // SAFETY: ptr/handle were produced by acquire and are unmapped once.
        unsafe {
            let _ = UnmapViewOfFile(MEMORY_MAPPED_VIEW_ADDRESS {
                Value: self.ptr.as_ptr().cast(),
            });
            let _ = CloseHandle(self.handle);
        }
    }
}

#[cfg(windows)]
impl CrossProcessRegion for WindowsMappingRegion {
    fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    fn len(&self) -> usize {
        self.len
    }

    fn created(&self) -> bool {
        self.created
    }
}

/// Acquires the platform's native region for `name`.
pub fn acquire_native(name: &str, size: usize) -> Result<Box<dyn CrossProcessRegion>, RegionError> {
    #[cfg(unix)]
    {
        Ok(Box::new(PosixShmRegion::acquire(name, size)?))
    }
    #[cfg(windows)]
    {
        Ok(Box::new(WindowsMappingRegion::acquire(name, size)?))
    }
    #[cfg(not(any(unix, windows)))]
    {
        let mut path = std::env::temp_dir();
        path.push(format!("{name}.shm"));
        Ok(Box::new(FileBackedRegion::acquire(&path, size)?))
    }
}
