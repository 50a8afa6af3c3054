//! Checked reads over memory the loader did not allocate.
//!
//! Everything the bootstrap looks at (the initial stack, the program header
//! table) is a blob laid out by someone else. Readers here carry the length of
//! the blob with them so offset mistakes become errors instead of wild reads.

use core::marker::PhantomData;
use core::mem;
use core::ptr;
use core::slice;

/// Errors raised when reading raw byte buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawAccessError {
    /// Requested range extends past the backing slice.
    OutOfBounds {
        offset: usize,
        size: usize,
        len: usize,
    },
    /// Offset math overflowed.
    Overflow,
    /// A typed slice was requested at an address not aligned for the type.
    Misaligned { offset: usize, align: usize },
}

/// Thin wrapper providing checked access to unaligned data.
#[derive(Clone, Copy)]
pub struct RawReader<'a> {
    data: *const u8,
    len: usize,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> RawReader<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data: data.as_ptr(),
            len: data.len(),
            _marker: PhantomData,
        }
    }

    /// View `count` words as bytes.
    pub fn from_words(words: &'a [u64]) -> Self {
        Self {
            data: words.as_ptr() as *const u8,
            len: words.len() * mem::size_of::<u64>(),
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address of the first byte of the view.
    pub fn base_addr(&self) -> u64 {
        self.data as u64
    }

    pub fn read<T>(&self, offset: usize) -> Result<T, RawAccessError>
    where
        T: Copy,
    {
        self.ensure(offset, mem::size_of::<T>())?;
        unsafe {
            let ptr = self.data.add(offset) as *const T;
            Ok(ptr::read_unaligned(ptr))
        }
    }

    pub fn u32(&self, offset: usize) -> Result<u32, RawAccessError> {
        self.read::<u32>(offset)
    }

    pub fn u64(&self, offset: usize) -> Result<u64, RawAccessError> {
        self.read::<u64>(offset)
    }

    pub fn slice<T>(&self, offset: usize, count: usize) -> Result<&'a [T], RawAccessError>
    where
        T: Copy,
    {
        if count == 0 {
            return Ok(&[]);
        }
        let size = count
            .checked_mul(mem::size_of::<T>())
            .ok_or(RawAccessError::Overflow)?;
        self.ensure(offset, size)?;
        let align = mem::align_of::<T>();
        let addr = (self.data as usize)
            .checked_add(offset)
            .ok_or(RawAccessError::Overflow)?;
        if addr % align != 0 {
            return Err(RawAccessError::Misaligned { offset, align });
        }
        unsafe {
            let ptr = self.data.add(offset) as *const T;
            Ok(slice::from_raw_parts(ptr, count))
        }
    }

    /// Narrow the view to `[offset, offset + len)`.
    pub fn sub(&self, offset: usize, len: usize) -> Result<RawReader<'a>, RawAccessError> {
        self.ensure(offset, len)?;
        Ok(Self {
            data: unsafe { self.data.add(offset) },
            len,
            _marker: PhantomData,
        })
    }

    fn ensure(&self, offset: usize, size: usize) -> Result<(), RawAccessError> {
        let end = offset.checked_add(size).ok_or(RawAccessError::Overflow)?;
        if end > self.len {
            Err(RawAccessError::OutOfBounds {
                offset,
                size,
                len: self.len,
            })
        } else {
            Ok(())
        }
    }
}
