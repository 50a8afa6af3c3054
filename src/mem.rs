//! C ABI memory intrinsics
//!
//! The compiler lowers copies and comparisons to these symbols and nothing
//! else in a `-nostdlib` link provides them. The loops use volatile access so
//! they are not turned back into calls to themselves.

use core::ffi::{c_char, c_int, c_void};
use core::ptr::{read_volatile, write_volatile};

#[no_mangle]
#[inline(never)]
pub unsafe extern "C" fn memcpy(dest: *mut c_void, src: *const c_void, n: usize) -> *mut c_void {
    let d = dest as *mut u8;
    let s = src as *const u8;
    let mut i = 0;
    while i < n {
        write_volatile(d.add(i), read_volatile(s.add(i)));
        i += 1;
    }
    dest
}

#[no_mangle]
#[inline(never)]
pub unsafe extern "C" fn memset(dest: *mut c_void, val: c_int, n: usize) -> *mut c_void {
    let d = dest as *mut u8;
    let mut i = 0;
    while i < n {
        write_volatile(d.add(i), val as u8);
        i += 1;
    }
    dest
}

/// Overlap-safe: copies backwards when `dest` is above `src`.
#[no_mangle]
#[inline(never)]
pub unsafe extern "C" fn memmove(dest: *mut c_void, src: *const c_void, n: usize) -> *mut c_void {
    let d = dest as *mut u8;
    let s = src as *const u8;
    if (d as usize) < (s as usize) {
        let mut i = 0;
        while i < n {
            write_volatile(d.add(i), read_volatile(s.add(i)));
            i += 1;
        }
    } else {
        let mut i = n;
        while i > 0 {
            i -= 1;
            write_volatile(d.add(i), read_volatile(s.add(i)));
        }
    }
    dest
}

#[no_mangle]
pub unsafe extern "C" fn memcmp(a: *const c_void, b: *const c_void, n: usize) -> c_int {
    let a = a as *const u8;
    let b = b as *const u8;
    let mut i = 0;
    while i < n {
        let (va, vb) = (read_volatile(a.add(i)), read_volatile(b.add(i)));
        if va != vb {
            return va as c_int - vb as c_int;
        }
        i += 1;
    }
    0
}

#[no_mangle]
pub unsafe extern "C" fn bcmp(a: *const c_void, b: *const c_void, n: usize) -> c_int {
    (memcmp(a, b, n) != 0) as c_int
}

#[no_mangle]
pub unsafe extern "C" fn strlen(s: *const c_char) -> usize {
    let mut len = 0;
    while read_volatile(s.add(len)) != 0 {
        len += 1;
    }
    len
}
