#![no_main]

use libfuzzer_sys::fuzz_target;
use xalloc::{call_site, Xalloc};

/// Fuzz target that interprets a byte slice as a sequence of allocator operations.
///
/// Each operation is encoded as:
///   byte 0: opcode (0=malloc, 1=free, 2=realloc, 3=try_malloc, 4=try_realloc)
///   byte 1-2: size (little-endian u16)
///   byte 3: slot index (which tracked pointer to operate on)
///
/// We track up to 64 live pointers. After every step the touched block must
/// report the size we asked for, hold the bytes we wrote, and be zero past
/// the old size after growth.
const MAX_SLOTS: usize = 64;

fn check(a: &Xalloc, ptr: *mut u8, size: usize, old_size: usize, fill: u8) {
    let site = call_site!();
    assert_eq!(unsafe { a.size(ptr, &site) }, size);
    let bytes = unsafe { std::slice::from_raw_parts(ptr, size) };
    let kept = old_size.min(size);
    assert!(bytes[..kept].iter().all(|&b| b == fill), "prefix lost");
    assert!(bytes[kept..].iter().all(|&b| b == 0), "tail not zeroed");
}

fuzz_target!(|data: &[u8]| {
    let a = Xalloc::new();
    let site = call_site!();
    let mut slots: [*mut u8; MAX_SLOTS] = [std::ptr::null_mut(); MAX_SLOTS];
    let mut sizes: [usize; MAX_SLOTS] = [0; MAX_SLOTS];

    let mut i = 0;
    while i + 4 <= data.len() {
        let opcode = data[i] % 5;
        let size = u16::from_le_bytes([data[i + 1], data[i + 2]]) as usize;
        let slot = (data[i + 3] as usize) % MAX_SLOTS;
        let fill = (slot as u8) | 0x80;
        i += 4;

        match opcode {
            0 | 3 => {
                unsafe { a.free(&mut slots[slot], &site) };
                sizes[slot] = 0;
                let ptr = if opcode == 0 {
                    a.malloc(size, &site)
                } else {
                    match a.try_malloc(size, &site) {
                        Ok(p) => p,
                        Err(_) => continue,
                    }
                };
                check(&a, ptr.as_ptr(), size, 0, fill);
                unsafe { std::ptr::write_bytes(ptr.as_ptr(), fill, size) };
                slots[slot] = ptr.as_ptr();
                sizes[slot] = size;
            }
            1 => {
                unsafe { a.free(&mut slots[slot], &site) };
                assert!(slots[slot].is_null());
                sizes[slot] = 0;
            }
            2 | 4 => {
                let old_size = sizes[slot];
                if opcode == 2 {
                    unsafe { a.realloc(&mut slots[slot], size, &site) };
                } else if unsafe { a.try_realloc(&mut slots[slot], size, &site) }.is_err() {
                    continue;
                }
                check(&a, slots[slot], size, old_size, fill);
                unsafe { std::ptr::write_bytes(slots[slot], fill, size) };
                sizes[slot] = size;
            }
            _ => unreachable!(),
        }
    }

    // Cleanup
    for slot in &mut slots {
        unsafe { a.free(slot, &site) };
    }
    assert_eq!(a.stats().live_blocks, 0);
});
