//! Page-boundary splitting
//!
//! Page program commands take at most one page and wrap around inside it,
//! so a write must be cut at every page boundary.

/// One page-program worth of a larger write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChunk {
    /// Flash address of the first byte
    pub address: u32,
    /// Offset of the first byte in the caller's buffer
    pub offset: usize,
    /// Number of bytes
    pub len: usize,
}

/// Iterator over the page chunks of a write
#[derive(Debug, Clone)]
pub struct PageChunks {
    address: u32,
    offset: usize,
    remaining: usize,
    page_size: u32,
}

/// Split `len` bytes starting at `address` into page-bounded chunks
///
/// The first chunk runs up to the next page boundary (or covers the whole
/// request if it fits), the following ones are full pages, and the last
/// one holds the remainder.
///
/// `page_size` must be a power of two.
pub fn page_chunks(address: u32, len: usize, page_size: u32) -> PageChunks {
    debug_assert!(page_size.is_power_of_two());
    PageChunks {
        address,
        offset: 0,
        remaining: len,
        page_size,
    }
}

impl Iterator for PageChunks {
    type Item = PageChunk;

    fn next(&mut self) -> Option<PageChunk> {
        if self.remaining == 0 {
            return None;
        }
        let to_boundary = (self.page_size - (self.address & (self.page_size - 1))) as usize;
        let len = to_boundary.min(self.remaining);
        let chunk = PageChunk {
            address: self.address,
            offset: self.offset,
            len,
        };
        self.address = self.address.wrapping_add(len as u32);
        self.offset += len;
        self.remaining -= len;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining == 0 {
            return (0, Some(0));
        }
        let page = self.page_size as usize;
        let head = (self.address & (self.page_size - 1)) as usize;
        let n = (head + self.remaining).div_ceil(page);
        (n, Some(n))
    }
}

impl ExactSizeIterator for PageChunks {}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_split(address: u32, len: usize) {
        let chunks = page_chunks(address, len, 256);
        let expected = chunks.len();
        let mut total = 0;
        let mut next_addr = address;
        let mut count = 0;
        for c in chunks {
            assert!(c.len > 0 && c.len <= 256);
            assert_eq!(c.address, next_addr);
            assert_eq!(c.offset, total);
            // never crosses a page boundary
            assert_eq!(c.address / 256, (c.address + c.len as u32 - 1) / 256);
            total += c.len;
            next_addr += c.len as u32;
            count += 1;
        }
        assert_eq!(total, len);
        assert_eq!(count, expected);
    }

    #[test]
    fn test_two_full_pages() {
        let chunks: [PageChunk; 2] = {
            let mut it = page_chunks(0x1000, 512, 256);
            [it.next().unwrap(), it.next().unwrap()]
        };
        assert_eq!(chunks[0], PageChunk { address: 0x1000, offset: 0, len: 256 });
        assert_eq!(chunks[1], PageChunk { address: 0x1100, offset: 256, len: 256 });
        assert_eq!(page_chunks(0x1000, 512, 256).len(), 2);
    }

    #[test]
    fn test_unaligned_start() {
        let mut it = page_chunks(0x10F0, 0x120, 256);
        assert_eq!(it.next(), Some(PageChunk { address: 0x10F0, offset: 0, len: 0x10 }));
        assert_eq!(it.next(), Some(PageChunk { address: 0x1100, offset: 0x10, len: 0x100 }));
        assert_eq!(it.next(), Some(PageChunk { address: 0x1200, offset: 0x110, len: 0x10 }));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_fits_in_page() {
        let mut it = page_chunks(0x2010, 16, 256);
        assert_eq!(it.next(), Some(PageChunk { address: 0x2010, offset: 0, len: 16 }));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_empty() {
        assert_eq!(page_chunks(0x1234, 0, 256).count(), 0);
    }

    #[test]
    fn test_split_property() {
        // deterministic sweep of starts and lengths around page edges
        for address in [0u32, 1, 0x7F, 0xFF, 0x100, 0x1FF, 0x12345, 0xFFFF00] {
            for len in [1usize, 2, 255, 256, 257, 511, 512, 513, 1000, 4096] {
                check_split(address, len);
            }
        }
    }
}
