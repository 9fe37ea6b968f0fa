//! # Memory Bring-Up
//!
//! Frame allocation, kernel stacks, address spaces, and the page cache.
//!
//! The frame allocator is a bump allocator over a fixed frame budget; the
//! lifecycle core only allocates during boot and thread creation, so
//! exhaustion here means the machine is genuinely too small to boot.

use crate::{HalError, HalResult, PhysAddr, VirtAddr};
use log::debug;

/// Page/frame size in bytes
pub const PAGE_SIZE: usize = 4096;

/// Base of the simulated kernel virtual mapping of physical memory
const KERNEL_DIRECT_BASE: u64 = 0xffff_8000_0000_0000;

/// A contiguous run of physical frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    start: PhysAddr,
    frames: usize,
}

impl FrameRange {
    /// First frame address
    pub fn start(&self) -> PhysAddr {
        self.start
    }

    /// Number of frames in the range
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Size of the range in bytes
    pub fn size(&self) -> usize {
        self.frames * PAGE_SIZE
    }
}

/// Physical frame allocator
pub struct FrameAllocator {
    total_frames: usize,
    next_frame: usize,
    freed_frames: usize,
}

impl FrameAllocator {
    /// Default physical memory budget (16 MiB)
    pub const DEFAULT_FRAMES: usize = 4096;

    /// Create an allocator over `total_frames` frames
    pub fn new(total_frames: usize) -> Self {
        Self {
            total_frames,
            next_frame: 0,
            freed_frames: 0,
        }
    }

    /// Allocate a contiguous run of frames
    pub fn alloc(&mut self, frames: usize) -> HalResult<FrameRange> {
        if frames == 0 {
            return Err(HalError::InvalidParameter);
        }
        if self.next_frame + frames > self.total_frames {
            return Err(HalError::OutOfMemory);
        }
        let start = PhysAddr::new((self.next_frame * PAGE_SIZE) as u64);
        self.next_frame += frames;
        debug!("mem: allocated {} frame(s) at {:#x}", frames, start.as_u64());
        Ok(FrameRange { start, frames })
    }

    /// Return a run of frames
    ///
    /// The bump allocator does not reuse frames; the count is tracked so
    /// that leak checks remain possible.
    pub fn free(&mut self, range: FrameRange) {
        self.freed_frames += range.frames;
    }

    /// Frames currently live (allocated minus freed)
    pub fn live_frames(&self) -> usize {
        self.next_frame - self.freed_frames
    }
}

impl Default for FrameAllocator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FRAMES)
    }
}

/// A kernel stack backed by physical frames
#[derive(Debug)]
pub struct KernelStack {
    frames: FrameRange,
}

impl KernelStack {
    /// Kernel stack size in frames (16 KiB)
    pub const FRAMES: usize = 4;

    /// Allocate a kernel stack
    pub fn allocate(frames: &mut FrameAllocator) -> HalResult<Self> {
        let frames = frames.alloc(Self::FRAMES)?;
        Ok(Self { frames })
    }

    /// Stack base (lowest virtual address)
    pub fn base(&self) -> VirtAddr {
        VirtAddr::new(KERNEL_DIRECT_BASE + self.frames.start().as_u64())
    }

    /// Stack top (highest virtual address, initial stack pointer)
    pub fn top(&self) -> VirtAddr {
        VirtAddr::new(self.base().as_u64() + self.size() as u64)
    }

    /// Stack size in bytes
    pub fn size(&self) -> usize {
        self.frames.size()
    }

    /// Release the backing frames
    pub fn release(self, frames: &mut FrameAllocator) {
        frames.free(self.frames);
    }
}

/// Handle to an address space (page directory equivalent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressSpaceId(u32);

impl AddressSpaceId {
    /// The kernel's own address space
    pub const KERNEL: Self = Self(0);

    /// Get the raw ID value
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Address space construction machinery
pub struct AddressSpaces {
    template_ready: bool,
    next: u32,
}

impl AddressSpaces {
    /// Create the machinery; only the kernel space exists initially
    pub const fn new() -> Self {
        Self {
            template_ready: false,
            next: 1,
        }
    }

    /// Finalize the address-space template
    ///
    /// One-shot: runs inside the bootstrap context, after which new
    /// address spaces may be created.
    pub fn finalize_template(&mut self) {
        assert!(!self.template_ready, "address-space template finalized twice");
        self.template_ready = true;
        debug!("mem: address-space template finalized");
    }

    /// Check whether the template is finalized
    pub fn template_ready(&self) -> bool {
        self.template_ready
    }

    /// Create a fresh address space from the template
    pub fn create(&mut self) -> HalResult<AddressSpaceId> {
        if !self.template_ready {
            return Err(HalError::NotInitialized);
        }
        let id = AddressSpaceId(self.next);
        self.next += 1;
        Ok(id)
    }
}

impl Default for AddressSpaces {
    fn default() -> Self {
        Self::new()
    }
}

/// Page cache (pframe equivalent)
pub struct PageCache {
    online: bool,
}

impl PageCache {
    /// Create the page cache in its offline state
    pub const fn new() -> Self {
        Self { online: false }
    }

    /// Bring the page cache online
    pub fn init(&mut self) -> HalResult<()> {
        if self.online {
            return Err(HalError::AlreadyInitialized);
        }
        self.online = true;
        debug!("mem: page cache online");
        Ok(())
    }

    /// Flush and shut the page cache down
    pub fn shutdown(&mut self) -> HalResult<()> {
        if !self.online {
            return Err(HalError::NotInitialized);
        }
        self.online = false;
        debug!("mem: page cache shut down");
        Ok(())
    }

    /// Check whether the page cache is online
    pub fn online(&self) -> bool {
        self.online
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_allocation_and_exhaustion() {
        let mut frames = FrameAllocator::new(8);
        let a = frames.alloc(4).unwrap();
        let b = frames.alloc(4).unwrap();
        assert_ne!(a.start(), b.start());
        assert_eq!(frames.alloc(1), Err(HalError::OutOfMemory));
    }

    #[test]
    fn stack_layout() {
        let mut frames = FrameAllocator::default();
        let stack = KernelStack::allocate(&mut frames).unwrap();
        assert_eq!(stack.size(), KernelStack::FRAMES * PAGE_SIZE);
        assert_eq!(
            stack.top().as_u64() - stack.base().as_u64(),
            stack.size() as u64
        );
        stack.release(&mut frames);
        assert_eq!(frames.live_frames(), 0);
    }

    #[test]
    fn address_space_requires_template() {
        let mut spaces = AddressSpaces::new();
        assert_eq!(spaces.create(), Err(HalError::NotInitialized));
        spaces.finalize_template();
        let first = spaces.create().unwrap();
        assert_ne!(first, AddressSpaceId::KERNEL);
    }
}
