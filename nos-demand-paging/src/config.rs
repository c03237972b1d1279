//! Paging configuration
//!
//! The geometry of the simulated machine: how many physical frames exist and
//! how virtual addresses split into a page number and an offset. A virtual
//! address is `virtual_address_bits` wide; its top `page_address_bits` select
//! the page, the rest is the offset within the page.

use nos_api::error::{Error, Result, config_error, invalid_argument};
use nos_api::{PageNum, Size, VirtAddr};
use static_assertions::const_assert;

/// Widest supported virtual address
pub const MAX_VIRTUAL_ADDRESS_BITS: u32 = 31;

/// Widest supported page number (bounds the page table size per task)
pub const MAX_PAGE_ADDRESS_BITS: u32 = 20;

const_assert!(MAX_VIRTUAL_ADDRESS_BITS < usize::BITS);
const_assert!(MAX_PAGE_ADDRESS_BITS <= MAX_VIRTUAL_ADDRESS_BITS);

/// Paging configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MmuConfig {
    /// Number of physical frames
    pub frame_count: usize,

    /// Width of a virtual address in bits
    pub virtual_address_bits: u32,

    /// Number of high address bits selecting the page
    pub page_address_bits: u32,

    /// Free frames the clock sweep tries to produce per invocation
    pub frames_to_free: usize,
}

impl MmuConfig {
    /// Set the number of physical frames
    pub fn with_frames(mut self, frame_count: usize) -> Self {
        self.frame_count = frame_count;
        self
    }

    /// Set the virtual address geometry
    pub fn with_address_bits(mut self, virtual_address_bits: u32, page_address_bits: u32) -> Self {
        self.virtual_address_bits = virtual_address_bits;
        self.page_address_bits = page_address_bits;
        self
    }

    /// Set the clock sweep's free-frame target
    pub fn with_frames_to_free(mut self, frames_to_free: usize) -> Self {
        self.frames_to_free = frames_to_free;
        self
    }

    /// Check the configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.frame_count == 0 {
            return Err(config_error("frame_count must be at least 1"));
        }
        if self.virtual_address_bits > MAX_VIRTUAL_ADDRESS_BITS {
            return Err(config_error("virtual_address_bits exceeds the supported width"));
        }
        if self.page_address_bits > MAX_PAGE_ADDRESS_BITS {
            return Err(config_error("page_address_bits exceeds the supported width"));
        }
        if self.page_address_bits > self.virtual_address_bits {
            return Err(config_error("page_address_bits must not exceed virtual_address_bits"));
        }
        if self.frames_to_free == 0 || self.frames_to_free > self.frame_count {
            return Err(config_error("frames_to_free must be between 1 and frame_count"));
        }
        Ok(())
    }

    /// Page size in bytes
    #[inline]
    pub fn page_size(&self) -> Size {
        1 << (self.virtual_address_bits - self.page_address_bits)
    }

    /// Number of pages in every task's page table
    #[inline]
    pub fn page_table_size(&self) -> usize {
        1 << self.page_address_bits
    }

    /// Size of a task's virtual address space in bytes
    #[inline]
    pub fn address_space_size(&self) -> Size {
        1 << self.virtual_address_bits
    }

    /// Page number holding `address`
    pub fn page_number(&self, address: VirtAddr) -> Result<PageNum> {
        if address >= self.address_space_size() {
            return Err(invalid_argument("address lies beyond the virtual address space"));
        }
        Ok(address / self.page_size())
    }
}

impl Default for MmuConfig {
    fn default() -> Self {
        Self {
            frame_count: 16,
            virtual_address_bits: 16,
            page_address_bits: 6,
            frames_to_free: 1,
        }
    }
}

impl TryFrom<MmuConfig> for ValidatedConfig {
    type Error = Error;

    fn try_from(config: MmuConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self(config))
    }
}

/// A configuration that passed [`MmuConfig::validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedConfig(MmuConfig);

impl core::ops::Deref for ValidatedConfig {
    type Target = MmuConfig;

    fn deref(&self) -> &MmuConfig {
        &self.0
    }
}
