use crate::ram::{RAMError, RAM};
use thiserror::Error;

/// Physical address at which emulated RAM begins.
pub const DEFAULT_RAM_BASE: u64 = 0x8000_0000;
/// 128 MiB.
pub const DEFAULT_RAM_SIZE: u64 = 128 * 1024 * 1024;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BusError {
    #[error(transparent)]
    RAMError(#[from] RAMError),
    #[error("Address '0x{address:0X}' is below emulated RAM, MMIO is not implemented")]
    UnimplementedMmio { address: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RAMConfig {
    pub start_address: u64,
    pub size: u64,
}

impl Default for RAMConfig {
    fn default() -> Self {
        Self {
            start_address: DEFAULT_RAM_BASE,
            size: DEFAULT_RAM_SIZE,
        }
    }
}

/// Routes hart-visible physical addresses to the RAM. Everything below the
/// RAM base is device space, which is not emulated.
#[derive(Debug, Clone)]
pub struct Bus {
    ram: (u64, RAM),
}

impl Bus {
    pub fn new(ram_config: RAMConfig, image: &[u8]) -> Result<Self, BusError> {
        let ram = (
            ram_config.start_address,
            RAM::with_image(ram_config.size, image)?,
        );

        Ok(Self { ram })
    }

    pub fn ram_start(&self) -> u64 {
        self.ram.0
    }

    /// One past the last RAM address.
    pub fn ram_end(&self) -> u64 {
        self.ram.0.wrapping_add(self.ram.1.capacity())
    }

    pub fn ram(&self) -> &RAM {
        &self.ram.1
    }

    pub fn ram_mut(&mut self) -> &mut RAM {
        &mut self.ram.1
    }

    fn translate(&self, address: u64) -> Result<u64, BusError> {
        if address >= self.ram.0 {
            Ok(address - self.ram.0)
        } else {
            Err(BusError::UnimplementedMmio { address })
        }
    }

    /// Loads `size` bits (8, 16, 32 or 64) from `address`, zero-extended.
    pub fn load(&self, address: u64, size: u32) -> Result<u64, BusError> {
        let translated = self.translate(address)?;
        let value = self.ram.1.load(translated, size)?;

        Ok(value)
    }

    /// Stores the low `size` bits (8, 16, 32 or 64) of `value` at `address`.
    pub fn store(&mut self, address: u64, size: u32, value: u64) -> Result<(), BusError> {
        let translated = self.translate(address)?;

        self.ram.1.store(translated, size, value)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Bus, BusError, RAMConfig};
    use crate::ram::RAMError;

    const BASE: u64 = 0x8000_0000;

    fn make_bus() -> Bus {
        Bus::new(
            RAMConfig {
                start_address: BASE,
                size: 4096,
            },
            &[0x13, 0x00, 0x00, 0x00],
        )
        .unwrap()
    }

    #[test]
    fn image_at_ram_base() {
        let bus = make_bus();

        assert_eq!(bus.load(BASE, 32), Ok(0x13));
        assert_eq!(bus.ram_end(), BASE + 4096);
    }

    #[test]
    fn store_load() {
        let mut bus = make_bus();

        for size in [8u32, 16, 32] {
            bus.store(BASE + 0x100, size, u64::MAX).unwrap();
            assert_eq!(bus.load(BASE + 0x100, size), Ok((1u64 << size) - 1));
        }

        bus.store(BASE + 0x100, 64, 0x0123_4567_89AB_CDEF).unwrap();
        assert_eq!(bus.load(BASE + 0x100, 64), Ok(0x0123_4567_89AB_CDEF));
        assert_eq!(bus.ram().load(0x100, 8), Ok(0xEF));
    }

    #[test]
    fn below_ram_is_mmio() {
        let mut bus = make_bus();

        assert_eq!(
            bus.load(BASE - 1, 8),
            Err(BusError::UnimplementedMmio { address: BASE - 1 })
        );
        assert_eq!(
            bus.store(0x1000_0000, 8, 0x41),
            Err(BusError::UnimplementedMmio {
                address: 0x1000_0000
            })
        );
    }

    #[test]
    fn past_ram_end() {
        let bus = make_bus();

        assert_eq!(
            bus.load(BASE + 4096, 32),
            Err(BusError::RAMError(RAMError::OutOfBounds {
                offset: 4096,
                bytes: 4
            }))
        );
    }

    #[test]
    fn image_too_large() {
        let bus = Bus::new(
            RAMConfig {
                start_address: BASE,
                size: 8,
            },
            &[0; 9],
        );

        assert!(bus.is_err());
    }
}
