use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RAMError {
    #[error("Memory size should be a non-zero multiple of 8, but it is {size}")]
    InvalidSize { size: u64 },
    #[error("Access of {bytes} bytes at offset '0x{offset:0X}' is out of bounds")]
    OutOfBounds { offset: u64, bytes: usize },
}

/// Byte width of a load/store of `size` bits.
///
/// Panics on anything but 8, 16, 32 or 64: a different size can only come
/// from a bug in the caller.
const fn access_bytes(size: u32) -> usize {
    match size {
        8 => 1,
        16 => 2,
        32 => 4,
        64 => 8,
        _ => panic!("unsupported memory access size"),
    }
}

/// Flat little-endian physical memory. Offsets are relative to the start of
/// the RAM, address translation happens in [crate::bus::Bus].
#[derive(Debug, Clone)]
pub struct RAM {
    memory: Vec<u8>,
}

impl RAM {
    pub fn new(size: u64) -> Result<Self, RAMError> {
        if size == 0 || size % 8 != 0 {
            return Err(RAMError::InvalidSize { size });
        }

        let memory = vec![0; size as usize];

        Ok(Self { memory })
    }

    /// Creates a RAM of `size` bytes with `image` copied to offset 0.
    pub fn with_image(size: u64, image: &[u8]) -> Result<Self, RAMError> {
        let mut ram = Self::new(size)?;

        ram.check_bounds(0, image.len())?;
        ram.memory[..image.len()].copy_from_slice(image);

        Ok(ram)
    }

    pub fn capacity(&self) -> u64 {
        self.memory.len() as u64
    }

    pub fn as_slice(&self) -> &[u8] {
        self.memory.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.memory.as_mut_slice()
    }

    fn check_bounds(&self, offset: u64, bytes: usize) -> Result<usize, RAMError> {
        let in_bounds = usize::try_from(offset)
            .ok()
            .and_then(|start| start.checked_add(bytes).map(|end| (start, end)))
            .filter(|&(_, end)| end <= self.memory.len());

        match in_bounds {
            Some((start, _)) => Ok(start),
            None => Err(RAMError::OutOfBounds { offset, bytes }),
        }
    }

    /// Reads `size` bits at `offset`, zero-extended to 64 bits.
    pub fn load(&self, offset: u64, size: u32) -> Result<u64, RAMError> {
        let bytes = access_bytes(size);
        let start = self.check_bounds(offset, bytes)?;

        let mut buf = [0u8; 8];
        buf[..bytes].copy_from_slice(&self.memory[start..start + bytes]);

        Ok(u64::from_le_bytes(buf))
    }

    /// Writes the low `size` bits of `value` at `offset`.
    pub fn store(&mut self, offset: u64, size: u32, value: u64) -> Result<(), RAMError> {
        let bytes = access_bytes(size);
        let start = self.check_bounds(offset, bytes)?;

        self.memory[start..start + bytes].copy_from_slice(&value.to_le_bytes()[..bytes]);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ram::{RAMError, RAM};

    #[test]
    fn invalid_size() {
        let ram = RAM::new(33);

        assert!(ram.is_err());
        assert_eq!(ram.unwrap_err(), RAMError::InvalidSize { size: 33 });
        assert_eq!(RAM::new(0).unwrap_err(), RAMError::InvalidSize { size: 0 });
    }

    #[test]
    fn store_load() {
        let mut ram = RAM::new(64).unwrap();
        let value = 0x1122_3344_5566_7788;

        for size in [8, 16, 32] {
            assert_eq!(ram.store(8, size, value), Ok(()));
            assert_eq!(ram.load(8, size), Ok(value & ((1 << size) - 1)));
        }

        assert_eq!(ram.store(8, 64, value), Ok(()));
        assert_eq!(ram.load(8, 64), Ok(value));
    }

    #[test]
    fn little_endian() {
        let mut ram = RAM::new(16).unwrap();

        ram.store(0, 32, 0xDEAD_BEEF).unwrap();

        assert_eq!(&ram.as_slice()[..4], &[0xEF, 0xBE, 0xAD, 0xDE]);
        assert_eq!(ram.load(1, 8), Ok(0xBE));
        assert_eq!(ram.load(2, 16), Ok(0xDEAD));
    }

    #[test]
    fn narrow_store_keeps_neighbours() {
        let mut ram = RAM::new(16).unwrap();

        ram.store(0, 64, u64::MAX).unwrap();
        ram.store(2, 8, 0).unwrap();

        assert_eq!(ram.load(0, 64), Ok(0xFFFF_FFFF_FF00_FFFF));
    }

    #[test]
    fn out_of_bounds() {
        let mut ram = RAM::new(16).unwrap();

        assert_eq!(ram.load(15, 8), Ok(0));
        assert_eq!(
            ram.load(15, 16),
            Err(RAMError::OutOfBounds { offset: 15, bytes: 2 })
        );
        assert_eq!(
            ram.store(16, 8, 1),
            Err(RAMError::OutOfBounds { offset: 16, bytes: 1 })
        );
        assert!(ram.load(u64::MAX, 64).is_err());
    }

    #[test]
    fn with_image() {
        let ram = RAM::with_image(16, &[1, 2, 3]).unwrap();

        assert_eq!(ram.load(0, 32), Ok(0x0003_0201));
        assert!(RAM::with_image(16, &[0; 17]).is_err());
    }

    #[test]
    #[should_panic(expected = "unsupported memory access size")]
    fn invalid_access_size() {
        let ram = RAM::new(16).unwrap();

        let _ = ram.load(0, 12);
    }
}
