use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use log::{debug, info};
use object::{Architecture, Object, ObjectSegment};

const ELF_MAGIC: &[u8] = b"\x7FELF";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// ELF if the file starts with the ELF magic, raw otherwise.
    #[default]
    Auto,
    /// Flat binary copied to the RAM base.
    Raw,
    /// RV64 ELF executable, loaded by its segments.
    Elf,
}

/// A flat RAM image starting at the RAM base, plus an optional entry point.
#[derive(Debug, PartialEq, Eq)]
pub struct Program {
    pub image: Vec<u8>,
    pub entry: Option<u64>,
}

/// Loads `bytes` for a RAM of `ram_size` bytes starting at `ram_base`.
pub fn load(bytes: &[u8], format: Format, ram_base: u64, ram_size: u64) -> Result<Program> {
    let format = match format {
        Format::Auto if bytes.starts_with(ELF_MAGIC) => Format::Elf,
        Format::Auto => Format::Raw,
        format => format,
    };

    match format {
        Format::Elf => load_elf(bytes, ram_base, ram_size),
        _ => {
            info!("Loading raw image of {} bytes", bytes.len());

            Ok(Program {
                image: bytes.to_vec(),
                entry: None,
            })
        }
    }
}

fn load_elf(bytes: &[u8], ram_base: u64, ram_size: u64) -> Result<Program> {
    let file = object::File::parse(bytes).context("Failed to parse ELF file")?;

    if file.architecture() != Architecture::Riscv64 {
        bail!("Expected a RISC-V 64 executable, got {:?}", file.architecture());
    }

    let mut image = Vec::new();

    for segment in file.segments() {
        let address = segment.address();
        let data = segment
            .data()
            .with_context(|| format!("Failed to read segment at 0x{address:X}"))?;

        if data.is_empty() {
            continue;
        }

        if address < ram_base {
            bail!("Segment at 0x{address:X} lies below the RAM base 0x{ram_base:X}");
        }

        let end = (address - ram_base)
            .checked_add(data.len() as u64)
            .context("Segment end overflows")?;

        if end > ram_size {
            bail!(
                "Segment at 0x{address:X} ({} bytes) does not fit in {ram_size} bytes of RAM",
                data.len()
            );
        }

        let offset = usize::try_from(address - ram_base)?;
        let end = usize::try_from(end)?;

        debug!(
            "Segment at 0x{address:X}, {} bytes from file, {} bytes in memory",
            data.len(),
            segment.size()
        );

        if image.len() < end {
            image.resize(end, 0);
        }

        image[offset..end].copy_from_slice(data);
    }

    info!(
        "Loaded ELF image of {} bytes, entry 0x{:X}",
        image.len(),
        file.entry()
    );

    Ok(Program {
        image,
        entry: Some(file.entry()),
    })
}

#[cfg(test)]
mod tests {
    use super::{load, Format, Program};
    use hex_literal::hex;

    const RAM_BASE: u64 = 0x8000_0000;
    const RAM_SIZE: u64 = 0x1_0000;

    /// ELF64 header, one PT_LOAD program header and 8 bytes of code.
    fn make_elf(vaddr: u64, entry: u64) -> Vec<u8> {
        let mut elf = Vec::new();

        // e_ident: magic, ELFCLASS64, ELFDATA2LSB, EV_CURRENT
        elf.extend_from_slice(&hex!("7f454c46 02 01 01 00 0000000000000000"));
        // e_type = EXEC, e_machine = RISC-V
        elf.extend_from_slice(&2u16.to_le_bytes());
        elf.extend_from_slice(&243u16.to_le_bytes());
        elf.extend_from_slice(&1u32.to_le_bytes());
        elf.extend_from_slice(&entry.to_le_bytes());
        // e_phoff, e_shoff
        elf.extend_from_slice(&64u64.to_le_bytes());
        elf.extend_from_slice(&0u64.to_le_bytes());
        // e_flags
        elf.extend_from_slice(&0u32.to_le_bytes());
        // e_ehsize, e_phentsize, e_phnum, e_shentsize, e_shnum, e_shstrndx
        for value in [64u16, 56, 1, 64, 0, 0] {
            elf.extend_from_slice(&value.to_le_bytes());
        }

        // p_type = PT_LOAD, p_flags = R | X
        elf.extend_from_slice(&1u32.to_le_bytes());
        elf.extend_from_slice(&5u32.to_le_bytes());
        // p_offset, p_vaddr, p_paddr, p_filesz, p_memsz, p_align
        for value in [120u64, vaddr, vaddr, 8, 8, 4] {
            elf.extend_from_slice(&value.to_le_bytes());
        }

        // addi x1, x0, 1
        // jalr x0, 0(x0)
        elf.extend_from_slice(&hex!("93001000 67000000"));

        elf
    }

    #[test]
    fn raw() {
        let bytes = hex!("93001000");

        assert_eq!(
            load(&bytes, Format::Auto, RAM_BASE, RAM_SIZE).unwrap(),
            Program {
                image: bytes.to_vec(),
                entry: None
            }
        );
    }

    #[test]
    fn elf() {
        let elf = make_elf(RAM_BASE + 0x10, RAM_BASE + 0x10);

        for format in [Format::Auto, Format::Elf] {
            let program = load(&elf, format, RAM_BASE, RAM_SIZE).unwrap();

            assert_eq!(program.entry, Some(RAM_BASE + 0x10));
            assert_eq!(program.image.len(), 0x18);
            assert_eq!(program.image[..0x10], [0; 0x10]);
            assert_eq!(program.image[0x10..], hex!("93001000 67000000"));
        }
    }

    #[test]
    fn forced_raw_keeps_elf_bytes() {
        let elf = make_elf(RAM_BASE, RAM_BASE);
        let program = load(&elf, Format::Raw, RAM_BASE, RAM_SIZE).unwrap();

        assert_eq!(program.image, elf);
        assert_eq!(program.entry, None);
    }

    #[test]
    fn segment_below_ram() {
        let elf = make_elf(0x1000, 0x1000);

        assert!(load(&elf, Format::Auto, RAM_BASE, RAM_SIZE).is_err());
    }

    #[test]
    fn segment_above_ram() {
        let elf = make_elf(RAM_BASE + (1 << 42), RAM_BASE);

        assert!(load(&elf, Format::Auto, RAM_BASE, RAM_SIZE).is_err());

        // The last 8 bytes of RAM still fit.
        let elf = make_elf(RAM_BASE + RAM_SIZE - 8, RAM_BASE);
        let program = load(&elf, Format::Auto, RAM_BASE, RAM_SIZE).unwrap();

        assert_eq!(program.image.len() as u64, RAM_SIZE);

        let elf = make_elf(RAM_BASE + RAM_SIZE - 4, RAM_BASE);

        assert!(load(&elf, Format::Auto, RAM_BASE, RAM_SIZE).is_err());
    }

    #[test]
    fn not_an_elf() {
        assert!(load(&hex!("93001000"), Format::Elf, RAM_BASE, RAM_SIZE).is_err());
    }
}
