use vm::{
    csr,
    registers::{Register, REGISTER_COUNT},
    Hart,
};

/// Lays out `cells` four to a line.
fn columns(cells: impl Iterator<Item = String>) -> String {
    let cells: Vec<String> = cells.collect();

    cells
        .chunks(4)
        .map(|line| line.join(" ") + "\n")
        .collect()
}

/// Renders the architectural state of `hart`. `csrs` adds every non-zero CSR.
pub fn dump(hart: &Hart, csrs: bool) -> String {
    let mut out = format!("pc = 0x{:016X} ({})\n", hart.pc(), hart.privilege_level());

    out.push_str(&columns((0..REGISTER_COUNT).map(|index| {
        let name = Register::new(index as u8).map_or("?", |r| r.abi_name());

        format!("x{index:<2} {name:>4} = 0x{:016X}", hart.read_register(index))
    })));

    out.push_str(&columns(
        hart.registers()
            .float_registers()
            .iter()
            .enumerate()
            .map(|(index, value)| format!("f{index:<2} = 0x{value:016X}")),
    ));

    if csrs {
        for (address, value) in hart.csr().memory().iter().enumerate() {
            if *value == 0 {
                continue;
            }

            let address = address as u16;
            let name = csr::name(address).unwrap_or("");

            out.push_str(&format!("{name:>9} (0x{address:03X}) = 0x{value:016X}\n"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::dump;
    use vm::{Hart, HartConfig};

    #[test]
    fn registers_and_csrs() {
        let hart = Hart::with_config(HartConfig::default(), &[]).unwrap();
        let out = dump(&hart, true);

        assert!(out.starts_with("pc = 0x0000000080000000 (M)\n"));
        assert!(out.contains("x2    sp = 0x0000000088000000"));
        assert!(out.contains("f31 = 0x0000000000000000\n"));
        assert!(out.contains("     misa (0x301) = 0x8000000000141101\n"));
        assert!(!out.contains("mhartid"));

        // pc, eight lines each of x and f registers, misa.
        assert_eq!(out.lines().count(), 18);
        assert_eq!(
            out.lines().nth(1),
            Some(
                "x0  zero = 0x0000000000000000 x1    ra = 0x0000000000000000 \
                 x2    sp = 0x0000000088000000 x3    gp = 0x0000000000000000"
            )
        );

        assert!(!dump(&hart, false).contains("misa"));
    }
}
