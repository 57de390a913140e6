use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrivilegeLevel {
    User = 0,
    Supervisor = 1,
    Machine = 3,
}

impl PrivilegeLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            PrivilegeLevel::User => 0b00,
            PrivilegeLevel::Supervisor => 0b01,
            PrivilegeLevel::Machine => 0b11,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0b00 => Some(Self::User),
            0b01 => Some(Self::Supervisor),
            0b11 => Some(Self::Machine),
            _ => None,
        }
    }

    /// Decodes the 2-bit `mstatus.MPP` field. The reserved encoding `0b10`
    /// is legalized to [PrivilegeLevel::User].
    pub fn from_mpp(value: u64) -> Self {
        Self::from_u8((value & 0b11) as u8).unwrap_or(Self::User)
    }

    /// Decodes the 1-bit `sstatus.SPP` field.
    pub fn from_spp(set: bool) -> Self {
        if set {
            Self::Supervisor
        } else {
            Self::User
        }
    }
}

impl fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrivilegeLevel::User => "U",
            PrivilegeLevel::Supervisor => "S",
            PrivilegeLevel::Machine => "M",
        };

        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::PrivilegeLevel;

    #[test]
    fn mpp() {
        assert_eq!(PrivilegeLevel::from_mpp(0b00), PrivilegeLevel::User);
        assert_eq!(PrivilegeLevel::from_mpp(0b01), PrivilegeLevel::Supervisor);
        assert_eq!(PrivilegeLevel::from_mpp(0b10), PrivilegeLevel::User);
        assert_eq!(PrivilegeLevel::from_mpp(0b11), PrivilegeLevel::Machine);
    }

    #[test]
    fn ordering() {
        assert!(PrivilegeLevel::Machine > PrivilegeLevel::Supervisor);
        assert!(PrivilegeLevel::Supervisor > PrivilegeLevel::User);
        assert_eq!(PrivilegeLevel::Machine.as_u8(), 3);
    }
}
