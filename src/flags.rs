use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Option bits handed to the classification engine when it is built.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags              = Flags(0x000000);
    pub const DEBUG: Flags             = Flags(0x000001);
    pub const SYMLINK: Flags           = Flags(0x000002);
    pub const COMPRESS: Flags          = Flags(0x000004);
    pub const DEVICES: Flags           = Flags(0x000008);
    pub const MIME_TYPE: Flags         = Flags(0x000010);
    pub const CONTINUE: Flags          = Flags(0x000020);
    pub const CHECK: Flags             = Flags(0x000040);
    pub const RAW: Flags               = Flags(0x000100);
    pub const MIME_ENCODING: Flags     = Flags(0x000400);
    pub const MIME: Flags              = Flags(0x000410);
    pub const NO_CHECK_COMPRESS: Flags = Flags(0x001000);
    pub const NO_CHECK_TAR: Flags      = Flags(0x002000);
    pub const NO_CHECK_SOFT: Flags     = Flags(0x004000);
    pub const NO_CHECK_APPTYPE: Flags  = Flags(0x008000);
    pub const NO_CHECK_ASCII: Flags    = Flags(0x020000);
    pub const NO_CHECK_TOKENS: Flags   = Flags(0x100000);

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    /// The bit that `-e <name>` turns on, if `name` is a known check.
    pub fn exclusion(name: &str) -> Option<Flags> {
        EXCLUDABLE_CHECKS
            .iter()
            .find(|(check, _)| *check == name)
            .map(|&(_, flag)| flag)
    }
}

/// Built-in checks that `-e` can switch off.
pub const EXCLUDABLE_CHECKS: &[(&str, Flags)] = &[
    ("apptype",  Flags::NO_CHECK_APPTYPE),
    ("ascii",    Flags::NO_CHECK_ASCII),
    ("compress", Flags::NO_CHECK_COMPRESS),
    ("soft",     Flags::NO_CHECK_SOFT),
    ("tar",      Flags::NO_CHECK_TAR),
    ("tokens",   Flags::NO_CHECK_TOKENS),
];

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flags({:#08x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Flags;

    #[test]
    fn mime_covers_both_halves() {
        assert!(Flags::MIME.contains(Flags::MIME_TYPE));
        assert!(Flags::MIME.contains(Flags::MIME_ENCODING));
        assert!(!Flags::MIME_TYPE.contains(Flags::MIME));
    }

    #[test]
    fn exclusions() {
        assert_eq!(Some(Flags::NO_CHECK_SOFT), Flags::exclusion("soft"));
        assert_eq!(Some(Flags::NO_CHECK_TOKENS), Flags::exclusion("tokens"));
        assert_eq!(None, Flags::exclusion("elf"));
        assert_eq!(None, Flags::exclusion("Soft"));
    }
}
