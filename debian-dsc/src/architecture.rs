// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian architecture names and wildcards.

Debian names architectures with strings like `amd64`, `kfreebsd-i386` or
`musl-linux-arm64`. Each name expands to a triple of ABI, operating system and CPU.
The special values `any` and `all` expand to the same value in all three components.

See <https://www.debian.org/doc/debian-policy/ch-customized-programs.html#architecture-specification-strings>.
*/

use {
    crate::error::{DebianError, Result},
    std::{
        fmt::{Display, Formatter},
        str::FromStr,
    },
};

/// Value that matches any component.
pub const ANY: &str = "any";

/// Value denoting architecture independent content.
pub const ALL: &str = "all";

/// A Debian architecture triple.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Architecture {
    abi: String,
    os: String,
    cpu: String,
}

impl Architecture {
    /// Construct an instance from explicit components.
    pub fn new(abi: impl ToString, os: impl ToString, cpu: impl ToString) -> Self {
        Self {
            abi: abi.to_string(),
            os: os.to_string(),
            cpu: cpu.to_string(),
        }
    }

    /// The `all` architecture.
    pub fn all() -> Self {
        Self::new(ALL, ALL, ALL)
    }

    /// The `any` wildcard.
    pub fn any() -> Self {
        Self::new(ANY, ANY, ANY)
    }

    /// Parse an architecture name.
    ///
    /// One component is a CPU on GNU/Linux, two components are `os-cpu` on GNU and three
    /// components are `abi-os-cpu`. A two component wildcard such as `linux-any` or
    /// `any-amd64` leaves the ABI open as well.
    pub fn parse(s: &str) -> Result<Self> {
        let parts = s.trim().split('-').collect::<Vec<_>>();

        if parts.iter().any(|p| p.is_empty()) {
            return Err(DebianError::ArchitectureParse(s.to_string()));
        }

        Ok(match parts.as_slice() {
            [ALL] => Self::all(),
            [ANY] => Self::any(),
            [cpu] => Self::new("gnu", "linux", cpu),
            [os, cpu] if *os == ANY || *cpu == ANY => Self::new(ANY, os, cpu),
            [os, cpu] => Self::new("gnu", os, cpu),
            [abi, os, cpu] => Self::new(abi, os, cpu),
            _ => return Err(DebianError::ArchitectureParse(s.to_string())),
        })
    }

    /// The ABI component.
    pub fn abi(&self) -> &str {
        &self.abi
    }

    /// The operating system component.
    pub fn os(&self) -> &str {
        &self.os
    }

    /// The CPU component.
    pub fn cpu(&self) -> &str {
        &self.cpu
    }

    /// Whether this is exactly the `all` architecture.
    pub fn is_all(&self) -> bool {
        self.abi == ALL && self.os == ALL && self.cpu == ALL
    }

    /// Whether this architecture matches another.
    ///
    /// Components are compared pairwise and `any` on either side matches everything.
    /// `all` is only matched by `all` or `any`.
    pub fn is(&self, other: &Self) -> bool {
        let component = |a: &str, b: &str| a == ANY || b == ANY || a == b;

        component(&self.abi, &other.abi)
            && component(&self.os, &other.os)
            && component(&self.cpu, &other.cpu)
    }
}

impl FromStr for Architecture {
    type Err = DebianError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Architecture {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Emit the shortest name that parses back to the same triple.
        let two_part_abi = if self.os == ANY || self.cpu == ANY {
            ANY
        } else {
            "gnu"
        };

        if self.abi == self.os && self.os == self.cpu && (self.cpu == ALL || self.cpu == ANY) {
            write!(f, "{}", self.cpu)
        } else if self.abi == "gnu" && self.os == "linux" && self.cpu != ANY {
            write!(f, "{}", self.cpu)
        } else if self.abi == two_part_abi {
            write!(f, "{}-{}", self.os, self.cpu)
        } else {
            write!(f, "{}-{}-{}", self.abi, self.os, self.cpu)
        }
    }
}

/// An architecture restriction list, as in `foo [amd64 i386]` or `foo [!hurd-any]`.
///
/// Debian requires all entries to be negated or none of them. An empty restriction
/// matches every architecture.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct ArchitectureRestriction {
    negated: bool,
    architectures: Vec<Architecture>,
}

impl ArchitectureRestriction {
    /// Parse the content between the brackets.
    pub fn parse(s: &str) -> Result<Self> {
        let mut negated = None;
        let mut architectures = vec![];

        for word in s.split_ascii_whitespace() {
            let (is_negated, name) = match word.strip_prefix('!') {
                Some(name) => (true, name),
                None => (false, word),
            };

            match negated {
                Some(previous) if previous != is_negated => {
                    return Err(DebianError::ArchitectureParse(format!(
                        "mixed negated and plain architectures in [{}]",
                        s
                    )));
                }
                _ => {
                    negated = Some(is_negated);
                }
            }

            architectures.push(Architecture::parse(name)?);
        }

        Ok(Self {
            negated: negated.unwrap_or(false),
            architectures,
        })
    }

    /// Whether the restriction has no entries.
    pub fn is_empty(&self) -> bool {
        self.architectures.is_empty()
    }

    /// Whether entries are negated (`!arch`).
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Architectures named by this restriction.
    pub fn architectures(&self) -> impl Iterator<Item = &Architecture> {
        self.architectures.iter()
    }

    /// Whether a dependency carrying this restriction applies to `arch`.
    pub fn matches(&self, arch: &Architecture) -> bool {
        if self.architectures.is_empty() {
            return true;
        }

        let hit = self.architectures.iter().any(|a| a.is(arch));

        if self.negated {
            !hit
        } else {
            hit
        }
    }
}

impl Display for ArchitectureRestriction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let words = self
            .architectures
            .iter()
            .map(|a| format!("{}{}", if self.negated { "!" } else { "" }, a))
            .collect::<Vec<_>>();

        write!(f, "[{}]", words.join(" "))
    }
}
