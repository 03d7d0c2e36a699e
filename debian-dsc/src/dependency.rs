// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian package dependency expressions.

Dependency fields like `Build-Depends` hold a comma delimited list of requirements.
Each requirement is a `|` delimited list of alternatives. Each alternative names a
package and optionally constrains its version, the architectures the alternative
applies to and the build profiles it is active in. e.g.

```text
debhelper-compat (= 13), libfoo-dev [linux-any] | libbar-dev, python3:any <!nocheck>
```

See <https://www.debian.org/doc/debian-policy/ch-relationships.html>.
*/

use {
    crate::{
        architecture::{Architecture, ArchitectureRestriction},
        error::{DebianError, Result},
        package_version::PackageVersion,
    },
    once_cell::sync::Lazy,
    regex::Regex,
    std::{
        fmt::{Display, Formatter},
        str::FromStr,
    },
};

static RE_SINGLE_DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^
        (?P<package>[a-zA-Z0-9][a-zA-Z0-9+.\-]*)
        (?::(?P<arch>[a-zA-Z0-9\-]+))?
        \s*
        (?:\(\s*(?P<relop><<|<=|>=|>>|=|<|>)\s*(?P<version>[^\s)]+)\s*\))?
        \s*
        (?:\[(?P<arches>[^\]]*)\])?
        \s*
        (?P<profiles>(?:<[^>]*>\s*)*)
        $
        ",
    )
    .expect("single dependency regex should compile")
});

static RE_PROFILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([^>]*)>").expect("profile regex should compile"));

/// Version relationship operator.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum VersionRelation {
    /// `<<`.
    StrictlyEarlier,
    /// `<=`, or the deprecated `<`.
    EarlierOrEqual,
    /// `=`.
    ExactlyEqual,
    /// `>=`, or the deprecated `>`.
    LaterOrEqual,
    /// `>>`.
    StrictlyLater,
}

impl FromStr for VersionRelation {
    type Err = DebianError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "<<" => Ok(Self::StrictlyEarlier),
            "<=" | "<" => Ok(Self::EarlierOrEqual),
            "=" => Ok(Self::ExactlyEqual),
            ">=" | ">" => Ok(Self::LaterOrEqual),
            ">>" => Ok(Self::StrictlyLater),
            _ => Err(DebianError::DependencyParse(format!(
                "unknown version relation: {}",
                s
            ))),
        }
    }
}

impl Display for VersionRelation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::StrictlyEarlier => "<<",
            Self::EarlierOrEqual => "<=",
            Self::ExactlyEqual => "=",
            Self::LaterOrEqual => ">=",
            Self::StrictlyLater => ">>",
        })
    }
}

/// A version constraint, as in `(>= 1.2)`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DependencyVersionConstraint {
    pub relation: VersionRelation,
    pub version: PackageVersion,
}

impl DependencyVersionConstraint {
    /// Whether a concrete version satisfies this constraint.
    pub fn is_satisfied_by(&self, version: &PackageVersion) -> bool {
        let ordering = version.cmp(&self.version);

        match self.relation {
            VersionRelation::StrictlyEarlier => ordering.is_lt(),
            VersionRelation::EarlierOrEqual => ordering.is_le(),
            VersionRelation::ExactlyEqual => ordering.is_eq(),
            VersionRelation::LaterOrEqual => ordering.is_ge(),
            VersionRelation::StrictlyLater => ordering.is_gt(),
        }
    }
}

impl Display for DependencyVersionConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} {})", self.relation, self.version)
    }
}

/// A single alternative within a dependency expression.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SingleDependency {
    /// Package name, or the full `${...}` text of a substitution variable.
    pub package: String,
    /// Architecture qualifier, as in `python3:any`.
    pub architecture: Option<String>,
    /// Version constraint.
    pub version_constraint: Option<DependencyVersionConstraint>,
    /// Architectures this alternative applies to.
    pub architectures: ArchitectureRestriction,
    /// Build profile formulas, without the enclosing `<>`.
    pub profiles: Vec<String>,
    /// Whether this is an unexpanded substitution variable like `${misc:Depends}`.
    pub substitution_variable: bool,
}

impl SingleDependency {
    /// Parse a single alternative.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.starts_with("${") {
            if !s.ends_with('}') {
                return Err(DebianError::DependencyParse(s.to_string()));
            }

            return Ok(Self {
                package: s.to_string(),
                architecture: None,
                version_constraint: None,
                architectures: ArchitectureRestriction::default(),
                profiles: vec![],
                substitution_variable: true,
            });
        }

        let caps = RE_SINGLE_DEPENDENCY
            .captures(s)
            .ok_or_else(|| DebianError::DependencyParse(s.to_string()))?;

        let package = caps["package"].to_string();
        let architecture = caps.name("arch").map(|m| m.as_str().to_string());

        let version_constraint = match (caps.name("relop"), caps.name("version")) {
            (Some(relop), Some(version)) => Some(DependencyVersionConstraint {
                relation: VersionRelation::from_str(relop.as_str())?,
                version: PackageVersion::parse(version.as_str())?,
            }),
            _ => None,
        };

        let architectures = match caps.name("arches") {
            Some(arches) => ArchitectureRestriction::parse(arches.as_str())?,
            None => ArchitectureRestriction::default(),
        };

        let profiles = caps
            .name("profiles")
            .map(|m| {
                RE_PROFILE
                    .captures_iter(m.as_str())
                    .map(|c| c[1].trim().to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(Self {
            package,
            architecture,
            version_constraint,
            architectures,
            profiles,
            substitution_variable: false,
        })
    }

    /// Whether this alternative is relevant when building for `arch`.
    pub fn applies_to(&self, arch: &Architecture) -> bool {
        self.architectures.matches(arch)
    }

    /// Whether a package at `version` satisfies this alternative's version constraint.
    ///
    /// Alternatives without a constraint are satisfied by any version.
    pub fn is_satisfied_by(&self, version: &PackageVersion) -> bool {
        self.version_constraint
            .as_ref()
            .map_or(true, |c| c.is_satisfied_by(version))
    }
}

impl Display for SingleDependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.package)?;

        if let Some(arch) = &self.architecture {
            write!(f, ":{}", arch)?;
        }
        if let Some(constraint) = &self.version_constraint {
            write!(f, " {}", constraint)?;
        }
        if !self.architectures.is_empty() {
            write!(f, " {}", self.architectures)?;
        }
        for profile in &self.profiles {
            write!(f, " <{}>", profile)?;
        }

        Ok(())
    }
}

/// A `|` delimited set of alternatives, any one of which satisfies the requirement.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct DependencyVariants(Vec<SingleDependency>);

impl DependencyVariants {
    /// Parse a `|` delimited requirement.
    pub fn parse(s: &str) -> Result<Self> {
        Ok(Self(
            s.split('|')
                .map(SingleDependency::parse)
                .collect::<Result<Vec<_>>>()?,
        ))
    }

    /// Iterate over alternatives.
    pub fn iter(&self) -> impl Iterator<Item = &SingleDependency> {
        self.0.iter()
    }
}

impl Display for DependencyVariants {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let parts = self.0.iter().map(|d| d.to_string()).collect::<Vec<_>>();

        f.write_str(&parts.join(" | "))
    }
}

/// A comma delimited list of requirements.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct DependencyList {
    requirements: Vec<DependencyVariants>,
}

impl DependencyList {
    /// Parse a dependency field value.
    ///
    /// Empty entries (e.g. from a trailing comma) are ignored.
    pub fn parse(s: &str) -> Result<Self> {
        let requirements = s
            .split(',')
            .map(|x| x.trim())
            .filter(|x| !x.is_empty())
            .map(DependencyVariants::parse)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { requirements })
    }

    /// Whether no requirements are present.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Iterate over requirements.
    pub fn requirements(&self) -> impl Iterator<Item = &DependencyVariants> {
        self.requirements.iter()
    }

    /// Every concrete alternative that applies to `arch`, in declaration order.
    ///
    /// Substitution variables never appear in the result.
    pub fn possibilities<'a>(
        &'a self,
        arch: &'a Architecture,
    ) -> impl Iterator<Item = &'a SingleDependency> + 'a {
        self.requirements
            .iter()
            .flat_map(|variants| variants.iter())
            .filter(move |dep| !dep.substitution_variable && dep.applies_to(arch))
    }
}

impl FromStr for DependencyList {
    type Err = DebianError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for DependencyList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let parts = self
            .requirements
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>();

        f.write_str(&parts.join(", "))
    }
}
