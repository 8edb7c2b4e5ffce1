//! C# language levels.
//!
//! A rule declares the minimum level it needs; the registry compares that
//! against the level a run targets. Ordering follows declaration order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target C# language version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LanguageLevel {
    CSharp6 = 6,
    CSharp7 = 7,
    CSharp8 = 8,
    CSharp9 = 9,
    CSharp10 = 10,
    CSharp11 = 11,
    #[default]
    CSharp12 = 12,
    CSharp13 = 13,
}

/// Error returned when a string does not name a known language level
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown C# version: {input} (expected 6 through 13)")]
pub struct LevelParseError {
    pub input: String,
}

impl LanguageLevel {
    /// Every level, oldest first
    pub const ALL: [LanguageLevel; 8] = [
        LanguageLevel::CSharp6,
        LanguageLevel::CSharp7,
        LanguageLevel::CSharp8,
        LanguageLevel::CSharp9,
        LanguageLevel::CSharp10,
        LanguageLevel::CSharp11,
        LanguageLevel::CSharp12,
        LanguageLevel::CSharp13,
    ];

    /// Numeric C# version
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Look up a level by its numeric version
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.ordinal() == ordinal)
    }

    /// Runtime that ships this language version
    pub fn dotnet_version(self) -> &'static str {
        match self {
            LanguageLevel::CSharp6 => ".NET Framework 4.6+ / .NET Core 1.0+",
            LanguageLevel::CSharp7 => ".NET Framework 4.7+ / .NET Core 2.0+",
            LanguageLevel::CSharp8 => ".NET Core 3.0+ / .NET Standard 2.1",
            LanguageLevel::CSharp9 => ".NET 5.0+",
            LanguageLevel::CSharp10 => ".NET 6.0+",
            LanguageLevel::CSharp11 => ".NET 7.0+",
            LanguageLevel::CSharp12 => ".NET 8.0+",
            LanguageLevel::CSharp13 => ".NET 9.0+",
        }
    }

    /// Next newer level, if any
    pub fn next(self) -> Option<Self> {
        Self::from_ordinal(self.ordinal() + 1)
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LanguageLevel::CSharp6 => "C# 6.0",
            LanguageLevel::CSharp7 => "C# 7.x",
            LanguageLevel::CSharp8 => "C# 8.0",
            LanguageLevel::CSharp9 => "C# 9.0",
            LanguageLevel::CSharp10 => "C# 10.0",
            LanguageLevel::CSharp11 => "C# 11.0",
            LanguageLevel::CSharp12 => "C# 12.0",
            LanguageLevel::CSharp13 => "C# 13.0",
        };
        f.write_str(label)
    }
}

impl FromStr for LanguageLevel {
    type Err = LevelParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let lowered = input.trim().to_ascii_lowercase();
        let digits = ["c#", "csharp", "cs"]
            .iter()
            .find_map(|prefix| lowered.strip_prefix(prefix))
            .unwrap_or(&lowered)
            .trim();
        // Accept "12" as well as "12.0" and "7.x"
        let major = digits.split('.').next().unwrap_or_default();

        major
            .parse::<u8>()
            .ok()
            .and_then(Self::from_ordinal)
            .ok_or_else(|| LevelParseError {
                input: input.to_string(),
            })
    }
}

impl TryFrom<String> for LanguageLevel {
    type Error = LevelParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LanguageLevel> for String {
    fn from(level: LanguageLevel) -> Self {
        level.ordinal().to_string()
    }
}
