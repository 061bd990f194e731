//! Tone mapping operators and their integer codes

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors produced when selecting a tone mapping operator
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToneMappingError {
    #[error("Unrecognized tone mapping code {0}")]
    Unrecognized(i32),
}

/// Operator applied to linear HDR color before output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToneMapping {
    None,
    Linear,
    Reinhard,
    Cineon,
    #[default]
    AcesFilmic,
}

impl ToneMapping {
    /// Every operator in code order
    pub const ALL: [ToneMapping; 5] = [
        ToneMapping::None,
        ToneMapping::Linear,
        ToneMapping::Reinhard,
        ToneMapping::Cineon,
        ToneMapping::AcesFilmic,
    ];

    /// Integer code shared with the panel and the shaders
    pub fn code(self) -> i32 {
        match self {
            ToneMapping::None => 0,
            ToneMapping::Linear => 1,
            ToneMapping::Reinhard => 2,
            ToneMapping::Cineon => 3,
            ToneMapping::AcesFilmic => 4,
        }
    }

    /// Label shown in the panel
    pub fn label(self) -> &'static str {
        match self {
            ToneMapping::None => "No",
            ToneMapping::Linear => "Linear",
            ToneMapping::Reinhard => "Reinhard",
            ToneMapping::Cineon => "Cineon",
            ToneMapping::AcesFilmic => "ACESFilmic",
        }
    }
}

impl TryFrom<i32> for ToneMapping {
    type Error = ToneMappingError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        ToneMapping::ALL
            .into_iter()
            .find(|mapping| mapping.code() == code)
            .ok_or(ToneMappingError::Unrecognized(code))
    }
}

impl fmt::Display for ToneMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
