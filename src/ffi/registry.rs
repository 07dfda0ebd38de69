//! Compiled-in catalogue of table-driven FreeImageAlgorithms functions.
//!
//! Every descriptor's first parameter is the implicit image handle. The
//! catalogue is closed: there is no way to register functions at runtime.

use std::fmt;
use std::str::FromStr;

use crate::error::{FiaError, Result};

/// Kind of one native parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// The implicit `FIBITMAP*`, always slot 0.
    Image,
    /// `int`, passed by value.
    Int,
    /// `double`, passed by value.
    Double,
    /// `const char*`, NUL-terminated.
    Str,
    /// `double*` the native function writes its result into.
    OutDouble,
}

impl ParamKind {
    pub fn is_out(self) -> bool {
        matches!(self, ParamKind::OutDouble)
    }
}

/// Native return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Void,
    Int,
    Double,
}

/// Call signature of one native function.
#[derive(Debug, PartialEq)]
pub struct FunctionDescriptor {
    /// Logical operation name.
    pub name: &'static str,
    /// Exported symbol in the native library.
    pub symbol: &'static str,
    pub ret: ReturnKind,
    /// Parameter kinds in declaration order, image slot included.
    pub params: &'static [ParamKind],
}

impl FunctionDescriptor {
    /// Parameters the caller supplies, i.e. everything after the image slot.
    pub fn trailing_params(&self) -> &'static [ParamKind] {
        self.params.get(1..).unwrap_or(&[])
    }

    /// Number of out-parameters, which is also the number of extra values
    /// returned by an invocation.
    pub fn out_count(&self) -> usize {
        self.params.iter().filter(|p| p.is_out()).count()
    }
}

/// The closed set of table-driven operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SetRainBowPalette,
    HistEq,
    GetGreyLevelAverage,
    MonoImageFindWhiteArea,
    SetGreyLevelPalette,
    SetLogColourPalette,
    SetTemperaturePalette,
    SetFalseColourPalette,
    IsGreyScale,
    FindMinMax,
    GetMaxPossibleValue,
    GetMinPossibleValue,
    SaveToFile,
}

use ParamKind::{Double, Image, Int, OutDouble, Str};

// Indexed by `Operation as usize`.
static DESCRIPTORS: [FunctionDescriptor; 13] = [
    FunctionDescriptor {
        name: "setRainBowPalette",
        symbol: "FIA_SetRainBowPalette",
        ret: ReturnKind::Int,
        params: &[Image],
    },
    FunctionDescriptor {
        name: "histEq",
        symbol: "FIA_HistEq",
        ret: ReturnKind::Int,
        params: &[Image],
    },
    FunctionDescriptor {
        name: "getGreyLevelAverage",
        symbol: "FIA_GetGreyLevelAverage",
        ret: ReturnKind::Double,
        params: &[Image],
    },
    FunctionDescriptor {
        name: "monoImageFindWhiteArea",
        symbol: "FIA_MonoImageFindWhiteArea",
        ret: ReturnKind::Int,
        params: &[Image, OutDouble],
    },
    FunctionDescriptor {
        name: "setGreyLevelPalette",
        symbol: "FIA_SetGreyLevelPalette",
        ret: ReturnKind::Int,
        params: &[Image],
    },
    FunctionDescriptor {
        name: "setLogColourPalette",
        symbol: "FIA_SetLogColourPalette",
        ret: ReturnKind::Int,
        params: &[Image],
    },
    FunctionDescriptor {
        name: "setTemperaturePalette",
        symbol: "FIA_SetTemperaturePalette",
        ret: ReturnKind::Int,
        params: &[Image],
    },
    FunctionDescriptor {
        name: "setFalseColourPalette",
        symbol: "FIA_SetFalseColourPalette",
        ret: ReturnKind::Int,
        params: &[Image, Double],
    },
    FunctionDescriptor {
        name: "isGreyScale",
        symbol: "FIA_IsGreyScale",
        ret: ReturnKind::Int,
        params: &[Image],
    },
    FunctionDescriptor {
        name: "findMinMax",
        symbol: "FIA_FindMinMax",
        ret: ReturnKind::Void,
        params: &[Image, OutDouble, OutDouble],
    },
    FunctionDescriptor {
        name: "getMaxPossibleValue",
        symbol: "FIA_GetMaxPosibleValueForFib",
        ret: ReturnKind::Void,
        params: &[Image, OutDouble],
    },
    FunctionDescriptor {
        name: "getMinPossibleValue",
        symbol: "FIA_GetMinPosibleValueForFib",
        ret: ReturnKind::Void,
        params: &[Image, OutDouble],
    },
    FunctionDescriptor {
        name: "saveToFile",
        symbol: "FIA_SaveFIBToFile",
        ret: ReturnKind::Int,
        params: &[Image, Str, Int],
    },
];

impl Operation {
    pub const ALL: [Operation; 13] = [
        Operation::SetRainBowPalette,
        Operation::HistEq,
        Operation::GetGreyLevelAverage,
        Operation::MonoImageFindWhiteArea,
        Operation::SetGreyLevelPalette,
        Operation::SetLogColourPalette,
        Operation::SetTemperaturePalette,
        Operation::SetFalseColourPalette,
        Operation::IsGreyScale,
        Operation::FindMinMax,
        Operation::GetMaxPossibleValue,
        Operation::GetMinPossibleValue,
        Operation::SaveToFile,
    ];

    pub fn descriptor(self) -> &'static FunctionDescriptor {
        &DESCRIPTORS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = FiaError;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| FiaError::unknown_operation(s))
    }
}

/// All descriptors, in catalogue order.
pub fn descriptors() -> &'static [FunctionDescriptor] {
    &DESCRIPTORS
}

/// Look up a descriptor by logical operation name.
pub fn lookup(name: &str) -> Result<&'static FunctionDescriptor> {
    name.parse::<Operation>().map(Operation::descriptor)
}
