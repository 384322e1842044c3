/*++

Licensed under the Apache-2.0 license.

File Name:

    params.rs

Abstract:

    File contains the typed parameter model shared by every pseudo-TA.

--*/

use te_error::{TeError, TeResult};

pub const NUM_PARAMS: usize = 4;

/// Direction and kind of one parameter slot.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ParamType {
    None = 0,
    ValueInput = 1,
    ValueOutput = 2,
    ValueInout = 3,
    MemrefInput = 5,
    MemrefOutput = 6,
    MemrefInout = 7,
}

/// Packed signature of four parameter types, four bits per slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ParamTypes(pub u32);

impl ParamTypes {
    pub const fn new(types: [ParamType; NUM_PARAMS]) -> Self {
        Self(
            types[0] as u32
                | (types[1] as u32) << 4
                | (types[2] as u32) << 8
                | (types[3] as u32) << 12,
        )
    }

    pub const NONE: Self = Self::new([ParamType::None; NUM_PARAMS]);

    pub fn of(params: &Params<'_>) -> Self {
        Self::new([
            params[0].param_type(),
            params[1].param_type(),
            params[2].param_type(),
            params[3].param_type(),
        ])
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Value {
    pub a: u32,
    pub b: u32,
}

/// Shared memory handed over by the caller.
///
/// For inputs `size` is the length of the payload. For outputs it is the
/// capacity on entry and the number of bytes produced on return.
#[derive(Debug, Eq, PartialEq)]
pub struct Memref<'a> {
    pub buf: &'a mut [u8],
    pub size: usize,
}

impl<'a> Memref<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        let size = buf.len();
        Self { buf, size }
    }

    /// The declared bytes, clipped to the backing buffer.
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.size.min(self.buf.len())]
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        let len = self.size.min(self.buf.len());
        &mut self.buf[..len]
    }
}

#[derive(Debug, Default, Eq, PartialEq)]
pub enum TeeParam<'a> {
    #[default]
    None,
    ValueInput(Value),
    ValueOutput(Value),
    ValueInout(Value),
    MemrefInput(Memref<'a>),
    MemrefOutput(Memref<'a>),
    MemrefInout(Memref<'a>),
}

impl<'a> TeeParam<'a> {
    pub fn value_in(a: u32, b: u32) -> Self {
        Self::ValueInput(Value { a, b })
    }

    pub fn value_out() -> Self {
        Self::ValueOutput(Value::default())
    }

    pub fn value_inout(a: u32, b: u32) -> Self {
        Self::ValueInout(Value { a, b })
    }

    pub fn param_type(&self) -> ParamType {
        match self {
            Self::None => ParamType::None,
            Self::ValueInput(_) => ParamType::ValueInput,
            Self::ValueOutput(_) => ParamType::ValueOutput,
            Self::ValueInout(_) => ParamType::ValueInout,
            Self::MemrefInput(_) => ParamType::MemrefInput,
            Self::MemrefOutput(_) => ParamType::MemrefOutput,
            Self::MemrefInout(_) => ParamType::MemrefInout,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::ValueInput(v) | Self::ValueOutput(v) | Self::ValueInout(v) => Some(v),
            _ => None,
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut Value> {
        match self {
            Self::ValueInput(v) | Self::ValueOutput(v) | Self::ValueInout(v) => Some(v),
            _ => None,
        }
    }

    pub fn memref(&self) -> Option<&Memref<'a>> {
        match self {
            Self::MemrefInput(m) | Self::MemrefOutput(m) | Self::MemrefInout(m) => Some(m),
            _ => None,
        }
    }

    pub fn memref_mut(&mut self) -> Option<&mut Memref<'a>> {
        match self {
            Self::MemrefInput(m) | Self::MemrefOutput(m) | Self::MemrefInout(m) => Some(m),
            _ => None,
        }
    }
}

pub type Params<'a> = [TeeParam<'a>; NUM_PARAMS];

/// Rejects a call whose parameter types differ from `expected`.
pub fn check_param_types(params: &Params<'_>, expected: ParamTypes) -> TeResult<()> {
    if ParamTypes::of(params) != expected {
        return Err(TeError::RUNTIME_BAD_PARAM_TYPES);
    }
    Ok(())
}

// The accessors below are only used after `check_param_types`, so a
// mismatch can only come from a service bug and is reported the same way.

pub(crate) fn value(params: &Params<'_>, idx: usize) -> TeResult<Value> {
    params[idx]
        .value()
        .copied()
        .ok_or(TeError::RUNTIME_BAD_PARAM_TYPES)
}

pub(crate) fn value_mut<'p>(params: &'p mut Params<'_>, idx: usize) -> TeResult<&'p mut Value> {
    params[idx]
        .value_mut()
        .ok_or(TeError::RUNTIME_BAD_PARAM_TYPES)
}

pub(crate) fn memref<'p, 'a>(params: &'p Params<'a>, idx: usize) -> TeResult<&'p Memref<'a>> {
    params[idx].memref().ok_or(TeError::RUNTIME_BAD_PARAM_TYPES)
}

pub(crate) fn memref_mut<'p, 'a>(
    params: &'p mut Params<'a>,
    idx: usize,
) -> TeResult<&'p mut Memref<'a>> {
    params[idx]
        .memref_mut()
        .ok_or(TeError::RUNTIME_BAD_PARAM_TYPES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_types_packing() {
        let types = ParamTypes::new([
            ParamType::ValueInput,
            ParamType::ValueInput,
            ParamType::ValueInout,
            ParamType::ValueInput,
        ]);
        assert_eq!(types, ParamTypes(0x1311));
        assert_eq!(ParamTypes::NONE, ParamTypes(0));
    }

    #[test]
    fn test_check_param_types() {
        let mut data = [0u8; 4];
        let params = [
            TeeParam::MemrefOutput(Memref::new(&mut data)),
            TeeParam::value_out(),
            TeeParam::None,
            TeeParam::None,
        ];
        let expected = ParamTypes::new([
            ParamType::MemrefOutput,
            ParamType::ValueOutput,
            ParamType::None,
            ParamType::None,
        ]);
        assert_eq!(check_param_types(&params, expected), Ok(()));
        assert_eq!(
            check_param_types(&params, ParamTypes::NONE),
            Err(TeError::RUNTIME_BAD_PARAM_TYPES)
        );
    }

    #[test]
    fn test_memref_data_is_clipped() {
        let mut data = [1u8, 2, 3];
        let mut memref = Memref::new(&mut data);
        memref.size = 8;
        assert_eq!(memref.data(), &[1, 2, 3]);
        memref.size = 2;
        assert_eq!(memref.data_mut(), &mut [1, 2]);
    }
}
