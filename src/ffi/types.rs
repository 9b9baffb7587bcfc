//! Kernel Type System
//!
//! Names every kernel operation, its exported symbols and its calling shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Parameter types that appear in kernel signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Signed 64-bit element count
    I64,
    /// Double passed by value
    F64,
    /// Output buffer (double*)
    OutPtr,
    /// Input buffer (const double*)
    InPtr,
}

impl ParamType {
    /// Check if this type is a buffer pointer
    pub fn is_pointer(&self) -> bool {
        matches!(self, ParamType::OutPtr | ParamType::InPtr)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::I64 => write!(f, "i64"),
            ParamType::F64 => write!(f, "f64"),
            ParamType::OutPtr => write!(f, "f64*"),
            ParamType::InPtr => write!(f, "const f64*"),
        }
    }
}

/// Calling shape shared by a group of kernels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelShape {
    /// `(n, out, in)`
    Unary,
    /// `(n, out, a, b)`
    Binary,
    /// `(n, out[1], a, b)`
    Reduce2,
    /// `(n, out[1], in)`
    Reduce1,
    /// `(n, out, in, factor)`
    Scaled,
    /// `(n, out_x, out_y, in_x, in_y, angle)`
    Rotate,
}

impl KernelShape {
    /// Parameter list, in ABI order
    pub fn params(&self) -> &'static [ParamType] {
        use ParamType::*;
        match self {
            KernelShape::Unary | KernelShape::Reduce1 => &[I64, OutPtr, InPtr],
            KernelShape::Binary | KernelShape::Reduce2 => &[I64, OutPtr, InPtr, InPtr],
            KernelShape::Scaled => &[I64, OutPtr, InPtr, F64],
            KernelShape::Rotate => &[I64, OutPtr, OutPtr, InPtr, InPtr, F64],
        }
    }

    /// Number of input buffers
    pub fn inputs(&self) -> usize {
        self.params()
            .iter()
            .filter(|p| **p == ParamType::InPtr)
            .count()
    }

    /// Whether the result is a single scalar
    pub fn is_reduction(&self) -> bool {
        matches!(self, KernelShape::Reduce1 | KernelShape::Reduce2)
    }
}

/// Number of kernel operations
pub const OP_COUNT: usize = 13;

/// A kernel operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Poly,
    Sin,
    Cos,
    Tan,
    Add,
    Sub,
    Mul,
    Div,
    Dot,
    Magnitude,
    Normalize,
    Scale,
    Rotate2d,
}

impl Op {
    /// Every operation, in table order
    pub const ALL: [Op; OP_COUNT] = [
        Op::Poly,
        Op::Sin,
        Op::Cos,
        Op::Tan,
        Op::Add,
        Op::Sub,
        Op::Mul,
        Op::Div,
        Op::Dot,
        Op::Magnitude,
        Op::Normalize,
        Op::Scale,
        Op::Rotate2d,
    ];

    /// Short operation name
    pub fn name(&self) -> &'static str {
        match self {
            Op::Poly => "poly",
            Op::Sin => "sin",
            Op::Cos => "cos",
            Op::Tan => "tan",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Dot => "dot",
            Op::Magnitude => "magnitude",
            Op::Normalize => "normalize",
            Op::Scale => "scale",
            Op::Rotate2d => "rotate2d",
        }
    }

    /// Exported symbol name
    pub fn symbol(&self) -> &'static str {
        match self {
            Op::Poly => "kernel_poly",
            Op::Sin => "kernel_sin",
            Op::Cos => "kernel_cos",
            Op::Tan => "kernel_tan",
            Op::Add => "kernel_add",
            Op::Sub => "kernel_sub",
            Op::Mul => "kernel_mul",
            Op::Div => "kernel_div",
            Op::Dot => "kernel_dot",
            Op::Magnitude => "kernel_magnitude",
            Op::Normalize => "kernel_normalize",
            Op::Scale => "kernel_scale",
            Op::Rotate2d => "kernel_rotate2d",
        }
    }

    /// Symbol exported by the older multi-toolchain `aranya_prime` artifacts.
    ///
    /// Same calling convention, different names.
    pub fn legacy_symbol(&self) -> &'static str {
        match self {
            Op::Poly => "prime_poly",
            Op::Sin => "prime_sin",
            Op::Cos => "prime_cos",
            Op::Tan => "prime_tan",
            Op::Add => "prime_math_sum",
            Op::Sub => "prime_sub",
            Op::Mul => "prime_mul",
            Op::Div => "prime_div",
            Op::Dot => "prime_dot",
            Op::Magnitude => "prime_mag",
            Op::Normalize => "prime_normalize",
            Op::Scale => "prime_scale",
            Op::Rotate2d => "prime_rotate_2d",
        }
    }

    /// Calling shape
    pub fn shape(&self) -> KernelShape {
        match self {
            Op::Poly | Op::Sin | Op::Cos | Op::Tan | Op::Normalize => KernelShape::Unary,
            Op::Add | Op::Sub | Op::Mul | Op::Div => KernelShape::Binary,
            Op::Dot => KernelShape::Reduce2,
            Op::Magnitude => KernelShape::Reduce1,
            Op::Scale => KernelShape::Scaled,
            Op::Rotate2d => KernelShape::Rotate,
        }
    }

    /// Signature of the exported symbol
    pub fn signature(&self) -> KernelSignature {
        KernelSignature {
            symbol: self.symbol(),
            params: self.shape().params(),
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Op {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "poly" | "polynomial" => Ok(Op::Poly),
            "sin" => Ok(Op::Sin),
            "cos" => Ok(Op::Cos),
            "tan" => Ok(Op::Tan),
            "add" | "sum" => Ok(Op::Add),
            "sub" => Ok(Op::Sub),
            "mul" => Ok(Op::Mul),
            "div" => Ok(Op::Div),
            "dot" => Ok(Op::Dot),
            "magnitude" | "mag" | "norm" => Ok(Op::Magnitude),
            "normalize" => Ok(Op::Normalize),
            "scale" => Ok(Op::Scale),
            "rotate2d" | "rotate_2d" | "rotate" => Ok(Op::Rotate2d),
            other => Err(format!("unknown kernel operation '{}'", other)),
        }
    }
}

/// Exported function signature of a kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelSignature {
    /// Symbol name
    pub symbol: &'static str,
    /// Parameter types
    pub params: &'static [ParamType],
}

impl fmt::Display for KernelSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "void {}(", self.symbol)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}
