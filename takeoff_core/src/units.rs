//! # Unit Types
//!
//! Type-safe wrappers for roofing units. These stay lightweight (just f64
//! wrappers) and serialize as bare numbers so the JSON form of a
//! measurement record is clean.
//!
//! ## Roofing Units
//!
//! - Length: feet (ft) for edges such as ridges, eaves, rakes
//! - Area: square feet (sq ft) as reported by aerial-survey vendors
//! - Squares: the trade unit, 1 square = 100 sq ft
//! - Pitch: rise over run, e.g. `6/12`
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::units::{Pitch, SqFt, Squares};
//!
//! let area = SqFt(2450.0);
//! let squares: Squares = area.into();
//! assert_eq!(squares.0, 24.5);
//!
//! let pitch: Pitch = "6/12".parse().unwrap();
//! assert_eq!(pitch.rise, 6);
//! ```

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::TakeoffError;

/// Square feet per roofing square
pub const SQFT_PER_SQUARE: f64 = 100.0;

// ============================================================================
// Length Units
// ============================================================================

/// Length in feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feet(pub f64);

// ============================================================================
// Area Units
// ============================================================================

/// Area in square feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqFt(pub f64);

/// Area in roofing squares (100 sq ft)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Squares(pub f64);

impl From<SqFt> for Squares {
    fn from(sqft: SqFt) -> Self {
        Squares(sqft.0 / SQFT_PER_SQUARE)
    }
}

impl From<Squares> for SqFt {
    fn from(squares: Squares) -> Self {
        SqFt(squares.0 * SQFT_PER_SQUARE)
    }
}

// ============================================================================
// Pitch
// ============================================================================

/// Roof slope as rise over run (`6/12` = 6 inches of rise per 12 of run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    pub rise: u32,
    pub run: u32,
}

impl Pitch {
    pub fn new(rise: u32, run: u32) -> Self {
        Pitch { rise, run }
    }

    /// Rise normalized to a 12-inch run.
    pub fn rise_per_12(&self) -> f64 {
        if self.run == 0 {
            return 0.0;
        }
        self.rise as f64 * 12.0 / self.run as f64
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.rise, self.run)
    }
}

impl FromStr for Pitch {
    type Err = TakeoffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| TakeoffError::invalid_input("pitch", s, reason);

        let (rise, run) = s.trim().split_once('/').ok_or_else(|| invalid("expected rise/run"))?;
        let rise: u32 = rise.trim().parse().map_err(|_| invalid("rise is not an integer"))?;
        let run: u32 = run.trim().parse().map_err(|_| invalid("run is not an integer"))?;
        if run == 0 {
            return Err(invalid("run must be positive"));
        }
        Ok(Pitch { rise, run })
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Feet);
impl_arithmetic!(SqFt);
impl_arithmetic!(Squares);
