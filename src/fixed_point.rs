/*
 * 17.14 Fixed-Point Arithmetic
 *
 * The MLFQ scheduler computes load averages and per-thread CPU usage with
 * real-number formulas, but the tick handler cannot touch floating-point
 * state. This module implements the standard 17.14 signed fixed-point
 * representation in a plain i32: 17 integer bits, 14 fraction bits, one
 * sign bit.
 *
 * Multiplication and division of two fixed-point values widen to i64 before
 * shifting so the intermediate product cannot overflow. All conversions
 * truncate toward zero except `to_int_round`, which rounds to nearest.
 */

use core::fmt;
use core::ops::{Add, Sub};

/// The fixed-point fraction unit: 2^14.
const FRACTION: i32 = 1 << 14;

/// A 17.14 signed fixed-point number.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fixed(i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);

    /// Convert an integer to fixed point.
    pub const fn from_int(n: i32) -> Fixed {
        Fixed(n * FRACTION)
    }

    /// Convert to integer, truncating toward zero.
    pub const fn to_int(self) -> i32 {
        self.0 / FRACTION
    }

    /// Convert to integer, rounding to nearest.
    pub const fn to_int_round(self) -> i32 {
        if self.0 >= 0 {
            (self.0 + FRACTION / 2) / FRACTION
        } else {
            (self.0 - FRACTION / 2) / FRACTION
        }
    }

    /// Add an integer.
    pub const fn add_int(self, n: i32) -> Fixed {
        Fixed(self.0 + n * FRACTION)
    }

    /// Subtract an integer.
    pub const fn sub_int(self, n: i32) -> Fixed {
        Fixed(self.0 - n * FRACTION)
    }

    /// Multiply two fixed-point values.
    pub const fn mul(self, other: Fixed) -> Fixed {
        Fixed((self.0 as i64 * other.0 as i64 / FRACTION as i64) as i32)
    }

    /// Multiply by an integer.
    pub const fn mul_int(self, n: i32) -> Fixed {
        Fixed(self.0 * n)
    }

    /// Divide by another fixed-point value.
    pub const fn div(self, other: Fixed) -> Fixed {
        Fixed((self.0 as i64 * FRACTION as i64 / other.0 as i64) as i32)
    }

    /// Divide by an integer.
    pub const fn div_int(self, n: i32) -> Fixed {
        Fixed(self.0 / n)
    }
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, other: Fixed) -> Fixed {
        Fixed(self.0 + other.0)
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, other: Fixed) -> Fixed {
        Fixed(self.0 - other.0)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // two decimal places is enough for load-average style output
        let hundredths = self.mul_int(100).to_int_round();
        let sign = if hundredths < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (hundredths / 100).abs(), (hundredths % 100).abs())
    }
}
