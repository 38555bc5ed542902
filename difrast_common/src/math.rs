// Copyright 2025 the Difrast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Small fixed-size vector types with componentwise arithmetic.
//!
//! These mirror the two to four component vector types of device code. All operators act
//! componentwise; a scalar operand is broadcast to every component.

use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use bytemuck::{Pod, Zeroable};

/// Types with an additive identity, used to reset accumulators.
pub trait Zero: Copy {
    fn zero_value() -> Self;
}

impl Zero for f32 {
    fn zero_value() -> Self {
        0.0
    }
}

impl Zero for i32 {
    fn zero_value() -> Self {
        0
    }
}

impl Zero for u32 {
    fn zero_value() -> Self {
        0
    }
}

/// Componentwise scalar arithmetic. Integer components wrap on overflow like device `int`
/// and `uint` arithmetic.
trait Component: Copy {
    fn component_add(self, rhs: Self) -> Self;
    fn component_sub(self, rhs: Self) -> Self;
    fn component_mul(self, rhs: Self) -> Self;
}

impl Component for f32 {
    #[inline]
    fn component_add(self, rhs: Self) -> Self {
        self + rhs
    }

    #[inline]
    fn component_sub(self, rhs: Self) -> Self {
        self - rhs
    }

    #[inline]
    fn component_mul(self, rhs: Self) -> Self {
        self * rhs
    }
}

macro_rules! wrapping_component {
    ($($scalar:ty),+) => {
        $(
            impl Component for $scalar {
                #[inline]
                fn component_add(self, rhs: Self) -> Self {
                    self.wrapping_add(rhs)
                }

                #[inline]
                fn component_sub(self, rhs: Self) -> Self {
                    self.wrapping_sub(rhs)
                }

                #[inline]
                fn component_mul(self, rhs: Self) -> Self {
                    self.wrapping_mul(rhs)
                }
            }
        )+
    };
}

wrapping_component!(i32, u32);

macro_rules! vector_type {
    ($name:ident, $scalar:ty, $n:literal, $($field:ident),+) => {
        #[derive(Clone, Copy, Default, Debug, PartialEq, Zeroable, Pod)]
        #[repr(C)]
        pub struct $name {
            $(pub $field: $scalar,)+
        }

        impl $name {
            pub const fn new($($field: $scalar),+) -> Self {
                Self { $($field),+ }
            }

            /// Returns a vector with every component set to `v`.
            pub const fn splat(v: $scalar) -> Self {
                Self { $($field: v),+ }
            }

            pub const fn to_array(self) -> [$scalar; $n] {
                [$(self.$field),+]
            }
        }

        impl From<[$scalar; $n]> for $name {
            fn from(a: [$scalar; $n]) -> Self {
                let [$($field),+] = a;
                Self { $($field),+ }
            }
        }

        impl Zero for $name {
            fn zero_value() -> Self {
                Self::splat(<$scalar as Zero>::zero_value())
            }
        }

        vector_type!(
            @op $name, $scalar, Add, add, AddAssign, add_assign, component_add, $($field),+
        );
        vector_type!(
            @op $name, $scalar, Sub, sub, SubAssign, sub_assign, component_sub, $($field),+
        );
        vector_type!(
            @op $name, $scalar, Mul, mul, MulAssign, mul_assign, component_mul, $($field),+
        );
    };
    (
        @op $name:ident, $scalar:ty,
        $tr:ident, $f:ident, $tra:ident, $fa:ident, $cf:ident,
        $($field:ident),+
    ) => {
        impl $tr for $name {
            type Output = Self;

            #[inline]
            fn $f(self, rhs: Self) -> Self {
                Self { $($field: self.$field.$cf(rhs.$field)),+ }
            }
        }

        impl $tr<$scalar> for $name {
            type Output = Self;

            #[inline]
            fn $f(self, rhs: $scalar) -> Self {
                Self { $($field: self.$field.$cf(rhs)),+ }
            }
        }

        impl $tr<$name> for $scalar {
            type Output = $name;

            #[inline]
            fn $f(self, rhs: $name) -> $name {
                $name { $($field: self.$cf(rhs.$field)),+ }
            }
        }

        impl $tra for $name {
            #[inline]
            fn $fa(&mut self, rhs: Self) {
                *self = $tr::$f(*self, rhs);
            }
        }

        impl $tra<$scalar> for $name {
            #[inline]
            fn $fa(&mut self, rhs: $scalar) {
                *self = $tr::$f(*self, rhs);
            }
        }
    };
}

macro_rules! signed_neg {
    ($negate:path => $($name:ident: $($field:ident),+;)+) => {
        $(
            impl Neg for $name {
                type Output = Self;

                #[inline]
                fn neg(self) -> Self {
                    Self { $($field: $negate(self.$field)),+ }
                }
            }
        )+
    };
}

macro_rules! widening_constructors {
    ($scalar:ty, $v2:ident, $v3:ident, $v4:ident) => {
        impl $v3 {
            /// Appends `z` to a two-component vector.
            pub const fn extend(a: $v2, z: $scalar) -> Self {
                Self::new(a.x, a.y, z)
            }
        }

        impl $v4 {
            /// Appends `w` to a three-component vector.
            pub const fn extend(a: $v3, w: $scalar) -> Self {
                Self::new(a.x, a.y, a.z, w)
            }

            /// Concatenates two two-component vectors.
            pub const fn from_halves(a: $v2, b: $v2) -> Self {
                Self::new(a.x, a.y, b.x, b.y)
            }
        }
    };
}

vector_type!(Float2, f32, 2, x, y);
vector_type!(Float3, f32, 3, x, y, z);
vector_type!(Float4, f32, 4, x, y, z, w);
vector_type!(Int2, i32, 2, x, y);
vector_type!(Int3, i32, 3, x, y, z);
vector_type!(Int4, i32, 4, x, y, z, w);
vector_type!(UInt2, u32, 2, x, y);
vector_type!(UInt3, u32, 3, x, y, z);
vector_type!(UInt4, u32, 4, x, y, z, w);

signed_neg! {
    f32::neg =>
    Float2: x, y;
    Float3: x, y, z;
    Float4: x, y, z, w;
}

signed_neg! {
    i32::wrapping_neg =>
    Int2: x, y;
    Int3: x, y, z;
    Int4: x, y, z, w;
}

widening_constructors!(f32, Float2, Float3, Float4);
widening_constructors!(i32, Int2, Int3, Int4);
widening_constructors!(u32, UInt2, UInt3, UInt4);
