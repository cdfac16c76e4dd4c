//! Tagged unions.
//!
//! A BSATN sum is a Rust enum whose variants each carry one value. The tag
//! on the wire is the zero-based variant index, so serde's derived enum
//! support already produces the right bytes; this module adds the
//! type-directed accessors (`tag`, `is`, `get`) on top.
//!
//! ```
//! use bsatn::{SumType, sum_type};
//!
//! sum_type! {
//!     #[derive(Debug, PartialEq)]
//!     pub enum Value {
//!         Int(i32),
//!         Text(String),
//!     }
//! }
//!
//! let v = Value::from("hi".to_string());
//! assert_eq!(v.tag(), 1);
//! assert!(v.is::<String>());
//! assert!(v.get::<i32>().is_err());
//! assert_eq!(bsatn::to_vec(&v).unwrap(), [1, 2, 0, 0, 0, b'h', b'i']);
//! ```

use crate::error::{BsatnError, Result};

/// A closed set of alternatives with exactly one active at a time.
pub trait SumType: Sized {
    /// Number of alternatives; every valid tag is below this.
    const VARIANTS: usize;

    /// Zero-based index of the active alternative.
    fn tag(&self) -> u8;

    fn is<T>(&self) -> bool
    where
        Self: Alternative<T>,
    {
        <Self as Alternative<T>>::try_ref(self).is_some()
    }

    /// Borrows the active value if it is the `T` alternative.
    fn get<T>(&self) -> Result<&T>
    where
        Self: Alternative<T>,
    {
        let active = self.tag();
        <Self as Alternative<T>>::try_ref(self).ok_or(BsatnError::WrongAlternative {
            requested: std::any::type_name::<T>(),
            active,
        })
    }

    fn get_mut<T>(&mut self) -> Result<&mut T>
    where
        Self: Alternative<T>,
    {
        let active = self.tag();
        <Self as Alternative<T>>::try_mut(self).ok_or(BsatnError::WrongAlternative {
            requested: std::any::type_name::<T>(),
            active,
        })
    }
}

/// Implemented once per alternative type of a sum.
///
/// Two alternatives of the same type would need two identical impls, so
/// type-directed access is only available for sums whose alternative types
/// are distinct, which [`sum_type!`](crate::sum_type) enforces at compile
/// time.
pub trait Alternative<T>: SumType {
    fn try_ref(&self) -> Option<&T>;

    fn try_mut(&mut self) -> Option<&mut T>;
}

impl<T> SumType for Option<T> {
    const VARIANTS: usize = 2;

    fn tag(&self) -> u8 {
        u8::from(self.is_some())
    }
}

impl<T> Alternative<T> for Option<T> {
    fn try_ref(&self) -> Option<&T> {
        self.as_ref()
    }

    fn try_mut(&mut self) -> Option<&mut T> {
        self.as_mut()
    }
}

/// The observable operations of an optional value.
pub trait OptionExt<T> {
    fn has_value(&self) -> bool;

    /// Fails with [`BsatnError::Absent`] when there is no value.
    fn value(&self) -> Result<&T>;

    fn value_or<'a>(&'a self, default: &'a T) -> &'a T;
}

impl<T> OptionExt<T> for Option<T> {
    fn has_value(&self) -> bool {
        self.is_some()
    }

    fn value(&self) -> Result<&T> {
        self.as_ref().ok_or(BsatnError::Absent)
    }

    fn value_or<'a>(&'a self, default: &'a T) -> &'a T {
        self.as_ref().unwrap_or(default)
    }
}

/// Declares a sum type: an enum of single-value variants that serializes as
/// a BSATN sum and implements [`SumType`], one [`Alternative`] and one
/// `From` per variant.
///
/// The derive uses `::serde`, so the calling crate must depend on serde.
/// At most 256 variants fit in the tag byte.
#[macro_export]
macro_rules! sum_type {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident($ty:ty)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(::serde::Serialize, ::serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant($ty),
            )+
        }

        const _: () = assert!(
            [$(stringify!($variant)),+].len() <= 256,
            "a sum type tag is a single byte"
        );

        impl $crate::SumType for $name {
            const VARIANTS: usize = [$(stringify!($variant)),+].len();

            fn tag(&self) -> u8 {
                #[allow(non_camel_case_types, dead_code)]
                enum Tag {
                    $($variant),+
                }
                match self {
                    $(Self::$variant(_) => Tag::$variant as u8,)+
                }
            }
        }

        $(
            impl $crate::Alternative<$ty> for $name {
                fn try_ref(&self) -> ::core::option::Option<&$ty> {
                    match self {
                        Self::$variant(v) => ::core::option::Option::Some(v),
                        #[allow(unreachable_patterns)]
                        _ => ::core::option::Option::None,
                    }
                }

                fn try_mut(&mut self) -> ::core::option::Option<&mut $ty> {
                    match self {
                        Self::$variant(v) => ::core::option::Option::Some(v),
                        #[allow(unreachable_patterns)]
                        _ => ::core::option::Option::None,
                    }
                }
            }

            impl ::core::convert::From<$ty> for $name {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )+
    };
}
