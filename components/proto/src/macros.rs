/// Define a fixed length byte identifier (Ledger addresses, channel identifiers).
///
/// The defined type is `Copy`, ordered and hashable, and is formatted as a `0x` prefixed
/// lowercase hex string for both `Debug` and `Display`.
#[macro_export]
macro_rules! define_fixed_bytes {
    ($name:ident, $len:expr) => {
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        pub struct $name([u8; $len]);

        impl $name {
            #[inline]
            pub const fn new(inner: [u8; $len]) -> Self {
                $name(inner)
            }

            #[allow(unused)]
            #[inline]
            pub fn as_array_ref(&self) -> &[u8; $len] {
                &self.0
            }

            pub const fn len() -> usize {
                $len
            }

            /// Formatting for `Debug` and `Display`.
            fn format(&self) -> String {
                let lower_hex = self
                    .0
                    .iter()
                    .map(|byte| format!("{:02x}", byte))
                    .collect::<Vec<_>>();

                format!("0x{}", lower_hex.join(""))
            }

            /// A short prefix of the hex representation. Useful for log lines.
            pub fn short_hex(&self) -> String {
                let mut formatted = self.format();
                // "0x" and 4 bytes:
                formatted.truncate(2 + 8);
                formatted
            }
        }

        impl AsRef<[u8]> for $name {
            #[inline]
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl ::std::convert::From<[u8; $len]> for $name {
            #[inline]
            fn from(src: [u8; $len]) -> $name {
                $name(src)
            }
        }

        impl<'a> ::std::convert::TryFrom<&'a [u8]> for $name {
            type Error = ();

            #[inline]
            fn try_from(src: &'a [u8]) -> Result<$name, ()> {
                if src.len() != $len {
                    Err(())
                } else {
                    let mut inner = [0x00u8; $len];
                    inner.copy_from_slice(src);
                    Ok($name(inner))
                }
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", self.format())
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", self.format())
            }
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                $name([0u8; $len])
            }
        }

        impl ::quickcheck::Arbitrary for $name {
            fn arbitrary<G: ::quickcheck::Gen>(g: &mut G) -> Self {
                let mut inner = [0u8; $len];
                ::rand::RngCore::fill_bytes(g, &mut inner);
                $name(inner)
            }
        }
    };
}
