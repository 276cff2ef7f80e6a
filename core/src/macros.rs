/// Implements `Debug` for types holding closures or trait objects.
///
/// With a single argument only the type name is printed. A second argument names a
/// `&str` accessor whose value is printed alongside it, e.g. `FunctionComponent("counter")`.
macro_rules! impl_debug {
    ($ty:ident) => {
        impl core::fmt::Debug for $ty {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(stringify!($ty))
            }
        }
    };
    ($ty:ident, $label:ident) => {
        impl core::fmt::Debug for $ty {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_tuple(stringify!($ty)).field(&self.$label()).finish()
            }
        }
    };
}
