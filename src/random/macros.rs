/// Declares a named random stream, e.g. `define_rng!(ExposureRng)`. The stream is seeded from
/// the base seed and its name, so every stream name must be unique within the program; a
/// second stream with the same name fails to link.
#[macro_export]
macro_rules! define_rng {
    ($stream:ident) => {
        #[derive(Copy, Clone)]
        struct $stream;

        impl $crate::random::RngId for $stream {
            type RngType = $crate::rand::rngs::SmallRng;

            fn get_name() -> &'static str {
                stringify!($stream)
            }
        }

        $crate::paste::paste! {
            #[doc(hidden)]
            #[no_mangle]
            #[allow(non_upper_case_globals)]
            pub static [<epinet_rng_stream_ $stream>]: () = ();
        }
    };
}
pub use define_rng;
