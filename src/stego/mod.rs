//! Steganography: hiding encrypted envelopes in carrier images.
//!
//! - [`chaos`]: password-keyed logistic-map pixel ordering
//! - [`image`]: LSB framing, embedding and extraction (PNG/BMP)

pub mod chaos;
pub mod image;

pub use chaos::{chaos_sequence, pixel_permutation};
pub use image::{ImageStego, StegoCodec, StegoError, StegoHeader};
