//! Chaotic LSB steganography for images.
//!
//! Hides a password-encrypted [`EncryptedEnvelope`] in the least significant
//! bits of the R, G and B channels. Alpha is never touched.
//!
//! Framing: `"FW" + version digit + 8-digit decimal payload length` followed by
//! the envelope JSON. Each character is written as 8 bits, most significant bit
//! first, one bit per channel, visiting pixels in the order given by
//! [`pixel_permutation`] of the password. Without the password the bits cannot
//! be located, so "no message" and "wrong password" look the same.
//!
//! Only lossless carriers survive: re-encoding the output as JPEG (or any lossy
//! format) destroys the LSB plane. Keeping the output lossless is the caller's
//! job; [`ImageStego`] always writes PNG.

use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

use super::chaos::pixel_permutation;
use crate::crypto::symmetric::{EncryptedEnvelope, SymmetricCipher, SymmetricError};

/// Magic prefix of every embedded payload.
pub const SIGNATURE: &str = "FW";

/// Framing version.
pub const VERSION: char = '1';

/// Width of the zero-padded decimal length field.
pub const LENGTH_DIGITS: usize = 8;

/// Header size in characters: signature + version + length.
pub const HEADER_LEN: usize = 2 + 1 + LENGTH_DIGITS;

/// Largest payload the length field can describe.
pub const MAX_PAYLOAD_LEN: usize = 99_999_999;

const BITS_PER_CHAR: usize = 8;

/// R, G, B. Alpha is skipped.
const CHANNELS_PER_PIXEL: usize = 3;

/// Errors that can occur during image steganography.
#[derive(Error, Debug)]
pub enum StegoError {
    #[error("Image too small to hide data: need {needed_bits} bits, have {capacity_bits}")]
    ImageTooSmall {
        needed_bits: usize,
        capacity_bits: usize,
    },

    #[error("Payload length {0} exceeds the 8-digit length field")]
    PayloadTooLong(usize),

    /// The length field counts characters, one byte each; only ASCII keeps that exact.
    #[error("Payload contains non-ASCII characters")]
    NonAsciiPayload,

    #[error("No hidden message or wrong password")]
    NoHiddenMessage,

    #[error("Unsupported stego version: {0}")]
    UnsupportedVersion(char),

    #[error("Invalid stego header: {0}")]
    InvalidHeader(String),

    #[error("Hidden payload is not a valid envelope: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    #[error(transparent)]
    Symmetric(#[from] SymmetricError),

    #[error("Image load error: {0}")]
    ImageLoadError(String),

    #[error("Image save error: {0}")]
    ImageSaveError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Parsed fixed-width header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StegoHeader {
    pub version: char,
    pub payload_len: usize,
}

impl StegoHeader {
    pub fn new(payload_len: usize) -> Result<Self, StegoError> {
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(StegoError::PayloadTooLong(payload_len));
        }
        Ok(Self {
            version: VERSION,
            payload_len,
        })
    }

    /// Renders the header, e.g. `FW100000042`.
    pub fn encode(&self) -> String {
        format!(
            "{}{}{:0width$}",
            SIGNATURE,
            self.version,
            self.payload_len,
            width = LENGTH_DIGITS
        )
    }

    /// Parses the first [`HEADER_LEN`] characters read from an image.
    pub fn parse(raw: &str) -> Result<Self, StegoError> {
        let chars: Vec<char> = raw.chars().collect();
        if chars.len() != HEADER_LEN {
            return Err(StegoError::InvalidHeader(format!(
                "expected {} characters, got {}",
                HEADER_LEN,
                chars.len()
            )));
        }

        let signature: String = chars[..2].iter().collect();
        if signature != SIGNATURE {
            return Err(StegoError::NoHiddenMessage);
        }

        let version = chars[2];
        if version != VERSION {
            return Err(StegoError::UnsupportedVersion(version));
        }

        let digits: String = chars[3..].iter().collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(StegoError::InvalidHeader(format!("bad length field {:?}", digits)));
        }
        let payload_len = digits
            .parse()
            .map_err(|_| StegoError::InvalidHeader(format!("bad length field {:?}", digits)))?;

        Ok(Self {
            version,
            payload_len,
        })
    }
}

/// Total bit capacity of an image: one bit per RGB channel.
pub fn capacity_bits(image: &RgbaImage) -> usize {
    (image.width() as usize) * (image.height() as usize) * CHANNELS_PER_PIXEL
}

/// Largest envelope JSON (in characters) that fits after the header.
pub fn capacity_chars(image: &RgbaImage) -> usize {
    (capacity_bits(image) / BITS_PER_CHAR).saturating_sub(HEADER_LEN)
}

/// Walks channel slots in permuted pixel order.
struct BitCursor<'a> {
    order: &'a [usize],
    width: usize,
}

impl BitCursor<'_> {
    /// `(x, y, channel)` carrying bit number `bit_index`.
    fn locate(&self, bit_index: usize) -> (u32, u32, usize) {
        let pixel = self.order[bit_index / CHANNELS_PER_PIXEL];
        let channel = bit_index % CHANNELS_PER_PIXEL;
        ((pixel % self.width) as u32, (pixel / self.width) as u32, channel)
    }

    fn write_chars(&self, image: &mut RgbaImage, text: &[u8]) {
        for (char_index, &byte) in text.iter().enumerate() {
            for bit in 0..BITS_PER_CHAR {
                let value = (byte >> (7 - bit)) & 1;
                let (x, y, channel) = self.locate(char_index * BITS_PER_CHAR + bit);
                let pixel = image.get_pixel_mut(x, y);
                pixel.0[channel] = (pixel.0[channel] & 0xFE) | value;
            }
        }
    }

    fn read_chars(&self, image: &RgbaImage, start_char: usize, count: usize) -> String {
        (start_char..start_char + count)
            .map(|char_index| {
                (0..BITS_PER_CHAR).fold(0u8, |acc, bit| {
                    let (x, y, channel) = self.locate(char_index * BITS_PER_CHAR + bit);
                    (acc << 1) | (image.get_pixel(x, y).0[channel] & 1)
                })
            })
            .map(char::from)
            .collect()
    }
}

/// Encrypts messages into carrier images and back out again.
#[derive(Debug, Clone, Copy, Default)]
pub struct StegoCodec {
    cipher: SymmetricCipher,
}

impl StegoCodec {
    pub fn new(cipher: SymmetricCipher) -> Self {
        Self { cipher }
    }

    /// Encrypts `message` under `password` and hides it in `image`.
    ///
    /// Capacity is checked before any pixel is written; on error the image is
    /// left exactly as it was.
    pub fn embed(&self, image: &mut RgbaImage, message: &str, password: &str) -> Result<(), StegoError> {
        let envelope = self.cipher.encrypt(message, password)?;
        let payload = envelope.to_json()?;
        embed_payload(image, &payload, password)
    }

    /// Locates, decrypts and returns the message hidden under `password`.
    pub fn extract(&self, image: &RgbaImage, password: &str) -> Result<String, StegoError> {
        let payload = extract_payload(image, password)?;
        let envelope: EncryptedEnvelope =
            serde_json::from_str(&payload).map_err(StegoError::InvalidPayload)?;
        let message = self.cipher.decrypt(&envelope, password)?;
        tracing::debug!(chars = payload.len(), "extracted stego payload");
        Ok(message)
    }
}

/// Hides a raw ASCII payload with its header, pixel order keyed by `password`.
pub fn embed_payload(image: &mut RgbaImage, payload: &str, password: &str) -> Result<(), StegoError> {
    if !payload.is_ascii() {
        return Err(StegoError::NonAsciiPayload);
    }

    let header = StegoHeader::new(payload.len())?;
    let framed = format!("{}{}", header.encode(), payload);

    let needed_bits = framed.len() * BITS_PER_CHAR;
    let capacity = capacity_bits(image);
    if needed_bits > capacity {
        return Err(StegoError::ImageTooSmall {
            needed_bits,
            capacity_bits: capacity,
        });
    }

    let (width, height) = image.dimensions();
    let order = pixel_permutation(password, (width as usize) * (height as usize));
    let cursor = BitCursor {
        order: &order,
        width: width as usize,
    };
    cursor.write_chars(image, framed.as_bytes());

    tracing::debug!(needed_bits, capacity_bits = capacity, "embedded stego payload");
    Ok(())
}

/// Reads back the raw payload written by [`embed_payload`].
pub fn extract_payload(image: &RgbaImage, password: &str) -> Result<String, StegoError> {
    let capacity = capacity_bits(image);
    if capacity < HEADER_LEN * BITS_PER_CHAR {
        return Err(StegoError::NoHiddenMessage);
    }

    let (width, height) = image.dimensions();
    let order = pixel_permutation(password, (width as usize) * (height as usize));
    let cursor = BitCursor {
        order: &order,
        width: width as usize,
    };

    let header = StegoHeader::parse(&cursor.read_chars(image, 0, HEADER_LEN))?;

    let needed_bits = (HEADER_LEN + header.payload_len) * BITS_PER_CHAR;
    if needed_bits > capacity {
        return Err(StegoError::InvalidHeader(format!(
            "length {} exceeds image capacity",
            header.payload_len
        )));
    }

    Ok(cursor.read_chars(image, HEADER_LEN, header.payload_len))
}

/// Carrier image wrapper handling load and save.
pub struct ImageStego {
    image: RgbaImage,
}

impl ImageStego {
    /// Creates a new ImageStego from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StegoError> {
        let image = image::open(path).map_err(|e| StegoError::ImageLoadError(e.to_string()))?;
        Ok(Self::from_image(image))
    }

    /// Creates a new ImageStego from encoded image bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StegoError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| StegoError::ImageLoadError(e.to_string()))?;
        Ok(Self::from_image(image))
    }

    /// Creates a new ImageStego from a decoded image, converting to RGBA8.
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            image: image.to_rgba8(),
        }
    }

    /// Characters of envelope JSON this carrier can hold.
    pub fn capacity_chars(&self) -> usize {
        capacity_chars(&self.image)
    }

    /// Returns a copy of the carrier with `message` hidden in it.
    pub fn hide(&self, codec: &StegoCodec, message: &str, password: &str) -> Result<Self, StegoError> {
        let mut output = self.image.clone();
        codec.embed(&mut output, message, password)?;
        Ok(Self { image: output })
    }

    /// Extracts and decrypts the hidden message.
    pub fn reveal(&self, codec: &StegoCodec, password: &str) -> Result<String, StegoError> {
        codec.extract(&self.image, password)
    }

    /// Saves the image as PNG regardless of the path's extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StegoError> {
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| StegoError::ImageSaveError(e.to_string()))
    }

    /// Returns the image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, StegoError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| StegoError::ImageSaveError(e.to_string()))?;
        Ok(bytes)
    }

    /// Returns a reference to the underlying image.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Consumes self and returns the underlying image.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}
