//! Multicodec-prefixed public keys, as found in `publicKeyMultibase`.
//!
//! See <https://github.com/multiformats/multicodec>.
use crate::error::Error;

pub const ED25519_PUB: u64 = 0xed;
pub const P256_PUB: u64 = 0x1200;
pub const P384_PUB: u64 = 0x1201;

/// Prefixes `bytes` with the unsigned-varint encoding of `codec`.
pub fn encode(codec: u64, bytes: &[u8]) -> Vec<u8> {
    let mut codec_buffer = unsigned_varint::encode::u64_buffer();
    let encoded_codec = unsigned_varint::encode::u64(codec, &mut codec_buffer);
    let mut result = Vec::with_capacity(encoded_codec.len() + bytes.len());
    result.extend(encoded_codec);
    result.extend(bytes);
    result
}

/// Splits multi-encoded `bytes` into their codec and data.
pub fn decode(bytes: &[u8]) -> Result<(u64, &[u8]), Error> {
    Ok(unsigned_varint::decode::u64(bytes)?)
}
