//! Seeded hash functions used by the index.
//!
//! - 4- and 8-byte keys go through integer avalanche mixes.
//! - Other byte spans use a reduced-round SipHash (1 compression round,
//!   1 finalization round). Enabling the `siphash-2-4` feature switches every
//!   binary key to full SipHash-2-4 from the `siphasher` crate and drops the
//!   integer fast paths.
//! - Strings use a rotate-and-add walk followed by an avalanche mix.
//!
//! None of these values are stable across crate versions; never persist them.

/// Types that can be used as keys of an [`ArrayMap`](crate::ArrayMap).
///
/// Implementations must agree with `Eq`: equal keys hash equally under the
/// same seed. Types related by `Borrow` (e.g. `String`/`str`) must hash
/// identically so borrowed lookups find owned keys.
pub trait HashKey {
    fn hash_key(&self, seed: u64) -> u64;
}

/// Hash a 4-byte key.
#[inline]
pub fn hash_u32(v: u32, seed: u64) -> u64 {
    let mut h = v ^ (seed as u32);
    h = (h ^ 61) ^ (h >> 16);
    h = h.wrapping_add(h << 3);
    h ^= h >> 4;
    h = h.wrapping_mul(0x27d4_eb2d);
    h ^= seed as u32;
    h ^= h >> 15;
    (((h as u64) << 32) | h as u64) ^ seed
}

/// Hash an 8-byte key.
#[inline]
pub fn hash_u64(v: u64, seed: u64) -> u64 {
    let mut h = v ^ seed;
    h = (!h).wrapping_add(h << 21);
    h ^= h.rotate_right(24);
    h = h.wrapping_mul(265);
    h ^= h.rotate_right(14);
    h ^= seed;
    h = h.wrapping_mul(21);
    h ^= h.rotate_right(28);
    h = h.wrapping_add(h << 31);
    (!h).wrapping_add(h << 18)
}

/// Hash an arbitrary byte span, taking the integer fast paths for 4- and
/// 8-byte spans unless `siphash-2-4` is enabled.
#[inline]
pub fn hash_bytes(bytes: &[u8], seed: u64) -> u64 {
    #[cfg(not(feature = "siphash-2-4"))]
    {
        if let Ok(b) = <[u8; 4]>::try_from(bytes) {
            return hash_u32(u32::from_le_bytes(b), seed);
        }
        if let Ok(b) = <[u8; 8]>::try_from(bytes) {
            return hash_u64(u64::from_le_bytes(b), seed);
        }
    }
    siphash_bytes(bytes, seed)
}

/// Hash a string by content.
pub fn hash_str(s: &str, seed: u64) -> u64 {
    let mut h = seed;
    for &b in s.as_bytes() {
        h = h.rotate_left(9).wrapping_add(b as u64);
    }
    h ^= seed;
    h = (!h).wrapping_add(h << 18);
    h = h.rotate_right(31);
    h = h.wrapping_mul(21);
    h = h.rotate_right(11);
    h = h.wrapping_add(h << 6);
    h ^= h.rotate_right(22);
    h.wrapping_add(seed)
}

/// Reduced SipHash state: one compression round, one finalization round.
#[cfg(not(feature = "siphash-2-4"))]
struct SipState {
    v0: u64,
    v1: u64,
    v2: u64,
    v3: u64,
}

#[cfg(not(feature = "siphash-2-4"))]
impl SipState {
    fn new(seed: u64) -> Self {
        Self {
            v0: 0x736f_6d65_7073_6575 ^ seed,
            v1: 0x646f_7261_6e64_6f6d ^ !seed,
            v2: 0x6c79_6765_6e65_7261 ^ seed,
            v3: 0x7465_6462_7974_6573 ^ !seed,
        }
    }

    #[inline]
    fn round(&mut self) {
        self.v0 = self.v0.wrapping_add(self.v1);
        self.v1 = self.v1.rotate_left(13);
        self.v1 ^= self.v0;
        self.v0 = self.v0.rotate_left(32);
        self.v2 = self.v2.wrapping_add(self.v3);
        self.v3 = self.v3.rotate_left(16);
        self.v3 ^= self.v2;
        self.v2 = self.v2.wrapping_add(self.v1);
        self.v1 = self.v1.rotate_left(17);
        self.v1 ^= self.v2;
        self.v2 = self.v2.rotate_left(32);
        self.v0 = self.v0.wrapping_add(self.v3);
        self.v3 = self.v3.rotate_left(21);
        self.v3 ^= self.v0;
    }

    #[inline]
    fn compress(&mut self, m: u64) {
        self.v3 ^= m;
        self.round();
        self.v0 ^= m;
    }
}

/// SipHash over `bytes` keyed with `(seed, !seed)`.
#[cfg(not(feature = "siphash-2-4"))]
pub fn siphash_bytes(bytes: &[u8], seed: u64) -> u64 {
    let mut st = SipState::new(seed);
    let mut chunks = bytes.chunks_exact(8);
    for c in &mut chunks {
        let mut w = [0u8; 8];
        w.copy_from_slice(c);
        st.compress(u64::from_le_bytes(w));
    }

    let mut last = (bytes.len() as u64) << 56;
    for (i, &b) in chunks.remainder().iter().enumerate() {
        last |= (b as u64) << (8 * i);
    }
    st.compress(last);

    st.v2 ^= 0xff;
    st.round();
    // The reduced variant leaves v0 out of the output.
    st.v1 ^ st.v2 ^ st.v3
}

/// SipHash-2-4 over `bytes` keyed with `(seed, !seed)`.
#[cfg(feature = "siphash-2-4")]
pub fn siphash_bytes(bytes: &[u8], seed: u64) -> u64 {
    use core::hash::Hasher;
    let mut h = siphasher::sip::SipHasher24::new_with_keys(seed, !seed);
    h.write(bytes);
    h.finish()
}

macro_rules! int_hash_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl HashKey for $t {
                #[inline]
                fn hash_key(&self, seed: u64) -> u64 {
                    hash_bytes(&self.to_le_bytes(), seed)
                }
            }
        )*
    };
}

int_hash_key!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl HashKey for char {
    #[inline]
    fn hash_key(&self, seed: u64) -> u64 {
        (*self as u32).hash_key(seed)
    }
}

impl HashKey for bool {
    #[inline]
    fn hash_key(&self, seed: u64) -> u64 {
        (*self as u8).hash_key(seed)
    }
}

impl HashKey for [u8] {
    #[inline]
    fn hash_key(&self, seed: u64) -> u64 {
        hash_bytes(self, seed)
    }
}

impl<const N: usize> HashKey for [u8; N] {
    #[inline]
    fn hash_key(&self, seed: u64) -> u64 {
        hash_bytes(self, seed)
    }
}

impl HashKey for Vec<u8> {
    #[inline]
    fn hash_key(&self, seed: u64) -> u64 {
        hash_bytes(self, seed)
    }
}

impl HashKey for str {
    #[inline]
    fn hash_key(&self, seed: u64) -> u64 {
        hash_str(self, seed)
    }
}

impl HashKey for String {
    #[inline]
    fn hash_key(&self, seed: u64) -> u64 {
        hash_str(self, seed)
    }
}

impl<T: HashKey + ?Sized> HashKey for &T {
    #[inline]
    fn hash_key(&self, seed: u64) -> u64 {
        (**self).hash_key(seed)
    }
}

impl<T: HashKey + ?Sized> HashKey for Box<T> {
    #[inline]
    fn hash_key(&self, seed: u64) -> u64 {
        (**self).hash_key(seed)
    }
}
