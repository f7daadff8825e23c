//! `c_hash`/`at_hash` computation, following the same SHA-256 +
//! base64url-no-pad idiom as `utils::secret::hash_oauth_token`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};

use super::model::SigningAlg;

/// Left half of SHA-256(value), truncated to the width implied by the
/// ID-token signing algorithm, base64url-encoded without padding.
pub fn left_half_hash(value: &str, alg: SigningAlg) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let half = &digest[..alg.hash_len()];
    URL_SAFE_NO_PAD.encode(half)
}

pub fn at_hash(access_token: &str, alg: SigningAlg) -> String {
    left_half_hash(access_token, alg)
}

pub fn c_hash(code: &str, alg: SigningAlg) -> String {
    left_half_hash(code, alg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rs256_hash_is_16_bytes_decoded() {
        let h = at_hash("some-access-token", SigningAlg::Rs256);
        let decoded = URL_SAFE_NO_PAD.decode(&h).unwrap();
        assert_eq!(decoded.len(), 16);
    }

    #[test]
    fn rs384_hash_is_24_bytes_decoded() {
        let h = c_hash("some-code", SigningAlg::Rs384);
        let decoded = URL_SAFE_NO_PAD.decode(&h).unwrap();
        assert_eq!(decoded.len(), 24);
    }

    #[test]
    fn rs512_hash_is_32_bytes_decoded() {
        let h = c_hash("some-code", SigningAlg::Rs512);
        let decoded = URL_SAFE_NO_PAD.decode(&h).unwrap();
        assert_eq!(decoded.len(), 32);
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(
            c_hash("abc", SigningAlg::Rs256),
            c_hash("abc", SigningAlg::Rs256)
        );
        assert_ne!(
            c_hash("abc", SigningAlg::Rs256),
            c_hash("abd", SigningAlg::Rs256)
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Invariants 7 & 8: for any input, the encoded hash is non-empty and
        // decodes to exactly the width implied by the signing algorithm.
        #[test]
        fn hash_width_matches_signing_alg(value in ".*", alg_idx in 0..3u8) {
            let alg = match alg_idx {
                0 => SigningAlg::Rs256,
                1 => SigningAlg::Rs384,
                _ => SigningAlg::Rs512,
            };
            let h = left_half_hash(&value, alg);
            prop_assert!(!h.is_empty());
            let decoded = URL_SAFE_NO_PAD.decode(&h).unwrap();
            prop_assert_eq!(decoded.len(), alg.hash_len());
        }
    }
}
