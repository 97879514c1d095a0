use rand::Rng;
use uuid::Uuid;

use crate::RequestToken;

/// Generate a deterministic v4-format UUID from a seeded RNG.
pub fn generate_uuid(rng: &mut impl Rng) -> Uuid {
    let bytes: [u8; 16] = rng.gen();
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

pub(crate) fn request_token(rng: &mut impl Rng) -> RequestToken {
    RequestToken(generate_uuid(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_same_seed_same_token() {
        let mut rng1 = ChaCha8Rng::seed_from_u64(42);
        let mut rng2 = ChaCha8Rng::seed_from_u64(42);
        let token1 = request_token(&mut rng1);
        let token2 = request_token(&mut rng2);
        assert_eq!(token1, token2);
        assert_eq!(token1.0.get_version(), Some(uuid::Version::Random));
    }

    #[test]
    fn test_successive_tokens_differ() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_ne!(request_token(&mut rng), request_token(&mut rng));
    }
}
