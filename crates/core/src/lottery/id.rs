use rand::Rng;

/// Characters used in lottery identifiers.
pub const LOTTERY_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random lowercase alphanumeric identifier.
pub fn generate_lottery_id<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..LOTTERY_ID_ALPHABET.len());
            LOTTERY_ID_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_lottery_id_length_and_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in [4, 6, 12] {
            let id = generate_lottery_id(&mut rng, len);
            assert_eq!(id.len(), len);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_generate_lottery_id_varies() {
        let mut rng = rand::thread_rng();
        let a = generate_lottery_id(&mut rng, 12);
        let b = generate_lottery_id(&mut rng, 12);
        assert_ne!(a, b);
    }
}
