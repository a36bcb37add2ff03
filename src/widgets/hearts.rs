use rand::Rng;
use rand::seq::IndexedRandom;

/// Pick `count` decorative emoji uniformly, with replacement.
pub fn scatter<'a, R>(count: usize, emojis: &'a [String], rng: &mut R) -> Vec<&'a str>
where
    R: Rng + ?Sized,
{
    (0..count)
        .filter_map(|_| emojis.choose(rng).map(String::as_str))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn picks_only_from_the_set() {
        let set = vec!["💕".to_string(), "💖".to_string()];
        let picked = scatter(10, &set, &mut StdRng::seed_from_u64(5));
        assert_eq!(picked.len(), 10);
        assert!(picked.iter().all(|e| set.iter().any(|s| s == e)));
    }

    #[test]
    fn empty_set_yields_nothing() {
        assert!(scatter(4, &[], &mut StdRng::seed_from_u64(5)).is_empty());
    }
}
