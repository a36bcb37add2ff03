//! The ordered set of photos the stream cycles through.

use rand::Rng;
use tracing::debug;

/// Shuffle `items` in place with the Fisher–Yates algorithm.
///
/// Walks from the last index down to 1, swapping each slot with a uniformly
/// drawn slot in `[0, i]`. Empty and single-element slices are left as is.
pub fn shuffle<T, R>(items: &mut [T], rng: &mut R)
where
    R: Rng + ?Sized,
{
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Photo identifiers in display order. Permuted once at construction and
/// read-only afterwards; the stream's sequence counter acts as the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    photos: Vec<String>,
}

impl Catalog {
    pub fn shuffled<R>(mut photos: Vec<String>, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        shuffle(&mut photos, rng);
        debug!(photos = photos.len(), "catalog shuffled");
        Self { photos }
    }

    pub fn unshuffled(photos: Vec<String>) -> Self {
        Self { photos }
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn photos(&self) -> &[String] {
        &self.photos
    }

    /// Cyclic lookup: the photo for the `sequence`-th spawned entry.
    pub fn photo_for(&self, sequence: u64) -> Option<(usize, &str)> {
        if self.photos.is_empty() {
            return None;
        }
        let index = (sequence % self.photos.len() as u64) as usize;
        Some((index, self.photos[index].as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{i}.jpg")).collect()
    }

    #[test]
    fn shuffle_keeps_every_element() {
        let mut rng = StdRng::seed_from_u64(11);
        for n in 0..16 {
            let mut items = names(n);
            shuffle(&mut items, &mut rng);
            let mut sorted = items.clone();
            sorted.sort();
            let mut expected = names(n);
            expected.sort();
            assert_eq!(sorted, expected, "size {n}");
        }
    }

    #[test]
    fn shuffle_is_reproducible_with_a_seed() {
        let mut a = names(20);
        let mut b = names(20);
        shuffle(&mut a, &mut StdRng::seed_from_u64(42));
        shuffle(&mut b, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert_ne!(a, names(20), "20 elements should not survive a shuffle untouched");
    }

    #[test]
    fn shuffle_of_empty_and_single_is_noop() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<u8> = Vec::new();
        shuffle(&mut empty, &mut rng);
        assert!(empty.is_empty());
        let mut one = vec!["only"];
        shuffle(&mut one, &mut rng);
        assert_eq!(one, vec!["only"]);
    }

    #[test]
    fn photo_for_cycles() {
        let catalog = Catalog::unshuffled(vec!["a".into(), "b".into(), "c".into()]);
        let picked: Vec<_> = (0..4)
            .map(|seq| catalog.photo_for(seq).unwrap())
            .collect();
        assert_eq!(picked, vec![(0, "a"), (1, "b"), (2, "c"), (0, "a")]);
    }

    #[test]
    fn empty_catalog_has_no_photo() {
        assert_eq!(Catalog::unshuffled(Vec::new()).photo_for(5), None);
    }
}
