use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

/// Returns a uniformly shuffled copy of `items`, leaving the input untouched.
pub fn shuffle_array<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

/// Uniform pick from `items`, `None` when empty.
pub fn pick_random<T: Copy, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Option<T> {
    items.choose(rng).copied()
}
