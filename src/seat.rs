use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

pub const ROWS: u32 = 60;
pub const LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// Seat labels look like `1A` .. `60F`.
pub fn is_valid_seat(seat: &str) -> bool {
    let Some(letter) = seat.chars().last() else {
        return false;
    };
    let row = &seat[..seat.len() - letter.len_utf8()];
    LETTERS.contains(&letter)
        && !row.starts_with('0')
        && row.parse::<u32>().is_ok_and(|r| (1..=ROWS).contains(&r))
}

/// Picks a random seat not in `taken`, `None` when the cabin is full.
pub fn random_free_seat<R: Rng + ?Sized>(rng: &mut R, taken: &HashSet<String>) -> Option<String> {
    let free: Vec<String> = (1..=ROWS)
        .flat_map(|row| LETTERS.iter().map(move |l| format!("{row}{l}")))
        .filter(|s| !taken.contains(s))
        .collect();
    free.choose(rng).cloned()
}
