use rand::{seq::SliceRandom, Rng};
use tracing::debug;

use crate::database::quiz::{Difficulty, Question};

/// Shares of a session drawn from the easy and medium buckets, in percent.
/// Hard questions fill whatever is left.
const EASY_SHARE: usize = 34;
const MEDIUM_SHARE: usize = 33;

fn share(count: usize, percent: usize) -> usize {
    (count * percent).div_ceil(100)
}

/// Picks `count` questions from `pool`, balanced across difficulties and in
/// random order. Returns fewer when the pool is too small.
pub fn select<R: Rng + ?Sized>(pool: &[Question], count: usize, rng: &mut R) -> Vec<Question> {
    let mut buckets = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard].map(|difficulty| {
        let mut bucket: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter(|(_, question)| question.difficulty() == difficulty)
            .map(|(i, _)| i)
            .collect();
        bucket.shuffle(&mut *rng);
        bucket
    });

    let easy_count = share(count, EASY_SHARE);
    let medium_count = share(count, MEDIUM_SHARE);
    let hard_count = count.saturating_sub(easy_count + medium_count);

    let mut taken = vec![false; pool.len()];
    let mut selected = Vec::with_capacity(count);
    for (bucket, wanted) in buckets
        .iter_mut()
        .zip([easy_count, medium_count, hard_count])
    {
        bucket.truncate(wanted);
        for &i in bucket.iter() {
            taken[i] = true;
            selected.push(i);
        }
    }

    if selected.len() < count {
        let mut rest: Vec<usize> = (0..pool.len()).filter(|&i| !taken[i]).collect();
        rest.shuffle(rng);
        rest.truncate(count - selected.len());
        debug!(backfilled = rest.len(), "Difficulty buckets short, backfilling");
        selected.extend(rest);
    }

    selected.shuffle(rng);
    selected.truncate(count);
    selected.into_iter().map(|i| pool[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::database::quiz::fixtures::{pool, question};

    fn count_of(questions: &[Question], difficulty: Difficulty) -> usize {
        questions
            .iter()
            .filter(|q| q.difficulty() == difficulty)
            .count()
    }

    #[test]
    fn balances_a_short_session() {
        let mut rng = StdRng::seed_from_u64(7);
        let selected = select(&pool(30), 25, &mut rng);

        assert_eq!(selected.len(), 25);
        assert_eq!(count_of(&selected, Difficulty::Easy), 9);
        assert_eq!(count_of(&selected, Difficulty::Medium), 9);
        assert_eq!(count_of(&selected, Difficulty::Hard), 7);
    }

    #[test]
    fn balances_a_long_session() {
        let mut rng = StdRng::seed_from_u64(11);
        let selected = select(&pool(30), 50, &mut rng);

        assert_eq!(selected.len(), 50);
        assert_eq!(count_of(&selected, Difficulty::Easy), 17);
        assert_eq!(count_of(&selected, Difficulty::Medium), 17);
        assert_eq!(count_of(&selected, Difficulty::Hard), 16);
    }

    #[test]
    fn never_repeats_a_question() {
        let mut rng = StdRng::seed_from_u64(3);
        let selected = select(&pool(20), 50, &mut rng);
        let ids: HashSet<u32> = selected.iter().map(Question::id).collect();
        assert_eq!(ids.len(), selected.len());
    }

    #[test]
    fn backfills_from_other_difficulties() {
        let mut questions: Vec<Question> = (1..=20).map(|id| question(id, Difficulty::Easy, 0)).collect();
        questions.push(question(21, Difficulty::Hard, 1));

        let mut rng = StdRng::seed_from_u64(5);
        let selected = select(&questions, 10, &mut rng);

        assert_eq!(selected.len(), 10);
        assert_eq!(count_of(&selected, Difficulty::Hard), 1);
        assert_eq!(count_of(&selected, Difficulty::Easy), 9);
    }

    #[test]
    fn returns_whole_pool_when_it_is_too_small() {
        let mut rng = StdRng::seed_from_u64(1);
        let selected = select(&pool(3), 25, &mut rng);
        assert_eq!(selected.len(), 9);
    }

    #[test]
    fn tiny_counts_are_not_overfilled() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(select(&pool(5), 1, &mut rng).len(), 1);
        assert!(select(&pool(5), 0, &mut rng).is_empty());
    }
}
