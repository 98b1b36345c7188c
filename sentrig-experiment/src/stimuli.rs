use rand::Rng;
use rand::seq::SliceRandom;

const LIST_A: [&str; 4] = [
    "The cat slept quietly on the sunny windowsill.",
    "A cool breeze drifted through the open window.",
    "The clock ticked softly in the empty room.",
    "She opened the book and began to read.",
];

const LIST_B: [&str; 4] = [
    "A dog barked in the distance, breaking the silence.",
    "He poured a cup of coffee and sat by the fire.",
    "The rain pattered lightly against the roof tiles.",
    "She smiled as she walked through the blooming garden.",
];

const LIST_C: [&str; 4] = [
    "A bird chirped cheerfully from a nearby tree branch.",
    "The sun rose slowly, painting the sky with gold.",
    "He tied his shoes and headed out for a morning jog.",
    "A child laughed joyfully while chasing a butterfly.",
];

const LIST_D: [&str; 4] = [
    "She brewed a pot of tea and settled on the couch.",
    "The mountains stood tall against the clear blue sky.",
    "He picked up the guitar and strummed a soft melody.",
    "The mist rose slowly, shrouding the valley in gray.",
];

const LIST_E: [&str; 4] = [
    "The warm sunlight filtered through the swaying branches.",
    "The ice cream melted quickly under the hot sun.",
    "He gazed at the stars, dreaming of distant worlds.",
    "The baker decorated cakes with colorful frosting.",
];

const LIST_F: [&str; 4] = [
    "The wind carried the scent of salt from the sea.",
    "A cat stretched lazily in the warm sunlight.",
    "She folded the letter and placed it in the drawer.",
    "He laced up his boots and headed for the trail.",
];

const LIST_G: [&str; 4] = [
    "A steaming bowl of soup sat on the edge of the table.",
    "The smell of fresh bread wafted through the bakery.",
    "A violin rested quietly on the wooden stand.",
    "A soft melody drifted from the strings of the harp.",
];

const LIST_H: [&str; 4] = [
    "A patch of moss grew thickly on the weathered stone.",
    "A kite soared brightly against the pale evening clouds.",
    "The blacksmith hammered a horseshoe on the anvil.",
    "The traveler traced the ancient map with her fingertip.",
];

const LIST_I: [&str; 4] = [
    "The jeweler polished the gemstone until it sparkled.",
    "A crescent moon rose above the jagged mountain peaks.",
    "The cyclist leaned forward as she raced down the hill.",
    "A red apple rolled off the counter and onto the floor.",
];

const LIST_J: [&str; 4] = [
    "A kaleidoscope of colors shifted within the stained-glass.",
    "A cluster of grapes hung low on the vine.",
    "The engineer tightened a bolt on the humming machine.",
    "The mechanic wiped his greasy hands on a faded rag.",
];

/// Sentence lists indexed by block.
#[derive(Debug, Clone, PartialEq)]
pub struct StimulusSet {
    lists: Vec<Vec<String>>,
}

impl StimulusSet {
    pub fn new(lists: Vec<Vec<String>>) -> Self {
        Self { lists }
    }

    /// Lists A-J for blocks 1-10, then the same lists with neighbouring pairs
    /// swapped (B, A, D, C, ...) for blocks 11-20, so each list is read once
    /// under each condition.
    pub fn builtin() -> Self {
        let first: Vec<Vec<String>> = [
            LIST_A, LIST_B, LIST_C, LIST_D, LIST_E, LIST_F, LIST_G, LIST_H, LIST_I, LIST_J,
        ]
        .iter()
        .map(|list| list.iter().map(|s| s.to_string()).collect())
        .collect();

        let second: Vec<Vec<String>> = (0..first.len())
            .map(|i| {
                let partner = if i % 2 == 0 { i + 1 } else { i - 1 };
                first[partner].clone()
            })
            .collect();

        Self::new(first.into_iter().chain(second).collect())
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Sentences of a 1-based block; empty when the block does not exist.
    pub fn block(&self, block: usize) -> &[String] {
        block
            .checked_sub(1)
            .and_then(|i| self.lists.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// A fresh uniform permutation of the block's sentences, truncated to
    /// `trials`.
    pub fn shuffled_block<R: Rng + ?Sized>(
        &self,
        block: usize,
        trials: usize,
        rng: &mut R,
    ) -> Vec<String> {
        let mut sentences = self.block(block).to_vec();
        sentences.shuffle(rng);
        sentences.truncate(trials);
        sentences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn builtin_covers_twenty_blocks_with_swapped_second_half() {
        let set = StimulusSet::builtin();
        assert_eq!(set.len(), 20);
        assert_eq!(set.block(1)[0], LIST_A[0]);
        assert_eq!(set.block(2)[0], LIST_B[0]);
        assert_eq!(set.block(11)[0], LIST_B[0]);
        assert_eq!(set.block(12)[0], LIST_A[0]);
        assert_eq!(set.block(20)[0], LIST_I[0]);
        assert!(set.block(0).is_empty());
        assert!(set.block(21).is_empty());
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let set = StimulusSet::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        let mut shuffled = set.shuffled_block(3, 4, &mut rng);
        let mut listed = set.block(3).to_vec();
        assert_eq!(shuffled.len(), 4);
        shuffled.sort();
        listed.sort();
        assert_eq!(shuffled, listed);
    }

    #[test]
    fn shuffle_is_not_always_identity() {
        let set = StimulusSet::builtin();
        let identity = set.block(1).to_vec();
        let reordered = (0..32u64)
            .map(|seed| set.shuffled_block(1, 4, &mut StdRng::seed_from_u64(seed)))
            .filter(|order| *order != identity)
            .count();
        assert!(reordered > 0);
    }

    #[test]
    fn truncates_to_trial_count() {
        let set = StimulusSet::builtin();
        let mut rng = StdRng::seed_from_u64(1);
        let picked = set.shuffled_block(5, 2, &mut rng);
        assert_eq!(picked.len(), 2);
        assert!(picked.iter().all(|s| set.block(5).contains(s)));
    }
}
