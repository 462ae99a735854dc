use std::cmp::Ordering;

use equity_rs::cards::{Card, Rank, Suit};
use equity_rs::hand::{evaluate, Category, Hand};
use proptest::prelude::*;
use proptest::sample::subsequence;

fn deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(52);
    for &suit in &Suit::ALL {
        for &rank in &Rank::ALL {
            cards.push(Card::new(rank, suit));
        }
    }
    cards
}

/// Seven distinct cards in deck order.
fn seven_cards() -> impl Strategy<Value = Vec<Card>> {
    subsequence(deck(), 7)
}

proptest! {
    #[test]
    fn add_order_never_changes_the_result(cards in seven_cards().prop_shuffle()) {
        let mut sorted = cards.clone();
        sorted.sort();
        let shuffled = evaluate(&cards).unwrap();
        let canonical = evaluate(&sorted).unwrap();
        prop_assert_eq!(shuffled, canonical);
    }

    #[test]
    fn stronger_category_always_scores_higher(a in seven_cards(), b in seven_cards()) {
        let ea = evaluate(&a).unwrap();
        let eb = evaluate(&b).unwrap();

        match ea.category().cmp(&eb.category()) {
            Ordering::Greater => prop_assert!(ea.score() > eb.score()),
            Ordering::Less => prop_assert!(ea.score() < eb.score()),
            Ordering::Equal => {}
        }

        // Equal scores must agree on the category too.
        if ea.score() == eb.score() {
            prop_assert_eq!(ea.category(), eb.category());
        }
    }

    #[test]
    fn re_adding_any_card_is_rejected(cards in seven_cards(), pick in 0usize..7) {
        let mut hand = Hand::new();
        for &card in &cards {
            prop_assert!(hand.add(card));
        }
        prop_assert!(!hand.add(cards[pick]));
    }

    #[test]
    fn seven_cards_score_their_best_five(cards in seven_cards()) {
        let best = evaluate(&cards).unwrap();
        let mut achieved = false;
        for i in 0..3 {
            for j in (i + 1)..4 {
                for k in (j + 1)..5 {
                    for l in (k + 1)..6 {
                        for m in (l + 1)..7 {
                            let five = [cards[i], cards[j], cards[k], cards[l], cards[m]];
                            let eval = evaluate(&five).unwrap();
                            prop_assert!(best.score() >= eval.score());
                            achieved |= best.score() == eval.score();
                        }
                    }
                }
            }
        }
        // The seven-card score is realized by at least one five-card subset.
        prop_assert!(achieved);
    }

    #[test]
    fn trips_with_two_pairs_scores_the_best_pair(
        ranks in subsequence(Rank::ALL.to_vec(), 3),
        which in 0usize..3,
    ) {
        let trips = ranks[which];
        let pairs: Vec<Rank> = ranks.iter().copied().filter(|&r| r != trips).collect();
        let best_pair = pairs[0].max(pairs[1]);

        let mut cards = vec![
            Card::new(trips, Suit::Clubs),
            Card::new(trips, Suit::Diamonds),
            Card::new(trips, Suit::Hearts),
        ];
        for (&rank, suits) in pairs.iter().zip([
            [Suit::Clubs, Suit::Diamonds],
            [Suit::Hearts, Suit::Spades],
        ]) {
            cards.extend(suits.into_iter().map(|suit| Card::new(rank, suit)));
        }

        let eval = evaluate(&cards).unwrap();
        prop_assert_eq!(eval.category(), Category::FullHouse);
        let raw = eval.score().raw();
        prop_assert_eq!((raw >> 32) & 0xFFFF, 1u64 << trips.index());
        prop_assert_eq!((raw >> 16) & 0xFFFF, 1u64 << best_pair.index());
    }
}
