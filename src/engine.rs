use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::cards::{Card, PackedCards, Rank, Suit};
use crate::deal::{nck, Deal, BOARD_CARDS, HOLE_CARDS, MAX_PLAYERS};
use crate::hand::{Hand, Score, HAND_CARDS};

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum EngineError {
    #[error("thread pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Per-player win/tie tallies for one run.
///
/// Laid out as `[win_0, tie_0, win_1, tie_1, ...]` with zeroed slots for
/// unused seats. Counters only ever increase while a run is in flight and
/// are read back once it has joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counters {
    counts: [u64; 2 * MAX_PLAYERS],
    trials: u64,
}

impl Counters {
    /// Trials where this player alone held the best hand.
    pub fn wins(&self, player: usize) -> u64 {
        self.counts[2 * player]
    }

    /// Trials where this player shared the best hand with someone else.
    pub fn ties(&self, player: usize) -> u64 {
        self.counts[2 * player + 1]
    }

    /// Trials completed by the run that produced these counters.
    pub fn trials(&self) -> u64 {
        self.trials
    }

    /// The raw interleaved win/tie buffer.
    pub fn as_array(&self) -> &[u64; 2 * MAX_PLAYERS] {
        &self.counts
    }

    fn add_win(&mut self, player: usize) {
        self.counts[2 * player] += 1;
    }

    fn add_tie(&mut self, player: usize) {
        self.counts[2 * player + 1] += 1;
    }
}

enum Policy {
    /// Monte Carlo completion; `seed` pins the per-worker streams for
    /// reproducible runs at a fixed thread count.
    Sample { seed: Option<u64> },
    /// Index-addressed exhaustive completion.
    Enumerate,
}

/// The simulation engine: a fixed-size worker pool that fans a trial range
/// out over the configured workers and joins before returning.
///
/// ```
/// use equity_rs::{deal::Deal, engine::Engine};
///
/// let deal: Deal = "2p AcAd KhKs - 2c 7h Th 9d".parse().unwrap();
/// let engine = Engine::new(2).unwrap();
/// let counters = engine.enumerate(&deal);
/// assert_eq!(counters.trials(), 44);
/// ```
pub struct Engine {
    threads: usize,
    pool: rayon::ThreadPool,
}

impl Engine {
    /// Build an engine with a pool of `threads` workers (minimum 1).
    pub fn new(threads: usize) -> Result<Self, EngineError> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        Ok(Self { threads, pool })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Resize the worker pool; takes effect on the next run.
    pub fn set_threads(&mut self, threads: usize) -> Result<(), EngineError> {
        let threads = threads.max(1);
        self.pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        self.threads = threads;
        Ok(())
    }

    /// Monte Carlo run: `trials` independent random completions of `deal`.
    pub fn sample(&self, deal: &Deal, trials: u64) -> Counters {
        self.run(deal, trials, Policy::Sample { seed: None })
    }

    /// Monte Carlo run with reproducible per-worker random streams.
    pub fn sample_seeded(&self, deal: &Deal, trials: u64, seed: u64) -> Counters {
        self.run(deal, trials, Policy::Sample { seed: Some(seed) })
    }

    /// Exhaustive run over every completion of `deal`. A degenerate total
    /// (zero completions) is a no-op that reports zero trials.
    pub fn enumerate(&self, deal: &Deal) -> Counters {
        self.run(deal, deal.combinations(), Policy::Enumerate)
    }

    fn run(&self, deal: &Deal, trials: u64, policy: Policy) -> Counters {
        if trials == 0 {
            return Counters::default();
        }

        let layout = Layout::new(deal);
        debug!(
            "run: {} trials over {} workers, {} unknown slots",
            trials, self.threads, layout.unknown
        );

        let shared = SharedCounters::default();
        self.pool.scope(|scope| {
            for worker in 0..self.threads {
                let (start, count) = partition(trials, self.threads, worker);
                if count == 0 {
                    continue;
                }
                let layout = &layout;
                let shared = &shared;
                let policy = &policy;
                scope.spawn(move |_| {
                    let local = match policy {
                        Policy::Sample { seed } => {
                            sample_range(layout, count, worker_rng(*seed, worker))
                        }
                        Policy::Enumerate => enumerate_range(layout, start, count),
                    };
                    shared.merge(&local);
                });
            }
        });

        shared.into_counters()
    }
}

/// Shared result buffer; workers merge their local tallies exactly once,
/// at completion, with atomic adds.
#[derive(Default)]
struct SharedCounters {
    counts: [AtomicU64; 2 * MAX_PLAYERS],
    trials: AtomicU64,
}

impl SharedCounters {
    fn merge(&self, local: &Counters) {
        for (slot, &count) in self.counts.iter().zip(local.counts.iter()) {
            slot.fetch_add(count, Ordering::Relaxed);
        }
        self.trials.fetch_add(local.trials, Ordering::Relaxed);
    }

    fn into_counters(self) -> Counters {
        let mut out = Counters::default();
        for (dst, src) in out.counts.iter_mut().zip(self.counts.iter()) {
            *dst = src.load(Ordering::Relaxed);
        }
        out.trials = self.trials.load(Ordering::Relaxed);
        out
    }
}

/// Contiguous, disjoint sub-range of trial indices for one worker; the
/// remainder goes to the first workers.
fn partition(total: u64, workers: usize, index: usize) -> (u64, u64) {
    let workers = workers as u64;
    let index = index as u64;
    let base = total / workers;
    let rem = total % workers;
    let count = base + u64::from(index < rem);
    let start = index * base + index.min(rem);
    (start, count)
}

fn worker_rng(seed: Option<u64>, worker: usize) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(worker as u64)),
        None => ChaCha8Rng::from_os_rng(),
    }
}

/// One card slot in a seat's seven-card template: either known up front or
/// filled from the trial's draw buffer.
#[derive(Clone, Copy)]
enum Slot {
    Known(Card),
    Draw(usize),
}

/// Per-run completion plan: the remaining deck, the number of unknown
/// slots, and each seat's hole + board template. Draw slots are numbered
/// seat by seat (missing hole cards first), then across the board gaps, so
/// every seat's template sees the same board draws.
struct Layout {
    players: usize,
    deck: Vec<Card>,
    unknown: usize,
    seats: Vec<[Slot; HAND_CARDS]>,
}

impl Layout {
    fn new(deal: &Deal) -> Self {
        let mut next = 0;

        let mut hole_slots = Vec::with_capacity(deal.players());
        for player in 0..deal.players() {
            let known = deal.holes(player);
            let mut slots = [Slot::Draw(0); HOLE_CARDS];
            for (i, slot) in slots.iter_mut().enumerate() {
                *slot = match known.get(i) {
                    Some(&card) => Slot::Known(card),
                    None => {
                        let draw = Slot::Draw(next);
                        next += 1;
                        draw
                    }
                };
            }
            hole_slots.push(slots);
        }

        let mut board_slots = [Slot::Draw(0); BOARD_CARDS];
        for (i, slot) in board_slots.iter_mut().enumerate() {
            *slot = match deal.board().get(i) {
                Some(&card) => Slot::Known(card),
                None => {
                    let draw = Slot::Draw(next);
                    next += 1;
                    draw
                }
            };
        }

        let seats = hole_slots
            .into_iter()
            .map(|holes| {
                let mut seat = [Slot::Draw(0); HAND_CARDS];
                seat[..HOLE_CARDS].copy_from_slice(&holes);
                seat[HOLE_CARDS..].copy_from_slice(&board_slots);
                seat
            })
            .collect();

        debug_assert_eq!(next, deal.unknown());
        Self {
            players: deal.players(),
            deck: deal.remaining(),
            unknown: next,
            seats,
        }
    }

    /// The seat's full seven cards for this trial, packed for the evaluator.
    fn cards(&self, seat: usize, draw: &[Card]) -> PackedCards {
        let cards = self.seats[seat].map(|slot| match slot {
            Slot::Known(card) => card,
            Slot::Draw(index) => draw[index],
        });
        PackedCards::new(&cards)
    }
}

/// Evaluate one completed trial and record the outcome: a unique best
/// score wins, otherwise every tied seat gets a tie.
fn resolve(layout: &Layout, draw: &[Card], counters: &mut Counters) {
    let mut scores = [Score::ZERO; MAX_PLAYERS];
    let mut best = Score::ZERO;

    for seat in 0..layout.players {
        let mut hand = Hand::new();
        hand.add_packed(layout.cards(seat, draw), HAND_CARDS);
        let score = hand.finish().score();
        scores[seat] = score;
        if score > best {
            best = score;
        }
    }

    let mut winner = 0;
    let mut tied = 0;
    for (seat, &score) in scores[..layout.players].iter().enumerate() {
        if score == best {
            winner = seat;
            tied += 1;
        }
    }

    if tied == 1 {
        counters.add_win(winner);
    } else {
        for (seat, &score) in scores[..layout.players].iter().enumerate() {
            if score == best {
                counters.add_tie(seat);
            }
        }
    }
    counters.trials += 1;
}

/// Monte Carlo worker body: each trial draws the unknown slots uniformly,
/// without replacement, from the remaining deck.
fn sample_range(layout: &Layout, count: u64, mut rng: ChaCha8Rng) -> Counters {
    let mut counters = Counters::default();
    let mut deck = layout.deck.clone();
    for _ in 0..count {
        let (draw, _) = deck.partial_shuffle(&mut rng, layout.unknown);
        resolve(layout, draw, &mut counters);
    }
    counters
}

/// Enumeration worker body: walks the worker's contiguous index range,
/// mapping each index to one combination of the remaining deck.
fn enumerate_range(layout: &Layout, start: u64, count: u64) -> Counters {
    let mut counters = Counters::default();
    let mut draw = vec![Card::new(Rank::Two, Suit::Clubs); layout.unknown];
    for_each_ksubset(layout.deck.len(), layout.unknown, start, count, |positions| {
        for (slot, &position) in positions.iter().enumerate() {
            draw[slot] = layout.deck[position];
        }
        resolve(layout, &draw, &mut counters);
    });
    counters
}

/// The `nth` k-combination of `0..n` in the combinatorial number system
/// (positions ascending), so disjoint index ranges enumerate disjoint
/// combinations.
fn nth_ksubset(mut n: u64, k: usize) -> Vec<usize> {
    let mut out = vec![0; k];
    for i in (0..k).rev() {
        // largest c with C(c, i + 1) <= n
        let mut c = i;
        while c < 52 && nck(c + 1, i + 1) <= n {
            c += 1;
        }
        out[i] = c;
        n -= nck(c, i + 1);
    }
    out
}

/// Visit `count` k-combinations of `0..n` starting from the `nth` one.
/// Stepping follows Knuth's Algorithm L (TAOCP 4A, 7.2.1.3).
fn for_each_ksubset<F>(n: usize, k: usize, nth: u64, count: u64, mut f: F)
where
    F: FnMut(&[usize]),
{
    if count == 0 {
        return;
    }
    if k == 0 {
        // Only the empty completion exists.
        f(&[]);
        return;
    }

    let mut c = vec![0usize; k + 3];
    for (i, position) in nth_ksubset(nth, k).into_iter().enumerate() {
        c[i + 1] = position;
    }
    c[k + 1] = n;

    let mut visited = 0;
    loop {
        f(&c[1..=k]);

        visited += 1;
        if visited >= count {
            break;
        }

        let mut j = 1;
        while c[j] + 1 == c[j + 1] {
            c[j] = j - 1;
            j += 1;
        }
        if j > k {
            break;
        }
        c[j] += 1;
    }
}
