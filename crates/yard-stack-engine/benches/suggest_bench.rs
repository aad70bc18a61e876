use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use yard_stack_core::prelude::*;
use yard_stack_engine::prelude::*;
use yard_stack_model::prelude::*;

// ---------- Scenario knobs ----------
const SEED: u64 = 0x5C0_4E5;

const BLOCKS: u32 = 12;
const SLOTS_PER_BLOCK: u32 = 40;
const ROWS_PER_BLOCK: u32 = 4;
const TIERS: u8 = 5;

// Share of tiers occupied before querying
const FILL: f64 = 0.7;

// Every 8th slot is a reefer plug, every 3rd takes 40ft boxes
const REEFER_EVERY: u32 = 8;
const FORTY_EVERY: u32 = 3;

const PASS_QUERIES: usize = 500;

fn build_layout() -> YardLayout {
    let cap = TierCapacity::new(TIERS).expect("valid capacity");
    let mut b = YardLayoutBuilder::new();
    b.add_yard(Yard::new(YardId::new(1), "Bench"))
        .expect("yard");
    for blk in 0..BLOCKS {
        let block = BlockId::new(blk + 1);
        b.add_block(Block::new(block, format!("B{blk:02}"), YardId::new(1)))
            .expect("block");
        for i in 0..SLOTS_PER_BLOCK {
            let n = blk * SLOTS_PER_BLOCK + i + 1;
            let row = i % ROWS_PER_BLOCK;
            let col = i / ROWS_PER_BLOCK;
            let size = if n % FORTY_EVERY == 0 {
                ContainerSize::Forty
            } else {
                ContainerSize::Twenty
            };
            let slot = Slot::new(SlotId::new(n), format!("{row}{col:02}"), block, format!("R{row}"), row, col, cap)
                .with_size(size)
                .with_reefer(n % REEFER_EVERY == 0);
            b.add_slot(slot).expect("slot");
        }
    }
    b.build()
}

fn build_filled() -> (InMemoryStore, Vec<ContainerNo>) {
    let store = InMemoryStore::new(build_layout());
    let clock = ManualClock::default();
    let ctl = PlacementController::new(&store, &clock);
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let slot_count = BLOCKS * SLOTS_PER_BLOCK;
    let target = (slot_count as f64 * TIERS as f64 * FILL) as usize;

    let mut placed = Vec::with_capacity(target);
    let mut n = 0u32;
    while placed.len() < target {
        let slot = SlotId::new(rng.random_range(1..=slot_count));
        let container = ContainerNo::parse(&format!("FILL{n:07}")).expect("container");
        n += 1;
        if ctl.assign(container.clone(), slot).is_ok() {
            placed.push(container);
        }
    }
    (store, placed)
}

fn random_request<R: Rng + ?Sized>(rng: &mut R, placed: &[ContainerNo]) -> SuggestRequest {
    let mut request = SuggestRequest::default();
    if rng.random_bool(0.3) {
        request.size = Some(ContainerSize::Forty);
    }
    request.reefer = rng.random_bool(0.1);
    if rng.random_bool(0.5) {
        request.preferred_blocks = vec![BlockId::new(rng.random_range(1..=BLOCKS))];
    }
    if rng.random_bool(0.5) {
        request.co_locate_with = (0..4)
            .map(|_| placed[rng.random_range(0..placed.len())].clone())
            .collect();
    }
    if rng.random_bool(0.5) {
        request.approach = Approach::RowEnd;
    }
    request
}

fn run_suggest_pass(store: &InMemoryStore, placed: &[ContainerNo]) {
    let config = ScoringConfig::default();
    let engine = SuggestionEngine::new(store, &config);
    let mut rng = ChaCha8Rng::seed_from_u64(SEED ^ 0xBEEF);
    for _ in 0..PASS_QUERIES {
        let request = random_request(&mut rng, placed);
        black_box(engine.suggest(&request));
    }
}

// -------------- Criterion wiring --------------
fn bench_suggest(c: &mut Criterion) {
    c.bench_function("suggest_seventy_percent_full_yard", |bch| {
        bch.iter_batched(
            build_filled,
            |(store, placed)| run_suggest_pass(&store, &placed),
            BatchSize::LargeInput,
        );
    });

    c.bench_function("stack_map_seventy_percent_full_yard", |bch| {
        let (store, _) = build_filled();
        bch.iter(|| black_box(StackMap::project(&store, Timestamp::default())));
    });
}

criterion_group!(suggest, bench_suggest);
criterion_main!(suggest);
