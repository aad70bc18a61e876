// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::{collections::BTreeMap, fs::File, io::BufWriter, time::Instant};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};
use yard_stack_core::prelude::*;
use yard_stack_engine::prelude::*;
use yard_stack_model::prelude::*;

const SEED: u64 = 42;
const WORKERS: usize = 8;
const OPS_PER_WORKER: usize = 2_000;

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .init();
}

fn load_config() -> EngineConfig {
    match std::env::var("YARD_ENGINE_CONFIG") {
        Ok(path) => {
            let file = File::open(&path).expect("open engine config");
            let cfg: EngineConfig = serde_json::from_reader(file).expect("parse engine config");
            info!(%path, "Loaded engine config");
            cfg
        }
        Err(_) => EngineConfig::default(),
    }
}

// Two yards, 3 blocks each, 4 rows x 6 bays per block. Every 5th bay has reefer plugs.
fn demo_layout() -> YardLayout {
    let mut b = YardLayoutBuilder::new();
    let mut block_id = 0u32;
    let mut slot_id = 0u32;
    for (y, name) in ["North", "South"].into_iter().enumerate() {
        let yard = YardId::new(y as u32 + 1);
        b.add_yard(Yard::new(yard, name)).expect("add yard");
        for code in ["A", "B", "C"] {
            block_id += 1;
            let block = BlockId::new(block_id);
            b.add_block(Block::new(block, code, yard)).expect("add block");
            for row in 0..4u32 {
                let label = char::from(b'A' + row as u8).to_string();
                for col in 0..6u32 {
                    slot_id += 1;
                    let cap = TierCapacity::new(if row == 0 { 3 } else { 5 }).expect("capacity");
                    let size = if col % 2 == 0 {
                        ContainerSize::Twenty
                    } else {
                        ContainerSize::Forty
                    };
                    let slot = Slot::new(
                        SlotId::new(slot_id),
                        format!("{label}{:02}", col + 1),
                        block,
                        label.as_str(),
                        row,
                        col,
                        cap,
                    )
                    .with_size(size)
                    .with_reefer(col % 5 == 4);
                    b.add_slot(slot).expect("add slot");
                }
            }
        }
    }
    b.build()
}

#[derive(Debug, Default, Clone, Serialize)]
struct WorkerTally {
    ok: BTreeMap<&'static str, usize>,
    rejected: BTreeMap<String, usize>,
}

impl WorkerTally {
    fn record<T>(&mut self, op: &'static str, result: &Result<T, EngineError>) {
        match result {
            Ok(_) => *self.ok.entry(op).or_default() += 1,
            Err(e) => *self.rejected.entry(format!("{op}:{}", e.kind())).or_default() += 1,
        }
    }

    fn merge(mut self, other: WorkerTally) -> Self {
        for (k, v) in other.ok {
            *self.ok.entry(k).or_default() += v;
        }
        for (k, v) in other.rejected {
            *self.rejected.entry(k).or_default() += v;
        }
        self
    }
}

fn run_worker<K: Clock>(engine: &YardEngine<InMemoryStore, K>, worker: usize) -> WorkerTally {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED + worker as u64);
    let slot_count = engine.layout().slot_count() as u32;
    let mut tally = WorkerTally::default();
    let mut mine: Vec<ContainerNo> = Vec::new();

    for i in 0..OPS_PER_WORKER {
        let container =
            ContainerNo::parse(&format!("W{worker}-{i:06}")).expect("valid container number");
        match rng.random_range(0..10) {
            // staged flow: suggest, hold the best tier, confirm
            0..=3 => {
                let request = SuggestRequest {
                    size: rng.random_bool(0.5).then_some(ContainerSize::Forty),
                    preferred_blocks: vec![BlockId::new(rng.random_range(1..=6))],
                    co_locate_with: mine.iter().rev().take(3).cloned().collect(),
                    ..SuggestRequest::default()
                };
                let Some(best) = engine.suggest(&request).first().copied() else {
                    continue;
                };
                let held = engine.hold(best.slot(), HoldRequest::auto().by(format!("worker-{worker}")));
                tally.record("hold", &held);
                let Ok(address) = held else {
                    continue;
                };
                let confirmed = engine.confirm(address, container.clone());
                tally.record("confirm", &confirmed);
                if confirmed.is_ok() {
                    mine.push(container);
                } else {
                    tally.record("release", &engine.release(address));
                }
            }
            4..=6 => {
                let slot = SlotId::new(rng.random_range(1..=slot_count));
                let assigned = engine.assign(container.clone(), slot);
                tally.record("assign", &assigned);
                if assigned.is_ok() {
                    mine.push(container);
                }
            }
            7 => {
                let slot = SlotId::new(rng.random_range(1..=slot_count));
                if let Ok(address) = engine.hold(slot, HoldRequest::auto()) {
                    let released = engine.release(address);
                    tally.record("release", &released);
                }
            }
            _ => {
                if mine.is_empty() {
                    continue;
                }
                let idx = rng.random_range(0..mine.len());
                let removed = engine.remove_by_container(&mine[idx]);
                tally.record("remove", &removed);
                if removed.is_ok() {
                    mine.swap_remove(idx);
                }
            }
        }
    }
    tally
}

#[derive(Debug, Clone, Serialize)]
struct WorkloadReport {
    seed: u64,
    workers: usize,
    ops_per_worker: usize,
    elapsed_ms: u128,
    occupied: usize,
    held: usize,
    free: usize,
    stale_holds: usize,
    tally: WorkerTally,
}

fn write_json<T: Serialize>(path: &str, value: &T) {
    let file = File::create(path).unwrap_or_else(|e| panic!("create {path}: {e}"));
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .unwrap_or_else(|e| panic!("write {path}: {e}"));
}

fn main() {
    enable_tracing();

    let config = load_config();
    let engine = YardEngine::in_memory(demo_layout(), config);
    info!(layout = %engine.layout(), "Built demo yard");

    let t0 = Instant::now();
    let tally = (0..WORKERS)
        .into_par_iter()
        .map(|w| run_worker(&engine, w))
        .reduce(WorkerTally::default, WorkerTally::merge);
    let elapsed = t0.elapsed();

    engine.store().verify().expect("store invariants hold");

    let map = engine.stack_map();
    let report = WorkloadReport {
        seed: SEED,
        workers: WORKERS,
        ops_per_worker: OPS_PER_WORKER,
        elapsed_ms: elapsed.as_millis(),
        occupied: map.counts().occupied(),
        held: map.counts().held(),
        free: map.counts().free(),
        stale_holds: engine.stale_holds().len(),
        tally,
    };
    info!(
        occupied = report.occupied,
        held = report.held,
        free = report.free,
        elapsed_ms = report.elapsed_ms,
        "Workload finished"
    );

    write_json("stack_map.json", &map);
    write_json(
        "yard_snapshot.json",
        &engine.store().snapshot(engine.clock().now()),
    );
    write_json("workload_report.json", &report);

    println!();
    println!("=================================================================");
    println!("========================= Workload Done =========================");
    println!("=================================================================");
    println!();
    println!("Wrote: stack_map.json, yard_snapshot.json, workload_report.json");
}
