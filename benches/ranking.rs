#[macro_use]
extern crate bencher;
extern crate rand;

use bencher::Bencher;
use hashbrown::{HashMap, HashSet};
use rand::Rng;

use minuet::io::{ItemId, UserId};
use minuet::model::bivae::BiVae;
use minuet::ranking;

const QTY_USERS: usize = 200;
const QTY_ITEMS: usize = 2_000;
const QTY_SEEN_ITEMS: usize = 50;
const LATENT_DIM: usize = 32;
const TOP_K: usize = 10;

fn synthetic_model() -> BiVae {
    let user_ids: Vec<UserId> = (0..QTY_USERS as u64).collect();
    let item_ids: Vec<ItemId> = (0..QTY_ITEMS as u64).collect();
    BiVae::seeded(LATENT_DIM, user_ids, item_ids, &[64], 42)
}

fn random_seen_items() -> HashSet<ItemId> {
    let mut rng = rand::thread_rng();
    (0..QTY_SEEN_ITEMS)
        .map(|_| rng.gen_range(0..QTY_ITEMS as u64))
        .collect()
}

fn bench_rank_unseen(bench: &mut Bencher) {
    let model = synthetic_model();
    let seen = random_seen_items();

    bench.iter(|| ranking::rank_unseen(&model, 7, Some(&seen), TOP_K));
}

fn bench_predict_ranking(bench: &mut Bencher) {
    let model = synthetic_model();
    let users: Vec<UserId> = (0..QTY_USERS as u64).collect();
    let seen_by_user: HashMap<UserId, HashSet<ItemId>> = users
        .iter()
        .map(|user| (*user, random_seen_items()))
        .collect();

    bench.iter(|| ranking::predict_ranking(&model, &seen_by_user, &users, TOP_K, true));
}

benchmark_group!(benches, bench_rank_unseen, bench_predict_ranking);
benchmark_main!(benches);
