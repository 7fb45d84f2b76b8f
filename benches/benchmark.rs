use assignment_market::{run_auction_with_params, MarketGraph, TieBreak};
use criterion::BenchmarkId;
use criterion::Throughput;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, SamplingMode};
use rand::distributions::{Bernoulli, Distribution, Uniform};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::Beta;
use reservoir_sampling::unweighted::core::r as reservoir_sample;

type Key = u32;
type Price = i64;

const MAX_ROUNDS: u32 = 100_000;

/// Square market where every buyer values every seller with probability `density`.
///
/// Every buyer is guaranteed at least one edge.
fn gen_dense_market(
    seed: u64,
    size: Key,
    density: f64,
    min_value: Price,
    max_value: Price,
) -> MarketGraph<Key, Price> {
    let mut val_rng = ChaCha8Rng::seed_from_u64(seed);
    let mut filter_rng = ChaCha8Rng::seed_from_u64(seed + 1);

    let between = Uniform::from(min_value..max_value);
    let num_of_edges_fully_dense = size.pow(2);
    let target_elements_from_prng = ((num_of_edges_fully_dense as f64) * density) as u32;
    let whether_to_add = Bernoulli::from_ratio(target_elements_from_prng, num_of_edges_fully_dense)
        .expect("unexpected error");
    let mut ensured_buyer_to_seller = (0..size).collect::<Vec<Key>>();
    ensured_buyer_to_seller.as_mut_slice().shuffle(&mut filter_rng);

    // sellers are 0..size, buyers are size..2 * size
    let mut market = MarketGraph::with_capacity(
        size as usize,
        size as usize,
        target_elements_from_prng as usize + size as usize,
    );
    (0..size).for_each(|seller| market.add_seller(seller, 0).unwrap());
    (0..size).for_each(|buyer| market.add_buyer(size + buyer).unwrap());
    (0..size)
        .flat_map(|buyer| (0..size).map(move |seller| (buyer, seller)))
        .for_each(|(buyer, seller)| {
            if whether_to_add.sample(&mut filter_rng)
                || ensured_buyer_to_seller[buyer as usize] == seller
            {
                let v = between.sample(&mut val_rng);
                market.add_valuation(seller, size + buyer, v).unwrap();
            }
        });
    market
}

/// Market with more sellers than buyers where every buyer values `edges_per_buyer` sellers.
fn gen_sparse_market(
    seed: u64,
    num_of_buyers: Key,
    num_of_sellers: Key,
    edges_per_buyer: Key,
    min_value: f64,
    range_width: f64,
) -> MarketGraph<Key, Price> {
    let mut val_rng = ChaCha8Rng::seed_from_u64(seed);
    let mut filter_rng = ChaCha8Rng::seed_from_u64(seed + 1);
    let beta = Beta::new(3.0, 3.0).unwrap();

    let mut market = MarketGraph::with_capacity(
        num_of_sellers as usize,
        num_of_buyers as usize,
        (num_of_buyers * edges_per_buyer) as usize,
    );
    (0..num_of_sellers).for_each(|seller| market.add_seller(seller, 0).unwrap());
    (0..num_of_buyers).for_each(|buyer| market.add_buyer(num_of_sellers + buyer).unwrap());
    (0..num_of_buyers)
        .map(|buyer| {
            let mut seller_samples = vec![0; edges_per_buyer as usize];
            reservoir_sample(0..num_of_sellers, seller_samples.as_mut_slice(), &mut filter_rng);
            seller_samples.sort_unstable();
            (buyer, seller_samples)
        })
        .for_each(|(buyer, seller_samples)| {
            seller_samples.iter().for_each(|seller| {
                let v = (range_width * beta.sample(&mut val_rng) + min_value).floor() as Price;
                market
                    .add_valuation(*seller, num_of_sellers + buyer, v)
                    .unwrap();
            });
        });
    market
}

fn report(result: anyhow::Result<assignment_market::AuctionOutcome<Key, Price>>) {
    if let Err(err) = result {
        println!("not cleared: {}", err)
    }
}

fn bench_dense_density_and_size(c: &mut Criterion, max_density_percent: u32, max_size: Key) {
    let mut group = c.benchmark_group("dense_random_degree");
    group.sample_size(10);
    group.sampling_mode(SamplingMode::Flat);

    for density in (1..=max_density_percent).map(|i| i as f64 * 0.01) {
        for size in (50..=max_size).step_by(50) {
            let market = gen_dense_market(size as u64, size, density, 500, 1000);
            group.throughput(Throughput::Elements(market.num_of_edges() as u64));
            for tie_break in [TieBreak::EdgeOrder, TieBreak::LowestSellerKey].iter() {
                let benchmark_id = BenchmarkId::new(
                    format!("{:?}", tie_break),
                    format!("density {} size {}", density, size),
                );
                group.bench_with_input(benchmark_id, &market, |b, market| {
                    b.iter_batched(
                        || market.clone(),
                        |mut market| {
                            report(run_auction_with_params(
                                &mut market,
                                1,
                                Some(*tie_break),
                                Some(MAX_ROUNDS),
                                None,
                            ))
                        },
                        BatchSize::LargeInput,
                    );
                });
            }
        }
    }
    group.finish();
}

fn bench_sparse_num_of_buyers_and_edges_per_buyer(
    c: &mut Criterion,
    max_num_of_buyers: Key,
    max_edges_per_buyer: Key,
) {
    let mut group = c.benchmark_group("sparse_buyers");
    let num_of_sellers = 2000;
    group.sampling_mode(SamplingMode::Flat);

    for num_of_buyers in (100..=max_num_of_buyers).step_by(200) {
        for edges_per_buyer in (4..=max_edges_per_buyer).step_by(4) {
            let market = gen_sparse_market(
                num_of_buyers as u64,
                num_of_buyers,
                num_of_sellers,
                edges_per_buyer,
                300.0,
                700.0,
            );
            group.throughput(Throughput::Elements(market.num_of_edges() as u64));
            let benchmark_id = BenchmarkId::new(
                "edge_order",
                format!(
                    "num_of_buyers {}, num_of_sellers {}, edges_per_buyer {}",
                    num_of_buyers, num_of_sellers, edges_per_buyer
                ),
            );
            group.bench_with_input(benchmark_id, &market, |b, market| {
                b.iter_batched(
                    || market.clone(),
                    |mut market| {
                        report(run_auction_with_params(
                            &mut market,
                            1,
                            None,
                            Some(MAX_ROUNDS),
                            None,
                        ))
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_dense_density_5_size_200(c: &mut Criterion) {
    bench_dense_density_and_size(c, 5, 200)
}

fn bench_sparse_num_of_buyers_500_edges_per_buyer_16(c: &mut Criterion) {
    bench_sparse_num_of_buyers_and_edges_per_buyer(c, 500, 16)
}

criterion_group!(
    benches,
    bench_dense_density_5_size_200,
    bench_sparse_num_of_buyers_500_edges_per_buyer_16
);
criterion_main!(benches);
