// Consensus core benchmarks for the QUORUM protocol.
//
// Covers vote signing/verification, proposer selection, and stake-weighted
// vote tallying at varying validator-set sizes.

use std::collections::BTreeMap;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use quorum_protocol::consensus::vote::Phase;
use quorum_protocol::consensus::{count_votes, ProposerSelector, StakeLedger, Vote};
use quorum_protocol::crypto::{Address, Keypair};

/// Builds a genesis stake ledger with `n` validators, descending stake so
/// proposer selection is predictable.
fn setup_ledger(n: usize) -> (StakeLedger, Vec<Keypair>) {
    let mut keypairs: Vec<Keypair> = (0..n).map(|_| Keypair::generate()).collect();
    keypairs.sort_by_key(|kp| kp.address());

    let mut stakes: BTreeMap<Address, u64> = BTreeMap::new();
    for (i, kp) in keypairs.iter().enumerate() {
        stakes.insert(kp.address(), (n - i) as u64 * 1_000);
    }
    (StakeLedger::genesis(stakes), keypairs)
}

fn bench_vote_sign(c: &mut Criterion) {
    let keypair = Keypair::generate();
    c.bench_function("consensus/vote_sign", |b| {
        b.iter(|| {
            let mut vote = Vote::new(keypair.address(), 1, 0, Phase::Prevote, [0xABu8; 32], keypair.public_key());
            vote.sign(&keypair);
            vote
        });
    });
}

fn bench_vote_verify(c: &mut Criterion) {
    let keypair = Keypair::generate();
    let mut vote = Vote::new(keypair.address(), 1, 0, Phase::Prevote, [0xABu8; 32], keypair.public_key());
    vote.sign(&keypair);

    c.bench_function("consensus/vote_verify", |b| {
        b.iter(|| vote.has_valid_signature());
    });
}

fn bench_proposer_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("consensus/proposer_select");
    for validator_count in [4, 7, 13, 21] {
        group.throughput(Throughput::Elements(validator_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(validator_count),
            &validator_count,
            |b, &n| {
                let (ledger, _keypairs) = setup_ledger(n);
                b.iter(|| ProposerSelector::select(&ledger));
            },
        );
    }
    group.finish();
}

fn bench_vote_tally(c: &mut Criterion) {
    let mut group = c.benchmark_group("consensus/vote_tally");
    for validator_count in [4, 7, 13, 21] {
        group.throughput(Throughput::Elements(validator_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(validator_count),
            &validator_count,
            |b, &n| {
                b.iter_with_setup(
                    || {
                        let (ledger, keypairs) = setup_ledger(n);
                        let block_id = [0x11u8; 32];
                        let votes: Vec<Vote> = keypairs
                            .iter()
                            .map(|kp| {
                                let mut v =
                                    Vote::new(kp.address(), 1, 0, Phase::Prevote, block_id, kp.public_key());
                                v.sign(kp);
                                v
                            })
                            .collect();
                        (ledger, votes)
                    },
                    |(ledger, votes)| {
                        let refs: Vec<&Vote> = votes.iter().collect();
                        count_votes(&refs, &ledger)
                    },
                );
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_vote_sign,
    bench_vote_verify,
    bench_proposer_selection,
    bench_vote_tally,
);
criterion_main!(benches);
