//! Concurrent registry access.
//!
//! Many threads creating entries at once must still produce a dense,
//! duplicate-free id range, and fan-outs must tolerate concurrent churn.

mod common;

use std::{collections::BTreeSet, thread};

use common::{NullTransport, RecordingTransport};
use proptest::prelude::*;
use weft_net::{NetConfig, NetService, SessionStatus};

const THREADS: usize = 8;
const PER_THREAD: usize = 250;

#[test]
fn concurrent_agent_creation_yields_dense_ids() {
    let net = NetService::new(NetConfig::frontend());
    let shared = &net;

    let ids: Vec<u64> = thread::scope(|scope| {
        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(move || {
                    (0..PER_THREAD)
                        .map(|_| shared.create_agent(NullTransport).id())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers.into_iter().flat_map(|w| w.join().unwrap()).collect()
    });

    let total = THREADS * PER_THREAD;
    let unique: BTreeSet<u64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), total);
    assert_eq!(unique, (1..=total as u64).collect::<BTreeSet<_>>());
    assert_eq!(net.agent_count(), total);

    for id in unique {
        assert_eq!(net.get_agent(id).unwrap().id(), id);
    }
}

#[test]
fn concurrent_acceptor_creation_is_independent_of_agents() {
    let net = NetService::new(NetConfig::backend());

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                for _ in 0..PER_THREAD {
                    net.create_agent(NullTransport);
                    net.create_acceptor(NullTransport);
                }
            });
        }
    });

    let total = THREADS * PER_THREAD;
    assert_eq!(net.agent_count(), total);
    assert_eq!(net.acceptor_count(), total);
    assert!(net.get_acceptor(total as u64).is_ok());
    assert!(net.get_acceptor(total as u64 + 1).is_err());
}

#[test]
fn broadcast_during_churn() {
    let net = NetService::new(NetConfig::frontend());
    let stable = RecordingTransport::new();
    let anchor = net.create_agent(stable.clone());
    anchor.session().set_status(SessionStatus::Working);

    thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..200 {
                let agent = net.create_agent(NullTransport);
                net.close_session(agent.session());
            }
        });
        scope.spawn(|| {
            for _ in 0..200 {
                net.broadcast("world.tick", b"");
            }
        });
        scope.spawn(|| {
            for _ in 0..200 {
                net.heartbeat();
            }
        });
    });

    assert_eq!(net.agent_ids(), vec![anchor.id()]);
    assert_eq!(stable.frame_count(), 400);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: ids stay unique and increasing under any interleaving of
    /// creates and removals
    #[test]
    fn prop_ids_never_reused(ops in prop::collection::vec(any::<bool>(), 1..200)) {
        let net = NetService::default();
        let mut issued = Vec::new();

        for create in ops {
            if create || issued.is_empty() {
                issued.push(net.create_agent(NullTransport).id());
            } else {
                let victim = issued[issued.len() / 2];
                net.remove_agent(victim);
            }
        }

        prop_assert!(issued.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(issued.first().copied(), Some(1));
        prop_assert_eq!(*issued.last().unwrap(), issued.len() as u64);
    }
}
