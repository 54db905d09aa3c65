use std::collections::{BTreeMap, BTreeSet};

use ben_or::{
    Body, Config, Lifecycle, NodeId, ParticipantState, Request, Result, StatusCode, Value, Vote,
};
use ben_or_net::Net;
use eyre::eyre;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use rand::{prelude::StdRng, Rng, SeedableRng};


static INIT: std::sync::Once = std::sync::Once::new();

fn init() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn rng_from(seed: u128) -> StdRng {
    let mut seed_buf = [0u8; 32];
    seed_buf[0..16].copy_from_slice(&seed.to_le_bytes());
    StdRng::from_seed(seed_buf)
}

fn values(raw: &[u8]) -> Vec<Value> {
    raw.iter().map(|v| Value::from(*v == 1)).collect()
}

#[test]
fn test_unanimous_correct_participants_decide_in_round_zero() -> Result<()> {
    init();
    let mut rng = StdRng::from_seed([0u8; 32]);
    let config = Config::new(4, 1)?;
    let faulty = BTreeSet::from_iter([3]);
    let mut net = Net::with_procs(config, &values(&[1, 1, 1, 0]), &faulty, &mut rng);

    let resps = net.start_all();
    for id in 0..3 {
        assert_eq!(resps[id].status, StatusCode::OK);
    }
    assert_eq!(resps[3].status, StatusCode::INTERNAL_SERVER_ERROR);

    net.drain_queued_packets();

    for id in 0..3 {
        assert_eq!(
            net.state(id),
            ParticipantState {
                killed: false,
                x: Some(Value::One),
                decided: true,
                k: Some(0),
            }
        );
    }
    assert!(!net.state(3).decided);

    // every correct vote sent to the faulty participant bounced
    assert_eq!(net.rejected_packets.len(), 3);
    assert!(net.rejected_packets.iter().all(|(p, _)| p.dest == 3));
    Ok(())
}

#[test]
fn test_split_start_randomizes_until_agreement() -> eyre::Result<()> {
    init();
    let mut rng = StdRng::from_seed([0u8; 32]);
    let config = Config::new(4, 1)?;
    let faulty = BTreeSet::from_iter([3]);
    let mut net = Net::with_procs(config, &values(&[0, 0, 1, 1]), &faulty, &mut rng);

    net.start_all();

    // deliver round 0 only: {0, 0, 1} holds no majority of 4
    while net
        .packets
        .front()
        .map(|p| p.vote.round == 0)
        .unwrap_or(false)
    {
        net.deliver_next();
    }
    for id in 0..3 {
        let p = net.proc(id);
        assert_eq!(p.round(), Some(1));
        assert_eq!(p.decision(), None);
    }

    net.drain_queued_packets();
    net.generate_msc("test_split_start_randomizes_until_agreement.msc")?;

    let decisions = net.decisions();
    assert_eq!(decisions.len(), 3);
    let decided = decisions
        .values()
        .next()
        .ok_or_else(|| eyre!("nobody decided"))?;
    assert!(decisions.values().all(|v| v == decided));

    let rounds = BTreeSet::from_iter((0..3).map(|id| net.proc(id).round()));
    assert_eq!(rounds.len(), 1, "correct participants move in lockstep");
    assert!(rounds.iter().all(|r| r.unwrap_or_default() >= 1));
    Ok(())
}

#[test]
fn test_stop_after_decision_keeps_the_decision() -> Result<()> {
    init();
    let mut rng = StdRng::from_seed([0u8; 32]);
    let config = Config::new(4, 1)?;
    let faulty = BTreeSet::from_iter([3]);
    let mut net = Net::with_procs(config, &values(&[1, 1, 1, 0]), &faulty, &mut rng);
    net.start_all();
    net.drain_queued_packets();

    let resp = net.request(0, Request::Stop);
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        net.request(0, Request::GetState).body,
        Body::State(ParticipantState {
            killed: true,
            x: Some(Value::One),
            decided: true,
            k: Some(0),
        })
    );

    let resp = net.request(0, Request::Message(Vote::new(1, 0, Value::Zero)));
    assert_eq!(resp.status, StatusCode::GONE);
    assert_eq!(net.proc(0).decision(), Some(Value::One));
    Ok(())
}

#[test]
fn test_future_round_vote_is_dropped() -> Result<()> {
    init();
    let mut rng = StdRng::from_seed([0u8; 32]);
    let config = Config::new(4, 1)?;
    let mut net = Net::with_procs(config, &values(&[0, 1, 0, 1]), &BTreeSet::new(), &mut rng);

    // walk participant 0 up to round 2 by hand
    net.request(0, Request::Start);
    net.packets.clear();
    for round in 0..2 {
        // with one 0 and one 1 from peers no value can reach 3 of 4
        net.request(0, Request::Message(Vote::new(1, round, Value::Zero)));
        let resp = net.request(0, Request::Message(Vote::new(2, round, Value::One)));
        assert_eq!(resp.status, StatusCode::OK);
    }
    assert_eq!(net.proc(0).round(), Some(2));
    let before = net.proc(0).ledger().len(2);

    let resp = net.request(0, Request::Message(Vote::new(3, 5, Value::One)));
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(net.proc(0).ledger().len(2), before);
    assert_eq!(net.proc(0).ledger().len(5), 0);
    assert_eq!(net.proc(0).round(), Some(2));
    Ok(())
}

#[test]
fn test_faulty_participant_never_participates() -> Result<()> {
    init();
    let mut rng = StdRng::from_seed([0u8; 32]);
    let config = Config::new(3, 1)?;
    let faulty = BTreeSet::from_iter([1]);
    let mut net = Net::with_procs(config, &values(&[1, 1, 1]), &faulty, &mut rng);
    net.start_all();
    net.drain_queued_packets();

    assert!(net.delivered_packets.iter().all(|p| p.source != 1));
    assert_eq!(net.proc(1).lifecycle(), Lifecycle::Idle);
    assert_eq!(net.proc(1).decision(), None);
    assert_eq!(
        net.request(1, Request::Status).body,
        Body::Text("faulty".to_string())
    );
    assert_eq!(net.decisions().len(), 2);
    Ok(())
}

#[test]
fn test_unreachable_quorum_never_progresses() -> Result<()> {
    init();
    let mut rng = StdRng::from_seed([0u8; 32]);
    let config = Config::new(5, 1)?;
    // two faulty participants where only one is tolerated
    let faulty = BTreeSet::from_iter([3, 4]);
    let mut net = Net::with_procs(config, &values(&[1, 1, 1, 1, 1]), &faulty, &mut rng);
    net.start_all();
    net.drain_queued_packets();

    for id in 0..3 {
        assert_eq!(net.proc(id).lifecycle(), Lifecycle::Running { round: 0 });
        assert_eq!(net.proc(id).ledger().len(0), 3);
    }
    assert!(net.decisions().is_empty());
    Ok(())
}

#[derive(Debug, Clone)]
struct Run {
    config: Config,
    faulty: BTreeSet<NodeId>,
    initial: Vec<Value>,
}

impl Run {
    // n in 1..=7 with exactly f silent participants, so every correct
    // participant's quorum is the votes of all correct participants.
    fn generate(n: u8, f: u8, initial: &[bool], rng: &mut StdRng) -> Option<Self> {
        let n = (n % 7 + 1) as usize;
        let f = f as usize % ((n - 1) / 2 + 1);
        let config = Config::new(n, f).ok()?;
        let mut ids = Vec::from_iter(0..n);
        let mut faulty = BTreeSet::new();
        while faulty.len() < f {
            faulty.insert(ids.remove(rng.gen_range(0, ids.len())));
        }
        let initial = (0..n)
            .map(|i| Value::from(initial.get(i).copied().unwrap_or_default()))
            .collect();
        Some(Self {
            config,
            faulty,
            initial,
        })
    }

    fn correct_initial_values(&self) -> BTreeSet<Value> {
        self.initial
            .iter()
            .enumerate()
            .filter(|(id, _)| !self.faulty.contains(id))
            .map(|(_, v)| *v)
            .collect()
    }
}

#[quickcheck]
fn prop_fifo_delivery_terminates_in_agreement(
    n: u8,
    f: u8,
    initial: Vec<bool>,
    seed: u128,
) -> eyre::Result<TestResult> {
    init();
    let mut rng = rng_from(seed);
    let run = match Run::generate(n, f, &initial, &mut rng) {
        Some(run) => run,
        None => return Ok(TestResult::discard()),
    };

    let mut net = Net::with_procs(run.config, &run.initial, &run.faulty, &mut rng);
    net.start_all();
    net.drain_queued_packets();

    // TERMINATION: every correct participant decided
    let decisions = net.decisions();
    assert_eq!(
        BTreeSet::from_iter(decisions.keys().copied()),
        BTreeSet::from_iter(net.correct_ids())
    );

    // AGREEMENT
    let decided = BTreeSet::from_iter(decisions.values().copied());
    assert_eq!(decided.len(), 1, "{:?}", decisions);

    // VALIDITY: unanimous correct participants decide their value at round 0
    let start_values = run.correct_initial_values();
    if start_values.len() == 1 {
        assert_eq!(decided, start_values);
        for id in net.correct_ids() {
            assert_eq!(net.proc(id).round(), Some(0));
        }
    }

    for id in run.faulty.iter() {
        assert_eq!(net.proc(*id).decision(), None);
    }

    Ok(TestResult::passed())
}

#[quickcheck]
fn prop_safety_under_reordering_and_loss(
    n: u8,
    f: u8,
    initial: Vec<bool>,
    actions: Vec<u8>,
    seed: u128,
) -> eyre::Result<TestResult> {
    init();
    let mut rng = rng_from(seed);
    let run = match Run::generate(n, f, &initial, &mut rng) {
        Some(run) => run,
        None => return Ok(TestResult::discard()),
    };

    let mut net = Net::with_procs(run.config, &run.initial, &run.faulty, &mut rng);
    let mut started = BTreeSet::new();
    let mut last_rounds: BTreeMap<NodeId, u64> = BTreeMap::new();
    let mut first_decisions: BTreeMap<NodeId, (u64, Value)> = BTreeMap::new();

    for action in actions.iter().take(200) {
        match action % 8 {
            0 => {
                // a participant that has not started yet starts
                let id = rng.gen_range(0, run.config.n);
                if started.insert(id) {
                    net.request(id, Request::Start);
                }
            }
            1 => {
                net.drop_random(&mut rng);
            }
            _ => {
                net.deliver_random(&mut rng);
            }
        }

        for id in net.correct_ids() {
            let p = net.proc(id);
            let round = p.round().unwrap_or_default();

            // MONOTONIC ROUND
            let last = last_rounds.entry(id).or_default();
            assert!(round >= *last, "{id} went from round {} to {round}", *last);
            *last = round;

            // TERMINAL IMMUTABILITY
            if let Some(value) = p.decision() {
                let first = first_decisions.entry(id).or_insert((round, value));
                assert_eq!(*first, (round, value));
            }
        }
    }

    // SAFETY: decided correct participants agree
    let decided = BTreeSet::from_iter(net.decisions().values().copied());
    assert!(decided.len() <= 1, "{:?}", net.decisions());

    // FAULT ISOLATION
    for id in run.faulty.iter() {
        assert_eq!(net.proc(*id).decision(), None);
        assert!(net.delivered_packets.iter().all(|p| p.source != *id));
    }

    Ok(TestResult::passed())
}
