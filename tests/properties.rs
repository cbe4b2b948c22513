//! Property tests: random publish/attach/detach sequences against a
//! reference model of each view.

use multiqueue::{Channel, Multiplexer, Subscription};
use proptest::prelude::*;

const SLOTS: usize = 3;

#[derive(Clone, Debug)]
enum Op {
    Publish,
    Attach(usize),
    Detach(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Publish),
        1 => (0..SLOTS).prop_map(Op::Attach),
        1 => (0..SLOTS).prop_map(Op::Detach),
    ]
}

/// Expected output of one consumer slot across all its attachments.
#[derive(Default)]
struct ModelSlot {
    attached: bool,
    caught_up: Vec<u32>,
    new_only: Vec<u32>,
    latest: Vec<Option<u32>>,
    replay: Vec<u32>,
}

#[derive(Default)]
struct Model {
    slots: Vec<ModelSlot>,
    pending: Vec<u32>,
    history: Vec<u32>,
}

impl Model {
    fn new() -> Self {
        Self {
            slots: (0..SLOTS).map(|_| ModelSlot::default()).collect(),
            ..Default::default()
        }
    }

    fn publish(&mut self, value: u32) {
        let any_attached = self.slots.iter().any(|s| s.attached);
        if !any_attached {
            self.pending.push(value);
        }
        for slot in self.slots.iter_mut().filter(|s| s.attached) {
            slot.caught_up.push(value);
            slot.new_only.push(value);
            slot.latest.push(Some(value));
            slot.replay.push(value);
        }
        self.history.push(value);
    }

    fn attach(&mut self, index: usize) {
        if self.slots[index].attached {
            return;
        }
        let first = !self.slots.iter().any(|s| s.attached);
        let slot = &mut self.slots[index];
        slot.attached = true;
        if first {
            slot.caught_up.append(&mut self.pending);
        }
        slot.latest.push(self.history.last().copied());
        slot.replay.extend(self.history.iter().copied());
    }

    fn detach(&mut self, index: usize) {
        self.slots[index].attached = false;
    }
}

/// Live handles for one slot; every attachment's subscription is kept so
/// its queue can be drained at the end.
#[derive(Default)]
struct RealSlot {
    current: Option<[usize; 4]>,
    caught_up: Vec<Subscription<u32>>,
    new_only: Vec<Subscription<u32>>,
    latest: Vec<Subscription<Option<u32>>>,
    replay: Vec<Subscription<u32>>,
}

fn drain<T>(subs: &[Subscription<T>]) -> Vec<T> {
    subs.iter().flat_map(|s| s.drain_values()).collect()
}

proptest! {
    #[test]
    fn prop_views_match_model(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mux = Multiplexer::new();
        let mut model = Model::new();
        let mut real: Vec<RealSlot> = (0..SLOTS).map(|_| RealSlot::default()).collect();
        let mut next_value = 0u32;

        for op in &ops {
            match *op {
                Op::Publish => {
                    mux.publish(next_value).unwrap();
                    model.publish(next_value);
                    next_value += 1;
                }
                Op::Attach(i) => {
                    if real[i].current.is_none() {
                        let slot = &mut real[i];
                        slot.caught_up.push(mux.caught_up().attach());
                        slot.new_only.push(mux.new_only().attach());
                        slot.latest.push(mux.latest_plus_new().attach());
                        slot.replay.push(mux.replay_all().attach());
                        slot.current = Some([
                            slot.caught_up.len() - 1,
                            slot.new_only.len() - 1,
                            slot.latest.len() - 1,
                            slot.replay.len() - 1,
                        ]);
                    }
                    model.attach(i);
                }
                Op::Detach(i) => {
                    let slot = &mut real[i];
                    if let Some([c, n, l, r]) = slot.current.take() {
                        slot.caught_up[c].detach();
                        slot.new_only[n].detach();
                        slot.latest[l].detach();
                        slot.replay[r].detach();
                    }
                    model.detach(i);
                }
            }

            let attached = model.slots.iter().filter(|s| s.attached).count();
            prop_assert_eq!(mux.caught_up().consumer_count(), attached);
            prop_assert_eq!(mux.caught_up().pending_len(), model.pending.len());
        }

        for (slot, expected) in real.iter().zip(&model.slots) {
            prop_assert_eq!(drain(&slot.caught_up), expected.caught_up.clone());
            prop_assert_eq!(drain(&slot.new_only), expected.new_only.clone());
            prop_assert_eq!(drain(&slot.latest), expected.latest.clone());
            prop_assert_eq!(drain(&slot.replay), expected.replay.clone());
        }
    }

    #[test]
    fn prop_caught_up_never_loses_values(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let mux = Multiplexer::new();
        let caught_up = mux.caught_up();
        let mut slots: Vec<Option<Subscription<u32>>> = (0..SLOTS).map(|_| None).collect();
        let mut finished: Vec<Subscription<u32>> = Vec::new();
        let mut published = 0u32;

        for op in &ops {
            match *op {
                Op::Publish => {
                    mux.publish(published).unwrap();
                    published += 1;
                }
                Op::Attach(i) => {
                    if slots[i].is_none() {
                        slots[i] = Some(caught_up.attach());
                    }
                }
                Op::Detach(i) => {
                    if let Some(sub) = slots[i].take() {
                        sub.detach();
                        finished.push(sub);
                    }
                }
            }
        }

        let mut seen: Vec<u32> = finished.iter().flat_map(|s| s.drain_values()).collect();
        seen.extend(slots.iter().flatten().flat_map(|s| s.drain_values()));
        let last = caught_up.attach();
        seen.extend(last.drain_values());

        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen, (0..published).collect::<Vec<_>>());
    }
}
