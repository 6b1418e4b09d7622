#![cfg(test)]

// Property tests for Table kept inside the crate so they can check
// internal structure (array/hash placement, live counts) directly.

use crate::rc_value::Value;
use crate::table::Table;
use crate::value::LuaValue;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{BuildHasher, Hasher};

// Model-side key: ordered, so key sets can be compared directly.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Key {
    Int(i64),
    Str(String),
    // Non-integral float, by bit pattern.
    Frac(u64),
    // Index into the scenario's pool of table objects.
    Obj(usize),
}

fn arb_key() -> impl Strategy<Value = Key> {
    prop_oneof![
        4 => (1i64..=40).prop_map(Key::Int),
        1 => (-5i64..=0).prop_map(Key::Int),
        1 => (1000i64..1010).prop_map(Key::Int),
        3 => "[a-e]{1,2}".prop_map(Key::Str),
        1 => (-20i32..20).prop_map(|n| Key::Frac((f64::from(n) + 0.5).to_bits())),
        1 => (0usize..4).prop_map(Key::Obj),
    ]
}

struct Objects(Vec<Value>);

impl Objects {
    fn new() -> Self {
        Objects((0..4).map(|_| Value::new_table()).collect())
    }

    fn value(&self, k: &Key) -> Value {
        match k {
            Key::Int(i) => Value::Integer(*i),
            Key::Str(s) => Value::from(s.as_str()),
            Key::Frac(bits) => Value::Number(f64::from_bits(*bits)),
            Key::Obj(i) => self.0[*i].clone(),
        }
    }

    fn model(&self, v: &Value) -> Key {
        match v {
            Value::Integer(i) => Key::Int(*i),
            Value::String(s) => Key::Str(s.to_string()),
            Value::Number(f) => Key::Frac(f.to_bits()),
            other => Key::Obj(
                self.0
                    .iter()
                    .position(|o| o.raw_eq(other))
                    .expect("object key from pool"),
            ),
        }
    }
}

#[derive(Clone, Debug)]
enum Op {
    Set(Key, i64),
    SetNil(Key),
    Remove(Key),
    Get(Key),
    Length,
    Iterate,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        6 => (arb_key(), any::<i64>()).prop_map(|(k, v)| Op::Set(k, v)),
        1 => arb_key().prop_map(Op::SetNil),
        2 => arb_key().prop_map(Op::Remove),
        2 => arb_key().prop_map(Op::Get),
        1 => Just(Op::Length),
        1 => Just(Op::Iterate),
    ];
    proptest::collection::vec(op, 1..120)
}

fn check_border<S: BuildHasher>(t: &Table<Value, S>) -> Result<(), TestCaseError> {
    let n = t.length();
    prop_assert!(n >= 0);
    if n == 0 {
        prop_assert!(t.get_int(1).is_none(), "0 only when t[1] is absent");
    } else {
        prop_assert!(t.get_int(n).is_some(), "t[{}] must be present", n);
        prop_assert!(t.get_int(n + 1).is_none(), "t[{}] must be absent", n + 1);
    }
    Ok(())
}

fn run_model<S: BuildHasher>(mut sut: Table<Value, S>, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let objs = Objects::new();
    let mut model: BTreeMap<Key, i64> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Set(k, v) => {
                sut.set(objs.value(&k), Value::Integer(v)).unwrap();
                model.insert(k, v);
            }
            Op::SetNil(k) => {
                sut.set(objs.value(&k), Value::Nil).unwrap();
                model.remove(&k);
            }
            Op::Remove(k) => {
                let got = sut.remove(&objs.value(&k));
                let want = model.remove(&k).map(Value::Integer);
                prop_assert_eq!(got, want);
            }
            Op::Get(k) => {
                let got = sut.get(&objs.value(&k));
                prop_assert_eq!(got, model.get(&k).copied().map(Value::Integer));
            }
            Op::Length => check_border(&sut)?,
            Op::Iterate => {
                let mut seen = BTreeMap::new();
                for (k, v) in sut.iter() {
                    let prev = seen.insert(objs.model(&k), v);
                    prop_assert!(prev.is_none(), "key yielded twice");
                }
                let want: BTreeMap<Key, Value> = model
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::Integer(*v)))
                    .collect();
                prop_assert_eq!(seen, want);
            }
        }

        prop_assert!(sut.array_capacity() == 0 || sut.array_capacity().is_power_of_two());
        prop_assert!(sut.hash_capacity() == 0 || sut.hash_capacity().is_power_of_two());
        let in_array = (1..=sut.array_capacity() as i64)
            .filter(|&i| sut.get_int(i).is_some())
            .count();
        prop_assert_eq!(in_array + sut.hash_len_upper_bound(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: state-machine equivalence against an ordered map.
// Invariants exercised across random operation sequences:
// - Reads return the last value written; removal and nil writes agree.
// - Iteration yields every live binding exactly once.
// - `length` is always a valid border.
// - Capacities stay powers of two; array + hash live counts equal the model size.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        run_model(Table::<Value>::new(), ops)?;
    }

    #[test]
    fn prop_state_machine_presized((na, nh) in (0usize..20, 0usize..20), ops in arb_ops()) {
        run_model(Table::<Value>::with_capacity(na, nh), ops)?;
    }

    #[test]
    fn prop_state_machine_collisions(ops in arb_ops()) {
        run_model(Table::<Value, ConstBuildHasher>::with_hasher(ConstBuildHasher), ops)?;
    }

    // Property: deleting the current key on every step of a `next` walk visits
    // each key exactly once and empties the table without errors.
    #[test]
    fn prop_delete_while_traversing(keys in proptest::collection::btree_set(arb_key(), 0..60)) {
        let objs = Objects::new();
        let mut t: Table<Value> = Table::new();
        for (i, k) in keys.iter().enumerate() {
            t.set(objs.value(k), Value::Integer(i as i64)).unwrap();
        }
        let mut seen = BTreeSet::new();
        let mut key = Value::Nil;
        while let Some((k, _)) = t.next(&key).unwrap() {
            prop_assert!(seen.insert(objs.model(&k)), "revisited a key");
            t.remove(&k);
            key = k;
        }
        prop_assert_eq!(seen, keys);
        prop_assert!(t.is_empty());
    }

    // Property: modifying values of existing keys during traversal keeps the
    // walk exact.
    #[test]
    fn prop_overwrite_while_traversing(keys in proptest::collection::btree_set(arb_key(), 1..60)) {
        let objs = Objects::new();
        let mut t: Table<Value> = Table::new();
        for k in &keys {
            t.set(objs.value(k), Value::Integer(0)).unwrap();
        }
        let mut visited = 0;
        let mut key = Value::Nil;
        while let Some((k, v)) = t.next(&key).unwrap() {
            prop_assert_eq!(v, Value::Integer(0));
            t.set(k.clone(), Value::Integer(1)).unwrap();
            visited += 1;
            key = k;
        }
        prop_assert_eq!(visited, keys.len());
        prop_assert!(t.iter().all(|(_, v)| v == Value::Integer(1)));
    }

    // Property: after every integer write or deletion, `length` is a border.
    #[test]
    fn prop_border_is_valid(
        ops in proptest::collection::vec((1i64..=64, any::<bool>()), 0..200),
    ) {
        let mut t: Table<Value> = Table::new();
        for (i, present) in ops {
            let v = if present { Value::Integer(i) } else { Value::Nil };
            t.set_int(i, v).unwrap();
            check_border(&t)?;
        }
    }
}

#[test]
fn objects_map_back_to_their_pool_index() {
    let objs = Objects::new();
    for i in 0..4 {
        assert_eq!(objs.model(&objs.value(&Key::Obj(i))), Key::Obj(i));
    }
    assert_eq!(objs.model(&Value::Number(0.5)), Key::Frac(0.5f64.to_bits()));
}
