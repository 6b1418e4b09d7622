use lua_table::{Table, Value, WeakMode};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum ListOp {
    Push(i64),
    Insert(usize, i64),
    Remove(usize),
    Pop,
    Sort,
}

fn arb_list_ops() -> impl Strategy<Value = Vec<ListOp>> {
    let op = prop_oneof![
        4 => any::<i64>().prop_map(ListOp::Push),
        2 => (any::<usize>(), any::<i64>()).prop_map(|(p, v)| ListOp::Insert(p, v)),
        2 => any::<usize>().prop_map(ListOp::Remove),
        1 => Just(ListOp::Pop),
        1 => Just(ListOp::Sort),
    ];
    proptest::collection::vec(op, 1..150)
}

fn contents(t: &Table<Value>) -> Vec<i64> {
    (1..=t.length())
        .map(|i| match t.get_int(i) {
            Some(Value::Integer(v)) => v,
            other => panic!("unexpected {:?} at {}", other, i),
        })
        .collect()
}

// Model list operations on a Vec: positions are taken modulo the valid
// range so every generated op is legal.
proptest! {
    #[test]
    fn prop_list_ops_match_vec(ops in arb_list_ops()) {
        let mut t: Table<Value> = Table::new();
        let mut model: Vec<i64> = Vec::new();
        for op in ops {
            match op {
                ListOp::Push(v) => {
                    t.push(Value::Integer(v)).unwrap();
                    model.push(v);
                }
                ListOp::Insert(p, v) => {
                    let pos = p % (model.len() + 1);
                    t.insert_at(pos as i64 + 1, Value::Integer(v)).unwrap();
                    model.insert(pos, v);
                }
                ListOp::Remove(p) => {
                    if model.is_empty() {
                        continue;
                    }
                    let pos = p % model.len();
                    let got = t.remove_at(Some(pos as i64 + 1)).unwrap();
                    prop_assert_eq!(got, Some(Value::Integer(model.remove(pos))));
                }
                ListOp::Pop => {
                    let got = t.remove_at(None).unwrap();
                    prop_assert_eq!(got, model.pop().map(Value::Integer));
                }
                ListOp::Sort => {
                    t.sort().unwrap();
                    model.sort();
                }
            }
            prop_assert_eq!(t.length(), model.len() as i64);
            prop_assert_eq!(contents(&t), model.clone());
        }
    }

    // Move on a table agrees with a slice copy_within-style model.
    #[test]
    fn prop_move_range_matches_model(
        len in 0usize..40,
        f in 1i64..45,
        span in 0i64..20,
        dest in 1i64..60,
    ) {
        let mut t: Table<Value> = Table::new();
        let mut model: Vec<Option<i64>> = vec![None; 128];
        for i in 1..=len as i64 {
            t.set_int(i, Value::Integer(i)).unwrap();
            model[i as usize] = Some(i);
        }
        let e = f + span - 1;
        t.move_range(f, e, dest).unwrap();
        if e >= f {
            let src: Vec<Option<i64>> = (f..=e).map(|i| model[i as usize]).collect();
            for (i, v) in src.into_iter().enumerate() {
                model[dest as usize + i] = v;
            }
        }
        for (i, want) in model.iter().enumerate().skip(1) {
            prop_assert_eq!(t.get_int(i as i64), want.map(Value::Integer));
        }
    }

    // A weak-keyed table never reports an object key that has been dropped,
    // whatever mix of live and dropped objects it holds.
    #[test]
    fn prop_weak_keys_forget_dropped(keep in proptest::collection::vec(any::<bool>(), 0..64)) {
        let mut t: Table<Value> = Table::new();
        t.set_mode(WeakMode::WEAK_KEYS);
        let mut held = Vec::new();
        for (i, k) in keep.iter().enumerate() {
            let obj = Value::new_table();
            t.set(obj.clone(), Value::Integer(i as i64)).unwrap();
            if *k {
                held.push((obj, i as i64));
            }
        }
        prop_assert_eq!(t.iter().count(), held.len());
        for (obj, i) in &held {
            prop_assert_eq!(t.get(obj), Some(Value::Integer(*i)));
        }
        let swept = t.clear_expired();
        prop_assert!(swept <= keep.len() - held.len());
        prop_assert_eq!(t.hash_len_upper_bound(), held.len());
    }
}
