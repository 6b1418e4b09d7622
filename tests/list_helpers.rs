// Sequence helper suite.
//
// Exercises the list operations through the public surface the way a
// table library would drive them: build a sequence, transform it, read it
// back with `unpack`/`concat`.
use lua_table::{LuaValue, Table, TableError, Value, MAX_UNPACK};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn seq(items: &[&str]) -> Table<Value> {
    let mut t = Table::new();
    for x in items {
        t.push(Value::from(*x)).unwrap();
    }
    t
}

fn joined(t: &Table<Value>) -> String {
    t.concat(" ", None, None).unwrap()
}

// Test: queue/stack usage through push, insert_at and remove_at.
#[test]
fn stack_and_queue_usage() {
    init_logs();
    let mut t: Table<Value> = Table::new();
    for i in 1..=5 {
        t.push(Value::Integer(i)).unwrap();
    }
    assert_eq!(t.remove_at(None), Ok(Some(Value::Integer(5))));
    assert_eq!(t.remove_at(Some(1)), Ok(Some(Value::Integer(1))));
    t.insert_at(1, Value::Integer(0)).unwrap();
    assert_eq!(joined(&t), "0 2 3 4");
    assert_eq!(t.length(), 4);
    while t.remove_at(None).unwrap().is_some() {}
    assert_eq!(t.length(), 0);
    assert!(t.is_empty());
}

// Test: sort strings, then sort with a key-extracting comparator.
#[test]
fn sort_strings_and_custom_order() {
    init_logs();
    let mut t = seq(&["pear", "apple", "fig", "banana", "cherry"]);
    t.sort().unwrap();
    assert_eq!(joined(&t), "apple banana cherry fig pear");

    let len = |v: &Value| match v {
        Value::String(s) => s.len(),
        _ => 0,
    };
    t.sort_by(|a, b| Ok(len(a) < len(b))).unwrap();
    // Stable: equal lengths keep their previous relative order.
    assert_eq!(joined(&t), "fig pear apple banana cherry");
}

// Test: a comparator error aborts the sort and is returned unchanged.
#[test]
fn sort_propagates_comparator_error() {
    let mut t = seq(&["b", "a", "c"]);
    let err = t
        .sort_by(|_, _| Err(TableError::Incomparable))
        .unwrap_err();
    assert_eq!(err, TableError::Incomparable);
    assert_eq!(joined(&t), "b a c");
}

// Test: mixed integers and floats sort numerically.
#[test]
fn sort_mixed_numbers() {
    let mut t: Table<Value> = Table::new();
    for v in [Value::Number(2.5), Value::Integer(3), Value::Number(-1.0), Value::Integer(2)] {
        t.push(v).unwrap();
    }
    t.sort().unwrap();
    assert_eq!(t.concat(",", None, None).unwrap(), "-1.0,2,2.5,3");
}

// Test: large sort stays consistent with a Vec model.
#[test]
fn sort_large_sequence() {
    let mut t: Table<Value> = Table::new();
    let mut model = Vec::new();
    let mut x: u64 = 12345;
    for _ in 0..2000 {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        let v = (x >> 40) as i64 % 500;
        t.push(Value::Integer(v)).unwrap();
        model.push(v);
    }
    t.sort().unwrap();
    model.sort();
    let got: Vec<Value> = t.unpack(None, None).unwrap().into_iter().flatten().collect();
    let want: Vec<Value> = model.into_iter().map(Value::Integer).collect();
    assert_eq!(got, want);
}

// Test: unpack defaults and limits.
#[test]
fn unpack_defaults_and_limit() {
    let t = seq(&["a", "b", "c"]);
    let all = t.unpack(None, None).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[2], Some(Value::from("c")));
    assert_eq!(t.unpack(Some(0), Some(1)).unwrap()[0], None);
    assert!(t.unpack(Some(1), Some(MAX_UNPACK)).is_ok());
    assert_eq!(
        t.unpack(Some(0), Some(MAX_UNPACK)),
        Err(TableError::TooManyResults)
    );
}

// Test: move within a table and across tables.
#[test]
fn move_and_copy() {
    init_logs();
    let mut t = seq(&["a", "b", "c", "d"]);
    t.move_range(2, 4, 1).unwrap();
    assert_eq!(joined(&t), "b c d d");
    t.move_range(1, 3, 2).unwrap();
    assert_eq!(joined(&t), "b b c d");

    let mut dst: Table<Value> = Table::new();
    t.copy_range_to(1, 4, 1, &mut dst).unwrap();
    assert_eq!(joined(&dst), "b b c d");

    // Moving holes clears destination slots.
    let mut gap: Table<Value> = Table::new();
    gap.set_int(1, Value::from("x")).unwrap();
    gap.set_int(3, Value::from("z")).unwrap();
    gap.move_range(1, 2, 3).unwrap();
    assert_eq!(gap.get_int(3), Some(Value::from("x")));
    assert!(gap.get_int(4).is_none());
}

// Test: move argument checks.
#[test]
fn move_limits() {
    let mut t = seq(&["a"]);
    assert_eq!(
        t.move_range(0, i64::MAX, 1),
        Err(TableError::TooManyElementsToMove)
    );
    assert_eq!(
        t.move_range(1, 10, i64::MAX - 5),
        Err(TableError::DestinationWrapAround)
    );
    assert!(t.move_range(1, 1, i64::MAX).is_ok());
    assert_eq!(t.get_int(i64::MAX), Some(Value::from("a")));
}

// Test: concat with numbers and failure position.
#[test]
fn concat_reports_bad_index() {
    let mut t: Table<Value> = Table::new();
    t.push(Value::Integer(1)).unwrap();
    t.push(Value::new_table()).unwrap();
    assert_eq!(
        t.concat("", None, None),
        Err(TableError::InvalidConcatValue { index: 2 })
    );
    assert_eq!(
        t.concat("", Some(1), Some(2)).unwrap_err().to_string(),
        "invalid value (at index 2) in table for 'concat'"
    );
    assert_eq!(t.concat("", Some(1), Some(1)).unwrap(), "1");
}

// Test: maxn finds the largest positive numeric key anywhere in the table.
#[test]
fn maxn_over_sparse_keys() {
    let mut t: Table<Value> = Table::new();
    t.set_int(1, Value::Integer(1)).unwrap();
    t.set_int(1_000_000, Value::Integer(1)).unwrap();
    t.set(Value::Number(2.5e6), Value::Integer(1)).unwrap();
    t.set(Value::from("9e9"), Value::Integer(1)).unwrap();
    assert_eq!(t.maxn(), 2.5e6);
    assert_eq!(t.length(), 1);
    assert!(Value::from("x").as_number().is_none());
}
