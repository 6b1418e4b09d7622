//! `Rc`-backed reference value type.
//!
//! A small but complete [`LuaValue`] for hosts without a collector of
//! their own, and for this crate's tests. Reference categories are `Rc`
//! allocations compared by identity; their weak handles are `rc::Weak`,
//! so "expired" means the last strong `Value` was dropped.

use crate::table::Table;
use crate::value::LuaValue;
use core::fmt::{self, Write as _};
use core::hash::{Hash, Hasher};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Opaque callable, identified by allocation.
#[derive(Debug, Default)]
pub struct Function {
    pub name: String,
}

/// Opaque coroutine handle.
#[derive(Debug, Default)]
pub struct Thread {
    _private: (),
}

/// Opaque host object.
#[derive(Debug, Default)]
pub struct UserData {
    pub tag: String,
}

pub type TableRef = Rc<RefCell<Table<Value>>>;

#[derive(Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(Rc<str>),
    Table(TableRef),
    Function(Rc<Function>),
    Thread(Rc<Thread>),
    UserData(Rc<UserData>),
}

#[derive(Clone)]
pub enum WeakValue {
    Table(Weak<RefCell<Table<Value>>>),
    Function(Weak<Function>),
    Thread(Weak<Thread>),
    UserData(Weak<UserData>),
}

impl Value {
    pub fn new_table() -> Self {
        Value::Table(Rc::new(RefCell::new(Table::new())))
    }

    pub fn function(name: &str) -> Self {
        Value::Function(Rc::new(Function {
            name: name.to_owned(),
        }))
    }

    pub fn thread() -> Self {
        Value::Thread(Rc::new(Thread::default()))
    }

    pub fn userdata(tag: &str) -> Self {
        Value::UserData(Rc::new(UserData {
            tag: tag.to_owned(),
        }))
    }

    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Table(_) => "table",
            Value::Function(_) => "function",
            Value::Thread(_) => "thread",
            Value::UserData(_) => "userdata",
        }
    }

    fn addr(&self) -> Option<usize> {
        match self {
            Value::Table(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            Value::Function(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            Value::Thread(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            Value::UserData(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            _ => None,
        }
    }
}

/// Formats a float the way `%.14g` does, keeping a `.0` suffix on results
/// that would otherwise read as integers.
fn write_number(out: &mut String, f: f64) {
    if f.is_nan() {
        out.push_str(if f.is_sign_negative() { "-nan" } else { "nan" });
        return;
    }
    if f.is_infinite() {
        out.push_str(if f < 0.0 { "-inf" } else { "inf" });
        return;
    }
    fn trim(digits: &str) -> &str {
        if digits.contains('.') {
            digits.trim_end_matches('0').trim_end_matches('.')
        } else {
            digits
        }
    }
    let start = out.len();
    // The exponent after rounding to 14 significant digits picks the style.
    let sci = format!("{f:.13e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if !(-4..14).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        let _ = write!(out, "{}e{sign}{:02}", trim(mantissa), exp.abs());
    } else {
        let fixed = format!("{:.*}", (13 - exp) as usize, f);
        out.push_str(trim(&fixed));
    }
    if out[start..].bytes().all(|b| b == b'-' || b.is_ascii_digit()) {
        out.push_str(".0");
    }
}

/// Exact integer value of a float, if it has one.
fn float_to_int(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; i64::MAX is not.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

fn int_float_eq(i: i64, f: f64) -> bool {
    float_to_int(f) == Some(i)
}

fn int_float_lt(i: i64, f: f64) -> bool {
    if f.is_nan() {
        return false;
    }
    match float_to_int(f.ceil()) {
        Some(c) => i < c,
        None => f > 0.0,
    }
}

fn float_int_lt(f: f64, i: i64) -> bool {
    if f.is_nan() {
        return false;
    }
    match float_to_int(f.floor()) {
        Some(c) => c < i,
        None => f < 0.0,
    }
}

impl LuaValue for Value {
    type Weak = WeakValue;

    fn nil() -> Self {
        Value::Nil
    }

    fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    fn is_nan(&self) -> bool {
        matches!(self, Value::Number(f) if f.is_nan())
    }

    fn raw_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Integer(i), Value::Number(f)) | (Value::Number(f), Value::Integer(i)) => {
                int_float_eq(*i, *f)
            }
            (Value::String(a), Value::String(b)) => a == b,
            _ => match (self.addr(), other.addr()) {
                (Some(a), Some(b)) => a == b && self.type_name() == other.type_name(),
                _ => false,
            },
        }
    }

    fn raw_hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Nil => {}
            Value::Boolean(b) => b.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Number(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            _ => self.addr().hash(state),
        }
    }

    fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Number(f) => float_to_int(*f),
            _ => None,
        }
    }

    fn from_integer(i: i64) -> Self {
        Value::Integer(i)
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(f) => Some(*f),
            _ => None,
        }
    }

    fn downgrade(&self) -> Option<WeakValue> {
        match self {
            Value::Table(rc) => Some(WeakValue::Table(Rc::downgrade(rc))),
            Value::Function(rc) => Some(WeakValue::Function(Rc::downgrade(rc))),
            Value::Thread(rc) => Some(WeakValue::Thread(Rc::downgrade(rc))),
            Value::UserData(rc) => Some(WeakValue::UserData(Rc::downgrade(rc))),
            _ => None,
        }
    }

    fn upgrade(weak: &WeakValue) -> Option<Self> {
        match weak {
            WeakValue::Table(w) => w.upgrade().map(Value::Table),
            WeakValue::Function(w) => w.upgrade().map(Value::Function),
            WeakValue::Thread(w) => w.upgrade().map(Value::Thread),
            WeakValue::UserData(w) => w.upgrade().map(Value::UserData),
        }
    }

    fn raw_lt(&self, other: &Self) -> Option<bool> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a < b),
            (Value::Number(a), Value::Number(b)) => Some(a < b),
            (Value::Integer(a), Value::Number(b)) => Some(int_float_lt(*a, *b)),
            (Value::Number(a), Value::Integer(b)) => Some(float_int_lt(*a, *b)),
            (Value::String(a), Value::String(b)) => Some(a.as_bytes() < b.as_bytes()),
            _ => None,
        }
    }

    fn write_concat(&self, out: &mut String) -> bool {
        match self {
            Value::String(s) => out.push_str(s),
            Value::Integer(i) => {
                let _ = write!(out, "{i}");
            }
            Value::Number(f) => write_number(out, *f),
            _ => return false,
        }
        true
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.raw_eq(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Function(func) => write!(f, "function {}: {:#x}", func.name, self.addr().unwrap_or(0)),
            _ => write!(f, "{}: {:#x}", self.type_name(), self.addr().unwrap_or(0)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Number(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
