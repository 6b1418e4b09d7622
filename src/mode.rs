//! Weak-mode flags.

/// Which sides of a binding a table holds weakly.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct WeakMode {
    pub keys: bool,
    pub values: bool,
}

impl WeakMode {
    pub const STRONG: WeakMode = WeakMode {
        keys: false,
        values: false,
    };
    pub const WEAK_KEYS: WeakMode = WeakMode {
        keys: true,
        values: false,
    };
    pub const WEAK_VALUES: WeakMode = WeakMode {
        keys: false,
        values: true,
    };
    pub const WEAK_BOTH: WeakMode = WeakMode {
        keys: true,
        values: true,
    };

    /// Interpret a `__mode` string: any `k` makes keys weak, any `v`
    /// makes values weak. Other characters are ignored.
    pub fn from_mode_str(mode: &str) -> Self {
        WeakMode {
            keys: mode.contains('k'),
            values: mode.contains('v'),
        }
    }

    pub fn is_weak(&self) -> bool {
        self.keys || self.values
    }
}

impl From<&str> for WeakMode {
    fn from(mode: &str) -> Self {
        WeakMode::from_mode_str(mode)
    }
}
