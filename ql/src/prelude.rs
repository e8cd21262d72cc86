use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use anyhow::Result;
use console_engine::screen::Screen;

/// Data type we use to encode an `Action` as a slot in the learning tables.
pub type ModelActionType = u8;

pub trait Action: Display + Debug + Sized + Clone + Copy + Hash + PartialEq + Eq {
    /// Number of possible actions
    const ACTION_SPACE: ModelActionType;
    /// Identifying the Action as a unique value in range (0..Self::ACTION_SPACE)
    fn numeric(&self) -> ModelActionType;
    fn try_from_numeric(value: ModelActionType) -> Result<Self>;
    /// The Action-variant which represents no particular action
    fn no_action() -> Self;
}

/// Marker for one encoding space of states.
///
/// Every learner owns exactly one view. Keys of different views are different types,
/// so a key produced for one table can never index another one.
pub trait View: 'static {
    /// Short name, used in log output
    const NAME: &'static str;
}

/// Integer digest of an observed state within the encoding space `V`.
pub struct StateKey<V: View> {
    value: u32,
    _view: PhantomData<fn() -> V>,
}

impl<V: View> StateKey<V> {
    pub const fn new(value: u32) -> Self {
        Self {
            value,
            _view: PhantomData,
        }
    }

    pub const fn value(&self) -> u32 {
        self.value
    }
}

// manual impls: the derives would put bounds on `V`, which is only a marker

impl<V: View> Clone for StateKey<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V: View> Copy for StateKey<V> {}

impl<V: View> PartialEq for StateKey<V> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<V: View> Eq for StateKey<V> {}

impl<V: View> PartialOrd for StateKey<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V: View> Ord for StateKey<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<V: View> Hash for StateKey<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl<V: View> Debug for StateKey<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:#x}", V::NAME, self.value)
    }
}

impl<V: View> Display for StateKey<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

pub trait DebugVisualizer {
    fn one_line_info(&self) -> String;
    fn render_to_console(&self) -> Screen;
}

#[derive(Debug)]
pub struct QlError(pub String);

impl QlError {
    pub fn from(msg: &str) -> Self {
        QlError(msg.to_string())
    }
}

impl Display for QlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for QlError {}
