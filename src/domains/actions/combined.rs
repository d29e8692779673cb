use crate::common::IoValue;
use crate::domains::actions::{Action, AsyncActionSpec};
use crate::domains::planning::MotionCommand;
use serde::{Deserialize, Serialize};

/// A non-motion action anchored on the path. The path parameter is the count
/// of motions that precede the action in the sequence, so all side effects
/// sitting between the same pair of motions share one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLocation {
    pub path_parameter: f64,
    pub action: Action,
}

/// A digital/analog output to be fired server-side at a path location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetIo {
    pub location: f64,
    pub key: String,
    pub value: IoValue,
    pub device: Option<String>,
}

/// Ordered sequence of actions. Insertion order is execution order; the
/// container never reorders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedActions {
    items: Vec<Action>,
}

impl CombinedActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, action: Action) {
        self.items.push(action);
    }

    /// Concatenation preserving order: all of `a`, then all of `b`.
    pub fn combine(a: &CombinedActions, b: &CombinedActions) -> CombinedActions {
        let mut items = a.items.clone();
        items.extend(b.items.iter().cloned());
        Self { items }
    }

    pub fn items(&self) -> &[Action] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All motion variants, order-preserved.
    pub fn motions(&self) -> Vec<&Action> {
        self.items.iter().filter(|a| a.is_motion()).collect()
    }

    pub fn motion_count(&self) -> usize {
        self.items.iter().filter(|a| a.is_motion()).count()
    }

    /// Non-motion actions paired with their path parameter.
    pub fn action_locations(&self) -> Vec<ActionLocation> {
        let mut locations = Vec::new();
        let mut motions_seen = 0u32;
        for action in &self.items {
            if action.is_motion() {
                motions_seen += 1;
            } else {
                locations.push(ActionLocation {
                    path_parameter: f64::from(motions_seen),
                    action: action.clone(),
                });
            }
        }
        locations
    }

    /// Motion commands in the planner's wire format, order-preserved.
    pub fn to_motion_commands(&self) -> Vec<MotionCommand> {
        self.items
            .iter()
            .filter_map(Action::to_motion_command)
            .collect()
    }

    /// Write actions projected to server-side I/O instructions at their
    /// path location.
    pub fn to_set_io_list(&self) -> Vec<SetIo> {
        self.action_locations()
            .into_iter()
            .filter_map(|al| match al.action {
                Action::Write { key, value, device } => Some(SetIo {
                    location: al.path_parameter,
                    key,
                    value,
                    device,
                }),
                _ => None,
            })
            .collect()
    }

    /// Async actions paired with their trigger location, feeding the
    /// executor's pending list.
    pub fn async_actions(&self) -> Vec<(f64, AsyncActionSpec)> {
        self.action_locations()
            .into_iter()
            .filter_map(|al| match al.action {
                Action::Async(spec) => Some((al.path_parameter, spec)),
                _ => None,
            })
            .collect()
    }
}

impl FromIterator<Action> for CombinedActions {
    fn from_iter<T: IntoIterator<Item = Action>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
