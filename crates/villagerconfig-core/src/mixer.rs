use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::item::{DEFAULT_MAX_STACK_SIZE, ItemStack, int_component};
use crate::rng::TradeRng;
use crate::scope::Scope;

/// Slots in a single chest. The container mixer never fills more.
pub const CONTAINER_SLOTS: usize = 27;

/// How resolved stacks are arranged before a trade slot takes the first one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackMixer {
    /// Generation order, unmerged.
    #[default]
    Default,
    /// Merge identical stacks, split at the max stack size into at most
    /// [`CONTAINER_SLOTS`] slots, then shuffle, roughly as a container fill
    /// would. Items past the last slot are dropped.
    Container,
}

impl StackMixer {
    pub fn mix(
        self,
        stacks: Vec<ItemStack>,
        rng: &mut TradeRng,
        scope: &Scope<'_>,
    ) -> Vec<ItemStack> {
        match self {
            StackMixer::Default => stacks,
            StackMixer::Container => {
                let mut slots = split_oversized(merge_identical(stacks), scope);
                rng.shuffle(&mut slots);
                slots
            }
        }
    }
}

fn merge_identical(stacks: Vec<ItemStack>) -> Vec<ItemStack> {
    let mut merged: Vec<ItemStack> = Vec::with_capacity(stacks.len());
    for stack in stacks {
        match merged.iter_mut().find(|m| m.stacks_with(&stack)) {
            Some(existing) => existing.count = existing.count.saturating_add(stack.count),
            None => merged.push(stack),
        }
    }
    merged
}

fn split_oversized(stacks: Vec<ItemStack>, scope: &Scope<'_>) -> Vec<ItemStack> {
    let mut slots = Vec::with_capacity(stacks.len().min(CONTAINER_SLOTS));
    for stack in stacks {
        let max = max_stack_size(&stack, scope);
        let mut remaining = stack.count;
        while remaining > 0 && slots.len() < CONTAINER_SLOTS {
            let take = remaining.min(max);
            let mut slot = stack.clone();
            slot.count = take;
            slots.push(slot);
            remaining -= take;
        }
    }
    slots
}

fn max_stack_size(stack: &ItemStack, scope: &Scope<'_>) -> u32 {
    scope
        .data()
        .and_then(|data| data.item_components(&stack.id))
        .and_then(|components| int_component(&components, "max_stack_size"))
        .map(|size| size.clamp(1, u32::MAX as i64) as u32)
        .unwrap_or(DEFAULT_MAX_STACK_SIZE)
}

impl fmt::Display for StackMixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StackMixer::Default => "default",
            StackMixer::Container => "container",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stack mixer '{0}', expected default or container")]
pub struct ParseStackMixerError(String);

impl FromStr for StackMixer {
    type Err = ParseStackMixerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(StackMixer::Default),
            "container" => Ok(StackMixer::Container),
            other => Err(ParseStackMixerError(other.to_string())),
        }
    }
}
