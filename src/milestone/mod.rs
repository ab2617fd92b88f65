//! Milestones: conditions on route progress that emit announcements
//!
//! ## Variants
//!
//! 1. **Step** - fires at most once per step while its [`Trigger`] holds
//! 2. **Voice** - fires when the current voice instruction changes
//! 3. **Banner** - fires when the current banner instruction changes
//! 4. **Custom** - user predicate returning an optional announcement
//!
//! Milestones are identified by an integer. User identifiers are `u32`; the
//! built-in voice and banner milestones use negative identifiers so the two
//! spaces never collide.

mod registry;
mod trigger;

pub use registry::MilestoneRegistry;
pub use trigger::{Comparison, Trigger, TriggerProperty};

use std::sync::Arc;

use crate::config::defaults::{BANNER_INSTRUCTION_MILESTONE_ID, VOICE_INSTRUCTION_MILESTONE_ID};
use crate::progress::RouteProgress;
use crate::types::BannerInstruction;

/// User-supplied milestone condition.
///
/// Implemented for any `Fn(Option<&RouteProgress>, &RouteProgress) -> Option<String>`.
pub trait MilestonePredicate: Send + Sync {
    /// Announcement text when the milestone fires, `None` otherwise.
    fn evaluate(&self, previous: Option<&RouteProgress>, current: &RouteProgress) -> Option<String>;
}

impl<F> MilestonePredicate for F
where
    F: Fn(Option<&RouteProgress>, &RouteProgress) -> Option<String> + Send + Sync,
{
    fn evaluate(&self, previous: Option<&RouteProgress>, current: &RouteProgress) -> Option<String> {
        self(previous, current)
    }
}

/// Payload delivered with a fired milestone.
#[derive(Debug, Clone, PartialEq)]
pub enum Announcement {
    Voice {
        text: String,
        ssml: Option<String>,
    },
    Banner(BannerInstruction),
    Step {
        leg_index: usize,
        step_index: usize,
        /// Maneuver instruction of the step
        instruction: String,
    },
    Custom(String),
}

/// A milestone that fired for one fix.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredMilestone {
    pub identifier: i64,
    pub announcement: Announcement,
}

#[derive(Clone)]
pub enum Milestone {
    Step {
        identifier: i64,
        trigger: Trigger,
        /// `(leg, step)` this milestone last fired on
        fired_on: Option<(usize, usize)>,
    },
    Voice {
        identifier: i64,
    },
    Banner {
        identifier: i64,
    },
    Custom {
        identifier: i64,
        predicate: Arc<dyn MilestonePredicate>,
    },
}

impl Milestone {
    /// Step milestone firing on the first fix of every step.
    pub fn step(identifier: u32) -> Self {
        Self::step_with_trigger(identifier, Trigger::new_step())
    }

    pub fn step_with_trigger(identifier: u32, trigger: Trigger) -> Self {
        Self::Step {
            identifier: i64::from(identifier),
            trigger,
            fired_on: None,
        }
    }

    pub fn voice(identifier: u32) -> Self {
        Self::Voice {
            identifier: i64::from(identifier),
        }
    }

    pub fn banner(identifier: u32) -> Self {
        Self::Banner {
            identifier: i64::from(identifier),
        }
    }

    pub fn custom(identifier: u32, predicate: impl MilestonePredicate + 'static) -> Self {
        Self::Custom {
            identifier: i64::from(identifier),
            predicate: Arc::new(predicate),
        }
    }

    /// The built-in voice milestone with its reserved identifier.
    pub const fn default_voice() -> Self {
        Self::Voice {
            identifier: VOICE_INSTRUCTION_MILESTONE_ID,
        }
    }

    /// The built-in banner milestone with its reserved identifier.
    pub const fn default_banner() -> Self {
        Self::Banner {
            identifier: BANNER_INSTRUCTION_MILESTONE_ID,
        }
    }

    pub const fn identifier(&self) -> i64 {
        match self {
            Self::Step { identifier, .. }
            | Self::Voice { identifier }
            | Self::Banner { identifier }
            | Self::Custom { identifier, .. } => *identifier,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Step { .. } => "step",
            Self::Voice { .. } => "voice",
            Self::Banner { .. } => "banner",
            Self::Custom { .. } => "custom",
        }
    }

    /// Evaluate against a progress transition, returning the announcement if
    /// the milestone fires.
    pub fn evaluate(
        &mut self,
        previous: Option<&RouteProgress>,
        current: &RouteProgress,
    ) -> Option<Announcement> {
        let step_changed = previous.map_or(true, |p| {
            (p.leg_index, p.step_index) != (current.leg_index, current.step_index)
        });

        match self {
            Self::Step {
                trigger, fired_on, ..
            } => {
                let here = (current.leg_index, current.step_index);
                if *fired_on == Some(here) || !trigger.holds(previous, current) {
                    return None;
                }
                *fired_on = Some(here);
                Some(Announcement::Step {
                    leg_index: current.leg_index,
                    step_index: current.step_index,
                    instruction: current.current_step().maneuver.instruction.clone(),
                })
            }
            Self::Voice { .. } => {
                let instruction = current.current_voice_instruction.as_ref()?;
                let before = previous.and_then(|p| p.current_voice_instruction.as_ref());
                let changed = before.map_or(true, |b| b.announcement != instruction.announcement);
                (changed || step_changed).then(|| Announcement::Voice {
                    text: instruction.announcement.clone(),
                    ssml: instruction.ssml_announcement.clone(),
                })
            }
            Self::Banner { .. } => {
                let banner = current.current_banner_instruction.as_ref()?;
                let before = previous.and_then(|p| p.current_banner_instruction.as_ref());
                let changed = before.map_or(true, |b| !b.same_text(banner));
                (changed || step_changed).then(|| Announcement::Banner(banner.clone()))
            }
            Self::Custom { predicate, .. } => predicate
                .evaluate(previous, current)
                .map(Announcement::Custom),
        }
    }

    /// Forget per-route firing state.
    pub fn reset(&mut self) {
        if let Self::Step { fired_on, .. } = self {
            *fired_on = None;
        }
    }
}

impl PartialEq for Milestone {
    fn eq(&self, other: &Self) -> bool {
        self.identifier() == other.identifier()
    }
}

impl Eq for Milestone {}

impl std::fmt::Debug for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("Milestone");
        out.field("kind", &self.kind())
            .field("identifier", &self.identifier());
        if let Self::Step { trigger, .. } = self {
            out.field("trigger", trigger);
        }
        out.finish()
    }
}
