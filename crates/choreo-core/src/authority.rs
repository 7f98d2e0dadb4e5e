//! Handoff controller: which subsystem owns an actor's transform.
//!
//! States: `Idle → Scripted → Simulated → {ScriptedOverride | Terminal}`.
//! The `Scripted → Simulated` cutover happens at a single discrete
//! kinematic-flag keyframe; there is no partial or gradual handoff. Each
//! actor transitions authority at most twice.

use serde::{Deserialize, Serialize};

use crate::error::ChoreoError;
use crate::ids::ActorId;
use crate::track::Channel;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum AuthorityState {
    #[default]
    Idle,
    Scripted,
    Simulated,
    /// Non-positional channels scripted again after handoff (hide/removal).
    ScriptedOverride,
    Terminal,
}

/// Result of a kinematic-flag write, reported so the stage can emit the
/// matching timeline event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HandoffTransition {
    None,
    ToSimulated,
    ToScriptedOverride,
}

#[derive(Clone, Copy, Debug, Default)]
struct AuthorityRecord {
    state: AuthorityState,
    transitions: u8,
}

/// Per-actor authority bookkeeping.
#[derive(Default, Debug)]
pub struct HandoffController {
    records: hashbrown::HashMap<ActorId, AuthorityRecord>,
}

impl HandoffController {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self, actor: ActorId) -> AuthorityState {
        self.records.get(&actor).map(|r| r.state).unwrap_or_default()
    }

    #[inline]
    pub fn transition_count(&self, actor: ActorId) -> u8 {
        self.records.get(&actor).map(|r| r.transitions).unwrap_or(0)
    }

    /// First scripted pose write moves Idle → Scripted. Not counted against
    /// the two-transition budget; it establishes the initial owner.
    pub fn note_scripted_write(&mut self, actor: ActorId) {
        let rec = self.records.entry(actor).or_default();
        if rec.state == AuthorityState::Idle {
            rec.state = AuthorityState::Scripted;
        }
    }

    /// Gate a scripted keyframe write against the current authority owner.
    pub fn ensure_writable(&self, actor: ActorId, channel: Channel) -> Result<(), ChoreoError> {
        match self.state(actor) {
            AuthorityState::Terminal => Err(ChoreoError::AuthorityConflict {
                actor,
                reason: "actor is terminal; no further writes".into(),
            }),
            AuthorityState::Simulated | AuthorityState::ScriptedOverride if channel.is_pose() => {
                Err(ChoreoError::AuthorityConflict {
                    actor,
                    reason: format!(
                        "{channel:?} is solver-owned after handoff; only non-pose channels may be scripted"
                    ),
                })
            }
            _ => Ok(()),
        }
    }

    /// A non-pose write on a Simulated actor becomes a ScriptedOverride.
    /// Returns true when the transition fired.
    pub fn mark_override(&mut self, actor: ActorId) -> bool {
        let rec = self.records.entry(actor).or_default();
        if rec.state == AuthorityState::Simulated {
            rec.state = AuthorityState::ScriptedOverride;
            rec.transitions += 1;
            return true;
        }
        false
    }

    /// Validate and apply a kinematic-flag keyframe at `frame`.
    ///
    /// `last_flag_frame` is the previous flag keyframe (if any) and
    /// `last_pose_frame` the last scripted position/rotation keyframe; the
    /// handoff frame must strictly exceed both.
    pub fn set_kinematic(
        &mut self,
        actor: ActorId,
        flag: bool,
        frame: u32,
        last_flag_frame: Option<u32>,
        last_pose_frame: Option<u32>,
    ) -> Result<HandoffTransition, ChoreoError> {
        if let Some(last) = last_flag_frame {
            if frame <= last {
                return Err(ChoreoError::AuthorityConflict {
                    actor,
                    reason: format!(
                        "kinematic flag keyframe at frame {frame} must follow previous flag keyframe at {last}"
                    ),
                });
            }
        }
        let rec = self.records.entry(actor).or_default();
        match (rec.state, flag) {
            (AuthorityState::Idle | AuthorityState::Scripted, true) => {
                rec.state = AuthorityState::Scripted;
                Ok(HandoffTransition::None)
            }
            (AuthorityState::Idle | AuthorityState::Scripted, false) => {
                if let Some(last) = last_pose_frame {
                    if frame <= last {
                        return Err(ChoreoError::AuthorityConflict {
                            actor,
                            reason: format!(
                                "handoff frame {frame} must strictly exceed last scripted pose keyframe at {last}"
                            ),
                        });
                    }
                }
                rec.state = AuthorityState::Simulated;
                rec.transitions += 1;
                Ok(HandoffTransition::ToSimulated)
            }
            (AuthorityState::Simulated, true) => {
                rec.state = AuthorityState::ScriptedOverride;
                rec.transitions += 1;
                Ok(HandoffTransition::ToScriptedOverride)
            }
            (AuthorityState::Simulated, false) => Err(ChoreoError::AuthorityConflict {
                actor,
                reason: "actor is already simulated".into(),
            }),
            (AuthorityState::ScriptedOverride | AuthorityState::Terminal, _) => {
                Err(ChoreoError::AuthorityConflict {
                    actor,
                    reason: "authority transitions exhausted (at most two per actor)".into(),
                })
            }
        }
    }

    /// Terminal hide/removal directly from Simulated (the alternative second
    /// transition when no override channel is scripted).
    pub fn retire(&mut self, actor: ActorId) -> Result<(), ChoreoError> {
        let rec = self.records.entry(actor).or_default();
        if rec.state != AuthorityState::Simulated {
            return Err(ChoreoError::AuthorityConflict {
                actor,
                reason: format!("retire requires Simulated state, was {:?}", rec.state),
            });
        }
        rec.state = AuthorityState::Terminal;
        rec.transitions += 1;
        Ok(())
    }
}
