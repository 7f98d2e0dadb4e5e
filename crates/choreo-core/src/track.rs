//! Keyframe track builder: per-(actor, channel) ordered sample sets.
//!
//! Frames are strictly increasing within a channel. The builder rejects
//! out-of-order insertion rather than silently reordering, and duplicate
//! frames require an explicit `replace`. Interpolation between samples is
//! the host's responsibility.

use serde::{Deserialize, Serialize};

use crate::error::ChoreoError;
use crate::ids::ActorId;
use crate::value::ChannelValue;

/// Attribute channels under choreography control.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Position,
    Rotation,
    Scale,
    Kinematic,
}

impl Channel {
    /// Fixed iteration order for snapshots and exports.
    pub const ALL: [Channel; 4] = [
        Channel::Position,
        Channel::Rotation,
        Channel::Scale,
        Channel::Kinematic,
    ];

    /// Pose channels are solver-owned after handoff.
    #[inline]
    pub fn is_pose(self) -> bool {
        matches!(self, Channel::Position | Channel::Rotation)
    }
}

/// A single stored sample.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keyframe {
    pub frame: u32,
    pub value: ChannelValue,
}

/// Internal insertion rejection, mapped to `ChoreoError` by the store.
#[derive(Debug, PartialEq)]
enum SampleRejection {
    Duplicate,
    OutOfOrder { last: u32 },
}

/// Ordered samples for one (actor, channel) pair.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct KeyframeTrack {
    samples: Vec<Keyframe>,
}

impl KeyframeTrack {
    fn add_sample(
        &mut self,
        frame: u32,
        value: ChannelValue,
        replace: bool,
    ) -> Result<(), SampleRejection> {
        if let Some(last) = self.samples.last_mut() {
            if last.frame == frame {
                if replace {
                    last.value = value;
                    return Ok(());
                }
                return Err(SampleRejection::Duplicate);
            }
            if frame < last.frame {
                return Err(SampleRejection::OutOfOrder { last: last.frame });
            }
        }
        self.samples.push(Keyframe { frame, value });
        Ok(())
    }

    #[inline]
    pub fn last_frame(&self) -> Option<u32> {
        self.samples.last().map(|k| k.frame)
    }

    #[inline]
    pub fn samples(&self) -> &[Keyframe] {
        &self.samples
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Latest sample at or before `frame`, if any.
    pub fn sample_at_or_before(&self, frame: u32) -> Option<&Keyframe> {
        self.samples.iter().rev().find(|k| k.frame <= frame)
    }
}

/// Exported view of one track in a bake snapshot (stable order).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrackExport {
    pub actor: ActorId,
    pub channel: Channel,
    pub samples: Vec<Keyframe>,
}

/// All tracks, keyed by (actor, channel).
#[derive(Default, Debug)]
pub struct TrackStore {
    tracks: hashbrown::HashMap<(ActorId, Channel), KeyframeTrack>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sample, enforcing the duplicate/ordering contract.
    pub fn add_sample(
        &mut self,
        actor: ActorId,
        channel: Channel,
        frame: u32,
        value: ChannelValue,
        replace: bool,
    ) -> Result<(), ChoreoError> {
        let track = self.tracks.entry((actor, channel)).or_default();
        track
            .add_sample(frame, value, replace)
            .map_err(|rej| match rej {
                SampleRejection::Duplicate => ChoreoError::DuplicateKeyframe {
                    actor,
                    channel,
                    frame,
                },
                SampleRejection::OutOfOrder { last } => ChoreoError::OutOfOrderKeyframe {
                    actor,
                    channel,
                    frame,
                    last,
                },
            })
    }

    #[inline]
    pub fn track(&self, actor: ActorId, channel: Channel) -> Option<&KeyframeTrack> {
        self.tracks.get(&(actor, channel))
    }

    /// Last scripted pose (position/rotation) keyframe frame for an actor.
    pub fn last_pose_frame(&self, actor: ActorId) -> Option<u32> {
        let p = self
            .track(actor, Channel::Position)
            .and_then(|t| t.last_frame());
        let r = self
            .track(actor, Channel::Rotation)
            .and_then(|t| t.last_frame());
        match (p, r) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Export all non-empty tracks in registration order then fixed channel
    /// order. The caller supplies actor ids in registration order; map
    /// iteration order never leaks into snapshots.
    pub fn export_ordered(&self, actors_in_order: &[ActorId]) -> Vec<TrackExport> {
        let mut out = Vec::new();
        for &actor in actors_in_order {
            for channel in Channel::ALL {
                if let Some(track) = self.track(actor, channel) {
                    if !track.is_empty() {
                        out.push(TrackExport {
                            actor,
                            channel,
                            samples: track.samples().to_vec(),
                        });
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Vec3;

    fn v(x: f32) -> ChannelValue {
        ChannelValue::Vec3(Vec3::splat(x))
    }

    #[test]
    fn duplicate_requires_replace() {
        let mut store = TrackStore::new();
        let a = ActorId(0);
        store
            .add_sample(a, Channel::Position, 10, v(1.0), false)
            .unwrap();
        let err = store
            .add_sample(a, Channel::Position, 10, v(2.0), false)
            .unwrap_err();
        assert!(matches!(err, ChoreoError::DuplicateKeyframe { frame: 10, .. }));
        store
            .add_sample(a, Channel::Position, 10, v(2.0), true)
            .unwrap();
        let track = store.track(a, Channel::Position).unwrap();
        assert_eq!(track.samples().len(), 1);
        assert_eq!(track.samples()[0].value, v(2.0));
    }

    #[test]
    fn out_of_order_rejected() {
        let mut store = TrackStore::new();
        let a = ActorId(0);
        store
            .add_sample(a, Channel::Rotation, 20, v(0.0), false)
            .unwrap();
        let err = store
            .add_sample(a, Channel::Rotation, 5, v(0.0), false)
            .unwrap_err();
        assert!(matches!(
            err,
            ChoreoError::OutOfOrderKeyframe { frame: 5, last: 20, .. }
        ));
    }

    #[test]
    fn last_pose_frame_is_max_of_position_and_rotation() {
        let mut store = TrackStore::new();
        let a = ActorId(3);
        assert_eq!(store.last_pose_frame(a), None);
        store
            .add_sample(a, Channel::Position, 10, v(0.0), false)
            .unwrap();
        store
            .add_sample(a, Channel::Rotation, 25, v(0.0), false)
            .unwrap();
        store
            .add_sample(a, Channel::Scale, 90, v(1.0), false)
            .unwrap();
        assert_eq!(store.last_pose_frame(a), Some(25));
    }

    #[test]
    fn sample_at_or_before_scans_backwards() {
        let mut store = TrackStore::new();
        let a = ActorId(1);
        store
            .add_sample(a, Channel::Position, 1, v(1.0), false)
            .unwrap();
        store
            .add_sample(a, Channel::Position, 20, v(2.0), false)
            .unwrap();
        let track = store.track(a, Channel::Position).unwrap();
        assert_eq!(track.sample_at_or_before(0), None);
        assert_eq!(track.sample_at_or_before(5).unwrap().value, v(1.0));
        assert_eq!(track.sample_at_or_before(20).unwrap().value, v(2.0));
        assert_eq!(track.sample_at_or_before(99).unwrap().value, v(2.0));
    }

    #[test]
    fn export_follows_registration_then_channel_order() {
        let mut store = TrackStore::new();
        let a = ActorId(0);
        let b = ActorId(1);
        store
            .add_sample(b, Channel::Scale, 1, v(1.0), false)
            .unwrap();
        store
            .add_sample(a, Channel::Kinematic, 1, ChannelValue::Flag(true), false)
            .unwrap();
        store
            .add_sample(a, Channel::Position, 1, v(0.0), false)
            .unwrap();
        let exported = store.export_ordered(&[a, b]);
        let order: Vec<_> = exported.iter().map(|t| (t.actor, t.channel)).collect();
        assert_eq!(
            order,
            vec![
                (a, Channel::Position),
                (a, Channel::Kinematic),
                (b, Channel::Scale)
            ]
        );
    }
}
