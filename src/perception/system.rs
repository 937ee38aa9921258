//! Default vision-based perception

use ahash::{AHashMap, AHashSet};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::PerceptionConfig;
use crate::core::timer::CountdownTimer;
use crate::core::types::{EntityHandle, Seconds, Team};
use crate::perception::memory::KnownEntityMemory;
use crate::perception::threat::{object_danger, participant_danger};
use crate::perception::{
    ForgetReason, IgnoreCategory, NoticeCause, Observer, Perception, PerceptionEvent,
};
use crate::world::{ObjectKind, Participant, WorldObject, WorldQuery};

/// A subject that passed the filters this scan
struct Sighting {
    subject: EntityHandle,
    position: Vec3,
    danger: f32,
}

/// Vision with an ignore filter, forced-notice overrides and a
/// skill-scaled recognition delay
#[derive(Debug, Clone)]
pub struct PerceptionSystem {
    config: PerceptionConfig,
    memory: KnownEntityMemory,
    /// When each not-yet-recognized subject became continuously visible
    pending: AHashMap<EntityHandle, Seconds>,
    /// Disguise each remembered participant wore when last seen
    last_disguise: AHashMap<EntityHandle, Option<Team>>,
    scan_timer: CountdownTimer,
    rng: ChaCha8Rng,
}

impl PerceptionSystem {
    pub fn new(config: PerceptionConfig, seed: u64) -> Self {
        Self {
            config,
            memory: KnownEntityMemory::new(),
            pending: AHashMap::new(),
            last_disguise: AHashMap::new(),
            scan_timer: CountdownTimer::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    /// Is the subject visible but still waiting out the recognition delay?
    pub fn is_pending(&self, subject: EntityHandle) -> bool {
        self.pending.contains_key(&subject)
    }

    fn is_fully_concealed(&self, subject: &Participant) -> bool {
        subject.concealment >= self.config.concealment_threshold
    }

    /// Condition that forces a hostile to be noticed
    fn forced_notice(&self, subject: &Participant) -> Option<NoticeCause> {
        if subject.placing_sabotage {
            Some(NoticeCause::Sabotage)
        } else if subject.burning {
            Some(NoticeCause::Burning)
        } else if subject.bleeding {
            Some(NoticeCause::Bleeding)
        } else if subject.concealment > 0.0 && !self.is_fully_concealed(subject) {
            Some(NoticeCause::PartiallyConcealed)
        } else {
            None
        }
    }

    fn is_participant_ignored(&self, observer: &Observer<'_>, subject: &Participant) -> bool {
        if subject.team == observer.team || !subject.team.is_playing() {
            return true;
        }
        if self.is_fully_concealed(subject) {
            return true;
        }
        if subject.apparent_team() == observer.team
            && !observer.known_hostiles.contains(&subject.handle)
        {
            return true;
        }
        observer.ignored.contains(&IgnoreCategory::Role(subject.role))
    }

    fn is_object_ignored(&self, observer: &Observer<'_>, object: &WorldObject) -> bool {
        if object.team == observer.team || object.disabled || !object.kind.is_fortification() {
            return true;
        }
        match object.kind {
            ObjectKind::Sentry => observer.ignored.contains(&IgnoreCategory::Sentries),
            _ => observer.ignored.contains(&IgnoreCategory::SupportStructures),
        }
    }

    fn can_see(&self, observer: &Observer<'_>, target: Vec3, world: &dyn WorldQuery) -> bool {
        observer.position.distance(target) <= self.config.max_vision_range
            && world.is_line_of_sight_clear(observer.position, target)
    }

    /// Skip this scan when heavily populated and the throttle is running
    fn is_throttled(&mut self, observer: &Observer<'_>, now: Seconds) -> bool {
        if observer.population <= self.config.heavy_population_threshold {
            return false;
        }
        if !self.scan_timer.is_elapsed(now) {
            return true;
        }
        let interval = self
            .rng
            .gen_range(self.config.throttle_interval_min..=self.config.throttle_interval_max);
        self.scan_timer.start(now, interval);
        false
    }

    fn collect_sightings(
        &self,
        observer: &Observer<'_>,
        world: &dyn WorldQuery,
        events: &mut Vec<PerceptionEvent>,
    ) -> Vec<Sighting> {
        let mut sightings = Vec::new();

        for subject in world.participants() {
            if subject.handle == observer.handle || !subject.alive {
                continue;
            }
            if !self.can_see(observer, subject.position, world) {
                continue;
            }

            if self.is_participant_ignored(observer, subject) {
                let hostile = subject.team != observer.team && subject.team.is_playing();
                match self.forced_notice(subject) {
                    Some(cause) if hostile => {
                        events.push(PerceptionEvent::ForcedNotice {
                            subject: subject.handle,
                            cause,
                        });
                    }
                    _ => continue,
                }
            }

            let range = observer.position.distance(subject.position);
            sightings.push(Sighting {
                subject: subject.handle,
                position: subject.position,
                danger: participant_danger(subject, range),
            });
        }

        for object in world.objects() {
            if self.is_object_ignored(observer, object) {
                continue;
            }
            if !self.can_see(observer, object.position, world) {
                continue;
            }
            let range = observer.position.distance(object.position);
            sightings.push(Sighting {
                subject: object.handle,
                position: object.position,
                danger: object_danger(object, range),
            });
        }

        sightings
    }

    fn forget_subject(&mut self, subject: EntityHandle) {
        self.memory.forget(subject);
        self.pending.remove(&subject);
        self.last_disguise.remove(&subject);
    }

    /// Remembered or known hostiles that changed disguise while out of sight
    ///
    /// A hostile known only through an ally gets its current disguise as the
    /// baseline the first time it is checked.
    fn drop_redisguised(
        &mut self,
        observer: &Observer<'_>,
        world: &dyn WorldQuery,
        seen: &AHashSet<EntityHandle>,
        events: &mut Vec<PerceptionEvent>,
    ) {
        let mut tracked: Vec<EntityHandle> = self
            .memory
            .iter()
            .map(|known| known.subject)
            .chain(observer.known_hostiles.iter().copied())
            .collect();
        tracked.sort_unstable();
        tracked.dedup();
        self.last_disguise.retain(|subject, _| tracked.binary_search(subject).is_ok());

        let mut changed = Vec::new();
        for subject in tracked {
            let Some(participant) = world.participant(subject) else {
                continue;
            };
            if seen.contains(&subject) {
                self.last_disguise.insert(subject, participant.disguise);
                continue;
            }
            match self.last_disguise.get(&subject).copied() {
                None => {
                    self.last_disguise.insert(subject, participant.disguise);
                }
                Some(previous) if previous != participant.disguise => changed.push(subject),
                Some(_) => {}
            }
        }

        for subject in changed {
            tracing::debug!("Forgetting {} after unseen disguise change", subject);
            self.forget_subject(subject);
            events.push(PerceptionEvent::Forgotten {
                subject,
                reason: ForgetReason::DisguiseChanged,
            });
        }
    }

    /// Known hostiles that slipped into full concealment
    fn drop_concealed(
        &mut self,
        observer: &Observer<'_>,
        world: &dyn WorldQuery,
        events: &mut Vec<PerceptionEvent>,
    ) {
        let mut hostiles: Vec<EntityHandle> = observer.known_hostiles.iter().copied().collect();
        hostiles.sort_unstable();
        for subject in hostiles {
            let Some(participant) = world.participant(subject) else {
                continue;
            };
            if self.is_fully_concealed(participant) && self.forced_notice(participant).is_none() {
                self.forget_subject(subject);
                events.push(PerceptionEvent::Forgotten {
                    subject,
                    reason: ForgetReason::Concealed,
                });
            }
        }
    }
}

impl Perception for PerceptionSystem {
    fn update(
        &mut self,
        observer: &Observer<'_>,
        world: &dyn WorldQuery,
        now: Seconds,
    ) -> Vec<PerceptionEvent> {
        let mut events = Vec::new();

        if !self.is_throttled(observer, now) {
            let sightings = self.collect_sightings(observer, world, &mut events);
            let recognize_time = self.config.recognize_time(observer.difficulty);
            let mut seen: AHashSet<EntityHandle> = AHashSet::with_capacity(sightings.len());

            for sighting in &sightings {
                seen.insert(sighting.subject);

                if self.memory.contains(sighting.subject) {
                    self.memory
                        .record_sighting(sighting.subject, sighting.position, sighting.danger, now);
                } else {
                    let since = *self.pending.entry(sighting.subject).or_insert(now);
                    if now - since >= recognize_time {
                        self.pending.remove(&sighting.subject);
                        self.memory.record_sighting(
                            sighting.subject,
                            sighting.position,
                            sighting.danger,
                            now,
                        );
                        events.push(PerceptionEvent::Recognized {
                            subject: sighting.subject,
                        });
                    }
                }
            }

            // recognition needs continuous visibility
            self.pending.retain(|subject, _| seen.contains(subject));

            let unseen: Vec<EntityHandle> = self
                .memory
                .iter()
                .filter(|known| known.visible && !seen.contains(&known.subject))
                .map(|known| known.subject)
                .collect();
            for subject in unseen {
                self.memory.mark_unseen(subject);
            }

            self.drop_redisguised(observer, world, &seen, &mut events);
            self.drop_concealed(observer, world, &mut events);
        }

        for subject in self.memory.purge_stale(now, self.config.forget_time) {
            self.last_disguise.remove(&subject);
            events.push(PerceptionEvent::Forgotten {
                subject,
                reason: ForgetReason::Timeout,
            });
        }

        events
    }

    fn known(&self) -> &KnownEntityMemory {
        &self.memory
    }

    fn recognize_now(
        &mut self,
        observer: &Observer<'_>,
        subject: EntityHandle,
        world: &dyn WorldQuery,
        now: Seconds,
    ) -> bool {
        let Some(participant) = world.participant(subject) else {
            return false;
        };
        if !participant.alive || participant.team == observer.team {
            return false;
        }
        let range = observer.position.distance(participant.position);
        self.pending.remove(&subject);
        self.last_disguise.insert(subject, participant.disguise);
        self.memory.record_sighting(
            subject,
            participant.position,
            participant_danger(participant, range),
            now,
        );
        true
    }

    fn forget(&mut self, subject: EntityHandle) {
        self.forget_subject(subject);
    }

    fn reset(&mut self) {
        self.memory.clear();
        self.pending.clear();
        self.last_disguise.clear();
        self.scan_timer.invalidate();
    }
}
