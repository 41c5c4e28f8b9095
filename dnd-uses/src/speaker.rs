//! Resolving the actor behind a chat speaker.
//!
//! The host attributes every chat command to a speaker: the token the user
//! has selected, the actor they are bound to, or both. Unlinked tokens carry
//! their own synthetic actor, so the token-bound actor takes precedence over
//! the registry entry.

use crate::world::{Actor, ActorId, TokenId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors from loading a host snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Actor {0} appears more than once")]
    DuplicateActor(ActorId),
}

/// Who a chat command is attributed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    #[serde(default)]
    pub token: Option<TokenId>,
    #[serde(default)]
    pub actor: Option<ActorId>,
}

impl Speaker {
    /// A speaker with neither token nor actor, e.g. a GM talking out of
    /// character.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn for_actor(actor: impl Into<ActorId>) -> Self {
        Self {
            token: None,
            actor: Some(actor.into()),
        }
    }

    pub fn for_token(token: impl Into<TokenId>) -> Self {
        Self {
            token: Some(token.into()),
            actor: None,
        }
    }

    pub fn with_actor(mut self, actor: impl Into<ActorId>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

/// Read-only access to the host's actors.
pub trait ActorDirectory {
    /// The actor bound to a placed token.
    fn token_actor(&self, token: &TokenId) -> Option<&Actor>;

    /// An actor from the registry.
    fn actor(&self, id: &ActorId) -> Option<&Actor>;
}

/// Find the speaker's actor: the token's actor first, then the actor id.
pub fn resolve_actor<'a, D>(speaker: &Speaker, directory: &'a D) -> Option<&'a Actor>
where
    D: ActorDirectory + ?Sized,
{
    let from_token = speaker
        .token
        .as_ref()
        .and_then(|token| directory.token_actor(token));
    let actor = from_token.or_else(|| {
        speaker
            .actor
            .as_ref()
            .and_then(|id| directory.actor(id))
    });

    match actor {
        Some(actor) => {
            tracing::trace!(actor = %actor.id, name = %actor.name, "resolved speaker");
        }
        None => {
            tracing::debug!(?speaker, "speaker has no actor");
        }
    }
    actor
}

/// A point-in-time copy of the host's actors and placed tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostSnapshot {
    #[serde(default)]
    pub actors: Vec<Actor>,
    /// Synthetic actors of placed tokens, keyed by token id.
    #[serde(default)]
    pub tokens: HashMap<TokenId, Actor>,
}

impl HostSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot exported by the host.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: HostSnapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        let mut seen = HashSet::new();
        for actor in &self.actors {
            if !seen.insert(&actor.id) {
                return Err(SnapshotError::DuplicateActor(actor.id.clone()));
            }
        }
        Ok(())
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actors.push(actor);
        self
    }

    pub fn with_token(mut self, token: impl Into<TokenId>, actor: Actor) -> Self {
        self.tokens.insert(token.into(), actor);
        self
    }
}

impl ActorDirectory for HostSnapshot {
    fn token_actor(&self, token: &TokenId) -> Option<&Actor> {
        self.tokens.get(token)
    }

    fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.iter().find(|actor| &actor.id == id)
    }
}

impl ActorDirectory for HashMap<ActorId, Actor> {
    fn token_actor(&self, _token: &TokenId) -> Option<&Actor> {
        None
    }

    fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.get(id)
    }
}
