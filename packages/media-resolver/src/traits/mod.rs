//! Trait abstractions for the collaborators the resolver depends on.

pub mod lookup;
