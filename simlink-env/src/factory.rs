//! Name-based construction of environments.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use simlink_core::Session;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

use crate::adapter::EpisodeAdapter;
use crate::config::EpisodeConfig;
use crate::env::SimEnv;
use crate::error::EnvError;
use crate::variants::{BasicCombat, BvrCombat, PointTracking, Variant};

/// The built-in variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvKind {
    PointTracking,
    BasicCombat,
    BvrCombat,
}

impl EnvKind {
    pub const ALL: [EnvKind; 3] = [EnvKind::PointTracking, EnvKind::BasicCombat, EnvKind::BvrCombat];

    pub fn name(self) -> &'static str {
        match self {
            EnvKind::PointTracking => "point_tracking",
            EnvKind::BasicCombat => "basic_combat",
            EnvKind::BvrCombat => "bvr_combat",
        }
    }

    pub fn variant(self) -> Box<dyn Variant> {
        match self {
            EnvKind::PointTracking => Box::new(PointTracking),
            EnvKind::BasicCombat => Box::new(BasicCombat),
            EnvKind::BvrCombat => Box::new(BvrCombat),
        }
    }
}

impl fmt::Display for EnvKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnvKind {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| EnvError::UnknownEnvironment {
                name: s.to_string(),
                available: EnvKind::ALL.iter().map(|k| k.name().to_string()).collect(),
            })
    }
}

/// Builds a fresh variant for each environment.
pub type VariantCtor = fn() -> Box<dyn Variant>;

/// Name → variant constructor table.
#[derive(Debug, Clone, Default)]
pub struct EnvRegistry {
    ctors: BTreeMap<String, VariantCtor>,
}

impl EnvRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every [`EnvKind`].
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(EnvKind::PointTracking.name(), || Box::new(PointTracking));
        registry.register(EnvKind::BasicCombat.name(), || Box::new(BasicCombat));
        registry.register(EnvKind::BvrCombat.name(), || Box::new(BvrCombat));
        registry
    }

    /// Add or replace a constructor. Returns the one it replaced.
    pub fn register(&mut self, name: impl Into<String>, ctor: VariantCtor) -> Option<VariantCtor> {
        self.ctors.insert(name.into(), ctor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.ctors.keys().cloned().collect()
    }

    /// Wrap `session` in the variant registered under `name`.
    ///
    /// On an unknown name the session is dropped, releasing its transport.
    pub fn build<T>(
        &self,
        name: &str,
        session: Session<T>,
        config: EpisodeConfig,
    ) -> Result<EpisodeAdapter<T>, EnvError>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let ctor = self
            .ctors
            .get(name)
            .ok_or_else(|| EnvError::UnknownEnvironment {
                name: name.to_string(),
                available: self.names(),
            })?;
        info!(env = name, "creating environment");
        Ok(EpisodeAdapter::new(session, ctor(), config))
    }

    /// [`build`](Self::build), boxed behind [`SimEnv`].
    pub fn create<T>(
        &self,
        name: &str,
        session: Session<T>,
        config: EpisodeConfig,
    ) -> Result<Box<dyn SimEnv>, EnvError>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        Ok(Box::new(self.build(name, session, config)?))
    }
}

/// Build the environment registered under `name`.
pub fn create_env<T>(
    name: &str,
    session: Session<T>,
    config: EpisodeConfig,
    registry: &EnvRegistry,
) -> Result<Box<dyn SimEnv>, EnvError>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    registry.create(name, session, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simlink_core::SessionConfig;
    use tokio::io::DuplexStream;

    fn session() -> Session<DuplexStream> {
        Session::new(SessionConfig::default())
    }

    #[test]
    fn kinds_parse_from_names() {
        for kind in EnvKind::ALL {
            assert_eq!(kind.name().parse::<EnvKind>().unwrap(), kind);
            assert_eq!(kind.variant().name(), kind.name());
        }
        assert!("dogfight".parse::<EnvKind>().is_err());
    }

    #[test]
    fn builtin_registry_lists_all_kinds() {
        let registry = EnvRegistry::with_builtin();
        assert_eq!(
            registry.names(),
            vec!["basic_combat", "bvr_combat", "point_tracking"]
        );
    }

    #[test]
    fn create_builds_named_variant() {
        let registry = EnvRegistry::with_builtin();
        let env = create_env("bvr_combat", session(), EpisodeConfig::default(), &registry).unwrap();
        assert_eq!(env.name(), "bvr_combat");
        assert_eq!(env.action_space().dim(), 8);
        assert_eq!(env.observation_dim(), 13);
    }

    #[test]
    fn unknown_name_reports_available() {
        let registry = EnvRegistry::with_builtin();
        let err = match create_env("dogfight", session(), EpisodeConfig::default(), &registry) {
            Err(e) => e,
            Ok(_) => panic!("expected UnknownEnvironment"),
        };
        match err {
            EnvError::UnknownEnvironment { name, available } => {
                assert_eq!(name, "dogfight");
                assert_eq!(available.len(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn register_extends_and_replaces() {
        let mut registry = EnvRegistry::new();
        assert!(registry.register("tracking", || Box::new(PointTracking)).is_none());
        assert!(registry.register("tracking", || Box::new(BasicCombat)).is_some());
        assert!(registry.contains("tracking"));

        let env = registry
            .create("tracking", session(), EpisodeConfig::default())
            .unwrap();
        assert_eq!(env.name(), "basic_combat");
    }
}
