//! Known backends and the table of live renderer instances.

use crate::error::BackendError;

use super::{Backend, Renderer, RendererId, RendererKind};

/// Builds a backend for the requested id.
pub type CreateFn = Box<dyn Fn(RendererId) -> Result<Box<dyn Backend>, BackendError>>;

/// Called after a renderer created from the registration has been freed.
pub type FreeHook = Box<dyn Fn(RendererId)>;

/// Maximum number of registrations unless configured otherwise.
pub const DEFAULT_MAX_REGISTERED_RENDERERS: usize = 10;
/// Maximum number of simultaneously active renderers unless configured otherwise.
pub const DEFAULT_MAX_ACTIVE_RENDERERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("renderer table is full ({0} entries)")]
    Full(usize),
    #[error("cannot register the unknown renderer id")]
    UnknownId,
    #[error("{0} is already registered")]
    Duplicate(RendererId),
    #[error("no registered renderer matches {0}")]
    NotRegistered(RendererId),
    #[error("creating {id} failed: {source}")]
    Create {
        id: RendererId,
        #[source]
        source: BackendError,
    },
}

/// A backend factory registered under a renderer id.
pub struct Registration {
    pub id: RendererId,
    create: CreateFn,
    free: Option<FreeHook>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("has_free_hook", &self.free.is_some())
            .finish()
    }
}

/// Registered backends plus the order `init` tries them in.
#[derive(Debug)]
pub struct Registry {
    entries: Vec<Registration>,
    max: usize,
    order: Vec<RendererId>,
}

impl Registry {
    pub fn new(max: usize, order: Vec<RendererId>) -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(max),
            max,
            order: Vec::new(),
        };
        registry.set_order(order);
        registry
    }

    pub fn register(
        &mut self,
        id: RendererId,
        create: CreateFn,
        free: Option<FreeHook>,
    ) -> Result<(), RegistryError> {
        if id.is_unknown() {
            return Err(RegistryError::UnknownId);
        }
        if self.entries.len() >= self.max {
            return Err(RegistryError::Full(self.max));
        }
        if let Some(existing) = self.find(id.kind) {
            return Err(RegistryError::Duplicate(existing.id));
        }
        self.entries.push(Registration { id, create, free });
        Ok(())
    }

    /// Registration for a backend family; versions are not compared.
    pub fn find(&self, kind: RendererKind) -> Option<&Registration> {
        self.entries.iter().find(|r| r.id.kind == kind)
    }

    pub fn ids(&self) -> Vec<RendererId> {
        self.entries.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the factory registered for `id.kind`.
    pub fn create(&self, id: RendererId) -> Result<Box<dyn Backend>, RegistryError> {
        let registration = self.find(id.kind).ok_or(RegistryError::NotRegistered(id))?;
        (registration.create)(id).map_err(|source| RegistryError::Create { id, source })
    }

    /// Calls the free hook of the registration matching `id`, if any.
    pub fn notify_freed(&self, id: RendererId) {
        if let Some(hook) = self.find(id.kind).and_then(|r| r.free.as_ref()) {
            hook(id);
        }
    }

    pub fn order(&self) -> &[RendererId] {
        &self.order
    }

    /// Replaces the init order; entries past the registry capacity are dropped.
    pub fn set_order(&mut self, mut order: Vec<RendererId>) {
        order.truncate(self.max);
        self.order = order;
    }
}

/// Live renderers, at most one per backend family.
#[derive(Debug)]
pub struct ActiveRenderers {
    renderers: Vec<Renderer>,
    max: usize,
}

impl ActiveRenderers {
    pub fn new(max: usize) -> Self {
        Self {
            renderers: Vec::with_capacity(max),
            max,
        }
    }

    pub fn get(&self, kind: RendererKind) -> Option<&Renderer> {
        self.renderers.iter().find(|r| r.id().kind == kind)
    }

    pub fn get_mut(&mut self, kind: RendererKind) -> Option<&mut Renderer> {
        self.renderers.iter_mut().find(|r| r.id().kind == kind)
    }

    pub fn is_full(&self) -> bool {
        self.renderers.len() >= self.max
    }

    /// Adds a renderer; hands it back when the table is full.
    pub fn insert(&mut self, renderer: Renderer) -> Result<(), Renderer> {
        if self.is_full() {
            return Err(renderer);
        }
        self.renderers.push(renderer);
        Ok(())
    }

    pub fn remove(&mut self, kind: RendererKind) -> Option<Renderer> {
        let at = self.renderers.iter().position(|r| r.id().kind == kind)?;
        Some(self.renderers.remove(at))
    }

    pub fn ids(&self) -> Vec<RendererId> {
        self.renderers.iter().map(Renderer::id).collect()
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Renderer> {
        self.renderers.iter_mut()
    }

    /// Removes every renderer, most recently added first.
    pub fn drain(&mut self) -> Vec<Renderer> {
        let mut all: Vec<Renderer> = self.renderers.drain(..).collect();
        all.reverse();
        all
    }
}
