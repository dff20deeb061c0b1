//! Keyed registry of per-instance session state.
//!
//! Every mutation is a read-modify-write against the latest entry for the key. Writes that carry
//! a [`GenerationId`] are fenced: they apply only while that generation is still current.
//! Listeners run after the borrow is released, so they may read the store or trigger new writes.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use crate::{
    error::StaleWrite,
    model::{AppId, GenerationId, InteractionHistory, NavigationPath, SessionState},
};

pub type SessionListener = Rc<dyn Fn(&AppId)>;

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Rc<RefCell<HashMap<AppId, SessionState>>>,
    listeners: Rc<RefCell<Vec<SessionListener>>>,
    next_generation: Rc<Cell<u64>>,
}

impl SessionStore {
    /// Registers a callback invoked with the app id after every session change.
    pub fn subscribe(&self, listener: impl Fn(&AppId) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn contains(&self, app_id: &AppId) -> bool {
        self.sessions.borrow().contains_key(app_id)
    }

    pub fn get(&self, app_id: &AppId) -> Option<SessionState> {
        self.sessions.borrow().get(app_id).cloned()
    }

    pub fn snapshot(&self) -> HashMap<AppId, SessionState> {
        self.sessions.borrow().clone()
    }

    /// Creates an empty root session for `app_id` unless one exists. Returns whether it was created.
    pub fn open(&self, app_id: &AppId) -> bool {
        if self.contains(app_id) {
            return false;
        }
        let session = SessionState::new(NavigationPath::root(app_id), self.allocate_generation());
        self.sessions.borrow_mut().insert(app_id.clone(), session);
        self.notify(app_id);
        true
    }

    pub fn remove(&self, app_id: &AppId) -> Option<SessionState> {
        let removed = self.sessions.borrow_mut().remove(app_id);
        if removed.is_some() {
            self.notify(app_id);
        }
        removed
    }

    /// Applies `f` to the current session for `app_id`.
    pub fn update<R>(
        &self,
        app_id: &AppId,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> Result<R, StaleWrite> {
        let result = {
            let mut sessions = self.sessions.borrow_mut();
            let session = sessions.get_mut(app_id).ok_or(StaleWrite::Closed)?;
            f(session)
        };
        self.notify(app_id);
        Ok(result)
    }

    /// Applies `f` only while `generation` is still the session's current generation.
    pub fn update_generation<R>(
        &self,
        app_id: &AppId,
        generation: GenerationId,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> Result<R, StaleWrite> {
        let result = {
            let mut sessions = self.sessions.borrow_mut();
            let session = sessions.get_mut(app_id).ok_or(StaleWrite::Closed)?;
            if session.generation != generation {
                return Err(StaleWrite::Superseded);
            }
            f(session)
        };
        self.notify(app_id);
        Ok(result)
    }

    /// Resets the session for a new screen and returns the generation that owns it.
    pub fn begin_navigation(
        &self,
        app_id: &AppId,
        path: NavigationPath,
        history: InteractionHistory,
    ) -> Result<GenerationId, StaleWrite> {
        let generation = self.allocate_generation();
        self.update(app_id, |session| {
            session.path = path;
            session.history = history;
            session.content.clear();
            session.error = None;
            session.is_loading = false;
            session.generation = generation;
        })?;
        Ok(generation)
    }

    pub fn apply_cached(
        &self,
        app_id: &AppId,
        generation: GenerationId,
        content: String,
    ) -> Result<(), StaleWrite> {
        self.update_generation(app_id, generation, |session| {
            session.content = content;
            session.is_loading = false;
        })
    }

    pub fn mark_loading(&self, app_id: &AppId, generation: GenerationId) -> Result<(), StaleWrite> {
        self.update_generation(app_id, generation, |session| {
            session.is_loading = true;
        })
    }

    pub fn append_fragment(
        &self,
        app_id: &AppId,
        generation: GenerationId,
        fragment: &str,
    ) -> Result<(), StaleWrite> {
        self.update_generation(app_id, generation, |session| {
            session.content.push_str(fragment);
        })
    }

    /// Records a terminal failure. Partial content is discarded.
    pub fn fail_generation(
        &self,
        app_id: &AppId,
        generation: GenerationId,
        message: String,
    ) -> Result<(), StaleWrite> {
        self.update_generation(app_id, generation, |session| {
            session.error = Some(message);
            session.content.clear();
        })
    }

    pub fn finish_generation(
        &self,
        app_id: &AppId,
        generation: GenerationId,
    ) -> Result<(), StaleWrite> {
        self.update_generation(app_id, generation, |session| {
            session.is_loading = false;
        })
    }

    fn allocate_generation(&self) -> GenerationId {
        let next = self.next_generation.get() + 1;
        self.next_generation.set(next);
        GenerationId(next)
    }

    fn notify(&self, app_id: &AppId) {
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(app_id);
        }
    }
}
