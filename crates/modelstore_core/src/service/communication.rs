//! Callback-shaped communication contract for editors.
//!
//! # Responsibility
//! - Define the load/save contract shared by every persistence backend.
//! - Implement it locally on top of [`UnitRepository`].
//!
//! # Invariants
//! - Callbacks run only on success, at most once per call.
//! - Rejected names and undecodable payloads are already reported by the
//!   repository; they return `Ok(())` without running the callback.
//! - Storage failures are reported to the notifier and returned as `Err`
//!   so the caller can decide whether to retry.

use crate::db::DbResult;
use crate::repo::unit_repo::{LoadOutcome, RepoResult, UnitRepository};
use crate::serializer::UnitSerializer;
use log::debug;

/// Persistence backend contract used by editors.
pub trait ModelCommunication {
    type Unit;

    fn put_model_unit(&self, model_name: &str, unit_name: &str, unit: &Self::Unit) -> DbResult<()>;

    fn delete_model_unit(&self, model_name: &str, unit_name: &str) -> DbResult<()>;

    fn delete_model(&self, model_name: &str) -> DbResult<()>;

    fn load_model_list(&self, callback: &mut dyn FnMut(Vec<String>)) -> DbResult<()>;

    fn load_unit_list(
        &self,
        model_name: &str,
        callback: &mut dyn FnMut(Vec<String>),
    ) -> DbResult<()>;

    fn load_model_unit(
        &self,
        model_name: &str,
        unit_name: &str,
        callback: &mut dyn FnMut(Self::Unit),
    ) -> DbResult<()>;

    fn load_model_unit_interface(
        &self,
        model_name: &str,
        unit_name: &str,
        callback: &mut dyn FnMut(Self::Unit),
    ) -> DbResult<()>;

    fn rename_model_unit(
        &self,
        model_name: &str,
        old_name: &str,
        new_name: &str,
        unit: &Self::Unit,
    ) -> DbResult<()>;
}

/// [`ModelCommunication`] backed by the local unit store.
pub struct LocalCommunication<'store, S: UnitSerializer> {
    repo: UnitRepository<'store, S>,
}

impl<'store, S: UnitSerializer> LocalCommunication<'store, S> {
    pub fn new(repo: UnitRepository<'store, S>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &UnitRepository<'store, S> {
        &self.repo
    }

    fn surface<T>(&self, operation: &str, result: RepoResult<T>) -> DbResult<T> {
        result.map_err(|err| {
            self.repo
                .notifier()
                .notify(&format!("{operation} failed: {err}"));
            err
        })
    }

    fn deliver(
        &self,
        model_name: &str,
        unit_name: &str,
        outcome: LoadOutcome<S::Unit>,
        callback: &mut dyn FnMut(S::Unit),
    ) {
        match outcome {
            LoadOutcome::Loaded(unit) => callback(unit),
            LoadOutcome::NotFound => self
                .repo
                .notifier()
                .notify(&format!("Unit '{model_name}/{unit_name}' does not exist.")),
            LoadOutcome::Rejected(_) => {}
        }
    }
}

impl<S: UnitSerializer> ModelCommunication for LocalCommunication<'_, S> {
    type Unit = S::Unit;

    fn put_model_unit(&self, model_name: &str, unit_name: &str, unit: &S::Unit) -> DbResult<()> {
        debug!("event=comm_call module=service op=put_model_unit model={model_name} unit={unit_name}");
        self.surface("put_model_unit", self.repo.save_unit(model_name, unit_name, unit))
            .map(|_| ())
    }

    fn delete_model_unit(&self, model_name: &str, unit_name: &str) -> DbResult<()> {
        debug!("event=comm_call module=service op=delete_model_unit model={model_name} unit={unit_name}");
        self.surface("delete_model_unit", self.repo.delete_unit(model_name, unit_name))
            .map(|_| ())
    }

    fn delete_model(&self, model_name: &str) -> DbResult<()> {
        debug!("event=comm_call module=service op=delete_model model={model_name}");
        self.surface("delete_model", self.repo.delete_model(model_name))
            .map(|_| ())
    }

    fn load_model_list(&self, callback: &mut dyn FnMut(Vec<String>)) -> DbResult<()> {
        debug!("event=comm_call module=service op=load_model_list");
        let names = self.surface("load_model_list", self.repo.list_models())?;
        callback(names);
        Ok(())
    }

    fn load_unit_list(
        &self,
        model_name: &str,
        callback: &mut dyn FnMut(Vec<String>),
    ) -> DbResult<()> {
        debug!("event=comm_call module=service op=load_unit_list model={model_name}");
        let names = self.surface("load_unit_list", self.repo.list_units(model_name))?;
        callback(names);
        Ok(())
    }

    fn load_model_unit(
        &self,
        model_name: &str,
        unit_name: &str,
        callback: &mut dyn FnMut(S::Unit),
    ) -> DbResult<()> {
        debug!("event=comm_call module=service op=load_model_unit model={model_name} unit={unit_name}");
        let outcome = self.surface("load_model_unit", self.repo.load_unit(model_name, unit_name))?;
        self.deliver(model_name, unit_name, outcome, callback);
        Ok(())
    }

    fn load_model_unit_interface(
        &self,
        model_name: &str,
        unit_name: &str,
        callback: &mut dyn FnMut(S::Unit),
    ) -> DbResult<()> {
        debug!("event=comm_call module=service op=load_model_unit_interface model={model_name} unit={unit_name}");
        let outcome = self.surface(
            "load_model_unit_interface",
            self.repo.load_unit_interface(model_name, unit_name),
        )?;
        self.deliver(model_name, unit_name, outcome, callback);
        Ok(())
    }

    fn rename_model_unit(
        &self,
        model_name: &str,
        old_name: &str,
        new_name: &str,
        unit: &S::Unit,
    ) -> DbResult<()> {
        debug!("event=comm_call module=service op=rename_model_unit model={model_name} from={old_name} to={new_name}");
        self.surface(
            "rename_model_unit",
            self.repo.rename_unit(model_name, old_name, new_name, unit),
        )
        .map(|_| ())
    }
}
