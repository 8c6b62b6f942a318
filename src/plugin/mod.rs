//! Host integration
//!
//! A [`Session`] lives from host startup to shutdown. It owns the registry and answers
//! host callbacks: context-menu requests, the user's mark/unmark actions, and the
//! final-maturity notification that triggers replay. All calls come from the host's
//! single event thread; nothing here locks.

pub mod events;

pub use events::{EventOutcome, HostEvent, Maturity, PopupAction, Refresh, Selection};

use crate::analysis::{find_var_asg, merge_var};
use crate::ast::{LVar, SUPERFLUOUS_COMMENT};
use crate::cfunc::CFunc;
use crate::config::PluginConfig;
use crate::error::{Error, Result};
use crate::registry::{NodeStore, ReplayReport, SfLVar, SuperfluousRegistry};

/// Superfluous-variable session bound to one store
#[derive(Debug)]
pub struct Session {
    registry: SuperfluousRegistry,
    config: PluginConfig,
}

impl Session {
    /// Start a session: optionally wipe the node, then load saved records
    pub fn init(mut store: Box<dyn NodeStore>, config: PluginConfig) -> Result<Self> {
        if config.reset_store && store.exists(&config.node_name) {
            log::info!("resetting saved superfluous variables in '{}'", config.node_name);
            store.kill(&config.node_name)?;
        }
        let registry = SuperfluousRegistry::open(store, config.node_name.clone())?;
        log::info!(
            "sf_lvars ready to use, {} saved superfluous variables",
            registry.len()
        );
        Ok(Self { registry, config })
    }

    /// End the session and hand the store back
    pub fn term(self) -> Box<dyn NodeStore> {
        log::debug!("sf_lvars terminating");
        self.registry.into_store()
    }

    pub fn registry(&self) -> &SuperfluousRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Dispatch one host event for `cfunc`
    pub fn handle_event(&mut self, cfunc: &mut CFunc, event: &HostEvent) -> EventOutcome {
        match event {
            HostEvent::RightClick { selection } => {
                EventOutcome::Popup(self.popup_actions(cfunc, selection))
            }
            HostEvent::Maturity { maturity } => {
                if *maturity != Maturity::Final
                    || !self.config.auto_replay
                    || self.registry.is_empty()
                {
                    return EventOutcome::Ignored;
                }
                EventOutcome::Replayed(self.replay(cfunc))
            }
        }
    }

    /// Context menu entries available for `selection`
    pub fn popup_actions(&self, cfunc: &CFunc, selection: &Selection) -> Vec<PopupAction> {
        match selection {
            // pointing at the lvar itself (in the variable list)
            Selection::LVar { idx } => cfunc
                .lvars
                .get(*idx)
                .map(|lvar| SfLVar::for_lvar(cfunc.entry_ea, lvar))
                .filter(|record| self.registry.contains(record))
                .map(|_| vec![PopupAction::UnmarkSuperfluous])
                .unwrap_or_default(),
            // pointing at an assignment to the var
            _ => find_var_asg(&cfunc.body, selection.item())
                .map(|_| vec![PopupAction::MarkSuperfluous])
                .unwrap_or_default(),
        }
    }

    /// Run a context menu action chosen by the user
    pub fn perform(
        &mut self,
        cfunc: &mut CFunc,
        action: PopupAction,
        selection: &Selection,
    ) -> Result<Option<Refresh>> {
        match action {
            PopupAction::MarkSuperfluous => self.mark_superfluous(cfunc, selection),
            PopupAction::UnmarkSuperfluous => self.unmark_superfluous(cfunc, selection),
        }
    }

    /// Merge the variable defined by the selected copy and remember the decision.
    ///
    /// Returns the refresh the host should do, or `None` when the selection is not an
    /// eliminable copy. A refused merge leaves `cfunc` untouched. A storage error
    /// comes after the merge: the body is rewritten but nothing was saved and the
    /// variable keeps its entry, so the host should decompile again.
    pub fn mark_superfluous(
        &mut self,
        cfunc: &mut CFunc,
        selection: &Selection,
    ) -> Result<Option<Refresh>> {
        let Some(asg) = find_var_asg(&cfunc.body, selection.item()) else {
            return Ok(None);
        };

        let outcome = merge_var(cfunc, asg).map_err(|err| {
            log::warn!("cannot mark variable superfluous: {}", err);
            Error::from(err)
        })?;

        let entry_ea = cfunc.entry_ea;
        let Some(lvar) = cfunc.lvars.get_mut(outcome.removed_var) else {
            log::error!("merged variable v{} is not in the variable table", outcome.removed_var);
            return Ok(Some(Refresh::Text));
        };
        let record = SfLVar::for_lvar(entry_ea, lvar);
        if let Err(err) = self.registry.add(record) {
            log::error!("failed to save superfluous variable ({}): {}", record, err);
            return Err(err);
        }
        self.remove_from_lvars(lvar);

        Ok(Some(Refresh::Text))
    }

    /// Forget the mark on the selected variable-list entry.
    ///
    /// The ctree is not restored here; the host must decompile again. `None` when the
    /// variable was not marked.
    pub fn unmark_superfluous(
        &mut self,
        cfunc: &mut CFunc,
        selection: &Selection,
    ) -> Result<Option<Refresh>> {
        let Selection::LVar { idx } = selection else {
            log::debug!("unmark needs a variable list entry");
            return Ok(None);
        };
        let entry_ea = cfunc.entry_ea;
        let Some(lvar) = cfunc.lvars.get_mut(*idx) else {
            return Ok(None);
        };
        let record = SfLVar::for_lvar(entry_ea, lvar);

        if !self.registry.remove(&record)? {
            return Ok(None);
        }
        lvar.comment.clear();
        Ok(Some(Refresh::View))
    }

    /// Re-apply saved merges to a freshly built function
    pub fn replay(&mut self, cfunc: &mut CFunc) -> ReplayReport {
        let report = self.registry.replay(cfunc);
        for outcome in &report.merged {
            if let Some(lvar) = cfunc.lvars.get_mut(outcome.removed_var) {
                self.remove_from_lvars(lvar);
            }
        }
        if !report.merged.is_empty() {
            log::debug!(
                "replayed {} superfluous variables in function {:#x}",
                report.merged.len(),
                cfunc.entry_ea
            );
        }
        report
    }

    fn remove_from_lvars(&self, lvar: &mut LVar) {
        if self.config.hide_superfluous {
            lvar.used = false;
        } else {
            // keep it visible so the mark can be removed
            lvar.comment = SUPERFLUOUS_COMMENT.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MergeError;
    use crate::ast::{CTreeBuilder, LVars, VarLocation};
    use crate::registry::MemoryStore;

    fn function() -> (CFunc, crate::ast::CopyStmt) {
        let mut b = CTreeBuilder::new();
        let copy = b.copy_stmt(0x1004, 0, 1);
        let v = b.var(0);
        let ret = b.ret(0x1008, Some(v));
        b.push_stmt(copy.stmt).push_stmt(ret);
        let mut lvars = LVars::new();
        lvars.push(LVar::new("v1", VarLocation::Register { reg: 0 }, 0x1004, 4));
        lvars.push(LVar::new("a1", VarLocation::Register { reg: 1 }, 0x1000, 4));
        (CFunc::new(0x1000, b.finish(), lvars), copy)
    }

    fn session(config: PluginConfig) -> Session {
        Session::init(Box::new(MemoryStore::new()), config).unwrap()
    }

    fn right_click(selection: Selection) -> HostEvent {
        HostEvent::RightClick { selection }
    }

    /// Store that refuses every blob write
    struct ReadOnlyStore(MemoryStore);

    impl NodeStore for ReadOnlyStore {
        fn exists(&self, node: &str) -> bool {
            self.0.exists(node)
        }

        fn blob(&self, node: &str) -> Result<Option<Vec<u8>>> {
            self.0.blob(node)
        }

        fn set_blob(&mut self, _node: &str, _data: &[u8]) -> Result<()> {
            Err(Error::Io("read-only store".to_string()))
        }

        fn altval(&self, node: &str) -> Result<u64> {
            self.0.altval(node)
        }

        fn set_altval(&mut self, node: &str, value: u64) -> Result<()> {
            self.0.set_altval(node, value)
        }

        fn kill(&mut self, node: &str) -> Result<()> {
            self.0.kill(node)
        }
    }

    #[test]
    fn test_popup_offers_mark_only_on_assignee() {
        let (mut cfunc, copy) = function();
        let mut s = session(PluginConfig::default());

        assert_eq!(
            s.handle_event(&mut cfunc, &right_click(Selection::Item { id: copy.dst })),
            EventOutcome::Popup(vec![PopupAction::MarkSuperfluous])
        );
        assert_eq!(
            s.handle_event(&mut cfunc, &right_click(Selection::Item { id: copy.src })),
            EventOutcome::Popup(vec![])
        );
    }

    #[test]
    fn test_popup_offers_unmark_only_for_registered_lvar() {
        let (mut cfunc, copy) = function();
        let mut s = session(PluginConfig::default());

        let on_v1 = right_click(Selection::LVar { idx: 0 });
        assert_eq!(s.handle_event(&mut cfunc, &on_v1), EventOutcome::Popup(vec![]));

        s.mark_superfluous(&mut cfunc, &Selection::Item { id: copy.dst })
            .unwrap();
        assert_eq!(
            s.handle_event(&mut cfunc, &on_v1),
            EventOutcome::Popup(vec![PopupAction::UnmarkSuperfluous])
        );

        // unregistered variable of the same function
        let on_a1 = right_click(Selection::LVar { idx: 1 });
        assert_eq!(s.handle_event(&mut cfunc, &on_a1), EventOutcome::Popup(vec![]));

        // same variable, different function
        let (mut other, _) = function();
        other.entry_ea = 0x2000;
        assert_eq!(s.handle_event(&mut other, &on_v1), EventOutcome::Popup(vec![]));
    }

    #[test]
    fn test_hide_superfluous_clears_used() {
        let (mut cfunc, copy) = function();
        let mut s = session(PluginConfig {
            hide_superfluous: true,
            ..Default::default()
        });

        let refresh = s
            .mark_superfluous(&mut cfunc, &Selection::Item { id: copy.dst })
            .unwrap();
        assert_eq!(refresh, Some(Refresh::Text));
        let lvar = cfunc.lvars.get(0).unwrap();
        assert!(!lvar.used);
        assert!(lvar.comment.is_empty());
    }

    #[test]
    fn test_refused_merge_is_reported() {
        // v1 = a1; v1 = a1; return v1;
        let mut b = CTreeBuilder::new();
        let copy = b.copy_stmt(0x1004, 0, 1);
        let again = b.copy_stmt(0x1008, 0, 1);
        let v = b.var(0);
        let ret = b.ret(0x100c, Some(v));
        b.push_stmt(copy.stmt).push_stmt(again.stmt).push_stmt(ret);
        let (plain, _) = function();
        let mut cfunc = CFunc::new(0x1000, b.finish(), plain.lvars);
        let before = cfunc.clone();
        let mut s = session(PluginConfig::default());

        let err = s
            .mark_superfluous(&mut cfunc, &Selection::Item { id: copy.dst })
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Merge(MergeError::MultipleAssignments { var: 0, .. })
        ));
        assert_eq!(cfunc, before);
        assert!(s.registry().is_empty());
    }

    #[test]
    fn test_unsaved_mark_is_an_error() {
        let (mut cfunc, copy) = function();
        let store = ReadOnlyStore(MemoryStore::new());
        let mut s = Session::init(Box::new(store), PluginConfig::default()).unwrap();

        assert!(s
            .mark_superfluous(&mut cfunc, &Selection::Item { id: copy.dst })
            .is_err());
        assert!(s.registry().is_empty());
        assert!(!cfunc.lvars.get(0).unwrap().is_superfluous());
    }

    #[test]
    fn test_unmark_of_unmarked_lvar_is_noop() {
        let (mut cfunc, _) = function();
        let mut s = session(PluginConfig::default());
        assert_eq!(
            s.unmark_superfluous(&mut cfunc, &Selection::LVar { idx: 0 })
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_maturity_below_final_is_ignored() {
        let (mut cfunc, copy) = function();
        let mut s = session(PluginConfig::default());
        s.mark_superfluous(&mut cfunc.clone(), &Selection::Item { id: copy.dst })
            .unwrap();

        let event = HostEvent::Maturity {
            maturity: Maturity::Casted,
        };
        assert_eq!(s.handle_event(&mut cfunc, &event), EventOutcome::Ignored);
    }

    #[test]
    fn test_auto_replay_off_ignores_final() {
        let (mut cfunc, copy) = function();
        let mut s = session(PluginConfig {
            auto_replay: false,
            ..Default::default()
        });
        s.mark_superfluous(&mut cfunc.clone(), &Selection::Item { id: copy.dst })
            .unwrap();
        assert_eq!(s.registry().len(), 1);

        let before = cfunc.clone();
        let event = HostEvent::Maturity {
            maturity: Maturity::Final,
        };
        assert_eq!(s.handle_event(&mut cfunc, &event), EventOutcome::Ignored);
        assert_eq!(cfunc, before);
    }

    #[test]
    fn test_reset_store_wipes_saved_records() {
        let (mut cfunc, copy) = function();
        let mut s = session(PluginConfig::default());
        s.mark_superfluous(&mut cfunc, &Selection::Item { id: copy.dst })
            .unwrap();
        let store = s.term();

        let s = Session::init(
            store,
            PluginConfig {
                reset_store: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(s.registry().is_empty());
    }
}
