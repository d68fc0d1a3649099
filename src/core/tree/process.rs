//=========================================================================
// Logic Pass
//=========================================================================
//
// One logic tick over the scene tree.
//
// Order within a tick:
//   1. node hooks, pre/post-order from the root
//        ready (once) → process_begin → process → [children] → process_end
//   2. tweens  (own mode, Inherit resolves through the owner)
//   3. timers  (only while unpaused)
//
// Children, timers and tweens created during a tick are first visited or
// advanced on the next tick: every slot, timer and tween records the tick
// it was attached or created in. A child already captured by a snapshot
// this tick keeps its visit even if it is detached and re-attached.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::mem;
use std::time::Duration;

use log::debug;

//=== Internal Dependencies ===============================================

use super::SceneTree;
use crate::core::error::SceneError;
use crate::core::node::{HookPhase, Node, NodeContext, NodeId, ProcessMode};
use crate::core::timer::Timer;
use crate::core::tween::{Pump, Tween};

//=== TickHook ============================================================

/// Hooks the logic pass can run on a node.
#[derive(Debug, Clone, Copy)]
enum TickHook {
    Ready,
    ProcessBegin,
    Process,
    ProcessEnd,
}

impl TickHook {
    fn phase(self) -> HookPhase {
        match self {
            Self::Ready => HookPhase::Ready,
            Self::ProcessBegin => HookPhase::ProcessBegin,
            Self::Process => HookPhase::Process,
            Self::ProcessEnd => HookPhase::ProcessEnd,
        }
    }
}

//=== Process Pass ========================================================

impl SceneTree {
    /// Runs one logic tick.
    ///
    /// Stores `delta` (readable by every hook through
    /// [`SceneTree::delta`]), walks the tree, then advances tweens and, if
    /// the tree is not paused, timers. Without a root the tick is a no-op.
    ///
    /// The first failing hook aborts the tick and is returned.
    pub fn process(&mut self, delta: Duration) -> Result<(), SceneError> {
        self.delta = delta;
        self.tick += 1;

        let Some(root) = self.root else {
            return Ok(());
        };

        self.visit(root)?;
        self.advance_tweens()?;
        if !self.paused {
            self.advance_timers()?;
        }
        Ok(())
    }

    //--- Node Traversal ---------------------------------------------------

    fn visit(&mut self, id: NodeId) -> Result<(), SceneError> {
        let tick = self.tick;
        let Some(slot) = self.arena.get_mut(id) else {
            return Ok(());
        };
        // A node moved under a later parent mid-pass is visited once.
        if !slot.active || slot.visited_tick == tick {
            return Ok(());
        }
        slot.visited_tick = tick;
        let children = slot.children.clone();
        for child in &children {
            if let Some(slot) = self.arena.get_mut(*child) {
                slot.snapshot_tick = tick;
            }
        }

        let runs = self
            .effective_mode(id)
            .unwrap_or(ProcessMode::FALLBACK)
            .should_process(self.paused);

        if runs {
            if !self.ready.contains(&id) {
                self.invoke(id, TickHook::Ready)?;
                if self.arena.contains(id) {
                    self.ready.insert(id);
                }
            }
            self.invoke(id, TickHook::ProcessBegin)?;
            self.invoke(id, TickHook::Process)?;
        }

        for child in children {
            let attached_now = self
                .arena
                .get(child)
                .is_some_and(|slot| slot.attached_tick == tick);
            if !attached_now {
                self.visit(child)?;
            }
        }

        if runs && self.arena.contains(id) {
            self.invoke(id, TickHook::ProcessEnd)?;
        }
        Ok(())
    }

    /// Runs one hook with the node's behaviour lent out of its slot.
    ///
    /// Missing nodes are skipped silently. If the hook freed its own node,
    /// the returned behaviour receives its teardown hook.
    fn invoke(&mut self, id: NodeId, hook: TickHook) -> Result<(), SceneError> {
        let Some(mut behavior) = self.arena.get_mut(id).and_then(|slot| slot.behavior.take())
        else {
            return Ok(());
        };

        let result = {
            let mut ctx = NodeContext::new(self, id);
            match hook {
                TickHook::Ready => behavior.ready(&mut ctx),
                TickHook::ProcessBegin => behavior.process_begin(&mut ctx),
                TickHook::Process => behavior.process(&mut ctx),
                TickHook::ProcessEnd => behavior.process_end(&mut ctx),
            }
        };

        self.restore(id, behavior);
        result.map_err(|source| SceneError::Hook {
            node: id,
            phase: hook.phase(),
            source,
        })
    }

    fn restore(&mut self, id: NodeId, mut behavior: Box<dyn Node>) {
        match self.arena.get_mut(id) {
            Some(slot) => slot.behavior = Some(behavior),
            None => behavior.on_free(),
        }
    }

    //--- Tweens -----------------------------------------------------------

    fn advance_tweens(&mut self) -> Result<(), SceneError> {
        let taken = mem::take(&mut self.tweens);
        self.in_flight_tweens = taken.iter().map(Tween::id).collect();
        let mut pending = taken.into_iter();
        let mut survivors = Vec::with_capacity(pending.len());
        self.advancing_tweens = true;

        let mut outcome = Ok(());
        while let Some(mut tween) = pending.next() {
            if self.killed_tweens.contains(&tween.id()) {
                tween.kill();
            }
            if !tween.is_active() {
                self.in_flight_tweens.remove(&tween.id());
                continue;
            }
            if tween.created_tick() == self.tick {
                survivors.push(tween);
                continue;
            }

            let Some(mode) = self.tween_mode(&tween) else {
                debug!(target: "scene", "Killed {}: owner {} is gone", tween.id(), tween.owner());
                self.in_flight_tweens.remove(&tween.id());
                continue;
            };
            if mode.should_process(self.paused) {
                tween.feed(self.delta);
                if let Err(err) = self.pump_tween(&mut tween) {
                    survivors.push(tween);
                    outcome = Err(err);
                    break;
                }
            }

            if tween.is_active() {
                survivors.push(tween);
            } else {
                self.in_flight_tweens.remove(&tween.id());
            }
        }

        survivors.extend(pending);
        let created = mem::replace(&mut self.tweens, survivors);
        self.tweens.extend(created);

        let killed = mem::take(&mut self.killed_tweens);
        for tween in self.tweens.iter_mut().filter(|t| killed.contains(&t.id())) {
            tween.kill();
        }
        self.in_flight_tweens.clear();
        self.advancing_tweens = false;
        outcome
    }

    /// Resolves a tween's mode. `None` if its owner no longer exists.
    fn tween_mode(&self, tween: &Tween) -> Option<ProcessMode> {
        let owner_mode = self.effective_mode(tween.owner())?;
        if tween.process_mode().is_inherit() {
            Some(owner_mode)
        } else {
            Some(tween.process_mode())
        }
    }

    fn pump_tween(&mut self, tween: &mut Tween) -> Result<(), SceneError> {
        loop {
            let target = self
                .arena
                .get_mut(tween.owner())
                .and_then(|slot| slot.behavior.as_deref_mut());

            match tween.pump(target) {
                Pump::Idle | Pump::Finished => return Ok(()),
                Pump::Callback => {
                    tween
                        .run_callback(self)
                        .map_err(|source| SceneError::Tween {
                            tween: tween.id(),
                            source,
                        })?;
                    if self.killed_tweens.contains(&tween.id()) {
                        tween.kill();
                        return Ok(());
                    }
                }
            }
        }
    }

    //--- Timers -----------------------------------------------------------

    fn advance_timers(&mut self) -> Result<(), SceneError> {
        let delta = self.delta;
        let taken = mem::take(&mut self.timers);
        self.in_flight_timers = taken.iter().map(Timer::id).collect();
        let mut pending = taken.into_iter();
        let mut survivors = Vec::with_capacity(pending.len());
        self.advancing_timers = true;

        let mut outcome = Ok(());
        while let Some(mut timer) = pending.next() {
            if self.cancelled_timers.contains(&timer.id()) {
                timer.cancel();
                self.in_flight_timers.remove(&timer.id());
                continue;
            }
            if timer.created_tick() == self.tick {
                survivors.push(timer);
                continue;
            }

            if timer.advance(delta) {
                if let Some(on_timeout) = timer.take_callback() {
                    if let Err(source) = on_timeout(self) {
                        outcome = Err(SceneError::Timer {
                            timer: timer.id(),
                            source,
                        });
                        break;
                    }
                }
            }

            if timer.is_active() {
                survivors.push(timer);
            } else {
                self.in_flight_timers.remove(&timer.id());
            }
        }

        survivors.extend(pending);
        let created = mem::replace(&mut self.timers, survivors);
        self.timers.extend(created);

        let cancelled = mem::take(&mut self.cancelled_timers);
        self.timers.retain(|t| !cancelled.contains(&t.id()));
        self.in_flight_timers.clear();
        self.advancing_timers = false;
        outcome
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::HookResult;
    use crate::core::timer::TimerId;
    use crate::core::tween::{Easing, TweenId};
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    const TICK: Duration = Duration::from_millis(100);

    //--- Test Nodes -------------------------------------------------------

    /// Logs every hook as "name:hook".
    struct Recorder {
        name: &'static str,
        log: Log,
    }

    impl Recorder {
        fn push(&self, hook: &str) {
            self.log.lock().unwrap().push(format!("{}:{}", self.name, hook));
        }
    }

    impl Node for Recorder {
        fn ready(&mut self, _ctx: &mut NodeContext<'_>) -> HookResult {
            self.push("ready");
            Ok(())
        }
        fn process_begin(&mut self, _ctx: &mut NodeContext<'_>) -> HookResult {
            self.push("begin");
            Ok(())
        }
        fn process(&mut self, _ctx: &mut NodeContext<'_>) -> HookResult {
            self.push("process");
            Ok(())
        }
        fn process_end(&mut self, _ctx: &mut NodeContext<'_>) -> HookResult {
            self.push("end");
            Ok(())
        }
        fn on_free(&mut self) {
            self.push("free");
        }
    }

    /// Runs a closure from its process hook.
    struct Scripted<F> {
        script: F,
    }

    impl<F> Node for Scripted<F>
    where
        F: FnMut(&mut NodeContext<'_>) -> HookResult + Send + 'static,
    {
        fn process(&mut self, ctx: &mut NodeContext<'_>) -> HookResult {
            (self.script)(ctx)
        }
    }

    struct Level {
        value: f32,
    }
    impl Node for Level {}

    //--- Helpers ----------------------------------------------------------

    fn new_log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn recorder(tree: &mut SceneTree, name: &'static str, log: &Log) -> NodeId {
        tree.insert(name, Recorder { name, log: log.clone() })
    }

    fn drain(log: &Log) -> Vec<String> {
        mem::take(&mut *log.lock().unwrap())
    }

    fn ran(log: &[String], name: &str) -> bool {
        log.iter().any(|entry| entry == &format!("{}:process", name))
    }

    //=====================================================================
    // Hook Order Tests
    //=====================================================================

    #[test]
    fn hooks_run_pre_and_post_order() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = recorder(&mut tree, "root", &log);
        let a = recorder(&mut tree, "a", &log);
        let b = recorder(&mut tree, "b", &log);
        tree.set_root(root).unwrap();
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();

        tree.process(TICK).unwrap();

        assert_eq!(
            drain(&log),
            vec![
                "root:ready", "root:begin", "root:process",
                "a:ready", "a:begin", "a:process", "a:end",
                "b:ready", "b:begin", "b:process", "b:end",
                "root:end",
            ]
        );
    }

    #[test]
    fn ready_fires_once_and_first() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = recorder(&mut tree, "root", &log);
        tree.set_root(root).unwrap();

        for _ in 0..3 {
            tree.process(TICK).unwrap();
        }

        let entries = drain(&log);
        assert_eq!(entries.iter().filter(|e| *e == "root:ready").count(), 1);
        assert_eq!(entries[0], "root:ready", "Ready must precede every tick hook");
        assert!(tree.is_ready(root));
    }

    #[test]
    fn ready_waits_until_node_can_process() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = recorder(&mut tree, "root", &log);
        tree.set_root(root).unwrap();
        tree.set_paused(true);

        tree.process(TICK).unwrap();
        assert!(drain(&log).is_empty(), "Pausable node must not run while paused");
        assert!(!tree.is_ready(root));

        tree.set_paused(false);
        tree.process(TICK).unwrap();
        assert_eq!(drain(&log)[0], "root:ready");

        tree.set_paused(true);
        tree.process(TICK).unwrap();
        tree.set_paused(false);
        tree.process(TICK).unwrap();
        assert!(!drain(&log).contains(&"root:ready".to_string()), "Ready never re-fires");
    }

    #[test]
    fn failed_ready_is_retried() {
        struct Flaky {
            attempts: u32,
        }
        impl Node for Flaky {
            fn ready(&mut self, _ctx: &mut NodeContext<'_>) -> HookResult {
                self.attempts += 1;
                if self.attempts == 1 {
                    return Err("not yet".into());
                }
                Ok(())
            }
        }

        let mut tree = SceneTree::new();
        let root = tree.insert("flaky", Flaky { attempts: 0 });
        tree.set_root(root).unwrap();

        assert!(tree.process(TICK).is_err());
        assert!(!tree.is_ready(root), "Readiness is recorded only on success");

        tree.process(TICK).unwrap();
        assert!(tree.is_ready(root));
        assert_eq!(tree.node_ref::<Flaky>(root).map(|f| f.attempts), Some(2));
    }

    #[test]
    fn process_without_root_is_noop() {
        let mut tree = SceneTree::new();
        tree.process(TICK).unwrap();
        assert_eq!(tree.delta(), TICK);
    }

    //=====================================================================
    // Active Flag Tests
    //=====================================================================

    #[test]
    fn inactive_subtree_receives_no_hooks() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = recorder(&mut tree, "root", &log);
        let a = recorder(&mut tree, "a", &log);
        let b = recorder(&mut tree, "b", &log);
        tree.set_root(root).unwrap();
        tree.add_child(root, a).unwrap();
        tree.add_child(a, b).unwrap();
        tree.set_active(a, false).unwrap();

        tree.process(TICK).unwrap();

        let entries = drain(&log);
        assert!(ran(&entries, "root"));
        assert!(!entries.iter().any(|e| e.starts_with("a:") || e.starts_with("b:")));
    }

    //=====================================================================
    // Pause Semantics Tests
    //=====================================================================

    #[test]
    fn pausable_and_when_paused_nodes() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = recorder(&mut tree, "root", &log);
        let normal = recorder(&mut tree, "normal", &log);
        let menu = recorder(&mut tree, "menu", &log);
        let off = recorder(&mut tree, "off", &log);
        tree.set_root(root).unwrap();
        tree.set_process_mode(root, ProcessMode::Always).unwrap();
        for node in [normal, menu, off] {
            tree.add_child(root, node).unwrap();
        }
        tree.set_process_mode(normal, ProcessMode::Pausable).unwrap();
        tree.set_process_mode(menu, ProcessMode::WhenPaused).unwrap();
        tree.set_process_mode(off, ProcessMode::Disabled).unwrap();

        tree.process(TICK).unwrap();
        let unpaused = drain(&log);
        assert!(ran(&unpaused, "normal"));
        assert!(!ran(&unpaused, "menu"));
        assert!(!ran(&unpaused, "off"));

        tree.set_paused(true);
        tree.process(TICK).unwrap();
        let paused = drain(&log);
        assert!(ran(&paused, "root"), "Always runs while paused");
        assert!(!ran(&paused, "normal"));
        assert!(ran(&paused, "menu"));
        assert!(!ran(&paused, "off"));
    }

    #[test]
    fn inherit_takes_always_from_explicit_parent_while_paused() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = recorder(&mut tree, "root", &log);
        let a = recorder(&mut tree, "a", &log);
        let b = recorder(&mut tree, "b", &log);
        tree.set_root(root).unwrap();
        tree.add_child(root, a).unwrap();
        tree.add_child(a, b).unwrap();
        tree.set_process_mode(a, ProcessMode::Always).unwrap();
        tree.set_paused(true);

        tree.process(TICK).unwrap();

        let entries = drain(&log);
        assert!(!ran(&entries, "root"), "Root falls back to Pausable");
        assert!(ran(&entries, "a"));
        assert!(ran(&entries, "b"), "B inherits Always from A");
    }

    #[test]
    fn unprocessed_parent_still_visits_children() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = recorder(&mut tree, "root", &log);
        let child = recorder(&mut tree, "child", &log);
        tree.set_root(root).unwrap();
        tree.add_child(root, child).unwrap();
        tree.set_process_mode(root, ProcessMode::Disabled).unwrap();
        tree.set_process_mode(child, ProcessMode::Always).unwrap();

        tree.process(TICK).unwrap();
        let entries = drain(&log);
        assert!(!ran(&entries, "root"));
        assert!(ran(&entries, "child"));
    }

    //=====================================================================
    // Snapshot Isolation Tests
    //=====================================================================

    #[test]
    fn child_added_in_own_hook_waits_for_next_tick() {
        let log = new_log();
        let spawn_log = log.clone();
        let mut spawned = false;

        let mut tree = SceneTree::new();
        let root = tree.insert(
            "spawner",
            Scripted {
                script: move |ctx: &mut NodeContext<'_>| -> HookResult {
                    if !spawned {
                        spawned = true;
                        ctx.add_child("late", Recorder { name: "late", log: spawn_log.clone() })?;
                    }
                    Ok(())
                },
            },
        );
        tree.set_root(root).unwrap();

        tree.process(TICK).unwrap();
        assert_eq!(tree.children(root).len(), 1);
        assert!(drain(&log).is_empty(), "New child must not run this tick");

        tree.process(TICK).unwrap();
        assert!(ran(&drain(&log), "late"));
    }

    #[test]
    fn child_added_by_earlier_sibling_waits_for_next_tick() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        let target = tree.insert("target", Level { value: 0.0 });
        tree.set_root(root).unwrap();

        let spawn_log = log.clone();
        let mut spawned = false;
        let spawner = tree.insert(
            "spawner",
            Scripted {
                script: move |ctx: &mut NodeContext<'_>| -> HookResult {
                    if !spawned {
                        spawned = true;
                        let tree = ctx.tree_mut();
                        let late = tree.insert("late", Recorder { name: "late", log: spawn_log.clone() });
                        tree.add_child(target, late)?;
                    }
                    Ok(())
                },
            },
        );
        tree.add_child(root, spawner).unwrap();
        tree.add_child(root, target).unwrap();

        tree.process(TICK).unwrap();
        assert!(drain(&log).is_empty());

        tree.process(TICK).unwrap();
        assert!(ran(&drain(&log), "late"));
    }

    #[test]
    fn sibling_freed_during_pass_is_skipped() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        tree.set_root(root).unwrap();

        let victim = recorder(&mut tree, "victim", &log);
        let killer = tree.insert(
            "killer",
            Scripted {
                script: move |ctx: &mut NodeContext<'_>| -> HookResult {
                    ctx.tree_mut().free(victim);
                    Ok(())
                },
            },
        );
        tree.add_child(root, killer).unwrap();
        tree.add_child(root, victim).unwrap();

        tree.process(TICK).unwrap();
        assert_eq!(drain(&log), vec!["victim:free"]);
    }

    #[test]
    fn sibling_detached_during_pass_still_completes_visit() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        tree.set_root(root).unwrap();

        let detached = recorder(&mut tree, "detached", &log);
        let remover = tree.insert(
            "remover",
            Scripted {
                script: move |ctx: &mut NodeContext<'_>| -> HookResult {
                    let tree = ctx.tree_mut();
                    if tree.parent(detached).is_some() {
                        tree.remove_child(root, detached)?;
                    }
                    Ok(())
                },
            },
        );
        tree.add_child(root, remover).unwrap();
        tree.add_child(root, detached).unwrap();

        tree.process(TICK).unwrap();
        assert!(ran(&drain(&log), "detached"), "Already snapshotted child completes its visit");

        tree.process(TICK).unwrap();
        assert!(drain(&log).is_empty(), "Detached node is no longer reachable");
    }

    #[test]
    fn sibling_moved_to_back_every_tick_keeps_running() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        tree.set_root(root).unwrap();

        let moved = recorder(&mut tree, "moved", &log);
        let mover = tree.insert(
            "mover",
            Scripted {
                script: move |ctx: &mut NodeContext<'_>| -> HookResult {
                    let tree = ctx.tree_mut();
                    tree.remove_child(root, moved)?;
                    tree.add_child(root, moved)?;
                    Ok(())
                },
            },
        );
        tree.add_child(root, mover).unwrap();
        tree.add_child(root, moved).unwrap();

        for expected in 1..=2 {
            tree.process(TICK).unwrap();
            let runs = log.lock().unwrap().iter().filter(|e| *e == "moved:process").count();
            assert_eq!(runs, expected, "Re-attached snapshotted child completes its visit");
        }
        assert_eq!(tree.children(root), &[mover, moved]);
    }

    #[test]
    fn node_moved_under_later_parent_is_visited_once() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        let holder = tree.insert("holder", Level { value: 0.0 });
        tree.set_root(root).unwrap();

        let moved = recorder(&mut tree, "moved", &log);
        let mut done = false;
        let mover = tree.insert(
            "mover",
            Scripted {
                script: move |ctx: &mut NodeContext<'_>| -> HookResult {
                    if !done {
                        done = true;
                        let tree = ctx.tree_mut();
                        tree.remove_child(root, moved)?;
                        tree.add_child(holder, moved)?;
                    }
                    Ok(())
                },
            },
        );
        tree.add_child(root, moved).unwrap();
        tree.add_child(root, mover).unwrap();
        tree.add_child(root, holder).unwrap();

        tree.process(TICK).unwrap();
        let entries = drain(&log);
        assert_eq!(entries.iter().filter(|e| *e == "moved:process").count(), 1);
        assert_eq!(tree.parent(moved), Some(holder));
    }

    #[test]
    fn node_freeing_itself_gets_teardown() {
        struct Suicidal {
            log: Log,
        }
        impl Node for Suicidal {
            fn process(&mut self, ctx: &mut NodeContext<'_>) -> HookResult {
                ctx.free_self();
                Ok(())
            }
            fn process_end(&mut self, _ctx: &mut NodeContext<'_>) -> HookResult {
                self.log.lock().unwrap().push("end".to_string());
                Ok(())
            }
            fn on_free(&mut self) {
                self.log.lock().unwrap().push("free".to_string());
            }
        }

        let log = new_log();
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        let node = tree.insert("suicidal", Suicidal { log: log.clone() });
        tree.set_root(root).unwrap();
        tree.add_child(root, node).unwrap();

        tree.process(TICK).unwrap();
        assert_eq!(drain(&log), vec!["free"], "No process_end after freeing");
        assert!(!tree.contains(node));
        assert!(tree.children(root).is_empty());
    }

    //=====================================================================
    // Failure Tests
    //=====================================================================

    #[test]
    fn failing_hook_aborts_pass() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        tree.set_root(root).unwrap();
        let bad = tree.insert(
            "bad",
            Scripted {
                script: |_ctx: &mut NodeContext<'_>| -> HookResult { Err("boom".into()) },
            },
        );
        let after = recorder(&mut tree, "after", &log);
        tree.add_child(root, bad).unwrap();
        tree.add_child(root, after).unwrap();
        let timer = tree.create_timer(Duration::from_millis(1));

        let err = tree.process(TICK).unwrap_err();
        match err {
            SceneError::Hook { node, phase, .. } => {
                assert_eq!(node, bad);
                assert_eq!(phase, HookPhase::Process);
            }
            other => panic!("Expected hook error, got {:?}", other),
        }
        assert!(drain(&log).is_empty(), "Later siblings must not run");
        assert!(!timer.has_fired(), "Timers must not advance after a failure");
        assert!(tree.contains(bad), "Failing node keeps its slot");
    }

    //=====================================================================
    // Scene Change Tests
    //=====================================================================

    #[test]
    fn ready_refires_after_change_scene_with_reused_slots() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = recorder(&mut tree, "old_root", &log);
        let a = recorder(&mut tree, "old_a", &log);
        let b = recorder(&mut tree, "old_b", &log);
        tree.set_root(root).unwrap();
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();
        tree.process(TICK).unwrap();
        assert!(tree.is_ready(a) && tree.is_ready(b) && tree.is_ready(root));
        drain(&log);

        let new_root = recorder(&mut tree, "new_root", &log);
        tree.change_scene(new_root).unwrap();
        assert!(!tree.is_ready(root), "Readiness record is cleared");

        let reused = recorder(&mut tree, "reused", &log);
        let old_indices = [root.index(), a.index(), b.index()];
        assert!(old_indices.contains(&reused.index()), "Freed slot index should be reused");
        tree.add_child(new_root, reused).unwrap();
        drain(&log);

        tree.process(TICK).unwrap();
        let entries = drain(&log);
        assert!(entries.contains(&"new_root:ready".to_string()));
        assert!(entries.contains(&"reused:ready".to_string()));
    }

    #[test]
    fn change_scene_from_hook() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let next = recorder(&mut tree, "next", &log);
        let old = tree.insert(
            "old",
            Scripted {
                script: move |ctx: &mut NodeContext<'_>| -> HookResult {
                    ctx.tree_mut().change_scene(next)?;
                    Ok(())
                },
            },
        );
        tree.set_root(old).unwrap();

        tree.process(TICK).unwrap();
        assert_eq!(tree.root(), Some(next));
        assert!(!tree.contains(old));

        tree.process(TICK).unwrap();
        assert_eq!(drain(&log)[0], "next:ready");
    }

    //=====================================================================
    // Timer Tests
    //=====================================================================

    #[test]
    fn timer_runs_after_node_hooks_and_fires_once() {
        let log = new_log();
        let mut tree = SceneTree::new();
        let root = recorder(&mut tree, "root", &log);
        tree.set_root(root).unwrap();

        let timer_log = log.clone();
        let handle = tree.create_timer_with(Duration::from_millis(150), move |_tree| {
            timer_log.lock().unwrap().push("timeout".to_string());
            Ok(())
        });

        tree.process(TICK).unwrap();
        assert!(!handle.has_fired());
        drain(&log);

        tree.process(TICK).unwrap();
        assert!(handle.has_fired());
        assert_eq!(drain(&log).last().map(String::as_str), Some("timeout"));
        assert_eq!(tree.timer_count(), 0, "Fired timer is dropped in the same pass");

        tree.process(TICK).unwrap();
        assert!(!drain(&log).contains(&"timeout".to_string()));
    }

    #[test]
    fn timer_does_not_count_down_while_paused() {
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        tree.set_root(root).unwrap();

        let handle = tree.create_timer(Duration::from_secs(1));
        let step = Duration::from_millis(200);

        // 0.6 s unpaused
        for _ in 0..3 {
            tree.process(step).unwrap();
        }
        assert_eq!(tree.timer_remaining(handle.id()), Some(Duration::from_millis(400)));

        // 0.6 s paused
        tree.set_paused(true);
        for _ in 0..3 {
            tree.process(step).unwrap();
        }
        assert!(!handle.has_fired(), "Only 0.6 s of unpaused time elapsed");
        assert_eq!(tree.timer_remaining(handle.id()), Some(Duration::from_millis(400)));

        // 0.4 s unpaused
        tree.set_paused(false);
        tree.process(step).unwrap();
        assert!(!handle.has_fired());
        tree.process(step).unwrap();
        assert!(handle.has_fired());
    }

    #[test]
    fn timer_created_in_hook_is_advanced_next_tick() {
        let mut tree = SceneTree::new();
        let handles = Arc::new(Mutex::new(Vec::new()));
        let sink = handles.clone();
        let mut created = false;
        let root = tree.insert(
            "root",
            Scripted {
                script: move |ctx: &mut NodeContext<'_>| -> HookResult {
                    if !created {
                        created = true;
                        let handle = ctx.tree_mut().create_timer(Duration::ZERO);
                        sink.lock().unwrap().push(handle);
                    }
                    Ok(())
                },
            },
        );
        tree.set_root(root).unwrap();

        tree.process(TICK).unwrap();
        let handle = handles.lock().unwrap()[0].clone();
        assert!(!handle.has_fired(), "Zero timer created this tick waits");

        tree.process(TICK).unwrap();
        assert!(handle.has_fired());
    }

    #[test]
    fn timer_callback_can_cancel_later_timer() {
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        tree.set_root(root).unwrap();

        let victim_id = Arc::new(Mutex::new(None));
        let lookup = victim_id.clone();
        tree.create_timer_with(Duration::from_millis(10), move |tree| {
            if let Some(id) = *lookup.lock().unwrap() {
                tree.remove_timer(id);
            }
            Ok(())
        });
        let victim = tree.create_timer(Duration::from_millis(10));
        *victim_id.lock().unwrap() = Some(victim.id());

        tree.process(TICK).unwrap();
        assert!(!victim.has_fired(), "Cancelled during the pass before it ran");
        assert_eq!(tree.timer_count(), 0);
    }

    #[test]
    fn cancelling_unknown_timer_from_callback_reports_false() {
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        tree.set_root(root).unwrap();

        let result = Arc::new(Mutex::new(None));
        let sink = result.clone();
        tree.create_timer_with(Duration::ZERO, move |tree| {
            *sink.lock().unwrap() = Some(tree.remove_timer(TimerId(9999)));
            Ok(())
        });

        tree.process(TICK).unwrap();
        assert_eq!(*result.lock().unwrap(), Some(false));
        assert!(tree.cancelled_timers.is_empty());
    }

    #[test]
    fn failing_timer_callback_is_reported() {
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        tree.set_root(root).unwrap();
        let handle = tree.create_timer_with(Duration::ZERO, |_tree| Err("late".into()));
        let other = tree.create_timer(Duration::from_secs(5));

        let err = tree.process(TICK).unwrap_err();
        assert!(matches!(err, SceneError::Timer { timer, .. } if timer == handle.id()));
        assert_eq!(tree.timer_remaining(other.id()), Some(Duration::from_secs(5)), "Untouched timers survive");
    }

    //=====================================================================
    // Tween Tests
    //=====================================================================

    fn set_level(node: &mut dyn Node, v: f32) {
        if let Some(level) = node.downcast_mut::<Level>() {
            level.value = v;
        }
    }

    fn level(tree: &SceneTree, id: NodeId) -> f32 {
        tree.node_ref::<Level>(id).map(|l| l.value).unwrap_or(f32::NAN)
    }

    #[test]
    fn tween_animates_owner_and_is_removed_when_done() {
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        tree.set_root(root).unwrap();
        tree.create_tween(root, ProcessMode::Inherit)
            .tween_property(0.0, 1.0, Duration::from_millis(200), Easing::Linear, set_level);

        tree.process(TICK).unwrap();
        assert!((level(&tree, root) - 0.5).abs() < 1e-4);
        assert_eq!(tree.tween_count(), 1);

        tree.process(TICK).unwrap();
        assert_eq!(level(&tree, root), 1.0);
        assert_eq!(tree.tween_count(), 0, "Finished tween is removed in the same tick");
    }

    #[test]
    fn tween_follows_pause_through_its_mode() {
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        let other = tree.insert("other", Level { value: 0.0 });
        tree.set_root(root).unwrap();
        tree.add_child(root, other).unwrap();

        tree.create_tween(root, ProcessMode::Inherit)
            .tween_property(0.0, 1.0, Duration::from_secs(1), Easing::Linear, set_level);
        tree.create_tween(other, ProcessMode::Always)
            .tween_property(0.0, 1.0, Duration::from_secs(1), Easing::Linear, set_level);

        tree.set_paused(true);
        tree.process(TICK).unwrap();

        assert_eq!(level(&tree, root), 0.0, "Inherited Pausable tween holds while paused");
        assert!(level(&tree, other) > 0.0, "Always tween advances while paused");
    }

    #[test]
    fn tween_of_freed_owner_is_killed() {
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        let owner = tree.insert("owner", Level { value: 0.0 });
        tree.set_root(root).unwrap();
        tree.add_child(root, owner).unwrap();

        tree.create_tween(owner, ProcessMode::Always)
            .interval(Duration::from_secs(10));
        tree.free(owner);

        tree.process(TICK).unwrap();
        assert_eq!(tree.tween_count(), 0);
    }

    #[test]
    fn tween_callback_step_gets_tree_access() {
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        tree.set_root(root).unwrap();

        tree.create_tween(root, ProcessMode::Inherit)
            .interval(Duration::from_millis(50))
            .callback(|tree| {
                tree.set_paused(true);
                Ok(())
            });

        tree.process(TICK).unwrap();
        assert!(tree.paused());
        assert_eq!(tree.tween_count(), 0);
    }

    #[test]
    fn tween_killed_from_its_own_callback_stops() {
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        tree.set_root(root).unwrap();

        let own_id = Arc::new(Mutex::new(None));
        let lookup = own_id.clone();
        let id = tree
            .create_tween(root, ProcessMode::Inherit)
            .callback(move |tree| {
                if let Some(id) = *lookup.lock().unwrap() {
                    tree.kill_tween(id);
                }
                Ok(())
            })
            .tween_property(0.0, 9.0, Duration::ZERO, Easing::Linear, set_level)
            .id();
        *own_id.lock().unwrap() = Some(id);

        tree.process(TICK).unwrap();
        assert_eq!(level(&tree, root), 0.0, "Steps after the kill never run");
        assert_eq!(tree.tween_count(), 0);
    }

    #[test]
    fn killing_unknown_tween_from_callback_reports_false() {
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        tree.set_root(root).unwrap();

        let result = Arc::new(Mutex::new(None));
        let sink = result.clone();
        tree.create_tween(root, ProcessMode::Inherit).callback(move |tree| {
            *sink.lock().unwrap() = Some(tree.kill_tween(TweenId(9999)));
            Ok(())
        });

        tree.process(TICK).unwrap();
        assert_eq!(*result.lock().unwrap(), Some(false));
        assert!(tree.killed_tweens.is_empty());
    }

    #[test]
    fn tween_created_in_hook_is_advanced_next_tick() {
        let mut tree = SceneTree::new();
        let mut created = false;
        let root = tree.insert(
            "root",
            Scripted {
                script: move |ctx: &mut NodeContext<'_>| -> HookResult {
                    if !created {
                        created = true;
                        let owner = ctx.id();
                        ctx.tree_mut()
                            .create_tween(owner, ProcessMode::Inherit)
                            .interval(Duration::from_millis(150));
                    }
                    Ok(())
                },
            },
        );
        tree.set_root(root).unwrap();

        tree.process(TICK).unwrap();
        let elapsed = tree.tweens.first().map(Tween::elapsed);
        assert_eq!(elapsed, Some(Duration::ZERO));

        tree.process(TICK).unwrap();
        let elapsed = tree.tweens.first().map(Tween::elapsed);
        assert_eq!(elapsed, Some(TICK));
    }

    #[test]
    fn tweens_advance_before_timers() {
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Level { value: 0.0 });
        tree.set_root(root).unwrap();

        let order = new_log();
        let tween_order = order.clone();
        let timer_order = order.clone();
        tree.create_timer_with(Duration::ZERO, move |_tree| {
            timer_order.lock().unwrap().push("timer".to_string());
            Ok(())
        });
        tree.create_tween(root, ProcessMode::Inherit).callback(move |_tree| {
            tween_order.lock().unwrap().push("tween".to_string());
            Ok(())
        });

        tree.process(TICK).unwrap();
        assert_eq!(drain(&order), vec!["tween", "timer"]);
    }

    #[test]
    fn whole_tween_in_one_tick_matches_many_ticks() {
        let run = |ticks: u32, step: Duration| {
            let mut tree = SceneTree::new();
            let root = tree.insert("root", Level { value: 0.0 });
            tree.set_root(root).unwrap();
            tree.create_tween(root, ProcessMode::Inherit)
                .tween_property(0.0, 2.0, Duration::from_millis(400), Easing::SineInOut, set_level)
                .tween_property(2.0, 5.0, Duration::from_millis(600), Easing::QuadIn, set_level);
            for _ in 0..ticks {
                tree.process(step).unwrap();
            }
            (level(&tree, root), tree.tween_count())
        };

        let single = run(1, Duration::from_secs(1));
        let many = run(50, Duration::from_millis(20));
        assert_eq!(single, many);
        assert_eq!(single, (5.0, 0));
    }
}
