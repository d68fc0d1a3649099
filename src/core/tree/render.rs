//=========================================================================
// Render Pass
//=========================================================================
//
// Paint traversal. Independent of the logic pass: it never consults
// process modes or the pause flag.
//
// Per node (pre-order):
//   missing / inactive → skip subtree
//   window             → stop (drawn by its own `render_window` pass)
//   visible visual     → draw(ctx)
//   children           → insertion order, earlier siblings paint first
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::SceneTree;
use crate::core::error::{SceneError, TreeError};
use crate::core::node::{DrawingContext, HookPhase, NodeId};

//=== Render Pass =========================================================

impl SceneTree {
    /// Draws the scene from the root. Without a root this is a no-op.
    pub fn render(&mut self, ctx: &mut dyn DrawingContext) -> Result<(), SceneError> {
        match self.root {
            Some(root) => self.render_node(root, ctx),
            None => Ok(()),
        }
    }

    /// Draws the subtree hosted by a window node into its own context.
    ///
    /// The window itself is not drawn; its children are, with the same
    /// rules as [`SceneTree::render`]. An inactive window draws nothing.
    pub fn render_window(
        &mut self,
        window: NodeId,
        ctx: &mut dyn DrawingContext,
    ) -> Result<(), SceneError> {
        let slot = self.arena.get(window).ok_or(TreeError::StaleNode(window))?;
        if !slot.active {
            return Ok(());
        }

        for child in slot.children.clone() {
            self.render_node(child, ctx)?;
        }
        Ok(())
    }

    fn render_node(&mut self, id: NodeId, ctx: &mut dyn DrawingContext) -> Result<(), SceneError> {
        let Some(slot) = self.arena.get_mut(id) else {
            return Ok(());
        };
        if !slot.active {
            return Ok(());
        }
        let children = slot.children.clone();

        if let Some(behavior) = slot.behavior.as_deref_mut() {
            if behavior.is_window() {
                return Ok(());
            }
            if let Some(visual) = behavior.as_visual_mut() {
                if visual.visible() {
                    visual.draw(ctx).map_err(|source| SceneError::Hook {
                        node: id,
                        phase: HookPhase::Draw,
                        source,
                    })?;
                }
            }
        }

        for child in children {
            self.render_node(child, ctx)?;
        }
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::HookResult;
    use crate::core::node::{Node, ProcessMode, Visual};
    use std::time::Duration;

    /// Frame type used by the tests: a list of painted names.
    type Frame = Vec<&'static str>;

    struct Sprite {
        name: &'static str,
        visible: bool,
    }

    impl Node for Sprite {
        fn as_visual_mut(&mut self) -> Option<&mut dyn Visual> {
            Some(self)
        }
    }

    impl Visual for Sprite {
        fn visible(&self) -> bool {
            self.visible
        }

        fn draw(&mut self, ctx: &mut dyn DrawingContext) -> HookResult {
            let frame = ctx.downcast_mut::<Frame>().ok_or("unexpected drawing context")?;
            frame.push(self.name);
            Ok(())
        }
    }

    struct Window;
    impl Node for Window {
        fn is_window(&self) -> bool {
            true
        }
    }

    struct Group;
    impl Node for Group {}

    fn sprite(tree: &mut SceneTree, name: &'static str) -> NodeId {
        tree.insert(name, Sprite { name, visible: true })
    }

    fn paint(tree: &mut SceneTree) -> Frame {
        let mut frame = Frame::new();
        tree.render(&mut frame).unwrap();
        frame
    }

    //=====================================================================
    // Traversal Tests
    //=====================================================================

    #[test]
    fn paints_pre_order_in_insertion_order() {
        let mut tree = SceneTree::new();
        let root = sprite(&mut tree, "root");
        let a = sprite(&mut tree, "a");
        let a1 = sprite(&mut tree, "a1");
        let b = sprite(&mut tree, "b");
        tree.set_root(root).unwrap();
        tree.add_child(root, a).unwrap();
        tree.add_child(a, a1).unwrap();
        tree.add_child(root, b).unwrap();

        assert_eq!(paint(&mut tree), vec!["root", "a", "a1", "b"]);
    }

    #[test]
    fn hidden_visual_still_paints_children() {
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Sprite { name: "root", visible: false });
        let child = sprite(&mut tree, "child");
        tree.set_root(root).unwrap();
        tree.add_child(root, child).unwrap();

        assert_eq!(paint(&mut tree), vec!["child"]);
    }

    #[test]
    fn inactive_subtree_is_not_painted() {
        let mut tree = SceneTree::new();
        let root = tree.insert("root", Group);
        let a = sprite(&mut tree, "a");
        let a1 = sprite(&mut tree, "a1");
        let b = sprite(&mut tree, "b");
        tree.set_root(root).unwrap();
        tree.add_child(root, a).unwrap();
        tree.add_child(a, a1).unwrap();
        tree.add_child(root, b).unwrap();
        tree.set_active(a, false).unwrap();

        assert_eq!(paint(&mut tree), vec!["b"]);
    }

    #[test]
    fn render_ignores_pause_and_process_mode() {
        let mut tree = SceneTree::new();
        let root = sprite(&mut tree, "root");
        tree.set_root(root).unwrap();
        tree.set_process_mode(root, ProcessMode::Disabled).unwrap();
        tree.set_paused(true);
        tree.process(Duration::from_millis(16)).unwrap();

        assert_eq!(paint(&mut tree), vec!["root"]);
    }

    #[test]
    fn render_without_root_is_noop() {
        let mut tree = SceneTree::new();
        assert!(paint(&mut tree).is_empty());
    }

    //=====================================================================
    // Window Tests
    //=====================================================================

    #[test]
    fn does_not_descend_into_windows() {
        let mut tree = SceneTree::new();
        let root = sprite(&mut tree, "root");
        let window = tree.insert("window", Window);
        let inner = sprite(&mut tree, "inner");
        let after = sprite(&mut tree, "after");
        tree.set_root(root).unwrap();
        tree.add_child(root, window).unwrap();
        tree.add_child(window, inner).unwrap();
        tree.add_child(root, after).unwrap();

        assert_eq!(paint(&mut tree), vec!["root", "after"]);

        let mut window_frame = Frame::new();
        tree.render_window(window, &mut window_frame).unwrap();
        assert_eq!(window_frame, vec!["inner"]);
    }

    #[test]
    fn render_window_rejects_stale_handle() {
        let mut tree = SceneTree::new();
        let window = tree.insert("window", Window);
        tree.free(window);

        let mut frame = Frame::new();
        let err = tree.render_window(window, &mut frame).unwrap_err();
        assert!(matches!(err, SceneError::Tree(TreeError::StaleNode(id)) if id == window));
    }

    //=====================================================================
    // Failure Tests
    //=====================================================================

    #[test]
    fn draw_failure_aborts_with_node_context() {
        let mut tree = SceneTree::new();
        let root = sprite(&mut tree, "root");
        tree.set_root(root).unwrap();

        let mut wrong_context = 0_u32;
        let err = tree.render(&mut wrong_context).unwrap_err();
        match err {
            SceneError::Hook { node, phase, .. } => {
                assert_eq!(node, root);
                assert_eq!(phase, HookPhase::Draw);
            }
            other => panic!("Expected draw hook error, got {:?}", other),
        }
    }
}
