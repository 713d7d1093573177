use pagecraft_model::{
    kind, validate_tree, BlockNode, NodeId, PageContent, RawDocument, ValidationKind,
};
use proptest::prelude::*;
use proptest::sample::Index;

/// Build a tree where node `i + 1` hangs under one of the nodes before it
fn tree_from_parents(parents: &[Index]) -> PageContent {
    let mut nodes = vec![BlockNode::of_kind("n0", kind::PAGE)];
    for (i, parent) in parents.iter().enumerate() {
        let id = NodeId::new(format!("n{}", i + 1));
        let parent_idx = parent.index(i + 1);

        let mut child = BlockNode::of_kind(id.clone(), kind::SECTION);
        child.parent_id = Some(nodes[parent_idx].id.clone());
        nodes[parent_idx].child_ids.push(id);
        nodes.push(child);
    }
    PageContent::from_parts(NodeId::new("n0"), nodes)
}

proptest! {
    #[test]
    fn generated_trees_are_structurally_valid(parents in prop::collection::vec(any::<Index>(), 0..40)) {
        let tree = tree_from_parents(&parents);
        prop_assert!(validate_tree(&tree).is_empty());
        prop_assert_eq!(tree.descendants(tree.root_id()).len(), parents.len() + 1);
    }

    #[test]
    fn dropping_a_child_link_is_reported(
        parents in prop::collection::vec(any::<Index>(), 1..40),
        victim in any::<Index>(),
    ) {
        let tree = tree_from_parents(&parents);
        let victim = NodeId::new(format!("n{}", victim.index(parents.len()) + 1));
        let parent_id = tree.parent_of(&victim).cloned().unwrap();

        let mut broken = tree.clone();
        broken
            .node_mut(&parent_id)
            .unwrap()
            .child_ids
            .retain(|c| c != &victim);

        let errors = validate_tree(&broken);
        prop_assert!(!errors.is_empty());
        prop_assert!(errors.iter().all(|e| e.kind == ValidationKind::Structural));
        prop_assert!(errors.iter().any(|e| e.node_id.as_ref() == Some(&victim)));
    }

    #[test]
    fn wire_format_preserves_structure(parents in prop::collection::vec(any::<Index>(), 0..20)) {
        let tree = tree_from_parents(&parents);
        let json = RawDocument::from_content(&tree, 3).to_json().unwrap();
        let decoded = RawDocument::from_json(&json).unwrap().into_content().unwrap();
        prop_assert_eq!(decoded, tree);
    }
}

#[test]
fn test_detached_cycle_is_reported() {
    let mut a = BlockNode::of_kind("a", kind::SECTION);
    let mut b = BlockNode::of_kind("b", kind::SECTION);
    a.parent_id = Some(NodeId::new("b"));
    a.child_ids = vec![NodeId::new("b")];
    b.parent_id = Some(NodeId::new("a"));
    b.child_ids = vec![NodeId::new("a")];
    let root = BlockNode::of_kind("r", kind::PAGE);

    let tree = PageContent::from_parts(NodeId::new("r"), [root, a, b]);
    let cycles: Vec<_> = validate_tree(&tree)
        .into_iter()
        .filter(|e| e.message.contains("reachable from itself"))
        .collect();
    assert!(!cycles.is_empty());
    assert!(cycles.iter().all(|e| e.kind == ValidationKind::Structural));
}
