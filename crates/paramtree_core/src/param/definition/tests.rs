mod unit_definition_tree {

	use std::sync::Arc;

	use crate::param::desc::HintValue;
	use crate::param::test_support::{HOLDER, LAYOUT, heap};
	use crate::param::{AllocEvent, ArraySize, DefinitionTree, ParamType, Traits, TrackingTraits};

	#[test]
	fn layout_tree_is_preorder_with_array_elements() {
		let tree = DefinitionTree::build(LAYOUT.name(), LAYOUT.fields(), &heap());
		let names: Vec<&str> = tree.nodes().iter().map(|node| node.long_name.as_ref()).collect();
		assert_eq!(
			names,
			vec![
				"",
				"flag",
				"count",
				"pos",
				"pair",
				"pair[]",
				"label",
				"points",
				"points[]",
				"points[].x",
				"points[].tag",
				"grid",
				"grid[]",
				"grid[][]",
				"settings",
				"settings.scale",
				"settings.mode",
				"settings.name",
				"hidden",
			]
		);
		assert_eq!(tree.len(), 19);
		assert_eq!(tree.root().ty, ParamType::Struct);
		assert_eq!(tree.root().child_count(), 9);
	}

	#[test]
	fn element_nodes_repeat_field_metadata() {
		let tree = DefinitionTree::build(HOLDER.name(), HOLDER.fields(), &heap());
		let array = tree.find("children").expect("children node");
		let element = tree.element_of(array).expect("element node");
		let element_node = &tree.nodes()[element];

		assert_eq!(element_node.name, "children");
		assert_eq!(element_node.ty, ParamType::Ref);
		assert_eq!(element_node.ref_variants, &["Note"]);
		assert_eq!(tree.nodes()[array].ref_variants, &["Note"]);
		assert_eq!(element_node.parent, Some(array));
		assert!(element_node.accepts_variant("Note"));
		assert!(!element_node.accepts_variant("Other"));

		let any = tree.find("any").expect("any node");
		assert!(tree.nodes()[any].accepts_variant("Other"));
	}

	#[test]
	fn dynamic_arrays_carry_extent_index() {
		let tree = DefinitionTree::build(LAYOUT.name(), LAYOUT.fields(), &heap());
		let grid = tree.find("grid").expect("grid");
		let row = tree.find("grid[]").expect("grid row");
		let pair = tree.find("pair").expect("pair");

		assert!(tree.nodes()[grid].is_dynamic_array());
		assert_eq!(&*tree.nodes()[grid].dynamic_handle_indices, &[0]);
		assert_eq!(&*tree.nodes()[row].dynamic_handle_indices, &[0, 1]);
		assert_eq!(tree.nodes()[pair].array_size, Some(ArraySize::Fixed(2)));
		assert!(tree.nodes()[pair].dynamic_handle_indices.is_empty());
	}

	#[test]
	fn hints_and_inclusion_come_from_description() {
		let tree = DefinitionTree::build(LAYOUT.name(), LAYOUT.fields(), &heap());
		let count = tree.find("count").expect("count");
		let hidden = tree.find("hidden").expect("hidden");

		assert_eq!(tree.nodes()[count].hint("max"), Some(HintValue::U64(100)));
		assert_eq!(tree.nodes()[count].hint("min"), None);
		assert!(!tree.nodes()[hidden].included);
		assert_eq!(tree.child_by_name(0, "count"), Some((1, count)));
		assert_eq!(tree.child_by_name(0, "missing"), None);
	}

	#[test]
	fn node_storage_goes_through_traits() {
		let tracker = Arc::new(TrackingTraits::new());
		let traits: Arc<dyn Traits> = tracker.clone();

		let tree = DefinitionTree::build(LAYOUT.name(), LAYOUT.fields(), &traits);
		assert_eq!(tracker.outstanding(), 1);
		assert!(matches!(tracker.events().as_slice(), [AllocEvent::Alloc { .. }]));

		drop(tree);
		assert_eq!(tracker.outstanding(), 0);
	}
}
