mod unit_storage_walk {

	use crate::param::storage::walk_containers;
	use crate::param::test_support::{LAYOUT, heap};

	#[test]
	fn walk_visits_array_headers_after_their_elements() {
		let traits = heap();
		let mut instance = LAYOUT.create(traits).expect("layout instance");
		let grid = instance.handle("grid").expect("grid handle");
		instance.set_array_size(&grid, 2).expect("grid resize");
		let row = instance.handle("grid[1]").expect("row handle");
		instance.set_array_size(&row, 3).expect("row resize");

		let schema = instance.schema().clone();
		let tree = schema.tree();
		let mut visited = Vec::new();
		// SAFETY: the instance is live and laid out by its schema.
		unsafe {
			walk_containers(schema.lookup(), 0, instance.base(), &mut |id, _| visited.push(tree.nodes()[id].long_name.to_string()));
		}

		assert_eq!(visited, vec!["label", "points", "grid[]", "grid[]", "grid", "settings.name"]);
	}
}

mod unit_storage_resize {

	use crate::param::test_support::{BYTES, tracking};
	use crate::param::{AllocEvent, ParamError};

	#[test]
	fn shrinking_to_zero_clears_buffer_and_ownership() {
		let (tracker, traits) = tracking(&[&BYTES]);
		let mut instance = BYTES.create(traits).expect("bytes instance");
		let bytes = instance.handle("bytes").expect("bytes handle");

		instance.set_array_size(&bytes, 8).expect("grow");
		let info = instance.array_info(&bytes).expect("info");
		assert!(info.owned);
		assert!(info.buffer.is_some());

		instance.set_array_size(&bytes, 0).expect("shrink to zero");
		let info = instance.array_info(&bytes).expect("info");
		assert_eq!(info.extent, 0);
		assert!(info.buffer.is_none());
		assert!(!info.owned);
		assert_eq!(info.element_size, 1);

		drop(instance);
		assert_eq!(tracker.outstanding(), 0);
	}

	#[test]
	fn resize_replaces_buffer_and_frees_old_one() {
		let (tracker, traits) = tracking(&[&BYTES]);
		let mut instance = BYTES.create(traits).expect("bytes instance");
		let bytes = instance.handle("bytes").expect("bytes handle");

		instance.set_array_size(&bytes, 4).expect("grow");
		tracker.clear_events();
		instance.set_array_size(&bytes, 6).expect("grow again");
		assert_eq!(tracker.events(), vec![AllocEvent::Alloc { size: 6 }, AllocEvent::Free { size: 4 }]);

		instance.set_array_size(&bytes, 6).expect("same size");
		assert_eq!(tracker.events().len(), 2);
	}

	#[test]
	fn resize_rejects_non_dynamic_fields() {
		let traits = crate::param::test_support::heap();
		let mut instance = crate::param::test_support::LAYOUT.create(traits).expect("layout instance");
		let pair = instance.handle("pair").expect("pair handle");
		let err = instance.set_array_size(&pair, 3).expect_err("fixed arrays cannot resize");
		assert!(matches!(err, ParamError::TypeMismatch { .. }));
	}
}
