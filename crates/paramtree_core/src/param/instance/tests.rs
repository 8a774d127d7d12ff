mod unit_instance_bytes_scenario {

	use crate::param::test_support::{BYTES, tracking};

	#[test]
	fn byte_array_grow_write_shrink_destroy() {
		let (tracker, traits) = tracking(&[&BYTES]);
		let mut instance = BYTES.create(traits).expect("bytes instance");
		let bytes = instance.handle("bytes").expect("bytes handle");

		let info = instance.array_info(&bytes).expect("info");
		assert_eq!(info.extent, 0);
		assert!(info.buffer.is_none());
		assert!(info.owned);

		instance.set_array_size(&bytes, 4).expect("grow to 4");
		let info = instance.array_info(&bytes).expect("info");
		assert!(info.buffer.is_some());
		let values: Vec<u8> = (0..4)
			.map(|idx| instance.get::<u8>(&bytes.index(instance.tree(), idx).expect("index")).expect("read byte"))
			.collect();
		assert_eq!(values, vec![0, 0, 0, 0]);

		let second = instance.handle("bytes[2]").expect("bytes[2]");
		instance.set::<u8>(&second, 0xAB).expect("write 0xAB");
		assert_eq!(instance.get::<u8>(&second).expect("read back"), 0xAB);

		instance.set_array_size(&bytes, 2).expect("shrink to 2");
		let values: Vec<u8> = (0..2)
			.map(|idx| instance.get::<u8>(&bytes.index(instance.tree(), idx).expect("index")).expect("read byte"))
			.collect();
		assert_eq!(values, vec![0, 0]);
		assert!(instance.resolve(&second).is_err());

		instance.destroy();
		assert_eq!(tracker.outstanding(), 0);
	}
}

mod unit_instance_teardown {

	use crate::param::test_support::{HOLDER, NOTE, tracking};
	use crate::param::{AllocEvent, Instance, Traits};
	use std::sync::Arc;

	fn note(traits: &Arc<dyn Traits>, text: &str) -> Instance {
		let mut note = NOTE.create(Arc::clone(traits)).expect("note instance");
		let handle = note.handle("text").expect("text handle");
		note.set_string(&handle, Some(text)).expect("set text");
		note
	}

	#[cfg(target_pointer_width = "64")]
	#[test]
	fn strings_and_children_are_released_before_array_buffers() {
		let (tracker, traits) = tracking(&[&HOLDER, &NOTE]);
		let mut holder = HOLDER.create(Arc::clone(&traits)).expect("holder instance");
		let children = holder.handle("children").expect("children handle");
		holder.set_array_size(&children, 2).expect("two children");
		holder.set_reference(&holder.handle("children[0]").expect("slot 0"), Some(note(&traits, "alpha"))).expect("store alpha");
		holder.set_reference(&holder.handle("children[1]").expect("slot 1"), Some(note(&traits, "beta"))).expect("store beta");

		tracker.clear_events();
		holder.destroy();

		assert_eq!(
			tracker.events(),
			vec![
				AllocEvent::StrFree { len: 5 },
				AllocEvent::Free { size: 16 },
				AllocEvent::StrFree { len: 4 },
				AllocEvent::Free { size: 16 },
				// children buffer: two reference slots
				AllocEvent::Free { size: 16 },
				// holder inline region
				AllocEvent::Free { size: 40 },
			]
		);
		assert_eq!(tracker.outstanding(), 0);
	}

	#[test]
	fn nested_dynamic_arrays_release_inner_buffers_on_shrink() {
		let (tracker, traits) = tracking(&[&crate::param::test_support::LAYOUT]);
		let mut layout = crate::param::test_support::LAYOUT.create(traits).expect("layout instance");
		let grid = layout.handle("grid").expect("grid");
		layout.set_array_size(&grid, 2).expect("two rows");
		for row in ["grid[0]", "grid[1]"] {
			let handle = layout.handle(row).expect("row");
			layout.set_array_size(&handle, 3).expect("row resize");
		}
		let before = tracker.outstanding();

		layout.set_array_size(&grid, 1).expect("drop one row");
		// one row buffer dropped, old grid buffer swapped for a smaller one
		assert_eq!(tracker.outstanding(), before - 1);
		assert_eq!(layout.array_size(&layout.handle("grid[0]").expect("row 0")).expect("row size"), 3);

		drop(layout);
		assert_eq!(tracker.outstanding(), 0);
	}
}

mod unit_instance_references {

	use std::sync::Arc;

	use crate::param::test_support::{HOLDER, NOTE, OTHER, tracking};
	use crate::param::{ParamError, Traits};

	#[test]
	fn rejected_variant_leaves_previous_value() {
		let (tracker, traits) = tracking(&[&HOLDER, &NOTE, &OTHER]);
		let mut holder = HOLDER.create(Arc::clone(&traits)).expect("holder");
		let single = holder.handle("single").expect("single");

		let mut keep = NOTE.create(Arc::clone(&traits)).expect("note");
		let text = keep.handle("text").expect("text");
		keep.set_string(&text, Some("keep")).expect("text set");
		holder.set_reference(&single, Some(keep)).expect("note accepted");

		let other = OTHER.create(Arc::clone(&traits)).expect("other");
		let err = holder.set_reference(&single, Some(other)).expect_err("other rejected");
		match err {
			ParamError::InvalidVariant { class, allowed } => {
				assert_eq!(class, "Other");
				assert_eq!(allowed, "Note");
			}
			other => panic!("unexpected error: {other}"),
		}

		let current = holder.reference(&single).expect("reference read").expect("still set");
		assert_eq!(current.class_name(), "Note");
		assert_eq!(current.string(&text).expect("text read"), Some("keep"));

		drop(holder);
		assert_eq!(tracker.outstanding(), 0);
	}

	#[test]
	fn checking_a_candidate_keeps_it_usable() {
		let (tracker, traits) = tracking(&[&HOLDER, &NOTE, &OTHER]);
		let mut holder = HOLDER.create(Arc::clone(&traits)).expect("holder");
		let single = holder.handle("single").expect("single");

		let mut other = OTHER.create(Arc::clone(&traits)).expect("other");
		let err = holder.check_reference(&single, &other).expect_err("other rejected");
		assert!(matches!(err, ParamError::InvalidVariant { .. }));
		assert!(holder.reference(&single).expect("reference read").is_none());

		let value = other.handle("value").expect("value");
		other.set::<u32>(&value, 7).expect("candidate still owned by the caller");
		let any = holder.handle("any").expect("any");
		holder.check_reference(&any, &other).expect("any accepts Other");
		holder.set_reference(&any, Some(other)).expect("stored");
		let stored = holder.reference(&any).expect("reference read").expect("set");
		assert_eq!(stored.get::<u32>(&value).expect("value"), 7);

		drop(holder);
		assert_eq!(tracker.outstanding(), 0);
	}

	#[test]
	fn unrestricted_reference_accepts_any_class_and_can_be_taken() {
		let traits: Arc<dyn Traits> = crate::param::test_support::heap();
		let mut holder = HOLDER.create(Arc::clone(&traits)).expect("holder");
		let any = holder.handle("any").expect("any");

		let mut other = OTHER.create(Arc::clone(&traits)).expect("other");
		let value = other.handle("value").expect("value");
		other.set::<u32>(&value, 42).expect("value set");
		holder.set_reference(&any, Some(other)).expect("any accepts Other");

		let child = holder.reference_mut(&any).expect("mutable ref").expect("set");
		child.set::<u32>(&value, 43).expect("mutate through parent");

		let taken = holder.take_reference(&any).expect("take").expect("was set");
		assert_eq!(taken.get::<u32>(&value).expect("value"), 43);
		assert!(holder.reference(&any).expect("read").is_none());
	}

	#[test]
	fn replacing_reference_destroys_previous_child() {
		let (tracker, traits) = tracking(&[&HOLDER, &NOTE]);
		let mut holder = HOLDER.create(Arc::clone(&traits)).expect("holder");
		let single = holder.handle("single").expect("single");
		holder.set_reference(&single, Some(NOTE.create(Arc::clone(&traits)).expect("first"))).expect("first stored");
		let with_one = tracker.outstanding();

		holder.set_reference(&single, Some(NOTE.create(Arc::clone(&traits)).expect("second"))).expect("second stored");
		assert_eq!(tracker.outstanding(), with_one);

		holder.set_reference(&single, None).expect("cleared");
		assert_eq!(tracker.outstanding(), with_one - 1);
	}
}

mod unit_instance_fields {

	use std::sync::Arc;

	use crate::param::classes::RENDER_MESH_ASSET_PARAMETERS;
	use crate::param::test_support::{LAYOUT, heap, tracking};
	use crate::param::{AllocEvent, Bounds3, ParamError, ParamType, Scalar};

	#[test]
	fn fresh_instances_get_defaults() {
		let instance = LAYOUT.create(heap()).expect("layout instance");
		assert!(instance.get::<bool>(&instance.handle("flag").expect("flag")).expect("flag"));
		assert_eq!(instance.get::<u32>(&instance.handle("count").expect("count")).expect("count"), 7);
		assert_eq!(instance.get::<f64>(&instance.handle("settings.scale").expect("scale")).expect("scale"), 2.5);
		assert_eq!(instance.get::<i32>(&instance.handle("settings.mode").expect("mode")).expect("mode"), -3);
		assert_eq!(instance.string(&instance.handle("settings.name").expect("name")).expect("name"), Some("unnamed"));
		assert_eq!(instance.string(&instance.handle("label").expect("label")).expect("label"), None);
		assert!(instance.is_self_allocated());
		assert_eq!(instance.ref_count(), 1);
	}

	#[test]
	fn typed_access_checks_type_tags() {
		let mut instance = LAYOUT.create(heap()).expect("layout instance");
		let count = instance.handle("count").expect("count");
		let pos = instance.handle("pos").expect("pos");

		let err = instance.get::<u16>(&count).expect_err("u16 read of U32");
		assert!(matches!(err, ParamError::TypeMismatch { expected: "U16", got: ParamType::U32 }));
		let err = instance.set_scalar(&count, Scalar::Bool(true)).expect_err("bool write to U32");
		assert!(matches!(err, ParamError::TypeMismatch { .. }));
		let err = instance.string(&count).expect_err("string read of U32");
		assert!(matches!(err, ParamError::TypeMismatch { expected: "STRING", .. }));

		instance.set::<[f32; 3]>(&pos, [1.0, 2.0, 3.0]).expect("vec3 write");
		assert_eq!(instance.get_scalar(&pos).expect("vec3 read"), Scalar::Vec3([1.0, 2.0, 3.0]));
		assert_eq!(instance.field_type(&pos).expect("type"), ParamType::Vec3);

		let pair1 = instance.handle("pair[1]").expect("pair[1]");
		instance.set::<u16>(&pair1, 513).expect("pair write");
		assert_eq!(instance.get::<u16>(&pair1).expect("pair read"), 513);
		assert_eq!(instance.array_size(&instance.handle("pair").expect("pair")).expect("pair size"), 2);
	}

	#[test]
	fn string_assignment_frees_before_allocating() {
		let (tracker, traits) = tracking(&[&LAYOUT]);
		let mut instance = LAYOUT.create(traits).expect("layout instance");
		let label = instance.handle("label").expect("label");

		instance.set_string(&label, Some("first")).expect("first");
		tracker.clear_events();
		instance.set_string(&label, Some("second!")).expect("second");
		assert_eq!(tracker.events(), vec![AllocEvent::StrFree { len: 5 }, AllocEvent::StrAlloc { len: 7 }]);
		assert_eq!(instance.string(&label).expect("read"), Some("second!"));

		instance.set_string(&label, None).expect("clear");
		assert_eq!(instance.string(&label).expect("read"), None);
		drop(instance);
		assert_eq!(tracker.outstanding(), 0);
	}

	#[test]
	fn render_mesh_arrays_of_strings_and_bounds() {
		let (tracker, traits) = tracking(&[&RENDER_MESH_ASSET_PARAMETERS]);
		let mut mesh = RENDER_MESH_ASSET_PARAMETERS.create(Arc::clone(&traits)).expect("mesh");
		let names = mesh.handle("materialNames").expect("names");
		mesh.set_array_size(&names, 2).expect("two names");
		mesh.set_string(&mesh.handle("materialNames[0]").expect("name 0"), Some("steel")).expect("name 0 set");
		mesh.set_string(&mesh.handle("materialNames[1]").expect("name 1"), Some("glass")).expect("name 1 set");

		tracker.clear_events();
		mesh.set_array_size(&names, 1).expect("drop one name");
		let slot = std::mem::size_of::<crate::param::storage::StringSlot>();
		assert_eq!(
			tracker.events(),
			vec![AllocEvent::Alloc { size: slot }, AllocEvent::StrFree { len: 5 }, AllocEvent::Free { size: 2 * slot }]
		);
		assert_eq!(mesh.string(&mesh.handle("materialNames[0]").expect("name 0")).expect("read"), Some("steel"));

		let bounds = mesh.handle("partBounds").expect("bounds");
		mesh.set_array_size(&bounds, 1).expect("one bound");
		let first = mesh.handle("partBounds[0]").expect("bound 0");
		let value = Bounds3 {
			min: [-1.0, 0.0, -1.0],
			max: [1.0, 2.0, 1.0],
		};
		mesh.set::<Bounds3>(&first, value).expect("bounds set");
		assert_eq!(mesh.get::<Bounds3>(&first).expect("bounds get"), value);

		drop(mesh);
		assert_eq!(tracker.outstanding(), 0);
	}
}
